use std::ops::{Index, IndexMut};

use crate::error::{Fault, Result};
use crate::{REGISTER_COUNT, STACK_SIZE};

/// One of the 16 general-purpose registers V0 through VF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    /// VF, overwritten by every instruction with a carry, borrow, or collision side effect
    pub const FLAG: Register = Register(0xF);

    /// Only the low nibble of `index` is used
    pub const fn new(index: u8) -> Self {
        Self(index & 0xF)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// V0 through `self`, inclusive
    pub fn up_to(self) -> impl Iterator<Item = Register> {
        (0..=self.0).map(Register)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers([u8; REGISTER_COUNT]);

impl Index<Register> for Registers {
    type Output = u8;

    fn index(&self, register: Register) -> &Self::Output {
        &self.0[register.index()]
    }
}

impl IndexMut<Register> for Registers {
    fn index_mut(&mut self, register: Register) -> &mut Self::Output {
        &mut self.0[register.index()]
    }
}

impl Registers {
    pub fn new() -> Self {
        Self([0; REGISTER_COUNT])
    }

    pub fn reset(&mut self) {
        self.0.fill(0);
    }

    pub fn set_flag(&mut self, value: bool) {
        self[Register::FLAG] = value as u8;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Return addresses for subroutine calls, with `sp` as the current depth
pub struct Stack {
    pub(crate) frames: [u16; STACK_SIZE],
    pub(crate) sp: u8,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            frames: [0; STACK_SIZE],
            sp: 0,
        }
    }

    pub fn reset(&mut self) {
        self.frames.fill(0);
        self.sp = 0;
    }

    /// Push a return address; `pc` identifies the faulting call in the error
    pub fn push(&mut self, addr: u16, pc: u16) -> Result<()> {
        let depth = self.sp as usize;
        if depth == STACK_SIZE {
            return Err(Fault::StackOverflow { pc });
        }
        self.frames[depth] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recent return address; `pc` identifies the faulting return in the error
    pub fn pop(&mut self, pc: u16) -> Result<u16> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow { pc });
        }
        self.sp -= 1;
        Ok(self.frames[self.sp as usize])
    }

    pub fn depth(&self) -> usize {
        self.sp as usize
    }
}
