use std::fmt::Display;

use crate::error::{Fault, Result};
use crate::{FONT_ADDR, FONT_DATA, MEM_SIZE, PROGRAM_ADDR, PROGRAM_SIZE};

const ADDR_MASK: u16 = (MEM_SIZE - 1) as u16;

pub struct Memory {
    pub(crate) data: [u8; MEM_SIZE],
}

impl Memory {
    /// Create a zeroed memory image with the font table installed
    pub fn new() -> Self {
        let mut memory = Self {
            data: [0; MEM_SIZE],
        };
        memory.install_font();
        memory
    }

    /// Zero every byte and re-install the font table
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.install_font();
    }

    fn install_font(&mut self) {
        self.data[FONT_ADDR..FONT_ADDR + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
    }

    /// Copy `program` into program space and zero-fill whatever it doesn't cover
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > PROGRAM_SIZE {
            return Err(Fault::ProgramTooLarge {
                size: program.len(),
                max: PROGRAM_SIZE,
            });
        }

        let (loaded, rest) = self.data[PROGRAM_ADDR..].split_at_mut(program.len());
        loaded.copy_from_slice(program);
        rest.fill(0);
        Ok(())
    }

    /// Addresses wrap modulo 4096
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.data[(addr & ADDR_MASK) as usize]
    }

    /// Addresses wrap modulo 4096
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.data[(addr & ADDR_MASK) as usize] = value;
    }

    /// Big-endian 16-bit read of `addr` and `addr + 1`
    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// Borrow `len` bytes starting at `addr`, or `None` if the span runs past the end of memory
    pub fn span(&self, addr: u16, len: usize) -> Option<&[u8]> {
        let start = addr as usize;
        self.data.get(start..start.checked_add(len)?)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const BYTES_PER_LINE: usize = 16;
        for (line, chunk) in self.data.chunks(BYTES_PER_LINE).enumerate() {
            write!(f, "{:04X}: ", line * BYTES_PER_LINE)?;
            for byte in chunk {
                write!(f, "{:02X} ", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
