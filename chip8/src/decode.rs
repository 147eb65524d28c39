use std::fmt::Display as FmtDisplay;

use crate::registers::Register;

/// The operand fields of a raw 16-bit opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub c: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for Opcode {
    fn from(opcode: u16) -> Self {
        Opcode {
            c: ((opcode & 0xF000) >> 12) as u8,
            x: ((opcode & 0x0F00) >> 8) as u8,
            y: ((opcode & 0x00F0) >> 4) as u8,
            n: (opcode & 0x000F) as u8,
            nn: (opcode & 0x00FF) as u8,
            nnn: opcode & 0x0FFF,
        }
    }
}

impl FmtDisplay for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}{:03X}", self.c, self.nnn)
    }
}

/// A decoded instruction. Register operands are VX/VY; `u8` operands are NN or N; `u16` operands are NNN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEq(Register, u8),
    /// 4XNN
    SkipNe(Register, u8),
    /// 5XY0
    SkipRegEq(Register, Register),
    /// 6XNN
    Set(Register, u8),
    /// 7XNN
    Add(Register, u8),
    /// 8XY0
    RegSet(Register, Register),
    /// 8XY1
    RegOr(Register, Register),
    /// 8XY2
    RegAnd(Register, Register),
    /// 8XY3
    RegXor(Register, Register),
    /// 8XY4
    RegAdd(Register, Register),
    /// 8XY5
    RegSubRight(Register, Register),
    /// 8XY6
    RegShiftRight(Register, Register),
    /// 8XY7
    RegSubLeft(Register, Register),
    /// 8XYE
    RegShiftLeft(Register, Register),
    /// 9XY0
    SkipRegNe(Register, Register),
    /// ANNN
    SetIndex(u16),
    /// BNNN, X is only used when jumps add VX
    JumpWithOffset(u16, Register),
    /// CXNN
    Random(Register, u8),
    /// DXYN
    Draw(Register, Register, u8),
    /// EX9E
    SkipIfKeyDown(Register),
    /// EXA1
    SkipIfKeyUp(Register),
    /// FX07
    GetDelay(Register),
    /// FX0A
    WaitKey(Register),
    /// FX15
    SetDelay(Register),
    /// FX18
    SetSound(Register),
    /// FX1E
    AddToIndex(Register),
    /// FX29
    FontCharacter(Register),
    /// FX33
    Bcd(Register),
    /// FX55
    StoreRegisters(Register),
    /// FX65
    LoadRegisters(Register),
}

impl Instruction {
    /// Decode a raw opcode, or `None` if it matches no instruction
    pub fn decode(raw: u16) -> Option<Self> {
        let opcode = Opcode::from(raw);
        let x = Register::new(opcode.x);
        let y = Register::new(opcode.y);

        let instruction = match opcode.c {
            0x0 => match opcode.nnn {
                0x0E0 => Self::Cls,
                0x0EE => Self::Return,
                _ => return None,
            },
            0x1 => Self::Jump(opcode.nnn),
            0x2 => Self::Call(opcode.nnn),
            0x3 => Self::SkipEq(x, opcode.nn),
            0x4 => Self::SkipNe(x, opcode.nn),
            0x5 if opcode.n == 0 => Self::SkipRegEq(x, y),
            0x6 => Self::Set(x, opcode.nn),
            0x7 => Self::Add(x, opcode.nn),
            0x8 => match opcode.n {
                0x0 => Self::RegSet(x, y),
                0x1 => Self::RegOr(x, y),
                0x2 => Self::RegAnd(x, y),
                0x3 => Self::RegXor(x, y),
                0x4 => Self::RegAdd(x, y),
                0x5 => Self::RegSubRight(x, y),
                0x6 => Self::RegShiftRight(x, y),
                0x7 => Self::RegSubLeft(x, y),
                0xE => Self::RegShiftLeft(x, y),
                _ => return None,
            },
            0x9 if opcode.n == 0 => Self::SkipRegNe(x, y),
            0xA => Self::SetIndex(opcode.nnn),
            0xB => Self::JumpWithOffset(opcode.nnn, x),
            0xC => Self::Random(x, opcode.nn),
            0xD => Self::Draw(x, y, opcode.n),
            0xE => match opcode.nn {
                0x9E => Self::SkipIfKeyDown(x),
                0xA1 => Self::SkipIfKeyUp(x),
                _ => return None,
            },
            0xF => match opcode.nn {
                0x07 => Self::GetDelay(x),
                0x0A => Self::WaitKey(x),
                0x15 => Self::SetDelay(x),
                0x18 => Self::SetSound(x),
                0x1E => Self::AddToIndex(x),
                0x29 => Self::FontCharacter(x),
                0x33 => Self::Bcd(x),
                0x55 => Self::StoreRegisters(x),
                0x65 => Self::LoadRegisters(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Opcode};
    use crate::registers::Register;

    #[test]
    fn test_opcode_fields() {
        let opcode = Opcode::from(0xD12F);
        assert_eq!(opcode.c, 0xD);
        assert_eq!(opcode.x, 0x1);
        assert_eq!(opcode.y, 0x2);
        assert_eq!(opcode.n, 0xF);
        assert_eq!(opcode.nn, 0x2F);
        assert_eq!(opcode.nnn, 0x12F);
        assert_eq!(opcode.to_string(), "D12F");
    }

    #[test]
    fn test_decode_families() {
        let (v1, v2) = (Register::new(1), Register::new(2));
        assert_eq!(Instruction::decode(0x00E0), Some(Instruction::Cls));
        assert_eq!(Instruction::decode(0x00EE), Some(Instruction::Return));
        assert_eq!(Instruction::decode(0x1ABC), Some(Instruction::Jump(0xABC)));
        assert_eq!(Instruction::decode(0x2ABC), Some(Instruction::Call(0xABC)));
        assert_eq!(Instruction::decode(0x8124), Some(Instruction::RegAdd(v1, v2)));
        assert_eq!(Instruction::decode(0x812E), Some(Instruction::RegShiftLeft(v1, v2)));
        assert_eq!(Instruction::decode(0xB123), Some(Instruction::JumpWithOffset(0x123, v1)));
        assert_eq!(Instruction::decode(0xD125), Some(Instruction::Draw(v1, v2, 5)));
        assert_eq!(Instruction::decode(0xE1A1), Some(Instruction::SkipIfKeyUp(v1)));
        assert_eq!(Instruction::decode(0xF10A), Some(Instruction::WaitKey(v1)));
        assert_eq!(Instruction::decode(0xF165), Some(Instruction::LoadRegisters(v1)));
    }

    #[test]
    fn test_decode_unknown() {
        for raw in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x812F, 0x9121, 0xE19F, 0xF100, 0xFF0F] {
            assert_eq!(Instruction::decode(raw), None, "{:04X}", raw);
        }
    }

    #[test]
    fn test_decode_f_family_masks_top_nibble() {
        // F-family sub-opcodes only match with the top nibble set to F
        assert_eq!(Instruction::decode(0x0F33), None);
        assert_eq!(Instruction::decode(0xFF33), Some(Instruction::Bcd(Register::FLAG)));
    }
}
