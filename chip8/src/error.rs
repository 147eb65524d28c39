use thiserror::Error;

pub type Result<T> = std::result::Result<T, Fault>;

/// Faults raised by the machine. None of them are recovered internally; the host
/// decides whether to halt, reset, or report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("address {address:#05x} out of range (pc {pc:#05x})")]
    AddressOutOfRange { address: u16, pc: u16 },

    #[error("unknown opcode {opcode:#06x} at {pc:#05x}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("call stack overflow at {pc:#05x}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at {pc:#05x}")]
    StackUnderflow { pc: u16 },

    #[error("key index {0:#x} is not on the keypad")]
    InvalidKey(usize),
}
