//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::{MAX_PROGRAM_SIZE, STACK_SIZE};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a program that can't fit in memory.
    LargeProgram { size: usize },
    /// `CALL` with every stack slot in use.
    StackOverflow { pc: u16 },
    /// `RET` with an empty stack.
    StackUnderflow { pc: u16 },
    Io(std::io::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram { size } => write!(
                f,
                "program too large for VM memory: {size} bytes, maximum is {MAX_PROGRAM_SIZE}"
            ),
            Self::StackOverflow { pc } => write!(
                f,
                "call stack overflow at ${pc:03X}, nesting is limited to {STACK_SIZE}"
            ),
            Self::StackUnderflow { pc } => write!(f, "call stack underflow at ${pc:03X}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}
