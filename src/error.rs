use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::memory::TypeAddr;

pub type Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), at most {max} bytes fit in memory")]
    RomTooLarge { size: usize, max: usize },

    #[error("unable to read ROM {}: {source}", .path.display())]
    RomRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: TypeAddr },

    #[error("return from subroutine with an empty call stack at {pc:#05X}")]
    StackUnderflow { pc: TypeAddr },

    #[error("program counter out of bounds: {pc:#06X}")]
    PcOutOfBounds { pc: TypeAddr },

    #[error("no audio output device available")]
    NoAudioDevice,

    #[error("audio output error: {0}")]
    Audio(String),
}

impl Chip8Error {
    /// Faults raised by the running program (as opposed to host problems).
    pub fn is_machine_fault(&self) -> bool {
        matches!(
            self,
            Self::StackOverflow { .. } | Self::StackUnderflow { .. } | Self::PcOutOfBounds { .. }
        )
    }
}
