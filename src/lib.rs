//! CHIP-8 virtual machine: the machine itself (`emulator`), the thread that
//! paces it (`scheduler`), and the pieces a host needs to show and hear it.

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod snapshot;
pub mod sound;
pub mod timer;

pub use config::Settings;
pub use emulator::Emulator;
pub use error::{Chip8Error, Result};
pub use scheduler::Scheduler;
pub use snapshot::Snapshot;
