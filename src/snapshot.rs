use std::fmt;

use crate::decode::OpCode;
use crate::memory::{TypeAddr, STACK_DEPTH};

/// Copy of the inspector-visible machine state, taken between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub opcode: u16,
    pub pc: TypeAddr,
    pub index: TypeAddr,
    pub v: [u8; 16],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [TypeAddr; STACK_DEPTH],
    pub sp: usize,
    pub clock_hz: u32,
}

impl Snapshot {
    /// One-line summary for a window title.
    pub fn summary(&self) -> String {
        format!(
            "PC {:04X}  OP {:04X}  I {:04X}  DT {:02X}  ST {:02X}  {} Hz",
            self.pc, self.opcode, self.index, self.delay_timer, self.sound_timer, self.clock_hz
        )
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}  ({})",
            self.summary(),
            OpCode::decode_raw(self.opcode)
        )?;
        for (i, value) in self.v.iter().enumerate() {
            if i % 8 != 0 {
                write!(f, " ")?;
            }
            write!(f, "V{i:X}={value:02X}")?;
            if i % 8 == 7 {
                writeln!(f)?;
            }
        }
        write!(f, "SP={} [", self.sp)?;
        for (i, addr) in self.stack[..self.sp].iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{addr:03X}")?;
        }
        write!(f, "]")
    }
}
