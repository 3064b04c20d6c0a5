use crate::memory::{TypeAddr, ADDR_MASK, PROGRAM_START};

// VF doubles as carry, borrow, shift-out and collision flag
pub const FLAG: u8 = 0xF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    registers: [u8; 16],
}

impl Registers {
    pub fn new() -> Self {
        Self { registers: [0; 16] }
    }

    pub fn reset(&mut self) {
        self.registers = [0; 16];
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[(reg_num & 0xF) as usize] = value;
    }

    pub fn set_flag(&mut self, set: bool) {
        self.set_register(FLAG, set as u8);
    }

    // 7XNN: wraps, VF untouched
    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let total = self.get(reg_num).wrapping_add(value);
        self.set_register(reg_num, total);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[(reg_num & 0xF) as usize]
    }

    pub fn all(&self) -> [u8; 16] {
        self.registers
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl Default for ProgramCounter {
    fn default() -> Self {
        ProgramCounter(PROGRAM_START)
    }
}

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn skip(&mut self) {
        self.0 = self.0.wrapping_add(4);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr & ADDR_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_register_wraps_without_touching_flag() {
        let mut regs = Registers::new();
        regs.set_register(0x3, 0xFF);
        regs.set_register(FLAG, 0x7);
        regs.add_to_register(0x3, 0x02);
        assert_eq!(regs.get(0x3), 0x01);
        assert_eq!(regs.get(FLAG), 0x7);
    }

    #[test]
    fn index_register_is_twelve_bits() {
        let mut index = IndexRegister::default();
        index.set_addr(0x1234);
        assert_eq!(index.0, 0x234);
    }

    #[test]
    fn program_counter_starts_at_program_area() {
        let mut pc = ProgramCounter::default();
        assert_eq!(pc.0, 0x200);
        pc.increment();
        assert_eq!(pc.0, 0x202);
        pc.skip();
        assert_eq!(pc.0, 0x206);
    }
}
