use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::error::{Chip8Error, Result};
use crate::registers::{IndexRegister, ProgramCounter};

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; GLYPH_BYTES * 16];

pub const MEMORY_SIZE: usize = 4096;
pub const ADDR_MASK: TypeAddr = 0x0FFF;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const FONT_START: TypeAddr = 0x000;
pub const GLYPH_BYTES: usize = 5;
pub const STACK_DEPTH: usize = 16;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory {
    // 4k bytes
    // font data stored from 000 -> 04F, programs from 200
    bytes: [u8; MEMORY_SIZE],
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: [0; MEMORY_SIZE],
            pc: ProgramCounter::default(),
            index: IndexRegister::default(),
            stack: Stack::new(),
        };
        mem.load_font();
        mem
    }

    /// Zero everything, reload the font set and point PC back at the program area.
    pub fn reset(&mut self) {
        self.bytes = [0; MEMORY_SIZE];
        self.pc = ProgramCounter::default();
        self.index = IndexRegister::default();
        self.stack.reset();
        self.load_font();
    }

    // addresses wrap around the 4k space
    pub fn set(&mut self, addr: TypeAddr, val: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = val;
    }

    pub fn get(&self, addr: TypeAddr) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads the big-endian word at PC without moving it.
    pub fn fetch(&self) -> Result<u16> {
        let pc = self.pc.0 as usize;
        if pc + 1 >= MEMORY_SIZE {
            return Err(Chip8Error::PcOutOfBounds { pc: self.pc.0 });
        }
        Ok(u16::from_be_bytes([self.bytes[pc], self.bytes[pc + 1]]))
    }

    pub fn set_pc(&mut self, addr: TypeAddr) {
        self.pc.set_addr(addr);
    }

    pub fn set_index(&mut self, addr: TypeAddr) {
        self.index.set_addr(addr);
    }

    // loads program bytes starting at address 0x200
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: bytes.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start_index = PROGRAM_START as usize;
        self.bytes[start_index..start_index + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn font_addr(digit: u8) -> TypeAddr {
        FONT_START + (digit & 0xF) as TypeAddr * GLYPH_BYTES as TypeAddr
    }

    fn load_font(&mut self) {
        let start_index = FONT_START as usize;
        self.bytes[start_index..start_index + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
    }

    /// Hex dump, 16 bytes per line with the line address in front.
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity(MEMORY_SIZE * 3 + (MEMORY_SIZE / 16) * 6);
        for (line, chunk) in self.bytes.chunks(16).enumerate() {
            let _ = write!(out, "{:03X}:", line * 16);
            for byte in chunk {
                let _ = write!(out, " {byte:02X}");
            }
            out.push('\n');
        }
        out
    }
}

/// Reads a raw ROM image. Size is checked when it is loaded.
pub fn read_rom(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Chip8Error::RomRead {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stack {
    addresses: [TypeAddr; STACK_DEPTH],
    sp: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns false when all 16 slots are taken.
    pub fn push(&mut self, addr: TypeAddr) -> bool {
        if self.sp == STACK_DEPTH {
            return false;
        }
        self.addresses[self.sp] = addr;
        self.sp += 1;
        true
    }

    pub fn pop(&mut self) -> Option<TypeAddr> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.addresses[self.sp])
    }

    pub fn pointer(&self) -> usize {
        self.sp
    }

    pub fn addresses(&self) -> [TypeAddr; STACK_DEPTH] {
        self.addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_loaded_at_zero() {
        let mem = Memory::new();
        assert_eq!(&mem.bytes()[..80], &DEFAULT_FONT);
        assert_eq!(Memory::font_addr(0xA), 50);
        assert_eq!(mem.get(Memory::font_addr(0x1)), 0x20);
    }

    #[test]
    fn rom_fills_program_area() {
        let mut mem = Memory::new();
        let rom = vec![0xAB; MAX_ROM_SIZE];
        mem.load_rom(&rom).unwrap();
        assert_eq!(mem.get(0x200), 0xAB);
        assert_eq!(mem.get(0xFFF), 0xAB);
    }

    #[test]
    fn oversized_rom_is_rejected() {
        let mut mem = Memory::new();
        let err = mem.load_rom(&vec![0; MAX_ROM_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::RomTooLarge { size: 3585, max: 3584 }
        ));
        assert_eq!(mem.get(0x200), 0);
    }

    #[test]
    fn fetch_is_big_endian_and_bounded() {
        let mut mem = Memory::new();
        mem.set(0x200, 0x12);
        mem.set(0x201, 0x34);
        assert_eq!(mem.fetch().unwrap(), 0x1234);
        assert_eq!(mem.pc.0, 0x200);

        mem.set_pc(0xFFE);
        assert!(mem.fetch().is_ok());
        mem.set_pc(0xFFF);
        assert!(matches!(
            mem.fetch(),
            Err(Chip8Error::PcOutOfBounds { pc: 0xFFF })
        ));
    }

    #[test]
    fn missing_rom_file_is_reported() {
        let err = read_rom(Path::new("/nonexistent/rom.ch8")).unwrap_err();
        assert!(matches!(err, Chip8Error::RomRead { .. }));
        assert!(err.to_string().contains("/nonexistent/rom.ch8"));
    }

    #[test]
    fn addresses_wrap() {
        let mut mem = Memory::new();
        mem.set(0x1000, 0x42);
        assert_eq!(mem.get(0x000), 0x42);
    }

    #[test]
    fn stack_holds_sixteen() {
        let mut stack = Stack::new();
        for addr in 0..16 {
            assert!(stack.push(addr * 2));
        }
        assert!(!stack.push(0x300));
        assert_eq!(stack.pointer(), 16);
        assert_eq!(stack.pop(), Some(30));
        assert_eq!(stack.pointer(), 15);

        let mut empty = Stack::new();
        assert_eq!(empty.pop(), None);
    }

    #[test]
    fn dump_formats_lines() {
        let mem = Memory::new();
        let dump = mem.dump();
        assert_eq!(dump.lines().count(), 256);
        assert!(dump.starts_with("000: F0 90 90 90 F0 20 60 20 20 70"));
        assert!(dump.lines().nth(0x20).unwrap().starts_with("200: 00"));
    }
}
