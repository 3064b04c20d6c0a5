use std::fmt;

use crate::memory::TypeAddr;

/// Field view over a raw 16-bit instruction word.
///
/// ```text
/// 0x73EE
///   7    top nibble, opcode group
///    3   x, register
///     E  y, register
///      E n, 4-bit constant
///     EE nn, 8-bit constant
///   3EE  nnn, address
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RawInstruction {
    code: u16,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code }
    }

    // n is starting digit (1-based), m is length
    pub fn nth_m_digits(&self, n: u8, m: u8) -> u16 {
        let shift_places = (4 - m - (n - 1)) * 4;
        let mask = (1u32 << (m * 4)) - 1;
        (self.code >> shift_places) & mask as u16
    }

    pub fn nibbles(&self) -> (u8, u8, u8, u8) {
        (
            self.nth_m_digits(1, 1) as u8,
            self.x(),
            self.y(),
            self.n(),
        )
    }

    pub fn x(&self) -> u8 {
        self.nth_m_digits(2, 1) as u8
    }

    pub fn y(&self) -> u8 {
        self.nth_m_digits(3, 1) as u8
    }

    pub fn n(&self) -> u8 {
        self.nth_m_digits(4, 1) as u8
    }

    pub fn nn(&self) -> u8 {
        self.nth_m_digits(3, 2) as u8
    }

    pub fn nnn(&self) -> TypeAddr {
        self.nth_m_digits(2, 3)
    }
}

impl PartialEq<u16> for RawInstruction {
    fn eq(&self, ins: &u16) -> bool {
        ins.eq(&self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    // 0NNN
    // machine code routine on the original hardware, ignored
    SysCall(TypeAddr),
    // 00E0
    // turn all pixels to 0
    ClearScreen,
    // 00EE
    PopSubroutine,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump(TypeAddr),
    // 2NNN
    PushSubroutine(TypeAddr),

    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),

    // 6XNN
    // set register VX to value NN
    SetRegister(u8, u8),
    // 7XNN
    // add value NN to VX, no carry
    AddToRegister(u8, u8),

    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    /// 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY6
    RightShift(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE
    LeftShift(u8, u8),

    // 9XY0
    SkipNotEqualRegister(u8, u8),
    // ANNN
    // set index register I to address NNN
    SetIndexRegister(TypeAddr),
    // BNNN
    JumpWithOffset(TypeAddr),
    // CXNN
    Random(u8, u8),
    // DXYN
    // draw an N pixel tall sprite starting at I
    // at coordinates (VX, VY), XOR onto the plane
    // VF set to 1 if any pixel was switched off
    Display(u8, u8, u8),

    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),

    // FX07
    CopyDelayToRegister(u8),
    // FX0A
    GetKey(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),
    // FX1E
    AddToIndex(u8),
    // FX29
    PointChar(u8),
    // FX33
    ToDecimal(u8),
    // FX55
    StoreRegisterToMemory(u8),
    // FX65
    LoadRegisterFromMemory(u8),

    Unknown(u16),
}

impl OpCode {
    pub fn decode_raw(ins: u16) -> Self {
        let raw = RawInstruction::new(ins);
        let (x, y, nn, nnn) = (raw.x(), raw.y(), raw.nn(), raw.nnn());

        match raw.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Self::ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Self::PopSubroutine,
            (0x0, ..) => Self::SysCall(nnn),
            (0x1, ..) => Self::Jump(nnn),
            (0x2, ..) => Self::PushSubroutine(nnn),
            (0x3, ..) => Self::SkipEqualConstant(x, nn),
            (0x4, ..) => Self::SkipNotEqualConstant(x, nn),
            (0x5, .., 0x0) => Self::SkipEqualRegister(x, y),
            (0x6, ..) => Self::SetRegister(x, nn),
            (0x7, ..) => Self::AddToRegister(x, nn),
            (0x8, .., 0x0) => Self::CopyRegister(x, y),
            (0x8, .., 0x1) => Self::Or(x, y),
            (0x8, .., 0x2) => Self::And(x, y),
            (0x8, .., 0x3) => Self::XOr(x, y),
            (0x8, .., 0x4) => Self::Add(x, y),
            (0x8, .., 0x5) => Self::SubtractForward(x, y),
            (0x8, .., 0x6) => Self::RightShift(x, y),
            (0x8, .., 0x7) => Self::SubtractBackward(x, y),
            (0x8, .., 0xE) => Self::LeftShift(x, y),
            (0x9, .., 0x0) => Self::SkipNotEqualRegister(x, y),
            (0xA, ..) => Self::SetIndexRegister(nnn),
            (0xB, ..) => Self::JumpWithOffset(nnn),
            (0xC, ..) => Self::Random(x, nn),
            (0xD, _, _, n) => Self::Display(x, y, n),
            (0xE, _, 0x9, 0xE) => Self::SkipIfPressed(x),
            (0xE, _, 0xA, 0x1) => Self::SkipIfNotPressed(x),
            (0xF, _, 0x0, 0x7) => Self::CopyDelayToRegister(x),
            (0xF, _, 0x0, 0xA) => Self::GetKey(x),
            (0xF, _, 0x1, 0x5) => Self::CopyRegisterToDelay(x),
            (0xF, _, 0x1, 0x8) => Self::CopyRegisterToSound(x),
            (0xF, _, 0x1, 0xE) => Self::AddToIndex(x),
            (0xF, _, 0x2, 0x9) => Self::PointChar(x),
            (0xF, _, 0x3, 0x3) => Self::ToDecimal(x),
            (0xF, _, 0x5, 0x5) => Self::StoreRegisterToMemory(x),
            (0xF, _, 0x6, 0x5) => Self::LoadRegisterFromMemory(x),
            _ => Self::Unknown(ins),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SysCall(addr) => write!(f, "SYS {addr:#05X}"),
            Self::ClearScreen => write!(f, "CLS"),
            Self::PopSubroutine => write!(f, "RET"),
            Self::Jump(addr) => write!(f, "JP {addr:#05X}"),
            Self::PushSubroutine(addr) => write!(f, "CALL {addr:#05X}"),
            Self::SkipEqualConstant(x, nn) => write!(f, "SE V{x:X}, {nn:#04X}"),
            Self::SkipNotEqualConstant(x, nn) => write!(f, "SNE V{x:X}, {nn:#04X}"),
            Self::SkipEqualRegister(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            Self::SetRegister(x, nn) => write!(f, "LD V{x:X}, {nn:#04X}"),
            Self::AddToRegister(x, nn) => write!(f, "ADD V{x:X}, {nn:#04X}"),
            Self::CopyRegister(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Self::Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            Self::And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Self::XOr(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            Self::Add(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Self::SubtractForward(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            Self::RightShift(x, _) => write!(f, "SHR V{x:X}"),
            Self::SubtractBackward(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            Self::LeftShift(x, _) => write!(f, "SHL V{x:X}"),
            Self::SkipNotEqualRegister(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::SetIndexRegister(addr) => write!(f, "LD I, {addr:#05X}"),
            Self::JumpWithOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Self::Random(x, nn) => write!(f, "RND V{x:X}, {nn:#04X}"),
            Self::Display(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::SkipIfPressed(x) => write!(f, "SKP V{x:X}"),
            Self::SkipIfNotPressed(x) => write!(f, "SKNP V{x:X}"),
            Self::CopyDelayToRegister(x) => write!(f, "LD V{x:X}, DT"),
            Self::GetKey(x) => write!(f, "LD V{x:X}, K"),
            Self::CopyRegisterToDelay(x) => write!(f, "LD DT, V{x:X}"),
            Self::CopyRegisterToSound(x) => write!(f, "LD ST, V{x:X}"),
            Self::AddToIndex(x) => write!(f, "ADD I, V{x:X}"),
            Self::PointChar(x) => write!(f, "LD F, V{x:X}"),
            Self::ToDecimal(x) => write!(f, "LD B, V{x:X}"),
            Self::StoreRegisterToMemory(x) => write!(f, "LD [I], V{x:X}"),
            Self::LoadRegisterFromMemory(x) => write!(f, "LD V{x:X}, [I]"),
            Self::Unknown(ins) => write!(f, "??? {ins:#06X}"),
        }
    }
}
