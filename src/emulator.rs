use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    decode::OpCode,
    display::{FrameBuffer, Palette},
    error::{Chip8Error, Result},
    keyboard::Keyboard,
    memory::{Memory, TypeAddr, MAX_ROM_SIZE},
    registers::Registers,
    snapshot::Snapshot,
    timer::Timer,
};

/// Where PC goes once an instruction has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    SkipIf(bool),
    Goto(TypeAddr),
    // FX0A with no key held
    Hold,
}

/// The whole CHIP-8 machine. Knows nothing about threads or wall-clock time:
/// `step` runs exactly one instruction, `tick_timers` one 60 Hz tick.
pub struct Emulator {
    fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub keyboard: Keyboard,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
    opcode: u16,
    draw_flag: bool,
    rng: StdRng,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic random source, for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            keyboard: Keyboard::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            opcode: 0,
            draw_flag: false,
            rng,
        }
    }

    /// Back to power-on state: memory, registers, stack, keys, timers and
    /// display zeroed, font reloaded, PC at 0x200, random source reseeded.
    pub fn initialize(&mut self) {
        self.mem.reset();
        self.regs.reset();
        self.keyboard.reset();
        self.delay_timer.set(0);
        self.sound_timer.set(0);
        self.fb.clear_buffer();
        self.opcode = 0;
        // blank plane still has to reach the host
        self.draw_flag = true;
        self.rng = StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::from_entropy());
    }

    /// Initializes the machine and copies `program` to 0x200. An oversized
    /// program is rejected before anything is touched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: program.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.initialize();
        self.mem.load_rom(program)?;
        info!("loaded {} byte program", program.len());
        Ok(())
    }

    pub fn fetch_decode(&mut self) -> Result<OpCode> {
        self.opcode = self.mem.fetch()?;
        Ok(OpCode::decode_raw(self.opcode))
    }

    /// One fetch-decode-execute cycle. PC is only moved by the instruction itself.
    pub fn step(&mut self) -> Result<()> {
        let operation = self.fetch_decode()?;
        trace!("{:03X}: {:04X} {}", self.mem.pc.0, self.opcode, operation);
        self.execute_ins(operation)
    }

    pub fn execute_ins(&mut self, ins: OpCode) -> Result<()> {
        let pc = self.mem.pc.0;
        let flow = match ins {
            OpCode::SysCall(addr) => {
                debug!("ignoring SYS {addr:#05X} at {pc:#05X}");
                Flow::Next
            }
            OpCode::ClearScreen => {
                self.fb.clear_buffer();
                self.draw_flag = true;
                Flow::Next
            }
            OpCode::PopSubroutine => {
                let addr = self
                    .mem
                    .stack
                    .pop()
                    .ok_or(Chip8Error::StackUnderflow { pc })?;
                // the stack holds the CALL itself
                Flow::Goto(addr.wrapping_add(2))
            }
            OpCode::Jump(addr) => Flow::Goto(addr),
            OpCode::PushSubroutine(addr) => {
                if !self.mem.stack.push(pc) {
                    return Err(Chip8Error::StackOverflow { pc });
                }
                Flow::Goto(addr)
            }
            OpCode::SkipEqualConstant(vx, nn) => Flow::SkipIf(self.regs.get(vx) == nn),
            OpCode::SkipNotEqualConstant(vx, nn) => Flow::SkipIf(self.regs.get(vx) != nn),
            OpCode::SkipEqualRegister(vx, vy) => {
                Flow::SkipIf(self.regs.get(vx) == self.regs.get(vy))
            }
            OpCode::SkipNotEqualRegister(vx, vy) => {
                Flow::SkipIf(self.regs.get(vx) != self.regs.get(vy))
            }
            OpCode::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
                Flow::Next
            }
            OpCode::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
                Flow::Next
            }
            OpCode::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
                Flow::Next
            }
            OpCode::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) | self.regs.get(vy));
                Flow::Next
            }
            OpCode::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) & self.regs.get(vy));
                Flow::Next
            }
            OpCode::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) ^ self.regs.get(vy));
                Flow::Next
            }
            OpCode::Add(vx, vy) => {
                let (z, carry) = self.regs.get(vx).overflowing_add(self.regs.get(vy));
                self.regs.set_register(vx, z);
                self.regs.set_flag(carry);
                Flow::Next
            }
            OpCode::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
                self.regs.set_flag(y < x); // 1 = no borrow
                Flow::Next
            }
            OpCode::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
                self.regs.set_flag(x < y); // 1 = no borrow
                Flow::Next
            }
            OpCode::RightShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value >> 1);
                self.regs.set_register(0xF, vx_value & 1);
                Flow::Next
            }
            OpCode::LeftShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value << 1);
                self.regs.set_register(0xF, (vx_value >> 7) & 1);
                Flow::Next
            }
            OpCode::SetIndexRegister(addr) => {
                self.mem.set_index(addr);
                Flow::Next
            }
            OpCode::JumpWithOffset(addr) => Flow::Goto(addr + self.regs.get(0) as TypeAddr),
            OpCode::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
                Flow::Next
            }
            OpCode::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                let index = self.mem.index.0;
                let sprite: Vec<u8> = (0..height as TypeAddr)
                    .map(|row| self.mem.get(index.wrapping_add(row)))
                    .collect();
                let collision = self.fb.paint(x, y, &sprite);
                self.regs.set_flag(collision);
                self.draw_flag = true;
                Flow::Next
            }
            OpCode::SkipIfPressed(vx) => {
                Flow::SkipIf(self.keyboard.get_key_status_from_num(self.regs.get(vx)))
            }
            OpCode::SkipIfNotPressed(vx) => {
                Flow::SkipIf(!self.keyboard.get_key_status_from_num(self.regs.get(vx)))
            }
            OpCode::CopyDelayToRegister(vx) => {
                self.regs.set_register(vx, self.delay_timer.count);
                Flow::Next
            }
            OpCode::GetKey(vx) => match self.keyboard.first_pressed() {
                Some(key) => {
                    self.regs.set_register(vx, key);
                    Flow::Next
                }
                None => Flow::Hold,
            },
            OpCode::CopyRegisterToDelay(vx) => {
                self.delay_timer.set(self.regs.get(vx));
                Flow::Next
            }
            OpCode::CopyRegisterToSound(vx) => {
                self.sound_timer.set(self.regs.get(vx));
                Flow::Next
            }
            OpCode::AddToIndex(vx) => {
                let sum = self.mem.index.0 + self.regs.get(vx) as TypeAddr;
                self.mem.set_index(sum);
                self.regs.set_flag(sum > 0xFFF);
                Flow::Next
            }
            OpCode::PointChar(vx) => {
                self.mem.set_index(Memory::font_addr(self.regs.get(vx)));
                Flow::Next
            }
            OpCode::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let index = self.mem.index.0;
                let digits = [value / 100, (value / 10) % 10, value % 10];
                for (i, digit) in digits.into_iter().enumerate() {
                    self.mem.set(index.wrapping_add(i as TypeAddr), digit);
                }
                Flow::Next
            }
            OpCode::StoreRegisterToMemory(vx) => {
                let index = self.mem.index.0;
                for reg in 0..=vx {
                    self.mem
                        .set(index.wrapping_add(reg as TypeAddr), self.regs.get(reg));
                }
                Flow::Next
            }
            OpCode::LoadRegisterFromMemory(vx) => {
                let index = self.mem.index.0;
                for reg in 0..=vx {
                    let reg_val = self.mem.get(index.wrapping_add(reg as TypeAddr));
                    self.regs.set_register(reg, reg_val);
                }
                Flow::Next
            }
            OpCode::Unknown(word) => {
                warn!("unknown opcode {word:#06X} at {pc:#05X}, skipped");
                Flow::Next
            }
        };

        match flow {
            Flow::Next | Flow::SkipIf(false) => self.mem.pc.increment(),
            Flow::SkipIf(true) => self.mem.pc.skip(),
            Flow::Goto(addr) => self.mem.set_pc(addr),
            Flow::Hold => {}
        }
        Ok(())
    }

    /// One 60 Hz tick of both timers. Returns true when the sound timer ran out,
    /// which is the cue for the tone.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer.decrement();
        self.sound_timer.decrement()
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn render(&self, palette: &Palette) -> Vec<u32> {
        self.fb.render(palette)
    }

    /// Renders and clears the draw flag if the plane changed since the last call.
    pub fn take_frame(&mut self, palette: &Palette) -> Option<Vec<u32>> {
        if !self.draw_flag {
            return None;
        }
        self.draw_flag = false;
        Some(self.render(palette))
    }

    pub fn snapshot(&self, clock_hz: u32) -> Snapshot {
        Snapshot {
            opcode: self.opcode,
            pc: self.mem.pc.0,
            index: self.mem.index.0,
            v: self.regs.all(),
            delay_timer: self.delay_timer.count,
            sound_timer: self.sound_timer.count,
            stack: self.mem.stack.addresses(),
            sp: self.mem.stack.pointer(),
            clock_hz,
        }
    }
}
