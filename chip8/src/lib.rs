mod decode;
mod display;
pub mod error;
mod keypad;
mod memory;
mod registers;
mod timers;

use std::fmt::Display as FmtDisplay;

use log::{debug, trace};
use rand::Rng;

use crate::display::Display;
use crate::error::Result;
use crate::keypad::Keypad;
use crate::registers::Stack;
use crate::timers::Timers;

pub use crate::decode::{Instruction, Opcode};
pub use crate::display::FrameBuffer;
pub use crate::error::Fault;
pub use crate::keypad::Key;
pub use crate::memory::Memory;
pub use crate::registers::{Register, Registers};

pub const FONT_CHAR_LENGTH: usize = 5;

pub const FONT_DATA: [u8; FONT_CHAR_LENGTH * 0x10] = [
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

pub const FONT_ADDR: usize = 0x050;

pub const MEM_SIZE: usize = 0x1000;
pub const PROGRAM_ADDR: usize = 0x200;
pub const PROGRAM_SIZE: usize = MEM_SIZE - PROGRAM_ADDR;
pub const STACK_SIZE: usize = 0x10;
pub const REGISTER_COUNT: usize = 0x10;
pub const KEY_COUNT: usize = 0x10;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

struct Chip8Config {
    shift_uses_vy: bool,
    jump_uses_vx: bool,
    load_store_increments_i: bool,
    ops_per_cycle: usize,
}

impl Chip8Config {
    pub fn new() -> Self {
        Self {
            shift_uses_vy: false,
            jump_uses_vx: false,
            load_store_increments_i: false,
            ops_per_cycle: 11,
        }
    }
}

/// Whether the machine can make progress on the next `step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    Running,
    /// Stalled on FX0A until a key is pressed; the key index lands in `register`
    AwaitingKey { register: Register },
    /// Stopped by a fault; every further `step` reports it again until the machine is re-initialized
    Faulted(Fault),
}

pub struct Chip8 {
    config: Chip8Config,
    /// RAM that stores font data, the program, and its working data
    memory: Memory,
    /// A frame buffer containing binary pixel states
    display: Display,
    /// A hexadecimal keypad containing 16 key states labelled 0 through F
    keypad: Keypad,
    /// Return addresses of the subroutines currently being executed
    stack: Stack,
    /// 16 8-bit general-purpose variable registers numbered 0 through F hexadecimal
    v: Registers,
    /// The program counter points to the current instruction in memory
    pc: u16,
    /// The index register is used to point at locations in memory
    i: u16,
    /// Delay and sound timers, decremented at 60 Hz by the host
    timers: Timers,
    state: MachineState,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            config: Chip8Config::new(),
            memory: Memory::new(),
            display: Display::new(),
            keypad: Keypad::new(),
            stack: Stack::new(),
            v: Registers::new(),
            pc: PROGRAM_ADDR as u16,
            i: 0,
            timers: Timers::new(),
            state: MachineState::Running,
        }
    }

    /* Config builder functions */
    pub fn shift_uses_vy(mut self, value: bool) -> Self {
        self.config.shift_uses_vy = value;
        self
    }

    pub fn jump_uses_vx(mut self, value: bool) -> Self {
        self.config.jump_uses_vx = value;
        self
    }

    pub fn load_store_increments_i(mut self, value: bool) -> Self {
        self.config.load_store_increments_i = value;
        self
    }

    pub fn ops_per_cycle(mut self, value: usize) -> Self {
        self.config.ops_per_cycle = value;
        self
    }

    /// Reset every component to its power-on state and re-install the font
    pub fn initialize(&mut self) {
        self.memory.reset();
        self.display.clear();
        self.keypad.reset();
        self.stack.reset();
        self.v.reset();
        self.pc = PROGRAM_ADDR as u16;
        self.i = 0;
        self.timers.reset();
        self.state = MachineState::Running;
        debug!("machine initialized");
    }

    /// Initialize the machine and copy `program` to 0x200
    /// On error the machine is left initialized with empty program space
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.initialize();
        self.memory.load_program(program)?;
        debug!("loaded {} byte program at {:#05x}", program.len(), PROGRAM_ADDR);
        Ok(())
    }

    pub fn set_key(&mut self, index: usize, pressed: bool) -> Result<()> {
        self.keypad.set_key(index, pressed)
    }

    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Run one 60 Hz frame: tick the timers once, then step `ops_per_cycle` times
    pub fn cycle(&mut self) -> Result<MachineState> {
        self.tick_timers();
        for _ in 0..self.config.ops_per_cycle {
            self.step()?;
        }
        Ok(self.state.clone())
    }

    /// Perform one fetch-decode-execute transition, or poll the keypad while stalled on FX0A
    pub fn step(&mut self) -> Result<MachineState> {
        match self.state {
            MachineState::Faulted(ref fault) => return Err(fault.clone()),
            MachineState::AwaitingKey { register } => {
                self.resume_on_key(register);
                return Ok(self.state.clone());
            }
            MachineState::Running => {}
        }

        if let Err(fault) = self.execute_next() {
            debug!("machine faulted: {}", fault);
            self.state = MachineState::Faulted(fault.clone());
            return Err(fault);
        }
        Ok(self.state.clone())
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn fault(&self) -> Option<&Fault> {
        match &self.state {
            MachineState::Faulted(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn is_fb_dirty(&self) -> bool {
        self.display.dirty
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.display.fb()
    }

    /// Copy out the frame buffer and clear the dirty flag
    pub fn take_framebuffer(&mut self) -> FrameBuffer {
        self.display.take_fb()
    }

    pub fn is_sound_playing(&self) -> bool {
        self.timers.sound() > 0
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay()
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &Registers {
        &self.v
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The screen as text, one line per row with `█` for lit pixels
    pub fn screen(&self) -> impl FmtDisplay + '_ {
        &self.display
    }

    fn resume_on_key(&mut self, register: Register) {
        if let Some(key) = self.keypad.first_pressed() {
            debug!("key {:X} pressed, resuming", key);
            self.v[register] = key;
            self.pc += 2;
            self.state = MachineState::Running;
        }
    }

    fn execute_next(&mut self) -> Result<()> {
        let pc = self.pc;
        let raw = self.fetch()?;
        let instruction =
            Instruction::decode(raw).ok_or(Fault::UnknownOpcode { opcode: raw, pc })?;
        trace!("{:#05x}: {} {:?}", pc, Opcode::from(raw), instruction);
        self.execute(instruction)
    }

    fn fetch(&mut self) -> Result<u16> {
        let pc = self.pc;
        if (pc as usize) < PROGRAM_ADDR || pc as usize + 1 >= MEM_SIZE {
            return Err(Fault::AddressOutOfRange { address: pc, pc });
        }

        let opcode = self.memory.read_word(pc);
        self.pc += 2;
        Ok(opcode)
    }

    fn execute(&mut self, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::Cls => self.op_cls(),
            Instruction::Return => self.op_sub_return()?,
            Instruction::Jump(nnn) => self.op_jump(nnn),
            Instruction::Call(nnn) => self.op_sub_call(nnn)?,
            Instruction::SkipEq(x, nn) => self.op_skip_eq(x, nn),
            Instruction::SkipNe(x, nn) => self.op_skip_ne(x, nn),
            Instruction::SkipRegEq(x, y) => self.op_skip_reg_eq(x, y),
            Instruction::Set(x, nn) => self.op_set(x, nn),
            Instruction::Add(x, nn) => self.op_add(x, nn),
            Instruction::RegSet(x, y) => self.op_reg_set(x, y),
            Instruction::RegOr(x, y) => self.op_reg_or(x, y),
            Instruction::RegAnd(x, y) => self.op_reg_and(x, y),
            Instruction::RegXor(x, y) => self.op_reg_xor(x, y),
            Instruction::RegAdd(x, y) => self.op_reg_add(x, y),
            Instruction::RegSubRight(x, y) => self.op_reg_sub_right(x, y),
            Instruction::RegShiftRight(x, y) => self.op_reg_shift_right(x, y),
            Instruction::RegSubLeft(x, y) => self.op_reg_sub_left(x, y),
            Instruction::RegShiftLeft(x, y) => self.op_reg_shift_left(x, y),
            Instruction::SkipRegNe(x, y) => self.op_skip_reg_ne(x, y),
            Instruction::SetIndex(nnn) => self.op_set_index(nnn),
            Instruction::JumpWithOffset(nnn, x) => self.op_jump_with_offset(nnn, x),
            Instruction::Random(x, nn) => self.op_random(x, nn),
            Instruction::Draw(x, y, n) => self.op_display(x, y, n)?,
            Instruction::SkipIfKeyDown(x) => self.op_skip_if_key_down(x),
            Instruction::SkipIfKeyUp(x) => self.op_skip_if_key_up(x),
            Instruction::GetDelay(x) => self.op_dt_get(x),
            Instruction::WaitKey(x) => self.op_get_key(x),
            Instruction::SetDelay(x) => self.op_dt_set(x),
            Instruction::SetSound(x) => self.op_st_set(x),
            Instruction::AddToIndex(x) => self.op_add_to_index(x),
            Instruction::FontCharacter(x) => self.op_font_character(x),
            Instruction::Bcd(x) => self.op_convert_to_decimal(x)?,
            Instruction::StoreRegisters(x) => self.op_memory_store(x)?,
            Instruction::LoadRegisters(x) => self.op_memory_load(x)?,
        }
        Ok(())
    }

    /// Address of the instruction being executed; only valid before it redirects `pc`
    fn op_addr(&self) -> u16 {
        self.pc - 2
    }

    /// Check that `len` bytes at `I` lie in memory, and for writes, outside the reserved region
    fn check_index_span(&self, len: usize, write: bool) -> Result<()> {
        let start = self.i as usize;
        if start + len > MEM_SIZE || (write && start < PROGRAM_ADDR) {
            return Err(Fault::AddressOutOfRange {
                address: self.i,
                pc: self.op_addr(),
            });
        }
        Ok(())
    }

    /* Operations */

    /// 0x00E0
    fn op_cls(&mut self) {
        self.display.clear();
    }

    /// 0x00EE
    fn op_sub_return(&mut self) -> Result<()> {
        self.pc = self.stack.pop(self.op_addr())?;
        Ok(())
    }

    /// 0x1NNN
    fn op_jump(&mut self, nnn: u16) {
        self.pc = nnn;
    }

    /// 0x2NNN
    fn op_sub_call(&mut self, nnn: u16) -> Result<()> {
        self.stack.push(self.pc, self.op_addr())?;
        self.pc = nnn;
        Ok(())
    }

    /// 0x3XNN
    fn op_skip_eq(&mut self, x: Register, nn: u8) {
        if self.v[x] == nn {
            self.pc += 2;
        }
    }

    /// 0x4XNN
    fn op_skip_ne(&mut self, x: Register, nn: u8) {
        if self.v[x] != nn {
            self.pc += 2;
        }
    }

    /// 0x5XY0
    fn op_skip_reg_eq(&mut self, x: Register, y: Register) {
        if self.v[x] == self.v[y] {
            self.pc += 2;
        }
    }

    /// 0x6XNN
    fn op_set(&mut self, x: Register, nn: u8) {
        self.v[x] = nn;
    }

    /// 0x7XNN, no carry flag
    fn op_add(&mut self, x: Register, nn: u8) {
        self.v[x] = self.v[x].wrapping_add(nn);
    }

    /// 0x8XY0
    fn op_reg_set(&mut self, x: Register, y: Register) {
        self.v[x] = self.v[y];
    }

    /// 0x8XY1
    fn op_reg_or(&mut self, x: Register, y: Register) {
        self.v[x] |= self.v[y];
    }

    /// 0x8XY2
    fn op_reg_and(&mut self, x: Register, y: Register) {
        self.v[x] &= self.v[y];
    }

    /// 0x8XY3
    fn op_reg_xor(&mut self, x: Register, y: Register) {
        self.v[x] ^= self.v[y];
    }

    /// 0x8XY4
    fn op_reg_add(&mut self, x: Register, y: Register) {
        let (sum, overflow) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = sum;
        self.v.set_flag(overflow);
    }

    /// 0x8XY5
    fn op_reg_sub_right(&mut self, x: Register, y: Register) {
        let (diff, borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[x] = diff;
        self.v.set_flag(!borrow);
    }

    /// 0x8XY6
    fn op_reg_shift_right(&mut self, x: Register, y: Register) {
        if self.config.shift_uses_vy {
            self.v[x] = self.v[y];
        }
        let flag = self.v[x] & 0x1;
        self.v[x] >>= 1;
        self.v.set_flag(flag == 1);
    }

    /// 0x8XY7
    fn op_reg_sub_left(&mut self, x: Register, y: Register) {
        let (diff, borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[x] = diff;
        self.v.set_flag(!borrow);
    }

    /// 0x8XYE
    fn op_reg_shift_left(&mut self, x: Register, y: Register) {
        if self.config.shift_uses_vy {
            self.v[x] = self.v[y];
        }
        let flag = self.v[x] >> 7 & 0x1;
        self.v[x] <<= 1;
        self.v.set_flag(flag == 1);
    }

    /// 0x9XY0
    fn op_skip_reg_ne(&mut self, x: Register, y: Register) {
        if self.v[x] != self.v[y] {
            self.pc += 2;
        }
    }

    /// 0xANNN
    fn op_set_index(&mut self, nnn: u16) {
        self.i = nnn;
    }

    /// 0xBNNN
    fn op_jump_with_offset(&mut self, nnn: u16, x: Register) {
        let offset = if self.config.jump_uses_vx {
            self.v[x]
        } else {
            self.v[Register::new(0)]
        };
        self.pc = nnn + offset as u16;
    }

    /// 0xCXNN
    fn op_random(&mut self, x: Register, nn: u8) {
        self.v[x] = nn & rand::rng().random::<u8>();
    }

    /// 0xDXYN
    fn op_display(&mut self, x: Register, y: Register, n: u8) -> Result<()> {
        let vx = self.v[x] as usize % SCREEN_WIDTH;
        let vy = self.v[y] as usize % SCREEN_HEIGHT;
        self.check_index_span(n as usize, false)?;

        let sprite = self.memory.span(self.i, n as usize).unwrap_or_default();
        let collision = self.display.draw_sprite(vx, vy, sprite);
        self.v.set_flag(collision);
        Ok(())
    }

    /// 0xEX9E
    fn op_skip_if_key_down(&mut self, x: Register) {
        if self.keypad.is_pressed(self.v[x]) {
            self.pc += 2;
        }
    }

    /// 0xEXA1
    fn op_skip_if_key_up(&mut self, x: Register) {
        if !self.keypad.is_pressed(self.v[x]) {
            self.pc += 2;
        }
    }

    /// 0xFX07
    fn op_dt_get(&mut self, x: Register) {
        self.v[x] = self.timers.delay;
    }

    /// 0xFX0A
    fn op_get_key(&mut self, x: Register) {
        if let Some(key) = self.keypad.first_pressed() {
            self.v[x] = key;
            return;
        }
        debug!("waiting for key at {:#05x}", self.op_addr());
        self.pc -= 2;
        self.state = MachineState::AwaitingKey { register: x };
    }

    /// 0xFX15
    fn op_dt_set(&mut self, x: Register) {
        self.timers.delay = self.v[x];
    }

    /// 0xFX18
    fn op_st_set(&mut self, x: Register) {
        self.timers.sound = self.v[x];
    }

    /// 0xFX1E
    fn op_add_to_index(&mut self, x: Register) {
        self.i = self.i.wrapping_add(self.v[x] as u16);
    }

    /// 0xFX29
    fn op_font_character(&mut self, x: Register) {
        self.i = (FONT_ADDR + FONT_CHAR_LENGTH * (self.v[x] & 0xF) as usize) as u16;
    }

    /// 0xFX33
    fn op_convert_to_decimal(&mut self, x: Register) -> Result<()> {
        self.check_index_span(3, true)?;
        let n = self.v[x];
        self.memory.write_byte(self.i, n / 100 % 10);
        self.memory.write_byte(self.i + 1, n / 10 % 10);
        self.memory.write_byte(self.i + 2, n % 10);
        Ok(())
    }

    /// 0xFX55
    fn op_memory_store(&mut self, x: Register) -> Result<()> {
        self.check_index_span(x.index() + 1, true)?;
        let start = self.i;
        for (offset, reg) in x.up_to().enumerate() {
            self.memory.write_byte(start + offset as u16, self.v[reg]);
        }
        if self.config.load_store_increments_i {
            self.i += x.index() as u16 + 1;
        }
        Ok(())
    }

    /// 0xFX65
    fn op_memory_load(&mut self, x: Register) -> Result<()> {
        self.check_index_span(x.index() + 1, false)?;
        let start = self.i;
        for (offset, reg) in x.up_to().enumerate() {
            self.v[reg] = self.memory.read_byte(start + offset as u16);
        }
        if self.config.load_store_increments_i {
            self.i += x.index() as u16 + 1;
        }
        Ok(())
    }
}

impl FmtDisplay for Chip8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Registers ===")?;
        for (n, value) in self.v.as_slice().iter().enumerate() {
            write!(f, "V{:X}={:02X} ", n, value)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "PC={:04X} I={:04X} SP={} DT={:02X} ST={:02X}",
            self.pc,
            self.i,
            self.stack.depth(),
            self.timers.delay(),
            self.timers.sound()
        )?;
        write!(f, "=== Memory ===\n{}", self.memory)
    }
}
