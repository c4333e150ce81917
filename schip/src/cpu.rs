//! CPU and memory state.
use crate::{
    bytecode::opcode,
    constants::*,
    display::Framebuffer,
    font::{BIG_FONTSET, FONTSET},
    keypad::{KeyCode, Keypad},
};

/// Whether the machine is executing, or stalled on `Fx0A (LD Vx, K)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    #[default]
    Running,
    /// Execution resumes once any key is down, and its value is stored in `register`.
    WaitingForKey { register: u8 },
}

/// Core state for a chip8 interpreter.
///
/// All memory accesses are masked to 12 bits, so addresses past the end of
/// RAM wrap around to the start rather than faulting.
#[derive(Debug, Clone)]
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the next instruction to fetch.
    pub(crate) pc: Address,
    /// Stack pointer, indicating the next free slot of the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address. Since addresses are 12 bits, only the
    /// lowest (rightmost) bits are used.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub(crate) sound_timer: u8,
    /// Super-CHIP 128x64 mode switch.
    pub(crate) high_res: bool,

    // ------------------------------------------------------------------------
    // Input
    pub(crate) wait: KeyWait,
    pub(crate) keys: Keypad,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn to.
    pub(crate) display: Framebuffer,
    /// Set whenever the display buffer changes, cleared by the renderer.
    pub(crate) draw_flag: bool,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        let mut cpu = Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            high_res: false,

            wait: KeyWait::Running,
            keys: Keypad::default(),

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Framebuffer::new(),
            draw_flag: false,
        };

        cpu.load_fonts();
        cpu
    }
}

impl Chip8Cpu {
    /// Power-on state, with fonts in low memory and the program counter at [`MEM_START`].
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn load_fonts(&mut self) {
        self.ram[FONTSET_START..FONTSET_START + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
        self.ram[BIG_FONTSET_START..BIG_FONTSET_START + BIG_FONTSET_DATA_LENGTH]
            .copy_from_slice(&BIG_FONTSET);
    }

    /// Read a byte from RAM, wrapping the address into the 4K space.
    #[inline(always)]
    pub fn read(&self, addr: usize) -> u8 {
        self.ram[addr & ADDRESS_MASK]
    }

    /// Write a byte to RAM, wrapping the address into the 4K space.
    #[inline(always)]
    pub(crate) fn write(&mut self, addr: usize, value: u8) {
        self.ram[addr & ADDRESS_MASK] = value;
    }

    /// Extract the instruction at the current program counter, without advancing.
    #[inline(always)]
    pub fn instr(&self) -> u16 {
        let pc = self.pc as usize;
        opcode(self.read(pc), self.read(pc + 1))
    }

    /// Read the instruction at the program counter, and step past it.
    #[inline(always)]
    pub(crate) fn fetch(&mut self) -> u16 {
        let code = self.instr();
        self.pc = self.pc.wrapping_add(2);
        code
    }

    /// Step over the next instruction.
    #[inline(always)]
    pub(crate) fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Count down the delay timer.
    #[inline]
    pub(crate) fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    #[inline]
    pub(crate) fn tick_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Sets a key state. Key ids outside of the keypad are ignored.
    pub(crate) fn set_key_state(&mut self, key_id: u8, state: bool) {
        if let Ok(key) = KeyCode::try_from(key_id) {
            self.keys.set(key, state);
        }
    }

    pub fn key_state(&self, key_id: u8) -> bool {
        KeyCode::try_from(key_id)
            .map(|key| self.keys.is_pressed(key))
            .unwrap_or(false)
    }
}

/// Read-only access for debuggers and renderers.
impl Chip8Cpu {
    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Register `I`.
    pub fn index(&self) -> Address {
        self.address
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    /// Value of register `Vx`, where `x` is masked to a nibble.
    pub fn v(&self, x: u8) -> u8 {
        self.registers[(x & 0xF) as usize]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Return addresses currently on the stack, oldest first.
    pub fn stack(&self) -> &[Address] {
        &self.stack[..self.sp]
    }

    pub fn is_high_res(&self) -> bool {
        self.high_res
    }

    pub fn key_wait(&self) -> KeyWait {
        self.wait
    }

    pub fn keys(&self) -> &Keypad {
        &self.keys
    }

    pub fn ram(&self) -> &[u8; MEM_SIZE] {
        &self.ram
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let cpu = Chip8Cpu::new();
        assert_eq!(cpu.pc(), 0x200);
        assert_eq!(cpu.sp(), 0);
        assert_eq!(cpu.index(), 0);
        assert_eq!(&cpu.ram()[..FONTSET_DATA_LENGTH], &FONTSET[..]);
        assert_eq!(cpu.read(BIG_FONTSET_START), BIG_FONTSET[0]);
        assert!(cpu.ram()[MEM_START..].iter().all(|b| *b == 0));
        assert!(cpu.display().is_blank());
        assert_eq!(cpu.key_wait(), KeyWait::Running);
    }

    #[test]
    fn test_memory_wraps() {
        let mut cpu = Chip8Cpu::new();
        cpu.write(MEM_SIZE + 0x300, 0xAB);
        assert_eq!(cpu.read(0x300), 0xAB);
        assert_eq!(cpu.read(MEM_SIZE + 0x300), 0xAB);
    }

    #[test]
    fn test_fetch_last_word_wraps_read() {
        let mut cpu = Chip8Cpu::new();
        cpu.write(0xFFF, 0x12);
        cpu.pc = 0xFFF;

        // Low byte is read from the start of memory, which holds the font.
        assert_eq!(cpu.fetch(), 0x1200 | FONTSET[0] as u16);
        assert_eq!(cpu.pc(), 0x1001);
    }

    #[test]
    fn test_key_state_ignores_out_of_range() {
        let mut cpu = Chip8Cpu::new();
        cpu.set_key_state(16, true);
        cpu.set_key_state(255, true);
        assert!(!cpu.keys().any());
        assert!(!cpu.key_state(16));

        cpu.set_key_state(0xF, true);
        assert!(cpu.key_state(0xF));
    }

    #[test]
    fn test_timers_saturate() {
        let mut cpu = Chip8Cpu::new();
        cpu.delay_timer = 1;
        cpu.tick_delay();
        cpu.tick_delay();
        cpu.tick_sound();
        assert_eq!(cpu.delay_timer(), 0);
        assert_eq!(cpu.sound_timer(), 0);
    }
}
