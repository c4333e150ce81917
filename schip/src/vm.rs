//! Virtual machine.
use std::{
    fmt::{self, Write},
    path::Path,
    time::Duration,
};

use rand::prelude::*;

use crate::{
    constants::*,
    cpu::{Chip8Cpu, KeyWait},
    disasm,
    display::Framebuffer,
    error::{Chip8Error, Chip8Result},
    keypad::KeyCode,
    op::Op,
    quirks::Quirks,
};

/// The interpreter.
///
/// Owns the whole machine state. A driver calls [`Chip8Vm::cycle`] at the
/// configured clock speed and [`Chip8Vm::update_timers`] at 60 Hz, and
/// feeds input through [`Chip8Vm::key_down`] and [`Chip8Vm::key_up`].
pub struct Chip8Vm {
    cpu: Chip8Cpu,
    conf: Chip8Conf,
    rng: StdRng,
    /// A program has been loaded.
    running: bool,
    paused: bool,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Instructions executed per second.
    pub clock_frequency: Hz,
    pub quirks: Quirks,
    /// Seed for `Cxnn (RND Vx, byte)`. Seeded from entropy when not set.
    pub seed: Option<u64>,
}

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl Default for Hz {
    fn default() -> Self {
        Hz(DEFAULT_CLOCK_HZ)
    }
}

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

impl fmt::Display for Hz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Outcome of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// No program is loaded, nothing was executed.
    Halted,
    /// Execution is suspended by the debugger.
    Paused,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// Display buffer changed.
    Draw,
    /// Sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
    /// Opcode does not match any instruction, and was skipped.
    Unknown(u16),
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Chip8Vm {
            cpu: Chip8Cpu::new(),
            conf,
            rng,
            running: false,
            paused: false,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    pub fn quirks(&self) -> &Quirks {
        &self.conf.quirks
    }

    /// Restore the power-on state. The loaded program is erased.
    pub fn reset(&mut self) {
        log::debug!("reset");

        self.cpu = Chip8Cpu::new();
        // Renderer must pick up the blank screen.
        self.cpu.draw_flag = true;
        self.running = false;
        self.paused = false;

        if let Some(seed) = self.conf.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }

    /// Reset the machine and load a program at [`MEM_START`].
    ///
    /// A program that doesn't fit in memory is rejected and the machine is left untouched.
    pub fn load_rom(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if bytecode.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
            });
        }

        // Start with clean memory to avoid leaking previous program.
        self.reset();

        // Load program into virtual RAM
        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);
        self.running = true;

        log::info!("loaded {} byte program", bytecode.len());

        Ok(())
    }

    pub fn load_rom_file(&mut self, filepath: impl AsRef<Path>) -> Chip8Result<()> {
        let filepath = filepath.as_ref();
        log::info!("load rom: {}", filepath.display());

        let bytecode = std::fs::read(filepath)?;
        self.load_rom(&bytecode)
    }

    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    pub fn display(&self) -> &Framebuffer {
        &self.cpu.display
    }

    /// Check whether the display changed since the last call, and clear the flag.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.cpu.draw_flag)
    }

    pub fn draw_flag(&self) -> bool {
        self.cpu.draw_flag
    }

    /// Buzzer should be on while the sound timer counts down.
    pub fn sound_active(&self) -> bool {
        self.cpu.sound_timer > 0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Render an opcode as an assembly mnemonic.
    pub fn disassemble(&self, opcode: u16) -> String {
        disasm::mnemonic(opcode)
    }
}

/// Debugger controls
impl Chip8Vm {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Execute exactly one cycle, even while paused.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        let paused = std::mem::replace(&mut self.paused, false);
        let result = self.cycle();
        self.paused = paused;
        result
    }
}

/// Input
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.keys.set(key, pressed);
    }

    /// Press a key. Keys outside of `0..16` are ignored.
    pub fn key_down(&mut self, key_id: u8) {
        self.cpu.set_key_state(key_id, true);
    }

    /// Release a key. Keys outside of `0..16` are ignored.
    pub fn key_up(&mut self, key_id: u8) {
        self.cpu.set_key_state(key_id, false);
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.keys.clear()
    }
}

/// Interpreter
impl Chip8Vm {
    /// Count down the delay and sound timers. Call at 60 Hz.
    pub fn update_timers(&mut self) {
        self.cpu.tick_delay();
        self.cpu.tick_sound();
    }

    /// Read the instruction at the program counter and advance past it.
    pub fn fetch(&mut self) -> u16 {
        self.cpu.fetch()
    }

    /// Run one fetch and execute cycle.
    ///
    /// While waiting on `Fx0A (LD Vx, K)` no instruction is fetched. Instead
    /// the keypad is polled, and the lowest pressed key completes the wait.
    ///
    /// A stack fault leaves the program counter on the faulting instruction.
    pub fn cycle(&mut self) -> Chip8Result<Flow> {
        if !self.running {
            return Ok(Flow::Halted);
        }

        if self.paused {
            return Ok(Flow::Paused);
        }

        if let KeyWait::WaitingForKey { register } = self.cpu.wait {
            return Ok(self.poll_key_wait(register));
        }

        let pc = self.cpu.pc;
        let opcode = self.fetch();

        self.execute(opcode).map_err(|err| {
            log::error!("{err}");
            self.cpu.pc = pc;
            err
        })
    }

    fn poll_key_wait(&mut self, register: u8) -> Flow {
        match self.cpu.keys.first_pressed() {
            Some(key) => {
                self.cpu.registers[register as usize] = key.as_u8();
                self.cpu.wait = KeyWait::Running;
                Flow::Ok
            }
            None => Flow::KeyWait,
        }
    }

    /// Address of the instruction being executed, which the program counter already stepped past.
    #[inline(always)]
    fn instr_addr(&self) -> u16 {
        self.cpu.pc.wrapping_sub(2)
    }

    /// Decode and execute a single opcode, as if it was just fetched.
    pub fn execute(&mut self, opcode: u16) -> Chip8Result<Flow> {
        let instr_addr = self.instr_addr();
        op_trace(instr_addr, opcode);

        let quirks = self.conf.quirks;
        let cpu = &mut self.cpu;
        let mut control_flow = Flow::Ok;

        match Op::decode(opcode) {
            // 00E0 (CLS)
            //
            // Clear display
            Op::ClearScreen => {
                cpu.display.clear();
                cpu.draw_flag = true;
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Subtract 1 from the stack pointer, then set the program
            // counter to the value at the top of the stack.
            Op::Return => {
                if cpu.sp == 0 {
                    return Err(Chip8Error::StackUnderflow { pc: instr_addr });
                }
                cpu.sp -= 1;
                cpu.pc = cpu.stack[cpu.sp];
                control_flow = Flow::Jump;
            }
            // 00Cn (SCD nibble)
            //
            // Scroll display down by n rows.
            Op::ScrollDown { n } => {
                cpu.display.scroll_down(n as usize);
                cpu.draw_flag = true;
                control_flow = Flow::Draw;
            }
            // 00FE (LOW), 00FF (HIGH)
            //
            // Only the mode bit is tracked, the display stays at 64x32.
            Op::LowRes => cpu.high_res = false,
            Op::HighRes => cpu.high_res = true,
            // 1nnn (JP addr)
            //
            // Jump to address.
            Op::JumpAddress { address } => {
                cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 2nnn (CALL addr)
            //
            // Call subroutine at nnn.
            Op::Call { address } => {
                if cpu.sp >= STACK_SIZE {
                    return Err(Chip8Error::StackOverflow { pc: instr_addr });
                }
                cpu.stack[cpu.sp] = cpu.pc;
                cpu.sp += 1;
                cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // 3xnn (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => {
                if cpu.registers[vx as usize] == nn {
                    cpu.skip();
                }
            }
            // 4xnn (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => {
                if cpu.registers[vx as usize] != nn {
                    cpu.skip();
                }
            }
            // 5xy0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => {
                if cpu.registers[vx as usize] == cpu.registers[vy as usize] {
                    cpu.skip();
                }
            }
            // 6xnn (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                cpu.registers[vx as usize] = nn;
            }
            // 7xnn (ADD Vx, byte)
            //
            // Add value nn to register Vx. Carry flag is not set.
            Op::Add_Byte { vx, nn } => {
                let x = cpu.registers[vx as usize];
                cpu.registers[vx as usize] = x.wrapping_add(nn);
            }
            // 9xy0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => {
                if cpu.registers[vx as usize] != cpu.registers[vy as usize] {
                    cpu.skip();
                }
            }
            // Annn (LD I, addr)
            Op::Load_Address { address } => {
                cpu.address = address;
            }
            // Bnnn (JP V0, addr)
            //
            // Jump to nnn + V0, or to xnn + Vx in the Super-CHIP form.
            Op::Jump_Offset { vx, address } => {
                let offset = if quirks.jump_v0 {
                    cpu.registers[0]
                } else {
                    cpu.registers[vx as usize]
                };
                cpu.pc = (address + offset as u16) & ADDRESS_MASK as u16;
                control_flow = Flow::Jump;
            }
            // Cxnn (RND Vx, byte)
            //
            // Set register Vx to the result of bitwise AND between a random number and nn.
            Op::Random { vx, nn } => {
                cpu.registers[vx as usize] = self.rng.gen::<u8>() & nn;
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
            // Sprite is encoded as 8 pixels wide, n pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            Op::Draw { vx, vy, n } => {
                let (x, y) = (
                    cpu.registers[vx as usize] as usize,
                    cpu.registers[vy as usize] as usize,
                );

                let mut sprite = [0_u8; 0xF];
                let addr = cpu.address as usize;
                for (r, row) in sprite.iter_mut().take(n as usize).enumerate() {
                    *row = cpu.read(addr + r);
                }

                let is_erased = cpu.display.draw_sprite(x, y, &sprite[..n as usize]);
                cpu.registers[FLAG_REGISTER] = is_erased as u8;
                cpu.draw_flag = true;
                control_flow = Flow::Draw;
            }
            // Ex9E (SKP Vx)
            Op::Skip_Pressed { vx } => {
                if cpu.key_state(cpu.registers[vx as usize] & 0xF) {
                    cpu.skip();
                }
            }
            // ExA1 (SKNP Vx)
            Op::Skip_NotPressed { vx } => {
                if !cpu.key_state(cpu.registers[vx as usize] & 0xF) {
                    cpu.skip();
                }
            }
            // Fx07 (LD Vx, DT)
            Op::Load_Delay { vx } => {
                cpu.registers[vx as usize] = cpu.delay_timer;
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // All execution stops until a key is pressed.
            Op::Wait_Key { vx } => {
                cpu.wait = KeyWait::WaitingForKey { register: vx };
                control_flow = Flow::KeyWait;
            }
            // Fx15 (LD DT, Vx)
            Op::Set_Delay { vx } => {
                cpu.delay_timer = cpu.registers[vx as usize];
            }
            // Fx18 (LD ST, Vx)
            Op::Set_Sound { vx } => {
                cpu.sound_timer = cpu.registers[vx as usize];
                control_flow = Flow::Sound;
            }
            // Fx1E (ADD I, Vx)
            Op::Add_Address { vx } => {
                let x = cpu.registers[vx as usize] as u16;
                cpu.address = (cpu.address + x) & ADDRESS_MASK as u16;
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of small sprite for digit Vx.
            Op::Load_Font { vx } => {
                let digit = (cpu.registers[vx as usize] & 0xF) as usize;
                cpu.address = (FONTSET_START + digit * FONTSET_HEIGHT) as u16;
            }
            // Fx30 (LD HF, Vx)
            //
            // Set I = location of large sprite for digit Vx.
            Op::Load_BigFont { vx } => {
                let digit = (cpu.registers[vx as usize] & 0xF) as usize;
                cpu.address = (BIG_FONTSET_START + digit * BIG_FONTSET_HEIGHT) as u16;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::Store_Bcd { vx } => {
                let addr = cpu.address as usize;
                let x = cpu.registers[vx as usize];
                cpu.write(addr,     x / 100);
                cpu.write(addr + 1, x / 10  % 10);
                cpu.write(addr + 2, x       % 10);
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            Op::Store_Registers { vx } => {
                let addr = cpu.address as usize;
                for v in 0..=vx as usize {
                    cpu.write(addr + v, cpu.registers[v]);
                }
                if quirks.load_store_inc {
                    cpu.address = (addr + vx as usize + 1) as u16 & ADDRESS_MASK as u16;
                }
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            Op::Load_Registers { vx } => {
                let addr = cpu.address as usize;
                for v in 0..=vx as usize {
                    cpu.registers[v] = cpu.read(addr + v);
                }
                if quirks.load_store_inc {
                    cpu.address = (addr + vx as usize + 1) as u16 & ADDRESS_MASK as u16;
                }
            }
            // Fx75 (LD R, Vx), Fx85 (LD Vx, R)
            //
            // There are no HP-48 user flags to persist to.
            Op::Save_Flags { .. } | Op::Restore_Flags { .. } => {
                log::debug!("RPL user flags are not supported: ${opcode:04X}");
            }
            Op::Unknown(code) => {
                log::warn!("unknown opcode ${code:04X} at ${instr_addr:03X}");
                control_flow = Flow::Unknown(code);
            }
            // Arithmetic instructions identified by n
            op => control_flow = self.exec_math(op),
        }

        Ok(control_flow)
    }

    /// Execute an arithmetic instruction.
    ///
    /// The flag register is always written after the result, so when the
    /// destination is VF the flag wins.
    #[inline]
    #[must_use]
    fn exec_math(&mut self, op: Op) -> Flow {
        let shift_vx = self.conf.quirks.shift_vx;
        let v = &mut self.cpu.registers;

        match op {
            // 8xy0 (LD Vx, Vy)
            //
            // Store the value of register Vy in register Vx.
            Op::Load_Vx_Vy { vx, vy } => {
                v[vx as usize] = v[vy as usize];
            }
            // 8xy1 (OR Vx, Vy)
            //
            // Performs bitwise OR on Vx and Vy, and stores the result in Vx.
            // VF is reset, like the COSMAC VIP did.
            Op::Or_Vx_Vy { vx, vy } => {
                v[vx as usize] |= v[vy as usize];
                v[FLAG_REGISTER] = 0;
            }
            // 8xy2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => {
                v[vx as usize] &= v[vy as usize];
                v[FLAG_REGISTER] = 0;
            }
            // 8xy3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => {
                v[vx as usize] ^= v[vy as usize];
                v[FLAG_REGISTER] = 0;
            }
            // 8xy4 (ADD Vx, Vy)
            //
            // Adds Vy to Vx, and stores the result in Vx.
            // Overflow is wrapped. If overflow, set VF to 1, else 0.
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = v[vx as usize].overflowing_add(v[vy as usize]);
                v[vx as usize] = result;
                v[FLAG_REGISTER] = carry as u8;
            }
            // 8xy5 (SUB Vx, Vy)
            //
            // Subtracts Vy from Vx, and stores the result in Vx.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub_Vx_Vy { vx, vy } => {
                let (x, y) = (v[vx as usize], v[vy as usize]);
                v[vx as usize] = x.wrapping_sub(y);
                v[FLAG_REGISTER] = (x >= y) as u8;
            }
            // 8xy6 (SHR Vx {, Vy})
            //
            // Shift the source right by 1 into Vx.
            // VF is set to the bit shifted out.
            Op::ShiftRight { vx, vy } => {
                let src = if shift_vx { v[vx as usize] } else { v[vy as usize] };
                v[vx as usize] = src >> 1;
                v[FLAG_REGISTER] = src & 1;
            }
            // 8xy7 (SUBN Vx, Vy)
            //
            // Subtracts Vx from Vy, and stores the result in Vx.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (x, y) = (v[vx as usize], v[vy as usize]);
                v[vx as usize] = y.wrapping_sub(x);
                v[FLAG_REGISTER] = (y >= x) as u8;
            }
            // 8xyE (SHL Vx {, Vy})
            //
            // Shift the source left by 1 into Vx.
            // VF is set to the bit shifted out.
            Op::ShiftLeft { vx, vy } => {
                let src = if shift_vx { v[vx as usize] } else { v[vy as usize] };
                v[vx as usize] = src << 1;
                v[FLAG_REGISTER] = src >> 7;
            }
            _ => unreachable!("non-arithmetic instruction {op:?}"),
        }

        Flow::Ok
    }
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for i in (MEM_START..(MEM_START + count).min(MEM_SIZE)).step_by(2) {
            writeln!(
                buf,
                "{:04X}: {:02X}{:02X}",
                i,
                self.cpu.read(i),
                self.cpu.read(i + 1)
            )?;
        }

        Ok(buf)
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.keys.any() {
            write!(buf, "keys:")?;
            for key in self.cpu.keys.iter_pressed() {
                write!(buf, " {key}")?;
            }
        }

        Ok(buf)
    }

    /// Register panel for debug overlays.
    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let cpu = &self.cpu;
        let mut buf = String::new();

        writeln!(buf, "PC: ${:03X}  I: ${:03X}", cpu.pc, cpu.address)?;
        writeln!(
            buf,
            "SP: {}  DT: {:02X}  ST: {:02X}",
            cpu.sp, cpu.delay_timer, cpu.sound_timer
        )?;
        for (label, bank) in [("V0-V7", &cpu.registers[..8]), ("V8-VF", &cpu.registers[8..])] {
            write!(buf, "{label}:")?;
            for v in bank {
                write!(buf, " {v:02X}")?;
            }
            writeln!(buf)?;
        }

        if (cpu.pc as usize) < MEM_SIZE - 1 {
            let opcode = cpu.instr();
            writeln!(buf, "OP: ${opcode:04X} {}", disasm::mnemonic(opcode))?;
        }

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(addr: u16, opcode: u16) {
    log::trace!("{addr:04X}: {opcode:04X} {}", disasm::mnemonic(opcode));
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: u16, _: u16) {}
