mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod disasm;
mod display;
mod error;
mod font;
mod keypad;
mod op;
mod quirks;
mod runner;
mod vm;

pub use self::vm::Hz;

pub static IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        clock::{Clock, CycleBudget},
        cpu::{Chip8Cpu, KeyWait},
        disasm::{mnemonic, Disassembler},
        display::Framebuffer,
        error::{Chip8Error, Chip8Result},
        keypad::{InvalidKeyCode, KeyCode, Keypad},
        op::Op,
        quirks::Quirks,
        runner::{Frame, Runner},
        vm::{Chip8Conf, Chip8Vm, Flow},
    };
}
