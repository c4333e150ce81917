//! Disassembler.
//!
//! The mnemonic table covers the base CHIP-8 instruction set only.
//! Unlike [`Op::decode`], Super-CHIP instructions are rendered as unknown words.
//!
//! [`Op::decode`]: crate::op::Op::decode
use std::fmt::{self, Write as FmtWrite};

use crate::{bytecode::*, constants::*};

/// Render a single opcode as its assembly mnemonic.
pub fn mnemonic(opcode: u16) -> String {
    let mut s = String::new();
    // Writing to a `String` cannot fail.
    let _ = write_mnemonic(&mut s, opcode);
    s
}

/// Write a single opcode as its assembly mnemonic.
pub fn write_mnemonic<W: FmtWrite>(w: &mut W, opcode: u16) -> fmt::Result {
    let (x, y, n) = op_xyn(opcode);
    let nn = op_nn(opcode);
    let nnn = op_nnn(opcode);

    match op_code(opcode) {
        0x0 if opcode == 0x00E0 => write!(w, "CLS"),
        0x0 if opcode == 0x00EE => write!(w, "RET"),
        0x1 => write!(w, "JP ${nnn:03X}"),
        0x2 => write!(w, "CALL ${nnn:03X}"),
        0x3 => write!(w, "SE V{x:X}, ${nn:02X}"),
        0x4 => write!(w, "SNE V{x:X}, ${nn:02X}"),
        0x5 => write!(w, "SE V{x:X}, V{y:X}"),
        0x6 => write!(w, "LD V{x:X}, ${nn:02X}"),
        0x7 => write!(w, "ADD V{x:X}, ${nn:02X}"),
        0x8 => {
            let name = match n {
                0x0 => "LD",
                0x1 => "OR",
                0x2 => "AND",
                0x3 => "XOR",
                0x4 => "ADD",
                0x5 => "SUB",
                0x6 => "SHR",
                0x7 => "SUBN",
                0xE => "SHL",
                _ => "???",
            };
            write!(w, "{name} V{x:X}, V{y:X}")
        }
        0x9 => write!(w, "SNE V{x:X}, V{y:X}"),
        0xA => write!(w, "LD I, ${nnn:03X}"),
        0xB => write!(w, "JP V0, ${nnn:03X}"),
        0xC => write!(w, "RND V{x:X}, ${nn:02X}"),
        // Sprite height is printed in decimal.
        0xD => write!(w, "DRW V{x:X}, V{y:X}, {n}"),
        0xE if nn == 0x9E => write!(w, "SKP V{x:X}"),
        0xE if nn == 0xA1 => write!(w, "SKNP V{x:X}"),
        0xF => match nn {
            0x07 => write!(w, "LD V{x:X}, DT"),
            0x0A => write!(w, "LD V{x:X}, K"),
            0x15 => write!(w, "LD DT, V{x:X}"),
            0x18 => write!(w, "LD ST, V{x:X}"),
            0x1E => write!(w, "ADD I, V{x:X}"),
            0x29 => write!(w, "LD F, V{x:X}"),
            0x33 => write!(w, "LD B, V{x:X}"),
            0x55 => write!(w, "LD [I], V{x:X}"),
            0x65 => write!(w, "LD V{x:X}, [I]"),
            _ => write!(w, "??? ${nn:02X}"),
        },
        _ => write!(w, "??? ${opcode:04X}"),
    }
}

/// Walks a ROM image and lists its instructions by address.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    /// Address the first byte is loaded at.
    origin: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            origin: MEM_START,
        }
    }

    /// Override the load address, for disassembling memory dumps.
    pub fn with_origin(mut self, origin: usize) -> Self {
        self.origin = origin;
        self
    }

    /// Pairs of address and opcode. A trailing odd byte is skipped.
    pub fn instructions(&self) -> impl Iterator<Item = (usize, u16)> + 'a {
        let origin = self.origin;
        let bytecode: &'a [u8] = self.bytecode;
        bytecode
            .chunks_exact(2)
            .enumerate()
            .map(move |(i, pair)| (origin + i * 2, opcode(pair[0], pair[1])))
    }

    /// Write the whole program, one instruction per line.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        for (addr, code) in self.instructions() {
            write!(w, "{addr:04X}: ")?;
            write_mnemonic(w, code)?;
            writeln!(w)?;
        }

        if self.bytecode.len() % 2 == 1 {
            let addr = self.origin + self.bytecode.len() - 1;
            let byte = self.bytecode[self.bytecode.len() - 1];
            writeln!(w, "{addr:04X}: .byte ${byte:02X}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mnemonics() {
        let cases: &[(u16, &str)] = &[
            (0x00E0, "CLS"),
            (0x00EE, "RET"),
            (0x11A2, "JP $1A2"),
            (0x2ABC, "CALL $ABC"),
            (0x3A07, "SE VA, $07"),
            (0x4B10, "SNE VB, $10"),
            (0x5120, "SE V1, V2"),
            (0x6345, "LD V3, $45"),
            (0x7FFF, "ADD VF, $FF"),
            (0x8120, "LD V1, V2"),
            (0x8121, "OR V1, V2"),
            (0x8122, "AND V1, V2"),
            (0x8123, "XOR V1, V2"),
            (0x8124, "ADD V1, V2"),
            (0x8125, "SUB V1, V2"),
            (0x8126, "SHR V1, V2"),
            (0x8127, "SUBN V1, V2"),
            (0x812E, "SHL V1, V2"),
            (0x9340, "SNE V3, V4"),
            (0xA123, "LD I, $123"),
            (0xB200, "JP V0, $200"),
            (0xC5F0, "RND V5, $F0"),
            (0xDAB4, "DRW VA, VB, 4"),
            (0xD12F, "DRW V1, V2, 15"),
            (0xE29E, "SKP V2"),
            (0xE3A1, "SKNP V3"),
            (0xF407, "LD V4, DT"),
            (0xF50A, "LD V5, K"),
            (0xF615, "LD DT, V6"),
            (0xF718, "LD ST, V7"),
            (0xF81E, "ADD I, V8"),
            (0xF929, "LD F, V9"),
            (0xFA33, "LD B, VA"),
            (0xFB55, "LD [I], VB"),
            (0xFC65, "LD VC, [I]"),
        ];

        for (code, expected) in cases {
            assert_eq!(mnemonic(*code), *expected, "{code:04X}");
        }
    }

    #[test]
    fn test_unknown_mnemonics() {
        assert_eq!(mnemonic(0x0000), "??? $0000");
        assert_eq!(mnemonic(0x0123), "??? $0123");
        assert_eq!(mnemonic(0x00C3), "??? $00C3");
        assert_eq!(mnemonic(0x00FF), "??? $00FF");
        assert_eq!(mnemonic(0xE1FF), "??? $E1FF");
        assert_eq!(mnemonic(0x8129), "??? V1, V2");
        assert_eq!(mnemonic(0xF130), "??? $30");
        assert_eq!(mnemonic(0xF175), "??? $75");
    }

    #[test]
    fn test_disassemble_listing() {
        let rom = [0x60, 0x0A, 0x70, 0x05, 0x00, 0xE0, 0x12];
        let mut buf = String::new();
        Disassembler::new(&rom).disassemble(&mut buf).unwrap();

        assert_eq!(
            buf,
            "0200: LD V0, $0A\n0202: ADD V0, $05\n0204: CLS\n0206: .byte $12\n"
        );
    }
}
