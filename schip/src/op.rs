//! Decoded instructions.
use crate::{bytecode::*, constants::Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 00Cn (SCD nibble)
    ///
    /// Super-CHIP: scroll the display down by `n` rows.
    ScrollDown { n: u8 },
    /// 00FE (LOW)
    ///
    /// Super-CHIP: leave high resolution mode.
    LowRes,
    /// 00FF (HIGH)
    ///
    /// Super-CHIP: enter high resolution mode.
    HighRes,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    JumpAddress { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Carry flag is not set.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx {, Vy})
    ShiftRight { vx: u8, vy: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx {, Vy})
    ShiftLeft { vx: u8, vy: u8 },

    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },
    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// `vx` is the high nibble of the address, used by the `Bxnn` form.
    Jump_Offset { vx: u8, address: Address },
    /// Cxnn (RND Vx, byte)
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Pressed { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotPressed { vx: u8 },

    // ------------------------------------------------------------------------
    // Miscellaneous
    /// Fx07 (LD Vx, DT)
    Load_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    Wait_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Set_Delay { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Set_Sound { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address { vx: u8 },
    /// Fx29 (LD F, Vx)
    Load_Font { vx: u8 },
    /// Fx30 (LD HF, Vx)
    Load_BigFont { vx: u8 },
    /// Fx33 (LD B, Vx)
    Store_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },
    /// Fx75 (LD R, Vx)
    ///
    /// Super-CHIP: save registers to the HP-48 RPL user flags.
    Save_Flags { vx: u8 },
    /// Fx85 (LD Vx, R)
    ///
    /// Super-CHIP: restore registers from the HP-48 RPL user flags.
    Restore_Flags { vx: u8 },

    /// Does not match any instruction.
    Unknown(u16),
}

impl Op {
    /// Decode a single instruction.
    pub fn decode(opcode: u16) -> Op {
        let code = op_code(opcode);
        let (vx, vy, n) = op_xyn(opcode);
        let nn = op_nn(opcode);
        let address = op_nnn(opcode);

        match code {
            // Miscellaneous instructions identified by nnn
            0x0 => match opcode {
                0x00E0 => Op::ClearScreen,
                0x00EE => Op::Return,
                0x00FE => Op::LowRes,
                0x00FF => Op::HighRes,
                _ if opcode & 0xFFF0 == 0x00C0 => Op::ScrollDown { n },
                _ => Op::Unknown(opcode),
            },
            0x1 => Op::JumpAddress { address },
            0x2 => Op::Call { address },
            0x3 => Op::Skip_Eq_Byte { vx, nn },
            0x4 => Op::Skip_NotEq_Byte { vx, nn },
            // The trailing nibble is not checked.
            0x5 => Op::Skip_Eq { vx, vy },
            0x6 => Op::Load_Byte { vx, nn },
            0x7 => Op::Add_Byte { vx, nn },
            // Arithmetic instructions identified by n
            0x8 => match n {
                0x0 => Op::Load_Vx_Vy { vx, vy },
                0x1 => Op::Or_Vx_Vy { vx, vy },
                0x2 => Op::And_Vx_Vy { vx, vy },
                0x3 => Op::Xor_Vx_Vy { vx, vy },
                0x4 => Op::Add_Vx_Vy { vx, vy },
                0x5 => Op::Sub_Vx_Vy { vx, vy },
                0x6 => Op::ShiftRight { vx, vy },
                0x7 => Op::SubReverse_Vx_Vy { vx, vy },
                0xE => Op::ShiftLeft { vx, vy },
                _ => Op::Unknown(opcode),
            },
            0x9 => Op::Skip_NotEq { vx, vy },
            0xA => Op::Load_Address { address },
            0xB => Op::Jump_Offset { vx, address },
            0xC => Op::Random { vx, nn },
            0xD => Op::Draw { vx, vy, n },
            0xE => match nn {
                0x9E => Op::Skip_Pressed { vx },
                0xA1 => Op::Skip_NotPressed { vx },
                _ => Op::Unknown(opcode),
            },
            0xF => match nn {
                0x07 => Op::Load_Delay { vx },
                0x0A => Op::Wait_Key { vx },
                0x15 => Op::Set_Delay { vx },
                0x18 => Op::Set_Sound { vx },
                0x1E => Op::Add_Address { vx },
                0x29 => Op::Load_Font { vx },
                0x30 => Op::Load_BigFont { vx },
                0x33 => Op::Store_Bcd { vx },
                0x55 => Op::Store_Registers { vx },
                0x65 => Op::Load_Registers { vx },
                0x75 => Op::Save_Flags { vx },
                0x85 => Op::Restore_Flags { vx },
                _ => Op::Unknown(opcode),
            },
            _ => unreachable!("opcode identity is a nibble"),
        }
    }
}
