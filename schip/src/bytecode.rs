//! Helpers for extracting operands from opcodes.
//!
//! Every instruction is a big-endian 16-bit word. The upper nibble
//! identifies the instruction, the remaining 12 bits are operands
//! in one of the layouts below.
//!
//! ```text
//!  op   x    y    n
//! [XXXX XXXX XXXX XXXX]
//!       |--- nnn ---|
//!            |- nn -|
//! ```

/// Combine two bytes from memory into an opcode.
#[inline(always)]
pub fn opcode(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// Extract the instruction identity.
#[inline(always)]
pub fn op_code(opcode: u16) -> u8 {
    ((opcode & 0xF000) >> 12) as u8
}

/// Extract operand NNN, a 12-bit address.
#[inline(always)]
pub fn op_nnn(opcode: u16) -> u16 {
    opcode & 0x0FFF
}

/// Extract operand NN, an 8-bit constant.
#[inline(always)]
pub fn op_nn(opcode: u16) -> u8 {
    (opcode & 0x00FF) as u8
}

/// Extract operand VX, a register index.
#[inline(always)]
pub fn op_x(opcode: u16) -> u8 {
    ((opcode & 0x0F00) >> 8) as u8
}

/// Extract operand VY, a register index.
#[inline(always)]
pub fn op_y(opcode: u16) -> u8 {
    ((opcode & 0x00F0) >> 4) as u8
}

/// Extract operand N, a 4-bit constant.
#[inline(always)]
pub fn op_n(opcode: u16) -> u8 {
    (opcode & 0x000F) as u8
}

/// Extract operands VX, VY and N.
#[inline(always)]
pub fn op_xyn(opcode: u16) -> (u8, u8, u8) {
    (op_x(opcode), op_y(opcode), op_n(opcode))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_operands() {
        let code = opcode(0xD1, 0x2F);
        assert_eq!(code, 0xD12F);
        assert_eq!(op_code(code), 0xD);
        assert_eq!(op_nnn(code), 0x12F);
        assert_eq!(op_nn(code), 0x2F);
        assert_eq!(op_xyn(code), (0x1, 0x2, 0xF));
    }
}
