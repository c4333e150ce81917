//! Constant values of the CHIP-8 and Super-CHIP architecture.

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 0x10; // 16

/// Register VF doubles as the carry, borrow and collision flag.
pub const FLAG_REGISTER: usize = 0xF;

/// The lower memory space was historically used for the interpreter itself,
/// but is now used for fonts.
pub const MEM_START: usize = 0x200; // 512
pub const MEM_SIZE: usize = 0x1000; // 4096

/// Addresses are 12 bits wide. Every memory access is masked with this,
/// so reads and writes past the end wrap around to the start.
pub const ADDRESS_MASK: usize = MEM_SIZE - 1;

/// Largest program that fits between [`MEM_START`] and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - MEM_START;

/// Levels of nesting allowed in the call stack.
///
/// The original RCA 1802 implementation allocated 48 bytes
/// for up to 12 levels of nesting. Super-CHIP and most modern
/// interpreters settled on 16.
pub const STACK_SIZE: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_SIZE: [usize; 2] = [DISPLAY_WIDTH, DISPLAY_HEIGHT];
pub const DISPLAY_BUFFER_SIZE: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Super-CHIP high resolution mode.
///
/// The mode bit is tracked, but the display buffer keeps its low resolution size.
pub const HIRES_DISPLAY_SIZE: [usize; 2] = [128, 64];

/// Small 4x5 hexadecimal font, one glyph every 5 bytes.
pub const FONTSET_START: usize = 0x000;
pub const FONTSET_HEIGHT: usize = 5;
pub const FONTSET_DATA_LENGTH: usize = 16 * FONTSET_HEIGHT; // 80

/// Large Super-CHIP 8x10 font, placed directly after the small font.
pub const BIG_FONTSET_START: usize = FONTSET_START + FONTSET_DATA_LENGTH; // 0x050
pub const BIG_FONTSET_HEIGHT: usize = 10;
pub const BIG_FONTSET_DATA_LENGTH: usize = 16 * BIG_FONTSET_HEIGHT; // 160

/// Number of clock cycles in a second that delay timers count down.
pub const TIMER_FREQUENCY: u64 = 60;

/// Number of nanoseconds in a second
#[doc(hidden)]
pub const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Time in nanoseconds a single timer tick takes, precalculated.
pub const TIMER_TICK_TIME: u64 = NANOS_IN_SECOND / TIMER_FREQUENCY;

/// Instructions per second when no clock speed is configured.
pub const DEFAULT_CLOCK_HZ: u64 = 500;

/// Number of keys on the keypad (0x0-0xF)
pub const KEY_COUNT: u8 = 16;

/// Type for storing the 12-bit memory addresses.
pub type Address = u16;
