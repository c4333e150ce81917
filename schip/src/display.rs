//! Monochrome display buffer.
use std::fmt;

use crate::constants::*;

/// Pixel grid drawn to by the `CLS`, `DRW` and `SCD` instructions.
///
/// Stored row major, `x + y * DISPLAY_WIDTH`.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[x + y * DISPLAY_WIDTH]
    }

    /// Raw buffer, row major.
    pub fn as_slice(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    /// Iterate the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks_exact(DISPLAY_WIDTH)
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| !px)
    }

    pub fn count_lit(&self) -> usize {
        self.pixels.iter().filter(|px| **px).count()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// XOR a sprite onto the display, returning whether any lit pixel was erased.
    ///
    /// Each byte of `sprite` is one row of 8 pixels, most significant bit on the left.
    ///
    /// The origin wraps around the edges of the display, but the sprite itself
    /// is clipped at the right and bottom edges instead of wrapping.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let x = x % DISPLAY_WIDTH;
        let y = y % DISPLAY_HEIGHT;
        let mut is_erased = false;

        for (r, row) in sprite.iter().enumerate() {
            let py = y + r;
            if py >= DISPLAY_HEIGHT {
                break;
            }

            for c in 0..8 {
                let px = x + c;
                if px >= DISPLAY_WIDTH {
                    break;
                }

                if row & (0x80 >> c) != 0 {
                    let d = px + py * DISPLAY_WIDTH;

                    // XOR erases a pixel when both the old and new values are 1.
                    is_erased |= self.pixels[d];
                    self.pixels[d] ^= true;
                }
            }
        }

        is_erased
    }

    /// Move every row down by `n`, blanking the rows uncovered at the top.
    pub fn scroll_down(&mut self, n: usize) {
        let n = n.min(DISPLAY_HEIGHT);
        let shift = n * DISPLAY_WIDTH;

        self.pixels.copy_within(0..DISPLAY_BUFFER_SIZE - shift, shift);
        self.pixels[..shift].fill(false);
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for px in row {
                f.write_str(if *px { "#" } else { "." })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("lit", &self.count_lit())
            .finish()
    }
}
