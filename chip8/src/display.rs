use std::fmt::Display as FmtDisplay;

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// One cell per pixel, each either on (1) or off (0), indexed `[y][x]`
pub type FrameBuffer = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];

pub struct Display {
    pub(crate) fb: FrameBuffer,
    pub(crate) dirty: bool,
}

impl Display {
    pub fn new() -> Self {
        Self {
            fb: [[0; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: false,
        }
    }

    pub fn fb(&self) -> &FrameBuffer {
        &self.fb
    }

    /// Copy out the frame buffer and mark it as presented
    pub fn take_fb(&mut self) -> FrameBuffer {
        self.dirty = false;
        self.fb
    }

    /// Toggle the pixel at the coordinates, wrapping both axes, and return true if it was already on
    /// This function marks the display as dirty, causing it to be re-rendered on the next update
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let (x, y) = (x % SCREEN_WIDTH, y % SCREEN_HEIGHT);
        self.dirty = true;
        let prev = self.fb[y][x];
        self.fb[y][x] ^= 1;
        prev == 1
    }

    /// XOR an 8-pixel-wide sprite onto the surface with its top-left corner at (x, y)
    /// Returns true if any pixel was switched off
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            for col in 0..8 {
                if (byte >> (7 - col)) & 0x1 == 1 {
                    collision |= self.toggle(x + col, y + row);
                }
            }
        }
        collision
    }

    /// Clear the display contents by zeroing out the framebuffer
    /// This function marks the display as dirty, causing it to be re-rendered on the next update
    pub fn clear(&mut self) {
        self.dirty = true;
        for row in self.fb.iter_mut() {
            row.fill(0);
        }
    }

    #[cfg(test)]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH] == 1
    }
}

impl FmtDisplay for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.fb.iter() {
            for cell in row {
                write!(f, "{}", if *cell == 1 { '█' } else { ' ' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};

    #[test]
    fn test_toggle() {
        let mut display = Display::new();
        assert_eq!(display.toggle(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1), false);
        assert_eq!(display.fb[SCREEN_HEIGHT - 1][SCREEN_WIDTH - 1], 1);
        assert_eq!(display.toggle(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1), true);
        assert_eq!(display.fb[SCREEN_HEIGHT - 1][SCREEN_WIDTH - 1], 0);
        assert_eq!(display.toggle(0, 0), false);
        assert_eq!(display.fb[0][0], 1);
        assert_eq!(display.toggle(SCREEN_WIDTH, SCREEN_HEIGHT), true);
        assert_eq!(display.fb[0][0], 0);
    }

    #[test]
    fn test_draw_sprite_wraps() {
        let mut display = Display::new();
        let collision = display.draw_sprite(SCREEN_WIDTH - 4, SCREEN_HEIGHT - 1, &[0xFF, 0x80]);
        assert_eq!(collision, false);
        assert!(display.is_set(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1));
        assert!(display.is_set(3, SCREEN_HEIGHT - 1));
        assert!(!display.is_set(4, SCREEN_HEIGHT - 1));
        assert!(display.is_set(SCREEN_WIDTH - 4, 0));
    }

    #[test]
    fn test_draw_sprite_collision() {
        let mut display = Display::new();
        assert_eq!(display.draw_sprite(10, 10, &[0b1100_0000]), false);
        assert_eq!(display.draw_sprite(11, 10, &[0b1000_0000]), true);
        assert!(display.is_set(10, 10));
        assert!(!display.is_set(11, 10));
    }

    #[test]
    fn test_render_text() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0b1100_0001]);
        let text = display.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, format!("██     █{}", " ".repeat(SCREEN_WIDTH - 8)));
        assert_eq!(text.lines().count(), SCREEN_HEIGHT);
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xFF; 4]);
        display.take_fb();
        assert!(!display.dirty);
        display.clear();
        assert!(display.dirty);
        assert!(display.fb.iter().flatten().all(|&cell| cell == 0));
    }
}
