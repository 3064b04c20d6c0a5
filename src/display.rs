pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

pub const fn from_u8_rgb(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

/// Colours used when turning the bit plane into pixels (0RGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: u32,
    pub background: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: from_u8_rgb(255, 255, 255),
            background: from_u8_rgb(0, 0, 0),
        }
    }
}

/// 64x32 monochrome plane. Only CLS and a machine reset clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bit_buffer: [bool; WIDTH * HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [false; WIDTH * HEIGHT],
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer = [false; WIDTH * HEIGHT];
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[(y % HEIGHT) * WIDTH + (x % WIDTH)]
    }

    pub fn is_blank(&self) -> bool {
        self.bit_buffer.iter().all(|bit| !bit)
    }

    /// XOR `sprite` onto the plane, one byte per row, MSB leftmost.
    /// Coordinates wrap on both axes. Returns true when a lit pixel was switched off.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (i, row) in sprite.iter().enumerate() {
            let ny = (y as usize + i) % HEIGHT;
            for j in 0..8 {
                if (row >> (7 - j)) & 1 == 0 {
                    continue;
                }
                let nx = (x as usize + j) % WIDTH;
                let index = ny * WIDTH + nx;
                if self.bit_buffer[index] {
                    collision = true;
                }
                self.bit_buffer[index] ^= true;
            }
        }
        collision
    }

    pub fn render(&self, palette: &Palette) -> Vec<u32> {
        self.bit_buffer
            .iter()
            .map(|&bit| {
                if bit {
                    palette.foreground
                } else {
                    palette.background
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_twice_erases_and_collides() {
        let mut fb = FrameBuffer::new();
        let sprite = [0xF0, 0x90, 0xF0];
        assert!(!fb.paint(10, 5, &sprite));
        assert!(fb.pixel(10, 5));
        assert!(!fb.pixel(11, 6));
        assert!(fb.pixel(13, 6));
        assert!(fb.paint(10, 5, &sprite));
        assert!(fb.is_blank());
    }

    #[test]
    fn sprite_wraps_horizontally() {
        let mut fb = FrameBuffer::new();
        fb.paint(60, 0, &[0xFF]);
        for x in (60..64).chain(0..4) {
            assert!(fb.pixel(x, 0), "column {x}");
        }
        for x in 4..60 {
            assert!(!fb.pixel(x, 0), "column {x}");
        }
    }

    #[test]
    fn sprite_wraps_vertically() {
        let mut fb = FrameBuffer::new();
        fb.paint(0, 30, &[0x80, 0x80, 0x80, 0x80]);
        assert!(fb.pixel(0, 30));
        assert!(fb.pixel(0, 31));
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(0, 1));
        assert!(!fb.pixel(0, 2));
    }

    #[test]
    fn coordinates_past_the_edge_wrap() {
        let mut fb = FrameBuffer::new();
        fb.paint(70, 40, &[0x80]);
        assert!(fb.pixel(6, 8));
    }

    #[test]
    fn collision_only_on_lit_to_unlit() {
        let mut fb = FrameBuffer::new();
        fb.paint(0, 0, &[0x0F]);
        assert!(!fb.paint(0, 0, &[0xF0]));
        assert!(fb.paint(0, 0, &[0x01]));
        assert!(!fb.pixel(7, 0));
    }

    #[test]
    fn render_uses_palette() {
        let mut fb = FrameBuffer::new();
        fb.paint(1, 0, &[0x80]);
        let palette = Palette {
            foreground: from_u8_rgb(0, 127, 255),
            background: from_u8_rgb(1, 2, 3),
        };
        let pixels = fb.render(&palette);
        assert_eq!(pixels.len(), WIDTH * HEIGHT);
        assert_eq!(pixels[0], 0x010203);
        assert_eq!(pixels[1], 0x007FFF);
    }

    #[test]
    fn clear_blanks_plane() {
        let mut fb = FrameBuffer::new();
        fb.paint(3, 3, &[0xFF, 0xFF]);
        fb.clear_buffer();
        assert!(fb.is_blank());
    }
}
