//! Monochrome 64x32 display memory.
//!
//! Pixel `(x, y)` lives at bit `x + 64 * y` of 256 bytes, most significant
//! bit first, so a row is 8 consecutive bytes and the buffer can be handed to
//! `embedded-graphics` as is.

use core::fmt;

use bitvec::prelude::*;
#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

const ROW_BYTES: usize = WIDTH / 8;

/// Pixel coordinates outside of the 64x32 display
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameError {
    pub x: usize,
    pub y: usize,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pixel ({}, {}) is off screen", self.x, self.y)
    }
}

#[inline]
fn bit_index(x: usize, y: usize) -> Option<usize> {
    if x < WIDTH && y < HEIGHT {
        Some(x + WIDTH * y)
    } else {
        None
    }
}

/// Owned display memory
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0.iter_mut().for_each(|byte| *byte = 0);
    }

    /// Flip pixel when `val` is set, returning whether it was lit before
    pub(crate) fn xor_bit(&mut self, x: usize, y: usize, val: bool) -> Result<bool, FrameError> {
        let index = bit_index(x, y).ok_or(FrameError { x, y })?;
        let bits = self.0[..].view_bits_mut::<Msb0>();
        let previous = bits[index];
        bits.set(index, previous ^ val);
        Ok(previous)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only window into the display memory of a running machine
///
/// The same pixels can be taken as raw bytes, per row bit slices, plain
/// booleans (optionally scaled up) or text.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    pub fn as_raw(&self) -> &'a [u8] {
        self.0
    }

    /// Detach pixels from the machine, e.g. to compare frames over time
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// `None` for coordinates off screen
    pub fn get_bit(&self, x: usize, y: usize) -> Option<&'a bool> {
        let index = bit_index(x, y)?;
        self.bits().get(index)
    }

    pub fn lit_pixels(&self) -> usize {
        self.bits().count_ones()
    }

    /// Rows from top to bottom
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        let bytes: &'a [u8] = self.0;
        bytes.chunks(ROW_BYTES).map(|row| row.view_bits::<Msb0>())
    }

    /// Rows of pixels with every pixel repeated `scale` times in both directions
    pub fn iter_pixelwise_scaled(
        &self,
        scale: usize,
    ) -> impl Iterator<Item = impl Iterator<Item = &'a bool>> {
        self.iter_rows_as_bitslices()
            .flat_map(move |row| core::iter::repeat(row).take(scale))
            .map(move |row| {
                row.iter()
                    .flat_map(move |pixel| core::iter::repeat(pixel).take(scale))
            })
    }

    fn bits(&self) -> &'a BitSlice<Msb0, u8> {
        let bytes: &'a [u8] = self.0;
        bytes.view_bits::<Msb0>()
    }

    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'a, BinaryColor> {
        ImageRaw::new(self.0, WIDTH as u32, HEIGHT as u32)
    }
}

/// Rows of `#` (lit) and `.` (dark), each terminated by a newline
impl fmt::Display for FrameView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows_as_bitslices() {
            for pixel in row.iter() {
                f.write_str(if *pixel { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::{consts::U4096, String};

    #[test]
    fn blank_on_creation() {
        let frame = Frame::new();
        assert_eq!(frame.view().lit_pixels(), 0);
        assert!(frame.view().as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn off_screen_reads() {
        let frame = Frame::new();
        assert_eq!(frame.view().get_bit(WIDTH - 1, HEIGHT - 1), Some(&false));
        assert_eq!(frame.view().get_bit(WIDTH, 0), None);
        assert_eq!(frame.view().get_bit(0, HEIGHT), None);
    }

    #[test]
    fn xor_reports_previous_state() {
        let mut frame = Frame::new();
        let flips = [
            (false, Ok(false), false),
            (true, Ok(false), true),
            (false, Ok(true), true),
            (true, Ok(true), false),
        ];
        for &(val, previous, lit) in flips.iter() {
            assert_eq!(frame.xor_bit(7, 3, val), previous);
            assert_eq!(frame.view().get_bit(7, 3), Some(&lit));
        }
    }

    #[test]
    fn xor_off_screen() {
        let mut frame = Frame::new();
        assert_eq!(frame.xor_bit(WIDTH, 0, true), Err(FrameError { x: WIDTH, y: 0 }));
        assert_eq!(frame.xor_bit(0, HEIGHT, true), Err(FrameError { x: 0, y: HEIGHT }));
        assert_eq!(frame.view().lit_pixels(), 0);
    }

    #[test]
    fn bit_layout_is_row_major() {
        let mut frame = Frame::new();
        frame.xor_bit(0, 0, true).unwrap();
        frame.xor_bit(9, 1, true).unwrap();
        assert_eq!(frame.view().as_raw()[0], 0b1000_0000);
        // bit 73 -> byte 9, second most significant bit
        assert_eq!(frame.view().as_raw()[9], 0b0100_0000);
        let rows: usize = frame.view().iter_rows_as_bitslices().count();
        assert_eq!(rows, HEIGHT);
    }

    #[test]
    fn clear() {
        let mut frame = Frame::new();
        frame.xor_bit(3, 4, true).unwrap();
        frame.xor_bit(63, 31, true).unwrap();
        assert_eq!(frame.view().lit_pixels(), 2);
        frame.clear();
        assert_eq!(frame, Frame::new());
    }

    #[test]
    fn scaled_iteration() {
        let mut frame = Frame::new();
        frame.xor_bit(1, 0, true).unwrap();
        let view = frame.view();

        let mut rows = view.iter_pixelwise_scaled(3);
        for _ in 0..3 {
            let row = rows.next().unwrap();
            let mut pixels = [false; 8];
            row.zip(pixels.iter_mut()).for_each(|(&p, out)| *out = p);
            assert_eq!(pixels, [false, false, false, true, true, true, false, false]);
        }
        let next = rows.next().unwrap();
        assert_eq!(next.count(), WIDTH * 3);
        assert_eq!(rows.count(), HEIGHT * 3 - 4);
    }

    #[test]
    fn text_rendering() {
        let mut frame = Frame::new();
        frame.xor_bit(0, 0, true).unwrap();
        frame.xor_bit(2, 1, true).unwrap();
        let mut text: String<U4096> = String::new();
        write!(text, "{}", frame.view()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().map(|l| &l[..4]), Some("#..."));
        assert_eq!(lines.next().map(|l| &l[..4]), Some("..#."));
        assert_eq!(text.len(), (WIDTH + 1) * HEIGHT);
    }

    #[test]
    fn copy_is_detached() {
        let mut frame = Frame::new();
        let copy = frame.view().copy_frame();
        frame.xor_bit(1, 1, true).unwrap();
        assert_ne!(copy, frame);
    }
}
