#[cfg(test)]
pub mod testing {
    use core::fmt;
    use core::ops::RangeBounds;

    #[cfg(feature = "embedded-graphics")]
    use embedded_graphics::{drawable::Pixel, pixelcolor::BinaryColor};

    use crate::frame::{FrameView, HEIGHT, WIDTH};

    /// Compare only the given window of two masks
    #[macro_export]
    macro_rules! assert_eq_2d {
        (x_range: $xrange:expr, y_range: $yrange:expr; $lhs:expr, $rhs:expr $(,)?) => {{
            let mut lhs_mask = crate::utils::testing::ImageMask::new();
            let mut rhs_mask = crate::utils::testing::ImageMask::new();
            lhs_mask.set_slice($xrange, $yrange, &$lhs);
            rhs_mask.set_slice($xrange, $yrange, &$rhs);
            assert_eq!(lhs_mask, rhs_mask);
        }};
    }

    /// Frame decoded into plain booleans, printed as a box of `#` in assertions
    #[derive(Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ImageMask([[bool; WIDTH]; HEIGHT]);

    impl ImageMask {
        pub fn new() -> Self {
            Self([[false; WIDTH]; HEIGHT])
        }

        /// Move the whole picture right and down, dropping what falls off
        pub fn offset(self, xoffset: usize, yoffset: usize) -> Self {
            let mut moved = Self::new();
            for (y, row) in self.0.iter().enumerate() {
                for (x, pixel) in row.iter().enumerate() {
                    if y + yoffset < HEIGHT && x + xoffset < WIDTH {
                        moved.0[y + yoffset][x + xoffset] = *pixel;
                    }
                }
            }
            moved
        }

        pub fn set_slice<T>(&mut self, range_x: T, range_y: T, other: &Self)
        where
            T: RangeBounds<usize>,
        {
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    if range_x.contains(&x) && range_y.contains(&y) {
                        self.0[y][x] = other.0[y][x];
                    }
                }
            }
        }
    }

    impl fmt::Debug for ImageMask {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let width = WIDTH + 2;
            writeln!(f)?;
            for _ in 0..width {
                write!(f, "-")?;
            }
            writeln!(f)?;
            for row in &self.0 {
                write!(f, "|")?;
                for &p in row.iter() {
                    write!(f, "{}", if p { '#' } else { ' ' })?;
                }
                writeln!(f, "|")?;
            }
            for _ in 0..width {
                write!(f, "-")?;
            }
            Ok(())
        }
    }

    pub trait ToMask {
        fn to_mask(&self) -> ImageMask;
    }

    /// Whitespace separated rows of `#` (lit) and anything else (dark),
    /// missing rows and columns stay dark
    impl ToMask for str {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            mask.0
                .iter_mut()
                .zip(self.split_whitespace())
                .for_each(|(m_row, c_row)| {
                    m_row
                        .iter_mut()
                        .zip(c_row.chars())
                        .for_each(|(m, c)| *m = c == '#')
                });
            mask
        }
    }

    #[cfg(feature = "embedded-graphics")]
    impl<I> ToMask for I
    where
        I: Iterator<Item = Pixel<BinaryColor>> + Clone,
    {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            self.clone().for_each(|Pixel(point, color)| {
                if color == BinaryColor::On {
                    mask.0[point.y as usize][point.x as usize] = true;
                }
            });
            mask
        }
    }

    impl ToMask for FrameView<'_> {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            self.iter_rows_as_bitslices()
                .zip(mask.0.iter_mut())
                .for_each(|(f_row, m_row)| {
                    m_row
                        .iter_mut()
                        .zip(f_row.iter())
                        .for_each(|(m, &f)| *m = f)
                });
            mask
        }
    }

    mod tests {
        use super::*;
        use crate::frame::Frame;

        #[test]
        fn str_to_mask() {
            let mut frame = Frame::new();
            frame.xor_bit(0, 0, true).unwrap();
            frame.xor_bit(2, 1, true).unwrap();
            assert_eq!(frame.view().to_mask(), "#.. ..#".to_mask());
            assert_eq!(Frame::new().view().to_mask(), ImageMask::new());
        }

        #[test]
        fn offset_mask() {
            let moved = "## #.".to_mask().offset(62, 30);
            assert_eq!(moved.0[30][62..], [true, true]);
            assert_eq!(moved.0[31][62..], [true, false]);
            assert_eq!("#".to_mask().offset(WIDTH, 0), ImageMask::new());
        }

        #[test]
        fn compare_window() {
            let lhs = "#.# ...".to_mask();
            let rhs = "#.. ...".to_mask();
            assert_eq_2d!(x_range: 0..2, y_range: 0..2; lhs, rhs);
        }

        #[cfg(feature = "embedded-graphics")]
        #[test]
        fn raw_image_to_mask() {
            use embedded_graphics::image::IntoPixelIter;

            let mut frame = Frame::new();
            frame.xor_bit(5, 7, true).unwrap();
            frame.xor_bit(63, 31, true).unwrap();
            let view = frame.view();
            let image = view.as_raw_image();

            assert_eq!(image.pixel_iter().to_mask(), view.to_mask());
        }
    }
}
