// THEORY:
// The image helper is the boundary between files on disk and the engine's plain
// matrices. It decodes any format the `image` crate understands into 8-bit
// grayscale samples, and it writes the result of a box search back out as an
// RGBA PNG with each box outlined so it can be inspected.

pub mod image_helper {
    use crate::core_modules::matrix::matrix::Matrix;
    use crate::core_modules::region::Region;
    use crate::error::SatResult;
    use image::ImageEncoder;
    use std::io::BufWriter;
    use std::path::Path;

    const CHANNELS: usize = 4;
    const OUTLINE_RGBA: [u8; CHANNELS] = [0, 0, 255, 255];
    const OUTLINE_THICKNESS: usize = 3;

    /// Decodes `path` and converts it to 8-bit luma. Rows follow the image height.
    pub fn load_grayscale(path: impl AsRef<Path>) -> SatResult<Matrix<u8>> {
        let image = image::open(path.as_ref())?.to_luma8();
        Matrix::try_from(&image)
    }

    /// Writes `samples` as a gray RGBA PNG with every region outlined.
    ///
    /// Regions hanging past the image are clipped.
    pub fn save_overlay(
        path: impl AsRef<Path>,
        samples: &Matrix<u8>,
        regions: &[Region],
    ) -> SatResult<()> {
        let (rows, cols) = samples.dimensions();
        let mut buffer = Vec::with_capacity(samples.len() * CHANNELS);
        for &value in samples.as_slice() {
            buffer.extend_from_slice(&[value, value, value, u8::MAX]);
        }
        for region in regions {
            draw_outline(&mut buffer, rows, cols, region);
        }

        let output = std::fs::File::create(path.as_ref())?;
        let encoder = image::codecs::png::PngEncoder::new(BufWriter::new(output));
        encoder.write_image(&buffer, cols as u32, rows as u32, image::ExtendedColorType::Rgba8)?;

        Ok(())
    }

    fn draw_outline(buffer: &mut [u8], rows: usize, cols: usize, region: &Region) {
        let (bottom, right) = region.bottom_right();
        for i in region.top..bottom.min(rows) {
            for j in region.left..right.min(cols) {
                let on_edge = i < region.top + OUTLINE_THICKNESS
                    || i + OUTLINE_THICKNESS >= bottom
                    || j < region.left + OUTLINE_THICKNESS
                    || j + OUTLINE_THICKNESS >= right;
                if on_edge {
                    let start = (i * cols + j) * CHANNELS;
                    buffer[start..start + CHANNELS].copy_from_slice(&OUTLINE_RGBA);
                }
            }
        }
    }
}
