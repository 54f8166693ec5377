use rayon::prelude::*;

use crate::core::data::fractal_field::FractalField;
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::core::fractals::mandelbrot::colour_schemes::{ColourScheme, normalised_iteration};

/// Maps every pixel's iteration count to RGBA8 under `scheme`.
///
/// Pure: the same field, denominator and scheme always give the same bytes.
#[must_use]
pub fn render_colours(
    field: &FractalField,
    current_iteration: u64,
    scheme: ColourScheme,
) -> PixelBuffer {
    let mut pixels = PixelBuffer::new(field.width(), field.height());

    pixels
        .buffer_mut()
        .par_chunks_mut(BYTES_PER_PIXEL)
        .zip(field.iterations().par_iter())
        .for_each(|(pixel, &iterations)| {
            let t = normalised_iteration(iterations, current_iteration);
            pixel.copy_from_slice(&scheme.colour(t).to_rgba());
        });

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::advance_field::advance_field;
    use crate::core::fractals::mandelbrot::params::EngineSettings;

    fn advanced_field() -> FractalField {
        let mut field = FractalField::new(4, 4, 2.0, 2.0, 1.0).unwrap();
        advance_field(&mut field, 10, &EngineSettings::default());
        field
    }

    #[test]
    fn test_output_is_exactly_width_height_four() {
        let field = FractalField::new(7, 3, 3.5, 1.5, 2.0).unwrap();

        let pixels = render_colours(&field, 0, ColourScheme::Rgb);

        assert_eq!(pixels.buffer_size(), 7 * 3 * 4);
        assert_eq!(pixels.width(), 7);
        assert_eq!(pixels.height(), 3);
    }

    #[test]
    fn test_unadvanced_field_renders_black_grayscale() {
        let field = FractalField::new(3, 2, 1.5, 1.0, 1.0).unwrap();

        let pixels = render_colours(&field, 0, ColourScheme::Grayscale);

        for pixel in pixels.buffer().chunks(4) {
            assert_eq!(pixel, [0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_grayscale_uses_iteration_ratio() {
        let field = advanced_field();

        let pixels = render_colours(&field, 10, ColourScheme::Grayscale);

        // n = 10 of 10 -> white, n = 0 -> black, n = 2 -> round(0.2 * 255)
        assert_eq!(pixels.pixel(2, 1).unwrap(), [255, 255, 255, 255]);
        assert_eq!(pixels.pixel(0, 0).unwrap(), [0, 0, 0, 255]);
        assert_eq!(pixels.pixel(1, 1).unwrap(), [51, 51, 51, 255]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let field = advanced_field();

        for &scheme in ColourScheme::ALL {
            let first = render_colours(&field, 10, scheme);
            let second = render_colours(&field, 10, scheme);

            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_alpha_is_always_opaque() {
        let field = advanced_field();

        for &scheme in ColourScheme::ALL {
            let pixels = render_colours(&field, 10, scheme);
            assert!(pixels.buffer().chunks(4).all(|pixel| pixel[3] == 255));
        }
    }

    #[test]
    fn test_rgb_bounded_pixels_wrap_to_red() {
        let field = advanced_field();

        let pixels = render_colours(&field, 10, ColourScheme::Rgb);

        // t = 1 is hue 360, the same as hue 0
        assert_eq!(pixels.pixel(0, 2).unwrap(), [255, 0, 0, 255]);
    }
}
