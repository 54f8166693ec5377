//! Per-pixel iteration state for one band of the image.
//!
//! Storage is structure-of-arrays: each component lives in its own flat,
//! row-major `Vec` so the lane kernel can walk neighbouring pixels together.

use crate::core::data::complex::Complex;
use crate::core::data::coord_system::CoordSystem;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("field of {width}x{height} pixels does not fit in memory")]
    TooLarge { width: u32, height: u32 },
    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("origin must be finite, got ({x}, {y})")]
    InvalidOrigin { x: f64, y: f64 },
}

/// Where a field sits in the complex plane.
///
/// `origin_x`/`origin_y` are the pixel position of `0 + 0i` in the *full*
/// canvas; `row_offset` is the canvas row of this field's first row. Keeping
/// the canvas origin and offsetting the row index (instead of shifting the
/// origin by a float subtraction) makes a band's `c` values bit-identical to
/// the same rows of an unsplit field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldGeometry {
    pub width: u32,
    pub height: u32,
    pub row_offset: u32,
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale: f64,
}

impl FieldGeometry {
    #[must_use]
    pub fn from_coord_system(width: u32, height: u32, coords: &CoordSystem) -> Self {
        Self {
            width,
            height,
            row_offset: 0,
            origin_x: coords.x(),
            origin_y: coords.y(),
            scale: coords.scale(),
        }
    }

    /// The sub-geometry covering canvas rows `top..top + rows`.
    #[must_use]
    pub fn band(&self, top: u32, rows: u32) -> Self {
        Self {
            height: rows,
            row_offset: self.row_offset + top,
            ..*self
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.width == 0 || self.height == 0 {
            return Err(FieldError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(FieldError::InvalidScale(self.scale));
        }
        if !(self.origin_x.is_finite() && self.origin_y.is_finite()) {
            return Err(FieldError::InvalidOrigin {
                x: self.origin_x,
                y: self.origin_y,
            });
        }

        self.pixel_count().map(|_| ())
    }

    /// Pixel count, refusing sizes whose RGBA buffer would overflow `usize`.
    pub fn pixel_count(&self) -> Result<usize, FieldError> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .filter(|pixels| pixels.checked_mul(4).is_some())
            .ok_or(FieldError::TooLarge {
                width: self.width,
                height: self.height,
            })
    }

    #[must_use]
    pub fn to_complex(&self, x: u32, y: u32) -> Complex {
        Complex {
            real: (f64::from(x) - self.origin_x) / self.scale,
            imag: (f64::from(self.row_offset + y) - self.origin_y) / self.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FractalField {
    geometry: FieldGeometry,
    c_real: Vec<f64>,
    c_imag: Vec<f64>,
    z_real: Vec<f64>,
    z_imag: Vec<f64>,
    iterations: Vec<u64>,
}

/// Mutable column view handed to the lane kernel.
pub(crate) struct FieldColumnsMut<'a> {
    pub c_real: &'a [f64],
    pub c_imag: &'a [f64],
    pub z_real: &'a mut [f64],
    pub z_imag: &'a mut [f64],
    pub iterations: &'a mut [u64],
}

impl FractalField {
    pub fn new(
        width: u32,
        height: u32,
        origin_x: f64,
        origin_y: f64,
        scale: f64,
    ) -> Result<Self, FieldError> {
        Self::with_geometry(FieldGeometry {
            width,
            height,
            row_offset: 0,
            origin_x,
            origin_y,
            scale,
        })
    }

    pub fn with_geometry(geometry: FieldGeometry) -> Result<Self, FieldError> {
        geometry.validate()?;
        let pixels = geometry.pixel_count()?;

        let mut c_real = Vec::with_capacity(pixels);
        let mut c_imag = Vec::with_capacity(pixels);

        for y in 0..geometry.height {
            for x in 0..geometry.width {
                let c = geometry.to_complex(x, y);
                c_real.push(c.real);
                c_imag.push(c.imag);
            }
        }

        Ok(Self {
            geometry,
            c_real,
            c_imag,
            z_real: vec![0.0; pixels],
            z_imag: vec![0.0; pixels],
            iterations: vec![0; pixels],
        })
    }

    #[must_use]
    pub fn geometry(&self) -> FieldGeometry {
        self.geometry
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    #[must_use]
    pub fn c(&self, index: usize) -> Complex {
        Complex::new(self.c_real[index], self.c_imag[index])
    }

    #[must_use]
    pub fn z(&self, index: usize) -> Complex {
        Complex::new(self.z_real[index], self.z_imag[index])
    }

    #[must_use]
    pub fn iterations(&self) -> &[u64] {
        &self.iterations
    }

    /// A pixel has escaped once `|z|²` is past the threshold. NaN counts as
    /// escaped so an orbit that overflowed in coarse mode stays frozen.
    #[must_use]
    pub fn is_escaped(&self, index: usize, escape_radius_squared: f64) -> bool {
        let magnitude = self.z(index).magnitude_squared();
        !(magnitude <= escape_radius_squared)
    }

    #[must_use]
    pub fn escaped_count(&self, escape_radius_squared: f64) -> usize {
        (0..self.len())
            .filter(|&index| self.is_escaped(index, escape_radius_squared))
            .count()
    }

    pub(crate) fn columns_mut(&mut self) -> FieldColumnsMut<'_> {
        FieldColumnsMut {
            c_real: &self.c_real,
            c_imag: &self.c_imag,
            z_real: &mut self.z_real,
            z_imag: &mut self.z_imag,
            iterations: &mut self.iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_computes_c_row_major() {
        let field = FractalField::new(3, 2, 1.0, 1.0, 2.0).unwrap();

        assert_eq!(field.len(), 6);
        assert_eq!(field.c(0), Complex::new(-0.5, -0.5));
        assert_eq!(field.c(1), Complex::new(0.0, -0.5));
        assert_eq!(field.c(2), Complex::new(0.5, -0.5));
        assert_eq!(field.c(3), Complex::new(-0.5, 0.0));
        assert_eq!(field.c(5), Complex::new(0.5, 0.0));
    }

    #[test]
    fn test_new_starts_at_zero() {
        let field = FractalField::new(4, 4, 2.0, 2.0, 1.0).unwrap();

        assert!((0..field.len()).all(|i| field.z(i) == Complex::ZERO));
        assert!(field.iterations().iter().all(|&n| n == 0));
        assert_eq!(field.escaped_count(4.0), 0);
    }

    #[test]
    fn test_new_is_deterministic() {
        let a = FractalField::new(7, 5, 3.3, 2.1, 1.7).unwrap();
        let b = FractalField::new(7, 5, 3.3, 2.1, 1.7).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            FractalField::new(0, 4, 0.0, 0.0, 1.0),
            Err(FieldError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            FractalField::new(4, 0, 0.0, 0.0, 1.0),
            Err(FieldError::InvalidDimensions {
                width: 4,
                height: 0
            })
        );
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        assert_eq!(
            FractalField::new(4, 4, 0.0, 0.0, 0.0),
            Err(FieldError::InvalidScale(0.0))
        );
        assert_eq!(
            FractalField::new(4, 4, 0.0, 0.0, -1.0),
            Err(FieldError::InvalidScale(-1.0))
        );
    }

    #[test]
    fn test_rejects_non_finite_origin() {
        assert!(matches!(
            FractalField::new(4, 4, f64::NAN, 0.0, 1.0),
            Err(FieldError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_band_geometry_reproduces_full_field_rows() {
        let full = FieldGeometry {
            width: 5,
            height: 7,
            row_offset: 0,
            origin_x: 2.3,
            origin_y: 3.7,
            scale: 1.9,
        };
        let full_field = FractalField::with_geometry(full).unwrap();
        let band_field = FractalField::with_geometry(full.band(4, 3)).unwrap();

        for index in 0..band_field.len() {
            assert_eq!(band_field.c(index), full_field.c(4 * 5 + index));
        }
    }

    #[test]
    fn test_from_coord_system_matches_forward_mapping() {
        let coords = CoordSystem::new(8.0, 4.0, 4.0).unwrap();
        let geometry = FieldGeometry::from_coord_system(16, 8, &coords);
        let field = FractalField::with_geometry(geometry).unwrap();

        assert_eq!(field.c(3 * 16 + 10), coords.from_viewport(10.0, 3.0));
    }

    #[test]
    fn test_nan_magnitude_counts_as_escaped() {
        let mut field = FractalField::new(1, 1, 0.0, 0.0, 1.0).unwrap();
        field.columns_mut().z_real[0] = f64::NAN;

        assert!(field.is_escaped(0, 4.0));
    }
}
