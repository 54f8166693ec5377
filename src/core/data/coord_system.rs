//! Viewport ↔ complex-plane transform.
//!
//! A `CoordSystem` places the complex origin `0 + 0i` at viewport pixel
//! `(x, y)` and maps `scale` pixels to one unit. Every field computation
//! consumes only the forward mapping; the remaining operations exist for the
//! hosts that pan and zoom a view before restarting a render.

use crate::core::data::complex::Complex;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum CoordSystemError {
    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("origin must be finite, got ({x}, {y})")]
    InvalidOrigin { x: f64, y: f64 },
    #[error("view radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("canvas must be at least 1x1 pixels, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordSystem {
    x: f64,
    y: f64,
    scale: f64,
}

impl CoordSystem {
    pub fn new(x: f64, y: f64, scale: f64) -> Result<Self, CoordSystemError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(CoordSystemError::InvalidOrigin { x, y });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CoordSystemError::InvalidScale(scale));
        }

        Ok(Self { x, y, scale })
    }

    /// The default view for a canvas: origin in the centre, a radius-2 disc
    /// fitting the shorter side.
    pub fn for_canvas(width: u32, height: u32) -> Result<Self, CoordSystemError> {
        if width == 0 || height == 0 {
            return Err(CoordSystemError::InvalidCanvas { width, height });
        }

        Self::new(
            f64::from(width) / 2.0,
            f64::from(height) / 2.0,
            f64::from(width.min(height)) / 4.0,
        )
    }

    /// Builds the view that centres `centre` on the canvas and fits a disc of
    /// `radius` units into the shorter side.
    pub fn from_centre_and_radius(
        width: u32,
        height: u32,
        centre: Complex,
        radius: f64,
    ) -> Result<Self, CoordSystemError> {
        if width == 0 || height == 0 {
            return Err(CoordSystemError::InvalidCanvas { width, height });
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CoordSystemError::InvalidRadius(radius));
        }

        let scale = f64::from(width.min(height)) / 2.0 / radius;
        Self::new(
            f64::from(width) / 2.0 - centre.real * scale,
            f64::from(height) / 2.0 - centre.imag * scale,
            scale,
        )
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn from_viewport(&self, x: f64, y: f64) -> Complex {
        Complex {
            real: (x - self.x) / self.scale,
            imag: (y - self.y) / self.scale,
        }
    }

    #[must_use]
    pub fn to_viewport(&self, point: Complex) -> (f64, f64) {
        (
            point.real * self.scale + self.x,
            point.imag * self.scale + self.y,
        )
    }

    /// Re-expresses a point of this system in `other`.
    #[must_use]
    pub fn from_coord_system(&self, point: Complex, other: &CoordSystem) -> Complex {
        let (x, y) = self.to_viewport(point);
        other.from_viewport(x, y)
    }

    #[must_use]
    pub fn from_viewport_distance(&self, distance: f64) -> f64 {
        distance / self.scale
    }

    #[must_use]
    pub fn distance(a: Complex, b: Complex) -> f64 {
        ((a.real - b.real).powi(2) + (a.imag - b.imag).powi(2)).sqrt()
    }

    #[must_use]
    pub fn distance_in_viewport(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        Self::distance(self.from_viewport(a.0, a.1), self.from_viewport(b.0, b.1))
    }

    pub fn move_origin_relative_to_viewport(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn move_origin_relative_to_self(&mut self, dx: f64, dy: f64) {
        self.x += dx * self.scale;
        self.y += dy * self.scale;
    }

    pub fn scale_by_factor(&mut self, factor: f64) -> Result<(), CoordSystemError> {
        let scale = self.scale * factor;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CoordSystemError::InvalidScale(scale));
        }

        self.scale = scale;
        Ok(())
    }

    /// Zooms by `factor` keeping the complex point under viewport `(x, y)`
    /// fixed.
    pub fn scale_at_viewport_position(
        &mut self,
        factor: f64,
        x: f64,
        y: f64,
    ) -> Result<(), CoordSystemError> {
        let before = self.from_viewport(x, y);
        self.scale_by_factor(factor)?;
        let after = self.from_viewport(x, y);
        self.move_origin_relative_to_self(after.real - before.real, after.imag - before.imag);

        Ok(())
    }

    /// Radius of the largest disc centred on the canvas that stays visible.
    #[must_use]
    pub fn view_radius(&self, width: u32, height: u32) -> f64 {
        self.from_viewport_distance(f64::from(width.min(height))) / 2.0
    }
}

/// Shallow views escape quickly, so they can afford fewer iterations per
/// tick; capped so a single tick never grows long.
#[must_use]
pub fn suggested_iterations_per_tick(radius: f64) -> u32 {
    const MAX_ITERATIONS_PER_TICK: f64 = 30.0;

    if !(radius.is_finite() && radius > 0.0) {
        return 1;
    }

    (1.0 / radius).ceil().clamp(1.0, MAX_ITERATIONS_PER_TICK) as u32
}
