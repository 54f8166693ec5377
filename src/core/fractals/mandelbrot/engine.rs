use crate::core::actions::advance_field::advance_field;
use crate::core::actions::render_colours::render_colours;
use crate::core::data::fractal_field::{FieldGeometry, FractalField};
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::fractals::mandelbrot::colour_schemes::ColourScheme;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;
use crate::core::fractals::mandelbrot::params::{EngineSettings, RenderParams};

/// One field plus the number of iterations issued against it.
///
/// `current_iteration` is what colour normalisation divides by: it grows by
/// the full batch on every `advance`, whether or not any pixel moved.
#[derive(Debug, Clone, PartialEq)]
pub struct MandelbrotEngine {
    field: FractalField,
    current_iteration: u64,
    settings: EngineSettings,
}

impl MandelbrotEngine {
    pub fn new(
        geometry: FieldGeometry,
        settings: EngineSettings,
    ) -> Result<Self, MandelbrotError> {
        settings.validate()?;

        Ok(Self {
            field: FractalField::with_geometry(geometry)?,
            current_iteration: 0,
            settings,
        })
    }

    pub fn from_params(params: &RenderParams) -> Result<Self, MandelbrotError> {
        params.validate()?;
        Self::new(params.geometry, params.settings)
    }

    /// Replaces the field wholesale. The only way back to `n = 0`.
    pub fn reset(
        &mut self,
        geometry: FieldGeometry,
        settings: EngineSettings,
    ) -> Result<(), MandelbrotError> {
        *self = Self::new(geometry, settings)?;
        Ok(())
    }

    /// Runs one batch and returns the number of pixels still bounded.
    pub fn advance(&mut self, batch_size: u32) -> usize {
        let bounded = advance_field(&mut self.field, batch_size, &self.settings);
        self.current_iteration = self.current_iteration.saturating_add(u64::from(batch_size));

        bounded
    }

    /// Like [`advance`](Self::advance), but never lets `current_iteration`
    /// pass `max_iterations` (`0` means no cap). Returns the batch actually
    /// run, which is `0` once the cap is reached.
    pub fn advance_capped(&mut self, batch_size: u32, max_iterations: u64) -> u32 {
        let batch = if max_iterations == 0 {
            batch_size
        } else {
            let remaining = max_iterations.saturating_sub(self.current_iteration);
            u32::try_from(remaining).map_or(batch_size, |remaining| remaining.min(batch_size))
        };

        if batch > 0 {
            self.advance(batch);
        }

        batch
    }

    #[must_use]
    pub fn is_complete(&self, max_iterations: u64) -> bool {
        max_iterations > 0 && self.current_iteration >= max_iterations
    }

    #[must_use]
    pub fn render(&self, scheme: ColourScheme) -> PixelBuffer {
        render_colours(&self.field, self.current_iteration, scheme)
    }

    #[must_use]
    pub fn current_iteration(&self) -> u64 {
        self.current_iteration
    }

    #[must_use]
    pub fn field(&self) -> &FractalField {
        &self.field
    }

    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::coord_system::CoordSystem;
    use crate::core::data::fractal_field::FieldError;

    fn geometry() -> FieldGeometry {
        FieldGeometry::from_coord_system(24, 16, &CoordSystem::for_canvas(24, 16).unwrap())
    }

    #[test]
    fn test_new_starts_at_iteration_zero() {
        let engine = MandelbrotEngine::new(geometry(), EngineSettings::default()).unwrap();

        assert_eq!(engine.current_iteration(), 0);
        assert!(engine.field().iterations().iter().all(|&n| n == 0));
    }

    #[test]
    fn test_new_rejects_invalid_geometry() {
        let mut geometry = geometry();
        geometry.height = 0;

        assert_eq!(
            MandelbrotEngine::new(geometry, EngineSettings::default()),
            Err(MandelbrotError::Field(FieldError::InvalidDimensions {
                width: 24,
                height: 0
            }))
        );
    }

    #[test]
    fn test_advance_counts_full_batch_even_when_nothing_moves() {
        let geometry = FieldGeometry {
            width: 2,
            height: 2,
            row_offset: 0,
            origin_x: -20.0,
            origin_y: -20.0,
            scale: 1.0,
        };
        let mut engine = MandelbrotEngine::new(geometry, EngineSettings::default()).unwrap();

        engine.advance(5);
        let bounded = engine.advance(7);

        assert_eq!(bounded, 0);
        assert_eq!(engine.current_iteration(), 12);
    }

    #[test]
    fn test_restart_matches_fresh_engine() {
        let settings = EngineSettings::default();
        let mut engine = MandelbrotEngine::new(geometry(), settings).unwrap();
        for _ in 0..6 {
            engine.advance(5);
        }

        engine.reset(geometry(), settings).unwrap();
        engine.advance(10);

        let mut fresh = MandelbrotEngine::new(geometry(), settings).unwrap();
        fresh.advance(10);

        assert_eq!(engine, fresh);
        assert_eq!(
            engine.render(ColourScheme::Rgb),
            fresh.render(ColourScheme::Rgb)
        );
    }

    #[test]
    fn test_advance_capped_clamps_final_batch() {
        let mut engine = MandelbrotEngine::new(geometry(), EngineSettings::default()).unwrap();

        assert_eq!(engine.advance_capped(10, 25), 10);
        assert_eq!(engine.advance_capped(10, 25), 10);
        assert!(!engine.is_complete(25));
        assert_eq!(engine.advance_capped(10, 25), 5);
        assert_eq!(engine.current_iteration(), 25);
        assert!(engine.is_complete(25));
        assert_eq!(engine.advance_capped(10, 25), 0);
        assert_eq!(engine.current_iteration(), 25);
    }

    #[test]
    fn test_advance_capped_without_cap_runs_full_batch() {
        let mut engine = MandelbrotEngine::new(geometry(), EngineSettings::default()).unwrap();

        assert_eq!(engine.advance_capped(10, 0), 10);
        assert!(!engine.is_complete(0));
    }

    #[test]
    fn test_capped_run_equals_single_advance() {
        let settings = EngineSettings::default();
        let mut capped = MandelbrotEngine::new(geometry(), settings).unwrap();
        while capped.advance_capped(7, 30) > 0 {}

        let mut single = MandelbrotEngine::new(geometry(), settings).unwrap();
        single.advance(30);

        assert_eq!(capped, single);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut engine = MandelbrotEngine::new(geometry(), EngineSettings::default()).unwrap();
        engine.advance(12);

        let first = engine.render(ColourScheme::GrayscaleSquared);
        let second = engine.render(ColourScheme::GrayscaleSquared);

        assert_eq!(first, second);
        assert_eq!(first.buffer_size(), 24 * 16 * 4);
    }
}
