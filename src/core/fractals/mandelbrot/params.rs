use crate::core::data::band::Band;
use crate::core::data::coord_system::CoordSystem;
use crate::core::data::fractal_field::FieldGeometry;
use crate::core::fractals::mandelbrot::colour_schemes::ColourScheme;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;

pub const DEFAULT_ESCAPE_RADIUS_SQUARED: f64 = 4.0;
pub const DEFAULT_ITERATIONS_PER_TICK: u32 = 10;

/// When the escape test runs.
///
/// `PerIteration` records the exact count of bounded iterations. `PerBatch`
/// tests only at the start of each `advance` call and credits the whole
/// batch to every pixel still bounded then, so a pixel escaping inside a
/// batch is overcounted by up to `batch_size - 1` iterations. It is cheaper but
/// its counts depend on how the work was batched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapePolicy {
    #[default]
    PerIteration,
    PerBatch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub escape_radius_squared: f64,
    pub escape_policy: EscapePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            escape_radius_squared: DEFAULT_ESCAPE_RADIUS_SQUARED,
            escape_policy: EscapePolicy::default(),
        }
    }
}

impl EngineSettings {
    pub fn new(
        escape_radius_squared: f64,
        escape_policy: EscapePolicy,
    ) -> Result<Self, MandelbrotError> {
        let settings = Self {
            escape_radius_squared,
            escape_policy,
        };
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), MandelbrotError> {
        if !(self.escape_radius_squared.is_finite() && self.escape_radius_squared > 0.0) {
            return Err(MandelbrotError::InvalidEscapeRadius(
                self.escape_radius_squared,
            ));
        }

        Ok(())
    }
}

/// Everything needed to (re)start a render of one field: the payload of a
/// tile `start` command, or of a whole view before it is split into bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub geometry: FieldGeometry,
    pub iterations_per_tick: u32,
    pub colour_scheme: ColourScheme,
    /// Iteration cap; `0` means unbounded.
    pub max_iterations: u64,
    pub settings: EngineSettings,
}

impl RenderParams {
    #[must_use]
    pub fn for_view(width: u32, height: u32, coords: &CoordSystem) -> Self {
        Self {
            geometry: FieldGeometry::from_coord_system(width, height, coords),
            iterations_per_tick: DEFAULT_ITERATIONS_PER_TICK,
            colour_scheme: ColourScheme::default(),
            max_iterations: 0,
            settings: EngineSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), MandelbrotError> {
        if self.iterations_per_tick == 0 {
            return Err(MandelbrotError::ZeroIterationsPerTick);
        }
        self.settings.validate()?;
        self.geometry.validate()?;

        Ok(())
    }

    #[must_use]
    pub fn for_band(&self, band: &Band) -> Self {
        Self {
            geometry: band.geometry(&self.geometry),
            ..*self
        }
    }

    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.max_iterations > 0
    }
}
