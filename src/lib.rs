pub mod adapters;
pub mod controllers;
pub mod core;
pub mod presenters;
pub mod telemetry;

pub use controllers::cli::headless::{HeadlessController, RenderJob, RenderMode, RenderReport};
pub use controllers::tiled::{CoordinatorConfig, Progress, TileCoordinator};
pub use core::actions::render_bands_rayon::render_bands_rayon;
pub use core::data::complex::Complex;
pub use core::data::coord_system::{CoordSystem, suggested_iterations_per_tick};
pub use core::fractals::mandelbrot::colour_schemes::ColourScheme;
pub use core::fractals::mandelbrot::engine::MandelbrotEngine;
pub use core::fractals::mandelbrot::params::{EngineSettings, EscapePolicy, RenderParams};
pub use presenters::file::ppm::PpmFilePresenter;
