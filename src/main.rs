use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueHint};
use progressive_fractal::core::util::calculate_workers::calculate_default_workers;
use progressive_fractal::{
    ColourScheme, Complex, CoordSystem, CoordinatorConfig, EngineSettings, EscapePolicy,
    HeadlessController, PpmFilePresenter, RenderJob, RenderParams, suggested_iterations_per_tick,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Progressively renders the Mandelbrot set to a PPM file"
)]
struct Cli {
    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Real part of the view centre
    #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
    re: f64,

    /// Imaginary part of the view centre
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    im: f64,

    /// Half the extent of the shorter canvas side, in complex units
    #[arg(long, default_value_t = 1.5)]
    radius: f64,

    /// Tile threads; defaults to the available parallelism
    #[arg(long)]
    workers: Option<NonZeroU32>,

    /// Iterations per tick; defaults to a value suggested by the radius
    #[arg(long)]
    iterations_per_tick: Option<u32>,

    /// Iteration cap; 0 runs until the frame budget is spent
    #[arg(long, default_value_t = 256)]
    max_iterations: u64,

    /// grayscale, grayscale-squared, rgb, rgb-squared or a code 0..=3
    #[arg(long, default_value_t = ColourScheme::Rgb)]
    scheme: ColourScheme,

    #[arg(long, default_value_t = 4.0)]
    escape_radius_squared: f64,

    /// Test for escape once per batch instead of every iteration
    #[arg(long)]
    coarse: bool,

    /// Stop after this many progressive frames
    #[arg(long)]
    frames: Option<u32>,

    /// Milliseconds between progressive frames
    #[arg(long, default_value_t = 100)]
    frame_interval_ms: u64,

    /// Milliseconds a fast tile sleeps per tick when it runs ahead
    #[arg(long, default_value_t = 0)]
    sync_delay_ms: u64,

    /// Render synchronously on the rayon pool instead of on tile threads
    #[arg(long)]
    direct: bool,

    #[arg(long, default_value = "output/mandelbrot.ppm", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

impl Cli {
    fn job(&self) -> Result<RenderJob, Box<dyn std::error::Error>> {
        let coords = CoordSystem::from_centre_and_radius(
            self.width,
            self.height,
            Complex::new(self.re, self.im),
            self.radius,
        )?;
        let policy = if self.coarse {
            EscapePolicy::PerBatch
        } else {
            EscapePolicy::PerIteration
        };

        let mut params = RenderParams::for_view(self.width, self.height, &coords);
        params.iterations_per_tick = self
            .iterations_per_tick
            .unwrap_or_else(|| suggested_iterations_per_tick(self.radius));
        params.max_iterations = self.max_iterations;
        params.colour_scheme = self.scheme;
        params.settings = EngineSettings::new(self.escape_radius_squared, policy)?;
        params.validate()?;

        let workers = self.workers.unwrap_or_else(calculate_default_workers);
        let mut job = if self.direct {
            RenderJob::direct(params, workers)
        } else {
            let mut config = CoordinatorConfig::with_workers(workers);
            config.sync_delay = Duration::from_millis(self.sync_delay_ms);
            RenderJob::tiled(params, config)
        };
        job.frame_interval = Duration::from_millis(self.frame_interval_ms);
        job.frame_budget = self.frames;

        Ok(job)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    progressive_fractal::telemetry::init_tracing();

    let cli = Cli::parse();
    let job = cli.job()?;

    let mut controller = HeadlessController::new(PpmFilePresenter::new());
    controller.generate(&job)?;
    controller.write(&cli.output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use progressive_fractal::RenderMode;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_build_a_bounded_tiled_job() {
        let cli = Cli::parse_from(["progressive_fractal"]);

        let job = cli.job().unwrap();

        assert!(matches!(job.mode, RenderMode::Tiled(_)));
        assert_eq!(job.params.max_iterations, 256);
        assert_eq!(job.params.colour_scheme, ColourScheme::Rgb);
        assert_eq!(job.params.iterations_per_tick, 1);
        assert_eq!(job.params.geometry.width, 800);
    }

    #[test]
    fn test_flags_map_onto_job() {
        let cli = Cli::parse_from([
            "progressive_fractal",
            "--width",
            "64",
            "--height",
            "48",
            "--re",
            "-0.75",
            "--radius",
            "0.01",
            "--scheme",
            "1",
            "--coarse",
            "--direct",
            "--workers",
            "3",
            "--frames",
            "5",
        ]);

        let job = cli.job().unwrap();

        assert_eq!(
            job.mode,
            RenderMode::Direct {
                workers: NonZeroU32::new(3).unwrap()
            }
        );
        assert_eq!(job.params.colour_scheme, ColourScheme::GrayscaleSquared);
        assert_eq!(job.params.settings.escape_policy, EscapePolicy::PerBatch);
        assert_eq!(job.params.iterations_per_tick, 30);
        assert_eq!(job.frame_budget, Some(5));
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        let cli = Cli::parse_from(["progressive_fractal", "--radius", "0"]);

        assert!(cli.job().is_err());
    }
}
