use std::num::NonZeroU32;
use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::controllers::ports::file_presenter::FilePresenterPort;
use crate::controllers::tiled::{CoordinatorConfig, CoordinatorError, TileCoordinator};
use crate::core::actions::render_bands_rayon::{RenderBandsError, render_bands_rayon};
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::fractals::mandelbrot::params::RenderParams;
use crate::core::util::calculate_bands::split_into_bands;

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Render(#[from] RenderBandsError),
    #[error("an unbounded view needs a frame budget")]
    UnboundedWithoutBudget,
    #[error("no frame could be assembled")]
    NoFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Progressive rendering on tile threads, polled for frames.
    Tiled(CoordinatorConfig),
    /// One synchronous pass over the bands on the rayon pool.
    Direct { workers: NonZeroU32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderJob {
    pub params: RenderParams,
    pub mode: RenderMode,
    /// Pause between frame requests in tiled mode.
    pub frame_interval: Duration,
    /// Stop after this many frames even if the view has not reached its cap.
    pub frame_budget: Option<u32>,
}

impl RenderJob {
    #[must_use]
    pub fn tiled(params: RenderParams, config: CoordinatorConfig) -> Self {
        Self {
            params,
            mode: RenderMode::Tiled(config),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            frame_budget: None,
        }
    }

    #[must_use]
    pub fn direct(params: RenderParams, workers: NonZeroU32) -> Self {
        Self {
            params,
            mode: RenderMode::Direct { workers },
            frame_interval: DEFAULT_FRAME_INTERVAL,
            frame_budget: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderReport {
    pub frames: u32,
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Renders one view without a display and hands the last frame to a file
/// presenter.
pub struct HeadlessController<P: FilePresenterPort> {
    presenter: P,
    buffer: Option<PixelBuffer>,
}

impl<P: FilePresenterPort> HeadlessController<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            buffer: None,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.buffer.as_ref()
    }

    pub fn generate(&mut self, job: &RenderJob) -> Result<RenderReport, HeadlessError> {
        let geometry = job.params.geometry;
        info!(
            width = geometry.width,
            height = geometry.height,
            max_iterations = job.params.max_iterations,
            scheme = %job.params.colour_scheme,
            "rendering mandelbrot set"
        );

        let start = Instant::now();
        let (frame, frames, iterations) = match job.mode {
            RenderMode::Tiled(config) => render_tiled(job, config)?,
            RenderMode::Direct { workers } => {
                let bands = split_into_bands(workers, geometry.height);
                let frame = render_bands_rayon(&job.params, &bands)?;
                (frame, 1, job.params.max_iterations)
            }
        };

        let report = RenderReport {
            frames,
            iterations,
            elapsed: start.elapsed(),
        };
        info!(
            frames = report.frames,
            iterations = report.iterations,
            duration = ?report.elapsed,
            "render finished"
        );

        self.buffer = Some(frame);

        Ok(report)
    }

    pub fn write(&self, filepath: impl AsRef<Path>) -> std::io::Result<()> {
        if let Some(buffer) = &self.buffer {
            self.presenter.present(buffer, filepath)?
        }

        Ok(())
    }
}

fn render_tiled(
    job: &RenderJob,
    config: CoordinatorConfig,
) -> Result<(PixelBuffer, u32, u64), HeadlessError> {
    if !job.params.is_bounded() && job.frame_budget.is_none() {
        return Err(HeadlessError::UnboundedWithoutBudget);
    }

    let scheme = job.params.colour_scheme;
    let mut coordinator = TileCoordinator::new(config);
    coordinator.start(job.params)?;

    if !coordinator.await_started(config.start_timeout)? {
        warn!("not every tile acknowledged start yet, carrying on");
    }

    let mut frames = 0;
    let mut latest = None;

    loop {
        if coordinator.await_complete(job.frame_interval)? {
            break;
        }

        if let Some(frame) = coordinator.request_frame(scheme)? {
            frames += 1;
            latest = Some(frame);
        }

        if let Some(progress) = coordinator.progress() {
            info!(frames, %progress, spread = progress.spread(), "progress");
        }

        if job.frame_budget.is_some_and(|budget| frames >= budget) {
            break;
        }
    }

    coordinator.stop();

    let frame = match coordinator.request_frame(scheme)? {
        Some(frame) => {
            frames += 1;
            frame
        }
        None => latest.ok_or(HeadlessError::NoFrame)?,
    };
    let iterations = coordinator.progress().map_or(0, |progress| progress.min);
    coordinator.shutdown();

    Ok((frame, frames, iterations))
}
