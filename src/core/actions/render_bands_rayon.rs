use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::core::actions::assemble_frame::{AssembleFrameError, assemble_frame};
use crate::core::actions::cancellation::{CancelToken, Cancelled, NeverCancel};
use crate::core::data::band::Band;
use crate::core::data::pixel_buffer::{PixelBuffer, PixelBufferData};
use crate::core::fractals::mandelbrot::engine::MandelbrotEngine;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;
use crate::core::fractals::mandelbrot::params::RenderParams;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderBandsError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("invalid render parameters: {0}")]
    Params(#[from] MandelbrotError),
    #[error("failed to assemble frame: {0}")]
    Assemble(#[from] AssembleFrameError),
}

/// Renders a view to completion, one engine per band, with rayon spreading
/// the bands over its pool.
///
/// The view must be bounded (`max_iterations > 0`). Each band advances in
/// `iterations_per_tick` batches exactly as a tile worker would, so the
/// result matches what the tiled coordinator converges to. For cancel-aware
/// rendering, use [`render_bands_rayon_cancelable`].
pub fn render_bands_rayon(
    params: &RenderParams,
    bands: &[Band],
) -> Result<PixelBuffer, RenderBandsError> {
    render_bands_rayon_cancelable(params, bands, &NeverCancel).map_err(|e| match e {
        RenderBandsError::Cancelled(_) => {
            unreachable!("NeverCancel token should never signal cancellation")
        }
        other => other,
    })
}

/// Like [`render_bands_rayon`], checking `cancel` between batches.
pub fn render_bands_rayon_cancelable<C>(
    params: &RenderParams,
    bands: &[Band],
    cancel: &C,
) -> Result<PixelBuffer, RenderBandsError>
where
    C: CancelToken,
{
    params.validate()?;
    if !params.is_bounded() {
        return Err(MandelbrotError::UnboundedDirectRender.into());
    }

    let tiles: Vec<PixelBufferData> = bands
        .par_iter()
        .map(|band| render_band(params, band, cancel))
        .collect::<Result<_, _>>()?;

    let geometry = params.geometry;
    Ok(assemble_frame(geometry.width, geometry.height, bands, &tiles)?)
}

fn render_band<C>(
    params: &RenderParams,
    band: &Band,
    cancel: &C,
) -> Result<PixelBufferData, RenderBandsError>
where
    C: CancelToken,
{
    let mut engine = MandelbrotEngine::from_params(&params.for_band(band))?;

    while !engine.is_complete(params.max_iterations) {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        engine.advance_capped(params.iterations_per_tick, params.max_iterations);
    }

    debug!(
        band = band.index,
        rows = band.rows,
        iterations = engine.current_iteration(),
        "band complete"
    );

    Ok(engine.render(params.colour_scheme).into_data())
}
