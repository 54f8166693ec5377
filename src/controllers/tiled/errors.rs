use crate::core::fractals::mandelbrot::errors::MandelbrotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid view: {0}")]
    InvalidView(#[from] MandelbrotError),
    #[error("no view has been started")]
    NotStarted,
    #[error("tile {tile} cannot be reached")]
    TileDisconnected { tile: usize },
    #[error("failed to spawn tile worker: {0}")]
    Spawn(#[from] std::io::Error),
}
