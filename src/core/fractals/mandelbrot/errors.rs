use crate::core::data::fractal_field::FieldError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MandelbrotError {
    #[error("iterations per tick must be greater than zero")]
    ZeroIterationsPerTick,
    #[error("escape radius squared must be positive and finite, got {0}")]
    InvalidEscapeRadius(f64),
    #[error("unknown colour scheme {0:?}")]
    UnknownColourScheme(String),
    #[error("a direct render needs a bounded maximum iteration count")]
    UnboundedDirectRender,
    #[error(transparent)]
    Field(#[from] FieldError),
}
