//! Progressive rendering across concurrent tiles.
//!
//! A [`TileCoordinator`] cuts the canvas into horizontal bands and gives each
//! band to a tile worker thread owning one `MandelbrotEngine`. The two sides
//! exchange only the messages in [`messages`]; cancellation is cooperative,
//! through a per-tile generation counter checked between ticks.

pub mod config;
mod coordinator;
pub mod errors;
pub mod messages;
pub mod progress;
mod worker;

pub use config::CoordinatorConfig;
pub use coordinator::TileCoordinator;
pub use errors::CoordinatorError;
pub use progress::Progress;
pub use worker::TileState;
