//! What the coordinator and its tiles say to each other.
//!
//! Every message is owned data: parameters are copied into `Start`, colour
//! buffers are moved into `Data`. Tiles share nothing with the coordinator
//! except their generation counter.

use crate::core::data::pixel_buffer::PixelBufferData;
use crate::core::fractals::mandelbrot::colour_schemes::ColourScheme;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;
use crate::core::fractals::mandelbrot::params::RenderParams;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TileCommand {
    /// Reinitialise the field from `params` and start iterating. `generation`
    /// identifies the run; the tile stops once its counter moves past it.
    Start {
        generation: u64,
        params: RenderParams,
    },
    Stop,
    /// Colour the field as it stands and send it back.
    Request {
        request_id: u64,
        scheme: ColourScheme,
    },
    /// Sleep this long after every tick; zero removes the throttle.
    Throttle(Duration),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileResponse {
    Started {
        tile: usize,
        generation: u64,
    },
    Data {
        tile: usize,
        request_id: u64,
        colour_buffer: PixelBufferData,
        current_iteration: u64,
    },
    /// The run reached its iteration cap.
    Completed {
        tile: usize,
        generation: u64,
        current_iteration: u64,
    },
    Failed {
        tile: usize,
        generation: u64,
        error: MandelbrotError,
    },
}
