use std::path::Path;

use crate::core::data::pixel_buffer::PixelBuffer;

/// Where the headless driver sends a finished frame.
pub trait FilePresenterPort {
    fn present(&self, buffer: &PixelBuffer, filepath: impl AsRef<Path>) -> std::io::Result<()>;
}
