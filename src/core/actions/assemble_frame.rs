use crate::core::data::band::Band;
use crate::core::data::pixel_buffer::{
    PixelBuffer, PixelBufferData, PixelBufferError, rgba_buffer_size,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleFrameError {
    #[error("expected {expected} tile buffers, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("band {band} starts at row {top}, expected row {expected_top}")]
    BandLayout { band: u32, top: u32, expected_top: u32 },
    #[error("band {band} sent {actual} bytes, expected {expected}")]
    MalformedTileBuffer {
        band: u32,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    PixelBuffer(#[from] PixelBufferError),
}

/// Concatenates per-band RGBA buffers, in band order, into one frame.
///
/// All-or-nothing: a single buffer of the wrong length rejects the frame.
pub fn assemble_frame(
    width: u32,
    height: u32,
    bands: &[Band],
    tiles: &[PixelBufferData],
) -> Result<PixelBuffer, AssembleFrameError> {
    if bands.len() != tiles.len() {
        return Err(AssembleFrameError::TileCountMismatch {
            expected: bands.len(),
            actual: tiles.len(),
        });
    }

    let mut frame = PixelBufferData::with_capacity(rgba_buffer_size(width, height));
    let mut expected_top = 0;

    for (band, tile) in bands.iter().zip(tiles) {
        if band.top != expected_top {
            return Err(AssembleFrameError::BandLayout {
                band: band.index,
                top: band.top,
                expected_top,
            });
        }

        let expected = band.buffer_size(width);
        if tile.len() != expected {
            return Err(AssembleFrameError::MalformedTileBuffer {
                band: band.index,
                expected,
                actual: tile.len(),
            });
        }

        frame.extend_from_slice(tile);
        expected_top = band.top + band.rows;
    }

    Ok(PixelBuffer::from_data(width, height, frame)?)
}
