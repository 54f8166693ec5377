use thiserror::Error;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

#[must_use]
pub fn rgba_buffer_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelBufferError {
    #[error("a {width}x{height} buffer needs {expected} bytes, got {actual}")]
    BoundsMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("pixel at x:{x}, y:{y} is outside a {width}x{height} buffer")]
    PixelOutsideBounds { x: u32, y: u32, width: u32, height: u32 },
}

pub type PixelBufferData = Vec<u8>;

/// Row-major RGBA8 image, top-to-bottom, left-to-right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    buffer: PixelBufferData,
}

impl PixelBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; rgba_buffer_size(width, height)],
        }
    }

    pub fn from_data(
        width: u32,
        height: u32,
        buffer: PixelBufferData,
    ) -> Result<Self, PixelBufferError> {
        let expected = rgba_buffer_size(width, height);

        if expected != buffer.len() {
            return Err(PixelBufferError::BoundsMismatch {
                width,
                height,
                expected,
                actual: buffer.len(),
            });
        }

        Ok(Self {
            width,
            height,
            buffer,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn buffer(&self) -> &PixelBufferData {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    #[must_use]
    pub fn into_data(self) -> PixelBufferData {
        self.buffer
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Result<[u8; 4], PixelBufferError> {
        if x >= self.width || y >= self.height {
            return Err(PixelBufferError::PixelOutsideBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let index = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.buffer[index..index + BYTES_PER_PIXEL]);

        Ok(rgba)
    }
}
