use crate::core::data::fractal_field::FieldGeometry;
use crate::core::data::pixel_buffer::rgba_buffer_size;

/// A horizontal slice of the canvas, `rows` tall, starting at canvas row `top`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Band {
    pub index: u32,
    pub top: u32,
    pub rows: u32,
}

impl Band {
    #[must_use]
    pub fn geometry(&self, canvas: &FieldGeometry) -> FieldGeometry {
        canvas.band(self.top, self.rows)
    }

    /// Byte length of this band's RGBA buffer for a canvas `width` wide.
    #[must_use]
    pub fn buffer_size(&self, width: u32) -> usize {
        rgba_buffer_size(width, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size() {
        let band = Band {
            index: 2,
            top: 6,
            rows: 3,
        };

        assert_eq!(band.buffer_size(10), 120);
    }

    #[test]
    fn test_geometry_offsets_rows() {
        let canvas = FieldGeometry {
            width: 10,
            height: 9,
            row_offset: 0,
            origin_x: 5.0,
            origin_y: 4.5,
            scale: 2.0,
        };
        let band = Band {
            index: 1,
            top: 3,
            rows: 3,
        };

        let geometry = band.geometry(&canvas);

        assert_eq!(geometry.height, 3);
        assert_eq!(geometry.row_offset, 3);
        assert_eq!(geometry.origin_y, canvas.origin_y);
        assert_eq!(geometry.width, canvas.width);
    }
}
