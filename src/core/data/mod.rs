pub mod band;
pub mod colour;
pub mod complex;
pub mod coord_system;
pub mod fractal_field;
pub mod pixel_buffer;
