pub mod advance_field;
pub mod assemble_frame;
pub mod cancellation;
pub mod render_bands_rayon;
pub mod render_colours;
