pub mod colour_schemes;
pub mod engine;
pub mod errors;
pub mod params;
