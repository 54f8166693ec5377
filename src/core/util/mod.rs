pub mod calculate_bands;
pub mod calculate_workers;
