use crate::core::data::band::Band;
use std::num::NonZeroU32;

/// Number of bands to cut a canvas `height` rows tall into. Never more bands
/// than rows, so every band owns at least one row.
#[must_use]
pub fn calculate_band_count(max_bands: NonZeroU32, height: u32) -> u32 {
    max_bands.get().min(height).max(1)
}

/// Splits `height` rows into contiguous bands of `height / count` rows; the
/// last band takes any remainder rows.
#[must_use]
pub fn split_into_bands(max_bands: NonZeroU32, height: u32) -> Vec<Band> {
    let total_bands = calculate_band_count(max_bands, height);
    let band_height = height / total_bands;

    (0..total_bands)
        .map(|index| {
            let top = index * band_height;
            let rows = if index == total_bands - 1 {
                height - top
            } else {
                band_height
            };

            Band { index, top, rows }
        })
        .collect()
}
