//! The iteration kernel.
//!
//! Pixels are processed `LANES` at a time out of the field's flat columns.
//! Each group carries a live mask; the per-lane update is computed for every
//! lane and committed with a select, so the inner loop has no data-dependent
//! branches and the compiler is free to vectorise it. A group whose lanes
//! have all escaped is skipped without touching its state.

use crate::core::data::fractal_field::{FieldColumnsMut, FractalField};
use crate::core::fractals::mandelbrot::params::{EngineSettings, EscapePolicy};

/// Pixels advanced together by the kernel.
pub const LANES: usize = 4;

/// Advances every bounded pixel of `field` by up to `batch_size` iterations.
///
/// Returns the number of pixels still bounded afterwards.
pub fn advance_field(
    field: &mut FractalField,
    batch_size: u32,
    settings: &EngineSettings,
) -> usize {
    let escape_radius_squared = settings.escape_radius_squared;
    let mut columns = field.columns_mut();
    let len = columns.iterations.len();

    let mut bounded = 0;
    let mut start = 0;

    while start < len {
        let end = (start + LANES).min(len);
        let mut lanes = Lanes::load(&columns, start, end, escape_radius_squared);

        if lanes.any_live() {
            match settings.escape_policy {
                EscapePolicy::PerIteration => {
                    lanes.iterate_per_iteration(batch_size, escape_radius_squared);
                }
                EscapePolicy::PerBatch => lanes.iterate_per_batch(batch_size),
            }
            lanes.store(&mut columns, start);
        }

        bounded += lanes.bounded_count(escape_radius_squared);
        start = end;
    }

    bounded
}

struct Lanes {
    width: usize,
    c_real: [f64; LANES],
    c_imag: [f64; LANES],
    z_real: [f64; LANES],
    z_imag: [f64; LANES],
    iterations: [u64; LANES],
    live: [bool; LANES],
}

impl Lanes {
    fn load(
        columns: &FieldColumnsMut<'_>,
        start: usize,
        end: usize,
        escape_radius_squared: f64,
    ) -> Self {
        let mut lanes = Self {
            width: end - start,
            c_real: [0.0; LANES],
            c_imag: [0.0; LANES],
            z_real: [0.0; LANES],
            z_imag: [0.0; LANES],
            iterations: [0; LANES],
            live: [false; LANES],
        };

        for lane in 0..lanes.width {
            let index = start + lane;
            lanes.c_real[lane] = columns.c_real[index];
            lanes.c_imag[lane] = columns.c_imag[index];
            lanes.z_real[lane] = columns.z_real[index];
            lanes.z_imag[lane] = columns.z_imag[index];
            lanes.iterations[lane] = columns.iterations[index];
            lanes.live[lane] = lanes.magnitude_squared(lane) <= escape_radius_squared;
        }

        lanes
    }

    fn store(&self, columns: &mut FieldColumnsMut<'_>, start: usize) {
        for lane in 0..self.width {
            let index = start + lane;
            columns.z_real[index] = self.z_real[lane];
            columns.z_imag[index] = self.z_imag[lane];
            columns.iterations[index] = self.iterations[lane];
        }
    }

    #[inline]
    fn any_live(&self) -> bool {
        self.live.iter().any(|&live| live)
    }

    #[inline]
    fn magnitude_squared(&self, lane: usize) -> f64 {
        self.z_real[lane] * self.z_real[lane] + self.z_imag[lane] * self.z_imag[lane]
    }

    fn bounded_count(&self, escape_radius_squared: f64) -> usize {
        (0..self.width)
            .filter(|&lane| self.magnitude_squared(lane) <= escape_radius_squared)
            .count()
    }

    /// Commits `z² + c` on live lanes and returns the new magnitudes.
    #[inline]
    fn step(&mut self) -> [f64; LANES] {
        let mut magnitudes = [0.0; LANES];

        for lane in 0..LANES {
            let re = self.z_real[lane];
            let im = self.z_imag[lane];
            let next_re = re * re - im * im + self.c_real[lane];
            let next_im = 2.0 * re * im + self.c_imag[lane];
            let live = self.live[lane];

            self.z_real[lane] = if live { next_re } else { re };
            self.z_imag[lane] = if live { next_im } else { im };
            magnitudes[lane] = next_re * next_re + next_im * next_im;
        }

        magnitudes
    }

    fn iterate_per_iteration(&mut self, batch_size: u32, escape_radius_squared: f64) {
        for _ in 0..batch_size {
            let magnitudes = self.step();

            for lane in 0..LANES {
                let stays_bounded = self.live[lane] && magnitudes[lane] <= escape_radius_squared;
                self.iterations[lane] =
                    self.iterations[lane].saturating_add(u64::from(stays_bounded));
                self.live[lane] = stays_bounded;
            }

            if !self.any_live() {
                break;
            }
        }
    }

    /// The mask is taken once when the group is loaded; every lane live then
    /// is credited the whole batch.
    fn iterate_per_batch(&mut self, batch_size: u32) {
        for _ in 0..batch_size {
            self.step();
        }

        for lane in 0..LANES {
            if self.live[lane] {
                self.iterations[lane] =
                    self.iterations[lane].saturating_add(u64::from(batch_size));
            }
        }
    }
}
