/// Spread of `current_iteration` across the running tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub min: u64,
    pub average: f64,
    pub max: u64,
}

impl Progress {
    /// `None` when there are no tiles to report on.
    #[must_use]
    pub fn from_iterations<I>(iterations: I) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut count = 0u64;
        let mut total = 0u128;
        let mut min = u64::MAX;
        let mut max = 0;

        for iteration in iterations {
            count += 1;
            total += u128::from(iteration);
            min = min.min(iteration);
            max = max.max(iteration);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            min,
            average: total as f64 / count as f64,
            max,
        })
    }

    /// Iterations separating the fastest tile from the slowest.
    #[must_use]
    pub fn spread(&self) -> u64 {
        self.max - self.min
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min {} / avg {:.1} / max {}",
            self.min, self.average, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iterations() {
        let progress = Progress::from_iterations([10, 30, 20]).unwrap();

        assert_eq!(progress.min, 10);
        assert_eq!(progress.max, 30);
        assert_eq!(progress.average, 20.0);
        assert_eq!(progress.spread(), 20);
    }

    #[test]
    fn test_no_tiles_has_no_progress() {
        assert_eq!(Progress::from_iterations(Vec::new()), None);
    }

    #[test]
    fn test_display() {
        let progress = Progress::from_iterations([1, 2]).unwrap();

        assert_eq!(progress.to_string(), "min 1 / avg 1.5 / max 2");
    }
}
