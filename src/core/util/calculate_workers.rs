use std::num::NonZeroU32;

/// One tile worker per available hardware thread.
#[must_use]
pub fn calculate_default_workers() -> NonZeroU32 {
    std::thread::available_parallelism()
        .ok()
        .and_then(|n| u32::try_from(n.get()).ok())
        .and_then(NonZeroU32::new)
        .unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanity_check() {
        let num_avail_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1) as u32;

        assert_eq!(calculate_default_workers().get(), num_avail_threads);
    }
}
