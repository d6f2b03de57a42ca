//! Exponentially weighted moving average.

/// EWMA of a series, seeded with its first value.
///
/// Returns 0 for an empty series.
#[must_use]
pub fn smooth(series: &[f64], alpha: f64) -> f64 {
    let Some((&first, rest)) = series.split_first() else {
        return 0.0;
    };

    rest.iter()
        .fold(first, |state, &value| alpha * value + (1.0 - alpha) * state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_empty_and_single() {
        assert_eq!(smooth(&[], 0.3), 0.0);
        assert_eq!(smooth(&[4.2], 0.3), 4.2);
    }

    #[test]
    fn test_smooth_recency_bias() {
        // 0.3 * 10 + 0.7 * 0 = 3.0, then 0.3 * 10 + 0.7 * 3 = 5.1
        let value = smooth(&[0.0, 10.0, 10.0], 0.3);
        assert!((value - 5.1).abs() < 1e-12);
    }

    #[test]
    fn test_smooth_constant_series() {
        assert!((smooth(&[2.0; 12], 0.3) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_one_tracks_last_value() {
        assert_eq!(smooth(&[1.0, 7.0, 3.0], 1.0), 3.0);
    }
}
