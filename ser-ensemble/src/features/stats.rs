//! Summary statistics over feature matrices
//!
//! Standard deviations are population (ddof = 0). Accumulation is done in
//! f64 so long clips don't drift.

/// Mean and population standard deviation. Empty input yields `(0.0, 0.0)`.
pub fn mean_std<I>(values: I) -> (f32, f32)
where
    I: IntoIterator<Item = f32>,
{
    // Welford
    let mut count = 0u64;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;

    for value in values {
        count += 1;
        let x = value as f64;
        let delta = x - mean;
        mean += delta / count as f64;
        m2 += delta * (x - mean);
    }

    if count == 0 {
        return (0.0, 0.0);
    }

    (mean as f32, (m2 / count as f64).sqrt() as f32)
}

/// Arithmetic mean. Empty input yields 0.0.
pub fn mean<I>(values: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    mean_std(values).0
}

/// Median; even-length input averages the two middle values. Empty input yields 0.0.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        ((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0) as f32
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std() {
        let (m, s) = mean_std([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-6);
        assert!((s - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(mean_std(std::iter::empty()), (0.0, 0.0));
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_constant_has_zero_std() {
        let (m, s) = mean_std(vec![0.25f32; 100]);
        assert!((m - 0.25).abs() < 1e-7);
        assert!(s.abs() < 1e-7);
    }
}
