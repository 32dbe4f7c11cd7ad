//! Descriptive statistics over `f64` samples.

use serde::Serialize;

/// Number of equal-width bins used for reading-pace histograms.
pub const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: usize,
}

#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N).
#[must_use]
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Linear-interpolation percentile over an ascending slice, `p` in `[0, 1]`.
///
/// With `k = (N - 1) * p`, `f = floor(k)` and `c = min(f + 1, N - 1)`, the
/// result is `v[f]` when `f == c`, otherwise `v[f] * (c - k) + v[c] * (k - f)`.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let last = sorted.len() - 1;
    let k = last as f64 * p;
    let f = (k.floor().max(0.0) as usize).min(last);
    let c = (f + 1).min(last);

    if f == c {
        return Some(sorted[f]);
    }
    Some(sorted[f] * (c as f64 - k) + sorted[c] * (k - f as f64))
}

/// Equal-width histogram spanning `[min, max]` of `values`.
///
/// Values land in bin `floor((v - min) / width)`, clamped to the last bin so
/// the maximum is counted. When every value is equal the result is a single
/// zero-width bin holding all of them.
#[must_use]
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    if min == max {
        return vec![HistogramBin {
            bin_start: min,
            bin_end: min,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            bin_start: min + i as f64 * width,
            bin_end: if i == bins - 1 {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}

#[must_use]
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(percentile(&sorted, 0.5).unwrap(), 2.5));
        assert!(approx(percentile(&sorted, 0.25).unwrap(), 1.75));
        assert!(approx(percentile(&sorted, 0.75).unwrap(), 3.25));
    }

    #[test]
    fn test_percentile_endpoints() {
        let sorted = [10.0, 20.0, 30.0];
        assert_eq!(percentile(&sorted, 0.0), Some(10.0));
        assert_eq!(percentile(&sorted, 1.0), Some(30.0));
        assert_eq!(percentile(&sorted, 0.5), Some(20.0));
    }

    #[test]
    fn test_percentile_single_and_empty() {
        assert_eq!(percentile(&[7.0], 0.25), Some(7.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn test_population_std_textbook() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(population_std(&values).unwrap(), 2.0));
        assert!(approx(mean(&values).unwrap(), 5.0));
    }

    #[test]
    fn test_population_std_empty_is_absent() {
        assert_eq!(population_std(&[]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_histogram_degenerate_single_bin() {
        let values = [5.0; 6];
        let bins = histogram(&values, HISTOGRAM_BINS);
        assert_eq!(
            bins,
            vec![HistogramBin {
                bin_start: 5.0,
                bin_end: 5.0,
                count: 6,
            }]
        );
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let bins = histogram(&values, HISTOGRAM_BINS);

        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[9].count, 2);
        assert!(approx(bins[0].bin_start, 0.0));
        assert!(approx(bins[0].bin_end, 1.0));
        assert_eq!(bins[9].bin_end, 10.0);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], HISTOGRAM_BINS).is_empty());
    }
}
