//! Summary statistics over decoded image cubes.

use alloc::vec::Vec;

use crate::image::HipsImage;

/// Whole-cube statistics, accumulated in f64.
///
/// A NaN sample makes `min`, `max`, `mean` and `std` NaN. An empty cube
/// reports NaN for all four.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Sorted distinct sample values, when requested. A NaN, if present,
    /// appears once at the end.
    pub unique: Option<Vec<f32>>,
}

impl ImageStats {
    pub fn compute(image: &HipsImage, unique: bool) -> Self {
        Self::from_samples(image.as_slice(), unique)
    }

    pub fn from_samples(samples: &[f32], unique: bool) -> Self {
        let count = samples.len();
        let unique = unique.then(|| unique_values(samples));
        if count == 0 || samples.iter().any(|v| v.is_nan()) {
            return ImageStats {
                count,
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                std: f64::NAN,
                unique,
            };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in samples {
            let v = f64::from(v);
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / count as f64;
        let var = samples
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / count as f64;

        ImageStats {
            count,
            min,
            max,
            mean,
            std: libm::sqrt(var),
            unique,
        }
    }
}

/// Sorted distinct values of `samples`; NaNs collapse to one trailing NaN.
pub fn unique_values(samples: &[f32]) -> Vec<f32> {
    let mut values: Vec<f32> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
    let has_nan = values.len() != samples.len();
    values.sort_by(f32::total_cmp);
    values.dedup_by(|a, b| a == b);
    if has_nan {
        values.push(f32::NAN);
    }
    values
}

/// The `q`-th percentile (0 to 100) of `samples`, ignoring NaN.
///
/// Interpolates linearly between the two closest ranks. Returns `None` when
/// no non-NaN sample exists.
pub fn percentile(samples: &[f32], q: f64) -> Option<f64> {
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f32::total_cmp);
    Some(percentile_of_sorted(&sorted, q))
}

/// Same as [`percentile`] on data already sorted and free of NaN.
pub fn percentile_of_sorted(sorted: &[f32], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = libm::floor(rank) as usize;
    let hi = (lo + 1).min(last);
    let a = f64::from(sorted[lo]);
    let b = f64::from(sorted[hi]);
    if a == b {
        a
    } else {
        a + (b - a) * (rank - lo as f64)
    }
}

/// Reads the file at `path` and computes its statistics.
#[cfg(feature = "std")]
pub fn hipstats<P: AsRef<std::path::Path>>(path: P, unique: bool) -> crate::Result<ImageStats> {
    let decoded = crate::image::read_hips(path)?;
    Ok(ImageStats::compute(&decoded.image, unique))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn basic_statistics() {
        let s = ImageStats::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], false);
        assert_eq!(s.count, 8);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!(close(s.mean, 5.0));
        assert!(close(s.std, 2.0));
        assert!(s.unique.is_none());
    }

    #[test]
    fn statistics_of_image() {
        let img = HipsImage::from_fn(2, 2, 2, |r, c, b| (r * 4 + c * 2 + b) as f32);
        let s = ImageStats::compute(&img, true);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 7.0);
        assert!(close(s.mean, 3.5));
        assert_eq!(s.unique.unwrap().len(), 8);
    }

    #[test]
    fn nan_propagates() {
        let s = ImageStats::from_samples(&[1.0, f32::NAN, 3.0], false);
        assert!(s.min.is_nan());
        assert!(s.mean.is_nan());
        assert!(s.std.is_nan());
    }

    #[test]
    fn empty_input() {
        let s = ImageStats::from_samples(&[], true);
        assert_eq!(s.count, 0);
        assert!(s.max.is_nan());
        assert_eq!(s.unique, Some(vec![]));
    }

    #[test]
    fn unique_sorted_with_single_nan() {
        let u = unique_values(&[3.0, f32::NAN, 1.0, 3.0, f32::NAN, -2.0, 1.0]);
        assert_eq!(u.len(), 4);
        assert_eq!(&u[..3], &[-2.0, 1.0, 3.0]);
        assert!(u[3].is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(4.0));
        assert!(close(percentile(&data, 50.0).unwrap(), 2.5));
        assert!(close(percentile(&data, 2.5).unwrap(), 1.075));
    }

    #[test]
    fn percentile_ignores_nan_and_order() {
        let data = [f32::NAN, 10.0, 0.0, 5.0];
        assert!(close(percentile(&data, 50.0).unwrap(), 5.0));
        assert_eq!(percentile(&[f32::NAN], 50.0), None);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[4.0], 97.5), Some(4.0));
    }
}
