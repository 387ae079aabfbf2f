//! Trailing (right-aligned) moving averages.

/// Trailing mean over `window` values, right-aligned.
///
/// Position `i` holds the mean of `values[i + 1 - window..=i]`. The first
/// `window - 1` positions have no full window and are `None`. A non-finite
/// input poisons every window that contains it.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        // Each window is summed from scratch (no running sum).
        let slice = &values[i + 1 - window..=i];
        let sum: f64 = slice.iter().sum();
        let mean = sum / window as f64;
        out.push(mean.is_finite().then_some(mean));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_mean_is_right_aligned() {
        let v: Vec<f64> = (1..=9).map(f64::from).collect();
        let out = trailing_mean(&v, 7);
        assert_eq!(out.len(), 9);
        assert!(out[..6].iter().all(Option::is_none));
        assert_eq!(out[6], Some(4.0)); // mean(1..=7)
        assert_eq!(out[8], Some(6.0)); // mean(3..=9)
    }

    #[test]
    fn short_input_is_all_missing() {
        let out = trailing_mean(&[1.0, 2.0, 3.0], 7);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn non_finite_input_only_affects_its_windows() {
        let v = [1.0, f64::NAN, 1.0, 1.0, 1.0];
        let out = trailing_mean(&v, 2);
        assert_eq!(out, vec![None, None, None, Some(1.0), Some(1.0)]);
    }
}
