use num_traits::ToPrimitive;

/// Linear interpolated percentile `p` (0-100) of `values`, ignoring values
/// that cannot be represented as `f64`.
pub fn percentile<T: ToPrimitive + Copy>(values: &[T], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values
        .iter()
        .filter_map(|v| v.to_f64())
        .filter(|v| v.is_finite())
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    let weight = rank - low as f64;
    Some(sorted[low] + (sorted[high] - sorted[low]) * weight)
}

/// Output level for every value when the stretch range is empty.
pub const FLAT_LEVEL: u8 = 128;

/// Maps a value range onto `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stretch {
    pub low: f64,
    pub high: f64,
}

impl Stretch {
    pub fn from_percentiles<T: ToPrimitive + Copy>(values: &[T], low: f64, high: f64) -> Self {
        match (percentile(values, low), percentile(values, high)) {
            (Some(low), Some(high)) => Self { low, high },
            _ => Self {
                low: 0.0,
                high: 1.0,
            },
        }
    }

    pub fn apply<T: ToPrimitive>(&self, value: T) -> u8 {
        let Some(v) = value.to_f64() else {
            return 0;
        };
        let span = self.high - self.low;
        if span <= 0.0 {
            return FLAT_LEVEL;
        }
        (((v - self.low) / span).clamp(0.0, 1.0) * 255.0).round() as u8
    }
}
