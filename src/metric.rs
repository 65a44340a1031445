// SeizeAlert - Magnitude Metric
//
// Reduces a raw sample to |magnitude - rest|.  The square root is a bounded
// Newton-Raphson iteration so the per-sample cost is fixed and identical on
// every target, with or without a hardware FPU math library.

use crate::config::{DetectorConfig, SQRT_MAX_ITERATIONS, SQRT_TOLERANCE};
use crate::events::Sample;

/// Newton-Raphson square root, stopping once `|g² - n| < SQRT_TOLERANCE` or
/// after `SQRT_MAX_ITERATIONS` steps.
pub fn approx_sqrt(n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }

    // Start at or above the root so every step moves monotonically down.
    let mut guess = if n >= 1.0 { n / 2.0 + 0.5 } else { 1.0 };
    for _ in 0..SQRT_MAX_ITERATIONS {
        if (guess * guess - n).abs() < SQRT_TOLERANCE {
            break;
        }
        guess = 0.5 * (guess + n / guess);
    }
    guess
}

/// Clamp each axis to `±max_axis`.
pub fn clamp_sample(sample: Sample, max_axis: i32) -> Sample {
    Sample {
        x: sample.x.clamp(-max_axis, max_axis),
        y: sample.y.clamp(-max_axis, max_axis),
        z: sample.z.clamp(-max_axis, max_axis),
    }
}

/// Vector magnitude of a (clamped) sample, rounded to the nearest unit.
pub fn magnitude(sample: Sample, max_axis: i32) -> u32 {
    let s = clamp_sample(sample, max_axis);
    let sum_sq = [s.x, s.y, s.z]
        .iter()
        .map(|&v| {
            let v = v as i64;
            v * v
        })
        .sum::<i64>();
    approx_sqrt(sum_sq as f64).round() as u32
}

/// Deviation of the sample's magnitude from the resting magnitude.
pub fn metric(sample: Sample, config: &DetectorConfig) -> u32 {
    let mag = magnitude(sample, config.max_axis) as i64;
    (mag - config.rest_magnitude as i64).unsigned_abs() as u32
}
