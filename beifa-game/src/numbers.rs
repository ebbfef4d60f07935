//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 half-to-even and clamp it to the i32 range, returning 0 for
/// NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round_ties_even();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Round a f64 to the nearest integer and clamp it into `[lo, hi]`.
#[must_use]
pub fn clamp_round(value: f64, lo: i32, hi: i32) -> i32 {
    round_f64_to_i32(value).clamp(lo, hi)
}

/// Map 64 random bits onto `[0, 1)` using the top 53 bits.
#[must_use]
pub fn unit_interval_from_bits(bits: u64) -> f64 {
    let mantissa = cast::<u64, f64>(bits >> 11).unwrap_or(0.0);
    mantissa * (1.0 / 9_007_199_254_740_992.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i32(1.6), 2);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(round_f64_to_i32(2.5), 2);
        assert_eq!(round_f64_to_i32(3.5), 4);
        assert_eq!(round_f64_to_i32(-2.5), -2);
        assert_eq!(round_f64_to_i32(15.0 * 0.7), 10);
        assert_eq!(clamp_round(2.5, -18, 18), 2);
    }

    #[test]
    fn clamp_round_respects_bounds() {
        assert_eq!(clamp_round(19.6, 0, 18), 18);
        assert_eq!(clamp_round(-30.2, -20, 20), -20);
        assert_eq!(clamp_round(4.4, -20, 20), 4);
    }

    #[test]
    fn unit_interval_stays_half_open() {
        assert!(unit_interval_from_bits(0).abs() < f64::EPSILON);
        let top = unit_interval_from_bits(u64::MAX);
        assert!(top < 1.0);
        assert!(top > 0.999_999);
    }
}
