//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u32 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Convert a u32 to f64 in a single location.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Ratio of two counts, falling back to `prior` when the denominator is zero.
#[must_use]
pub fn ratio_or(numerator: usize, denominator: usize, prior: f64) -> f64 {
    if denominator == 0 {
        return prior;
    }
    let num = cast::<usize, f64>(numerator).unwrap_or(0.0);
    let den = cast::<usize, f64>(denominator).unwrap_or(1.0);
    (num / den).clamp(0.0, 1.0)
}

/// Convert a small trait value to f64.
#[must_use]
pub fn trait_to_f64(value: u8) -> f64 {
    f64::from(value)
}

/// Saturating conversion from usize to u32.
#[must_use]
pub fn usize_to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
