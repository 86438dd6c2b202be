//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64, returning 0.0 if the cast is not representable.
#[must_use]
pub fn count_to_f64(value: u32) -> f64 {
    cast::<u32, f64>(value).unwrap_or(0.0)
}

/// Fraction of `part` over `whole`, or 0.0 when `whole` is zero.
#[must_use]
pub fn rate(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    count_to_f64(part) / count_to_f64(whole)
}

/// Narrow an unsigned total into the signed domain used by run arithmetic,
/// saturating at `i64::MAX`.
#[must_use]
pub fn saturating_u64_to_i64(value: u64) -> i64 {
    cast::<u64, i64>(value).unwrap_or(i64::MAX)
}
