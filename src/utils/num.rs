//! Numeric utilities: centralized integer conversions for option parsing and metrics.
//!
//! Fallible conversions return `Option` where an out-of-range value must reject the request;
//! saturating ones are for counters and timings where clamping is acceptable.

#[inline]
#[must_use]
pub fn i64_to_usize(v: i64) -> Option<usize> {
    usize::try_from(v).ok()
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}
