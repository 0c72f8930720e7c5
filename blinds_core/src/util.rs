//! Common time helpers for blinds_core.
use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Convert fractional seconds to a `Duration`.
/// - Negative, NaN and infinite input map to `Duration::ZERO`, which the
///   builder then rejects where a positive time is required.
#[inline]
pub fn duration_from_secs_f32(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
}

/// Scale a duration by a factor >= 1, saturating on overflow.
#[inline]
pub fn scaled(d: Duration, factor: f32) -> Duration {
    if !factor.is_finite() || factor <= 0.0 {
        return d;
    }
    Duration::try_from_secs_f64(d.as_secs_f64() * f64::from(factor)).unwrap_or(Duration::MAX)
}

/// Saturating conversion to whole milliseconds.
#[inline]
pub fn as_millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
