// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw and logical nanosecond time values.
//!
//! Two timelines exist side by side:
//!
//! - [`RawTime`] is a reading of the underlying monotonic time source (e.g.
//!   `CLOCK_MONOTONIC`, or the clock announced by `wp_presentation`), in
//!   nanoseconds since that source's arbitrary origin.
//! - [`LogicalTime`] is the pause-aware offset from a
//!   [`LogicalClock`](crate::clock::LogicalClock) epoch.
//!
//! Keeping them as distinct types means a raw reading can never be used as a
//! prediction input without first passing through the clock.
//!
//! [`Duration`] is a span of nanoseconds valid on either timeline.

use core::fmt;
use core::ops::{Add, Sub};

/// A reading of the raw monotonic time source, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawTime(pub u64);

impl RawTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration between `self` and an earlier reading, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Returns the duration since `earlier`, or `None` if `earlier` is after
    /// `self`.
    #[inline]
    #[must_use]
    pub const fn checked_duration_since(self, earlier: Self) -> Option<Duration> {
        match self.0.checked_sub(earlier.0) {
            Some(d) => Some(Duration(d)),
            None => None,
        }
    }
}

impl Add<Duration> for RawTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for RawTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawTime({})", self.0)
    }
}

/// Pause-aware nanoseconds since a logical clock epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalTime(pub u64);

impl LogicalTime {
    /// The epoch itself.
    pub const ZERO: Self = Self(0);

    /// Returns the nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Converts to milliseconds for human-readable output.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 * 1e-6
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Checked subtraction of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, duration: Duration) -> Option<Self> {
        match self.0.checked_sub(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Signed difference `self - other` in nanoseconds, saturating at the
    /// `i64` range.
    #[inline]
    #[must_use]
    pub fn signed_delta(self, other: Self) -> i64 {
        let wide = i128::from(self.0) - i128::from(other.0);
        i64::try_from(wide).unwrap_or(if wide < 0 { i64::MIN } else { i64::MAX })
    }
}

impl Add<Duration> for LogicalTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for LogicalTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for LogicalTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalTime({})", self.0)
    }
}

/// A span of nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Returns the nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns `true` for a zero-length duration.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Multiplies by `numer / denom` with a `u128` intermediate, rounding down.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub fn mul_ratio(self, numer: u64, denom: u64) -> Self {
        assert!(denom != 0, "ratio denominator must not be zero");
        let wide = u128::from(self.0) * u128::from(numer) / u128::from(denom);
        Self(u64::try_from(wide).unwrap_or(u64::MAX))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_duration_since() {
        let t = RawTime(1000);
        assert_eq!(t.saturating_duration_since(RawTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(RawTime(400)), Duration(600));
        assert_eq!(t.checked_duration_since(RawTime(1001)), None);
        assert_eq!(t.checked_duration_since(RawTime(1000)), Some(Duration::ZERO));
    }

    #[test]
    fn logical_time_duration_ops() {
        let t = LogicalTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).nanos(), 1200);
        assert_eq!((t - d).nanos(), 800);
        assert_eq!(LogicalTime(1200) - t, Duration(200));
        assert_eq!(LogicalTime(u64::MAX).checked_add(d), None);
        assert_eq!(LogicalTime(100).checked_sub(d), None);
    }

    #[test]
    fn signed_delta_in_both_directions() {
        assert_eq!(LogicalTime(1500).signed_delta(LogicalTime(1000)), 500);
        assert_eq!(LogicalTime(1000).signed_delta(LogicalTime(1500)), -500);
        assert_eq!(LogicalTime(u64::MAX).signed_delta(LogicalTime(0)), i64::MAX);
    }

    #[test]
    fn mul_ratio_rounds_down() {
        // 1.5 periods of the nominal 60 Hz period.
        assert_eq!(Duration(16_666_667).mul_ratio(3, 2), Duration(25_000_000));
        assert_eq!(Duration(u64::MAX).mul_ratio(3, 1), Duration(u64::MAX));
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration(100);
        let b = Duration(30);
        assert_eq!((a + b).nanos(), 130);
        assert_eq!((a - b).nanos(), 70);
        assert_eq!(a.saturating_sub(Duration(200)), Duration::ZERO);
        assert_eq!(Duration::from_millis(16), Duration(16_000_000));
        assert!(Duration::ZERO.is_zero());
    }
}
