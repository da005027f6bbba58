// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw clock selection and reads.
//!
//! The compositor announces which POSIX clock its presentation timestamps use
//! (`wp_presentation.clock_id`). Every raw reading the tracker sees must come
//! from that same clock, so [`Clock`] is the tracker's
//! [`TimeSource`].

use oring_core::clock::TimeSource;
use oring_core::submission::{PresentFlags, PresentedFeedback};
use oring_core::time::{Duration, RawTime};
use rustix::time::{ClockId as PosixClockId, Timespec, clock_gettime};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// `CLOCK_MONOTONIC` as numbered by the kernel and the protocol.
pub const CLOCK_MONOTONIC_ID: u32 = 1;

/// Clock source used for raw timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Clock {
    /// `CLOCK_MONOTONIC` fallback clock.
    #[default]
    Monotonic,
    /// Clock selected from `wp_presentation.clock_id`.
    Presentation(PosixClockId),
}

impl Clock {
    /// Maps a protocol clock id to a clock this process can read.
    ///
    /// Returns `None` for ids that are not a supported POSIX clock.
    #[must_use]
    pub fn from_protocol_id(clk_id: u32) -> Option<Self> {
        let id = match clk_id {
            0 => PosixClockId::Realtime,
            1 => PosixClockId::Monotonic,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            4 => PosixClockId::MonotonicRaw,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            7 => PosixClockId::Boottime,
            _ => return None,
        };
        Some(Self::Presentation(id))
    }

    #[must_use]
    const fn posix_clock_id(self) -> PosixClockId {
        match self {
            Self::Monotonic => PosixClockId::Monotonic,
            Self::Presentation(clock_id) => clock_id,
        }
    }
}

impl TimeSource for Clock {
    fn now(&self) -> RawTime {
        timespec_to_raw(clock_gettime(self.posix_clock_id()))
    }
}

/// Human-readable name of a protocol clock id, for log lines.
#[must_use]
pub fn clock_name(clk_id: u32) -> &'static str {
    match clk_id {
        0 => "CLOCK_REALTIME",
        1 => "CLOCK_MONOTONIC",
        2 => "CLOCK_PROCESS_CPUTIME_ID",
        3 => "CLOCK_THREAD_CPUTIME_ID",
        4 => "CLOCK_MONOTONIC_RAW",
        5 => "CLOCK_REALTIME_COARSE",
        6 => "CLOCK_MONOTONIC_COARSE",
        7 => "CLOCK_BOOTTIME",
        _ => "unknown",
    }
}

/// Returns the current `CLOCK_MONOTONIC` reading.
#[must_use]
pub fn now() -> RawTime {
    Clock::Monotonic.now()
}

/// Converts a `timespec`, saturating on out-of-range values.
pub(crate) fn timespec_to_raw(timespec: Timespec) -> RawTime {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);
    secs_nanos_to_raw(seconds, nanos)
}

/// Converts the `(tv_sec_hi, tv_sec_lo, tv_nsec)` triple carried by
/// `wp_presentation_feedback.presented`.
#[must_use]
pub fn protocol_to_raw(tv_sec_hi: u32, tv_sec_lo: u32, tv_nsec: u32) -> RawTime {
    let seconds = (u64::from(tv_sec_hi) << 32) | u64::from(tv_sec_lo);
    secs_nanos_to_raw(seconds, u64::from(tv_nsec.min(999_999_999)))
}

/// Builds the tracker's [`PresentedFeedback`] from the fields of
/// `wp_presentation_feedback.presented`.
///
/// `flags` is the raw `kind` bitfield; the retrace counter halves are joined
/// high word first.
#[must_use]
pub fn feedback_from_presented(
    tv_sec_hi: u32,
    tv_sec_lo: u32,
    tv_nsec: u32,
    refresh: u32,
    seq_hi: u32,
    seq_lo: u32,
    flags: u32,
) -> PresentedFeedback {
    PresentedFeedback {
        raw_time: protocol_to_raw(tv_sec_hi, tv_sec_lo, tv_nsec),
        refresh: Duration(u64::from(refresh)),
        flags: PresentFlags(flags),
        sequence: (u64::from(seq_hi) << 32) | u64::from(seq_lo),
    }
}

fn secs_nanos_to_raw(seconds: u64, nanos: u64) -> RawTime {
    let ticks = u128::from(seconds)
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u128::from(nanos));
    RawTime(u64::try_from(ticks).unwrap_or(u64::MAX))
}
