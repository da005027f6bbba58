// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pause-aware logical clock.
//!
//! [`LogicalClock`] maps readings of one raw monotonic [`TimeSource`] onto a
//! nanosecond timeline that starts at zero at a chosen epoch:
//!
//! ```text
//! logical(raw) = accumulated_offset + (raw - base)
//! ```
//!
//! `base` starts at the epoch and moves to the last freeze or thaw point.
//! While frozen, every raw reading at or after the freeze point maps to the
//! freeze value, so a known pause (suspend, a stalled presentation clock)
//! leaves no gap in the logical timeline.
//!
//! Reading a raw time before `base` extrapolates backward from `base`
//! without taking earlier freezes into account. Such values are only suitable
//! for diagnostics, never for prediction.

use alloc::rc::Rc;
use core::cell::Cell;

use crate::time::{Duration, LogicalTime, RawTime};

/// A raw monotonic time source.
///
/// The source value itself identifies which raw clock is read; a clock
/// instance is bound to one source for its whole lifetime.
pub trait TimeSource {
    /// Reads the current raw time.
    fn now(&self) -> RawTime;
}

/// Misuse of a [`LogicalClock`].
///
/// All variants are caller logic errors rather than runtime conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The raw time lies before the epoch and cannot be represented.
    #[error("raw time {raw:?} lies before the clock epoch (base {base:?})")]
    BeforeEpoch {
        /// The offending raw time.
        raw: RawTime,
        /// The clock's current base.
        base: RawTime,
    },
    /// Freeze or thaw was given a raw time before the last freeze/thaw point.
    #[error("raw time {raw:?} is earlier than the last freeze/thaw point {base:?}")]
    BeforeBase {
        /// The offending raw time.
        raw: RawTime,
        /// The clock's current base.
        base: RawTime,
    },
    /// `freeze` was called on a frozen clock.
    #[error("clock is already frozen")]
    AlreadyFrozen,
    /// `thaw` was called on a running clock.
    #[error("clock is not frozen")]
    NotFrozen,
    /// The logical value does not fit in 64 bits of nanoseconds.
    #[error("logical time overflowed")]
    Overflow,
}

/// Converts raw time readings into pause-aware logical nanoseconds.
#[derive(Clone, Debug)]
pub struct LogicalClock<S> {
    source: S,
    base: RawTime,
    offset: Duration,
    frozen: bool,
}

impl<S: TimeSource> LogicalClock<S> {
    /// Creates a running clock whose logical zero is `epoch`.
    #[must_use]
    pub fn new(source: S, epoch: RawTime) -> Self {
        Self {
            source,
            base: epoch,
            offset: Duration::ZERO,
            frozen: false,
        }
    }

    /// Creates a running clock whose epoch is the source's current reading.
    #[must_use]
    pub fn starting_now(source: S) -> Self {
        let epoch = source.now();
        Self::new(source, epoch)
    }

    /// Returns the time source this clock reads.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns `true` while the clock is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Reads the raw source without converting.
    #[must_use]
    pub fn raw_now(&self) -> RawTime {
        self.source.now()
    }

    /// Returns the current logical time.
    ///
    /// # Panics
    ///
    /// Panics if the source reports a time before the epoch, which means the
    /// source is not monotonic.
    #[must_use]
    #[track_caller]
    pub fn now(&self) -> LogicalTime {
        self.to_logical(self.source.now())
    }

    /// Converts a raw time to logical time.
    ///
    /// # Panics
    ///
    /// Panics when [`checked_to_logical`](Self::checked_to_logical) would
    /// return an error.
    #[must_use]
    #[track_caller]
    pub fn to_logical(&self, raw: RawTime) -> LogicalTime {
        match self.checked_to_logical(raw) {
            Ok(t) => t,
            Err(err) => panic!("{err}"),
        }
    }

    /// Converts a raw time to logical time, reporting unrepresentable values.
    ///
    /// When frozen, any `raw` at or after the freeze point yields the freeze
    /// value. A `raw` before `base` is extrapolated backward and is an error
    /// only if it would precede logical zero.
    pub fn checked_to_logical(&self, raw: RawTime) -> Result<LogicalTime, ClockError> {
        match raw.checked_duration_since(self.base) {
            Some(_) if self.frozen => Ok(LogicalTime(self.offset.nanos())),
            Some(delta) => self
                .offset
                .nanos()
                .checked_add(delta.nanos())
                .map(LogicalTime)
                .ok_or(ClockError::Overflow),
            None => {
                let back = self.base.saturating_duration_since(raw);
                self.offset
                    .nanos()
                    .checked_sub(back.nanos())
                    .map(LogicalTime)
                    .ok_or(ClockError::BeforeEpoch {
                        raw,
                        base: self.base,
                    })
            }
        }
    }

    /// Freezes the clock at `raw`.
    ///
    /// Time between `raw` and the matching [`thaw`](Self::thaw) is not
    /// counted.
    pub fn freeze(&mut self, raw: RawTime) -> Result<(), ClockError> {
        if self.frozen {
            return Err(ClockError::AlreadyFrozen);
        }
        let delta = raw
            .checked_duration_since(self.base)
            .ok_or(ClockError::BeforeBase {
                raw,
                base: self.base,
            })?;
        let offset = self
            .offset
            .nanos()
            .checked_add(delta.nanos())
            .ok_or(ClockError::Overflow)?;

        self.offset = Duration(offset);
        self.base = raw;
        self.frozen = true;
        Ok(())
    }

    /// Thaws the clock at `raw`; counting resumes from the freeze value.
    pub fn thaw(&mut self, raw: RawTime) -> Result<(), ClockError> {
        if !self.frozen {
            return Err(ClockError::NotFrozen);
        }
        if raw < self.base {
            return Err(ClockError::BeforeBase {
                raw,
                base: self.base,
            });
        }

        self.base = raw;
        self.frozen = false;
        Ok(())
    }

    /// Freezes the clock at the source's current reading.
    pub fn freeze_now(&mut self) -> Result<(), ClockError> {
        let raw = self.source.now();
        self.freeze(raw)
    }

    /// Thaws the clock at the source's current reading.
    pub fn thaw_now(&mut self) -> Result<(), ClockError> {
        let raw = self.source.now();
        self.thaw(raw)
    }
}

/// A manually advanced [`TimeSource`] for tests and simulations.
///
/// Clones share the same underlying reading, so a test can keep one handle
/// while a clock owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualSource {
    now: Rc<Cell<RawTime>>,
}

impl ManualSource {
    /// Creates a source reading `start`.
    #[must_use]
    pub fn new(start: RawTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, now: RawTime) {
        self.now.set(now);
    }

    /// Advances the current reading by `by`, saturating.
    pub fn advance(&self, by: Duration) {
        let now = self.now.get();
        self.now.set(RawTime(now.nanos().saturating_add(by.nanos())));
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> RawTime {
        self.now.get()
    }
}
