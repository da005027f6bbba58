// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for submission lifecycles.
//!
//! This module provides a [`TraceSink`] trait with one method per lifecycle
//! event. Instrumentation calls them as submissions move through the
//! tracker. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! The tracker itself does not trace; callers forward what it returns, for
//! example `tracer.outcome(&OutcomeEvent::from(&outcome))`.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::output::OutputId;
use crate::submission::{Outcome, OutcomeKind, PresentFlags, SubmissionId};
use crate::surface::SurfaceId;
use crate::time::{Duration, LogicalTime, RawTime};
use crate::timing::{PeriodSource, PredictionBasis};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which terminal path a submission took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeTag {
    /// Confirmed presentation.
    Presented,
    /// Discard notice.
    Discarded,
    /// Finished on draw-done alone.
    DrawDoneOnly,
}

/// Direction of a clock pause transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockTransition {
    /// Counting stopped.
    Freeze,
    /// Counting resumed.
    Thaw,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a submission starts being tracked.
#[derive(Clone, Copy, Debug)]
pub struct SubmissionBegunEvent {
    /// The new submission.
    pub submission: SubmissionId,
    /// Its surface.
    pub surface: SurfaceId,
    /// The time the frame was aimed at, if any.
    pub target_time: Option<LogicalTime>,
    /// Logical time of the call.
    pub at: LogicalTime,
}

/// Emitted when a submission is committed.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// The submission.
    pub submission: SubmissionId,
    /// Commit time.
    pub at: LogicalTime,
}

/// Emitted when the drawing-complete signal arrives.
#[derive(Clone, Copy, Debug)]
pub struct DrawDoneEvent {
    /// The submission.
    pub submission: SubmissionId,
    /// Signal time.
    pub at: LogicalTime,
}

/// Emitted when a sync output is recorded.
#[derive(Clone, Copy, Debug)]
pub struct SyncOutputEvent {
    /// The submission.
    pub submission: SubmissionId,
    /// The output it is synchronized to.
    pub output: OutputId,
    /// Logical time the event was handled.
    pub at: LogicalTime,
}

/// Emitted once per finalized submission.
#[derive(Clone, Copy, Debug)]
pub struct OutcomeEvent {
    /// The submission.
    pub submission: SubmissionId,
    /// Its surface.
    pub surface: SurfaceId,
    /// Terminal path.
    pub tag: OutcomeTag,
    /// Aimed-at time, if any.
    pub target_time: Option<LogicalTime>,
    /// Commit time, if recorded.
    pub commit_time: Option<LogicalTime>,
    /// Draw-done time, if recorded.
    pub frame_signal_time: Option<LogicalTime>,
    /// Logical presentation time, for presented outcomes.
    pub presented_time: Option<LogicalTime>,
    /// Presentation flags; empty unless presented.
    pub flags: PresentFlags,
    /// Predicted target for the next frame.
    pub next_target: LogicalTime,
    /// Period used for the prediction.
    pub period: Duration,
    /// Where the period came from.
    pub period_source: PeriodSource,
    /// Which signal anchored the prediction.
    pub basis: PredictionBasis,
}

impl From<&Outcome> for OutcomeEvent {
    fn from(outcome: &Outcome) -> Self {
        let (tag, flags) = match outcome.kind {
            OutcomeKind::Presented { flags, .. } => (OutcomeTag::Presented, flags),
            OutcomeKind::Discarded => (OutcomeTag::Discarded, PresentFlags::default()),
            OutcomeKind::DrawDoneOnly => (OutcomeTag::DrawDoneOnly, PresentFlags::default()),
        };
        Self {
            submission: outcome.submission,
            surface: outcome.surface,
            tag,
            target_time: outcome.target_time,
            commit_time: outcome.commit_time,
            frame_signal_time: outcome.frame_signal_time,
            presented_time: outcome.presented_time(),
            flags,
            next_target: outcome.next_target(),
            period: outcome.prediction.period,
            period_source: outcome.prediction.period_source,
            basis: outcome.prediction.basis,
        }
    }
}

impl OutcomeEvent {
    /// Signed presentation error against the aimed target, positive when
    /// late.
    #[must_use]
    pub fn target_error(&self) -> Option<i64> {
        Some(self.presented_time?.signed_delta(self.target_time?))
    }
}

/// Emitted when the logical clock is frozen or thawed.
#[derive(Clone, Copy, Debug)]
pub struct ClockEvent {
    /// Freeze or thaw.
    pub transition: ClockTransition,
    /// Raw time of the transition.
    pub raw: RawTime,
    /// Logical time at the transition.
    pub logical: LogicalTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives submission lifecycle events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a submission starts being tracked.
    fn on_submission_begun(&mut self, e: &SubmissionBegunEvent) {
        _ = e;
    }

    /// Called when a submission is committed.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a drawing-complete signal is recorded.
    fn on_draw_done(&mut self, e: &DrawDoneEvent) {
        _ = e;
    }

    /// Called when a sync output is recorded.
    fn on_sync_output(&mut self, e: &SyncOutputEvent) {
        _ = e;
    }

    /// Called once per finalized submission.
    fn on_outcome(&mut self, e: &OutcomeEvent) {
        _ = e;
    }

    /// Called on clock freeze and thaw.
    fn on_clock(&mut self, e: &ClockEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! tracer_methods {
    ($($(#[$doc:meta])* $name:ident => $sink_fn:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self, e: &$ty) {
                #[cfg(feature = "trace")]
                if let Some(s) = &mut self.sink {
                    s.$sink_fn(e);
                }
                #[cfg(not(feature = "trace"))]
                {
                    _ = e;
                }
            }
        )*
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    tracer_methods! {
        /// Emits a [`SubmissionBegunEvent`].
        submission_begun => on_submission_begun(SubmissionBegunEvent);
        /// Emits a [`CommitEvent`].
        commit => on_commit(CommitEvent);
        /// Emits a [`DrawDoneEvent`].
        draw_done => on_draw_done(DrawDoneEvent);
        /// Emits a [`SyncOutputEvent`].
        sync_output => on_sync_output(SyncOutputEvent);
        /// Emits an [`OutcomeEvent`].
        outcome => on_outcome(OutcomeEvent);
        /// Emits a [`ClockEvent`].
        clock => on_clock(ClockEvent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
