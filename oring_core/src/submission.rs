// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame submission records and their terminal outcomes.
//!
//! A [`Submission`] follows one committed frame until the display server
//! reports what happened to it:
//!
//! ```text
//!   Pending ──draw-done──► DrawDone ──presented──► Presented ─┐
//!      │                      │  └────discarded──► Discarded ─┤
//!      │                      └─(no feedback facility)────────┤──► Finished
//!      └──presented / discarded (out of order, tolerated)─────┘
//! ```
//!
//! Only `Pending` and `DrawDone` are observable on a [`Submission`]. A
//! terminal signal finishes the submission in the same call: the tracker
//! removes the record from its active set, which releases its sync-output
//! reference, and returns an [`Outcome`] whose [`OutcomeKind`] names the
//! terminal path. The presentation time and refresh hint live on
//! [`OutcomeKind::Presented`].

use core::fmt;

use crate::output::{OutputId, OutputRef};
use crate::surface::SurfaceId;
use crate::time::{Duration, LogicalTime};
use crate::timing::Prediction;

/// Unique identity for one committed frame.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionId(pub u64);

impl fmt::Debug for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubmissionId({})", self.0)
    }
}

/// Lifecycle position of an active submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    /// Committed, no signal received yet.
    Pending,
    /// The drawing-complete signal arrived; waiting for presentation
    /// feedback.
    DrawDone,
}

/// `wp_presentation_feedback.kind` flags reported with a presentation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PresentFlags(pub u32);

impl PresentFlags {
    /// Presentation was synchronized to the vertical retrace.
    pub const VSYNC: Self = Self(0x1);
    /// The timestamp comes from a hardware clock.
    pub const HW_CLOCK: Self = Self(0x2);
    /// Completion was signalled by hardware.
    pub const HW_COMPLETION: Self = Self(0x4);
    /// The buffer was scanned out directly.
    pub const ZERO_COPY: Self = Self(0x8);

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for PresentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PresentFlags, &str); 4] = [
            (PresentFlags::VSYNC, "VSYNC"),
            (PresentFlags::HW_CLOCK, "HW_CLOCK"),
            (PresentFlags::HW_COMPLETION, "HW_COMPLETION"),
            (PresentFlags::ZERO_COPY, "ZERO_COPY"),
        ];
        write!(f, "PresentFlags(")?;
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, ")")
    }
}

/// One in-flight frame.
#[derive(Debug)]
pub struct Submission {
    pub(crate) id: SubmissionId,
    pub(crate) surface: SurfaceId,
    pub(crate) target_time: Option<LogicalTime>,
    pub(crate) commit_time: Option<LogicalTime>,
    pub(crate) frame_signal_time: Option<LogicalTime>,
    pub(crate) sync_output: Option<OutputRef>,
    pub(crate) state: SubmissionState,
}

impl Submission {
    pub(crate) fn new(
        id: SubmissionId,
        surface: SurfaceId,
        target_time: Option<LogicalTime>,
    ) -> Self {
        Self {
            id,
            surface,
            target_time,
            commit_time: None,
            frame_signal_time: None,
            sync_output: None,
            state: SubmissionState::Pending,
        }
    }

    /// Identity of this submission.
    #[must_use]
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// The surface the frame was committed to.
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The logical time the frame was aimed at.
    #[must_use]
    pub fn target_time(&self) -> Option<LogicalTime> {
        self.target_time
    }

    /// When the frame was handed to the display server.
    #[must_use]
    pub fn commit_time(&self) -> Option<LogicalTime> {
        self.commit_time
    }

    /// When the drawing-complete signal arrived.
    #[must_use]
    pub fn frame_signal_time(&self) -> Option<LogicalTime> {
        self.frame_signal_time
    }

    /// The output the frame is expected to appear on.
    #[must_use]
    pub fn sync_output(&self) -> Option<&OutputRef> {
        self.sync_output.as_ref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state
    }
}

/// Details of a presentation confirmation, as carried by the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PresentedFeedback {
    /// Presentation timestamp on the raw clock.
    pub raw_time: crate::time::RawTime,
    /// Refresh interval hint, zero if unknown.
    pub refresh: Duration,
    /// Quality flags.
    pub flags: PresentFlags,
    /// Vertical retrace counter, zero if unavailable.
    pub sequence: u64,
}

/// How a submission ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// The frame was shown.
    Presented {
        /// Logical presentation time; `None` if the server's timestamp could
        /// not be placed on the logical timeline.
        presented_time: Option<LogicalTime>,
        /// Refresh interval hint from the server, zero if unknown.
        refresh: Duration,
        /// Quality flags.
        flags: PresentFlags,
        /// Vertical retrace counter.
        sequence: u64,
    },
    /// The frame was never shown.
    Discarded,
    /// Only the drawing-complete signal is available for this frame.
    DrawDoneOnly,
}

/// The terminal result of one submission.
///
/// Each finalized submission yields exactly one `Outcome`; its
/// [`next_target`](Self::next_target) is also written to the surface's repaint
/// slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Outcome {
    /// The submission that ended.
    pub submission: SubmissionId,
    /// Its surface.
    pub surface: SurfaceId,
    /// How it ended.
    pub kind: OutcomeKind,
    /// The time it was aimed at.
    pub target_time: Option<LogicalTime>,
    /// When it was committed.
    pub commit_time: Option<LogicalTime>,
    /// When its drawing-complete signal arrived.
    pub frame_signal_time: Option<LogicalTime>,
    /// The sync output recorded for it, if any.
    pub sync_output: Option<OutputId>,
    /// Prediction for the next frame.
    pub prediction: Prediction,
}

impl Outcome {
    /// The predicted target time of the next frame.
    #[must_use]
    pub fn next_target(&self) -> LogicalTime {
        self.prediction.next_target
    }

    /// The logical presentation time, for presented outcomes.
    #[must_use]
    pub fn presented_time(&self) -> Option<LogicalTime> {
        match self.kind {
            OutcomeKind::Presented { presented_time, .. } => presented_time,
            OutcomeKind::Discarded | OutcomeKind::DrawDoneOnly => None,
        }
    }

    /// Time from commit to presentation.
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        Some(self.presented_time()?.saturating_duration_since(self.commit_time?))
    }

    /// Signed error between the actual presentation and the aimed target,
    /// positive when the frame was late.
    #[must_use]
    pub fn target_error(&self) -> Option<i64> {
        Some(self.presented_time()?.signed_delta(self.target_time?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{PeriodSource, PredictionBasis};
    use alloc::format;

    fn outcome(kind: OutcomeKind) -> Outcome {
        Outcome {
            submission: SubmissionId(1),
            surface: SurfaceId(0),
            kind,
            target_time: Some(LogicalTime(1_000)),
            commit_time: Some(LogicalTime(400)),
            frame_signal_time: None,
            sync_output: None,
            prediction: Prediction {
                next_target: LogicalTime(2_000),
                period: Duration(1_000),
                period_source: PeriodSource::Nominal,
                basis: PredictionBasis::Presented,
            },
        }
    }

    #[test]
    fn flags_debug_lists_set_bits() {
        let flags = PresentFlags(PresentFlags::VSYNC.0 | PresentFlags::ZERO_COPY.0);
        assert_eq!(format!("{flags:?}"), "PresentFlags(VSYNC | ZERO_COPY)");
        assert_eq!(format!("{:?}", PresentFlags::default()), "PresentFlags()");
        assert!(flags.contains(PresentFlags::VSYNC));
        assert!(!flags.contains(PresentFlags::HW_CLOCK));
    }

    #[test]
    fn presented_outcome_reports_latency_and_error() {
        let o = outcome(OutcomeKind::Presented {
            presented_time: Some(LogicalTime(1_250)),
            refresh: Duration(1_000),
            flags: PresentFlags::VSYNC,
            sequence: 9,
        });
        assert_eq!(o.latency(), Some(Duration(850)));
        assert_eq!(o.target_error(), Some(250));
        assert_eq!(o.next_target(), LogicalTime(2_000));
    }

    #[test]
    fn discarded_outcome_has_no_presentation_diagnostics() {
        let o = outcome(OutcomeKind::Discarded);
        assert_eq!(o.presented_time(), None);
        assert_eq!(o.latency(), None);
        assert_eq!(o.target_error(), None);
    }

    #[test]
    fn new_submission_is_pending_and_unset() {
        let s = Submission::new(SubmissionId(3), SurfaceId(1), None);
        assert_eq!(s.state(), SubmissionState::Pending);
        assert_eq!(s.commit_time(), None);
        assert!(s.sync_output().is_none());
    }
}
