// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Submission tracking and next-frame prediction.
//!
//! [`SubmissionTracker`] owns the registered surfaces, the set of in-flight
//! [`Submission`]s, and the [`LogicalClock`] every signal is stamped with.
//! The display-protocol layer feeds it one signal at a time; each signal is
//! handled to completion before the call returns.
//!
//! # Signal flow
//!
//! ```text
//!   begin_submission ──► mark_committed
//!                              │
//!        ┌─────────────────────┼──────────────────────┐
//!        ▼                     ▼                      ▼
//!   on_draw_done        on_sync_output        on_presented / on_discarded
//!        │ (frame callbacks only)                     │
//!        └───────────────► finalize ◄─────────────────┘
//!                              │
//!                  Outcome + Surface repaint slot
//! ```
//!
//! Every finalizing call returns `Some(Outcome)` exactly once per submission.
//! Signals naming a submission that is no longer active (for example a frame
//! callback that fires after presentation already finalized the frame) are
//! ignored.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use crate::clock::{LogicalClock, TimeSource};
use crate::output::{OutputId, OutputRef};
use crate::repaint::OverwritePolicy;
use crate::submission::{
    Outcome, OutcomeKind, PresentedFeedback, Submission, SubmissionId, SubmissionState,
};
use crate::surface::{Surface, SurfaceId};
use crate::time::{Duration, LogicalTime, RawTime};
use crate::timing::{
    NOMINAL_REFRESH_PERIOD, Prediction, predict_after_draw_done, predict_after_presented,
    resolve_period,
};

/// Which completion signals the display server can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FeedbackMode {
    /// Presentation feedback is available; frames finish on presented or
    /// discarded.
    #[default]
    PresentationTime,
    /// Only drawing-complete callbacks exist; frames finish on draw-done.
    FrameCallbacksOnly,
}

/// Tunables for a [`SubmissionTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Refresh period used when no output or hint reports one.
    pub nominal_period: Duration,
    /// Which completion signals to expect.
    pub feedback: FeedbackMode,
    /// How to resolve a repaint scheduled over a pending one.
    pub overwrite_policy: OverwritePolicy,
}

impl TrackerConfig {
    /// Configuration for a server without presentation feedback.
    #[must_use]
    pub fn frame_callbacks_only() -> Self {
        Self {
            feedback: FeedbackMode::FrameCallbacksOnly,
            ..Self::default()
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            nominal_period: NOMINAL_REFRESH_PERIOD,
            feedback: FeedbackMode::PresentationTime,
            overwrite_policy: OverwritePolicy::Latest,
        }
    }
}

/// Failure to start tracking a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The surface was never registered or was already removed.
    #[error("surface {0:?} is not registered with the tracker")]
    UnknownSurface(SurfaceId),
}

/// Running totals of finalized submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TrackerStats {
    /// Frames confirmed as presented.
    pub presented: u64,
    /// Frames reported as discarded.
    pub discarded: u64,
    /// Frames finished on draw-done alone.
    pub draw_done_only: u64,
    /// Presentation confirmations that arrived before draw-done.
    pub out_of_order: u64,
    /// Signals that named an inactive submission.
    pub stray_signals: u64,
}

/// Owns in-flight submissions and turns their signals into predictions.
#[derive(Debug)]
pub struct SubmissionTracker<S> {
    clock: LogicalClock<S>,
    config: TrackerConfig,
    surfaces: BTreeMap<SurfaceId, Surface>,
    active: BTreeMap<SubmissionId, Submission>,
    next_surface: u32,
    next_submission: u64,
    stats: TrackerStats,
}

impl<S: TimeSource> SubmissionTracker<S> {
    /// Creates a tracker stamping signals with `clock`.
    ///
    /// Without presentation feedback, the accuracy loss is reported once
    /// here rather than per frame.
    #[must_use]
    pub fn new(clock: LogicalClock<S>, config: TrackerConfig) -> Self {
        if config.feedback == FeedbackMode::FrameCallbacksOnly {
            tracing::warn!("presentation feedback unavailable, timings will suffer");
        }
        Self {
            clock,
            config,
            surfaces: BTreeMap::new(),
            active: BTreeMap::new(),
            next_surface: 0,
            next_submission: 0,
            stats: TrackerStats::default(),
        }
    }

    /// The clock used to stamp signals.
    #[must_use]
    pub fn clock(&self) -> &LogicalClock<S> {
        &self.clock
    }

    /// Mutable access to the clock, for freeze and thaw.
    pub fn clock_mut(&mut self) -> &mut LogicalClock<S> {
        &mut self.clock
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Totals of finalized submissions.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    // -- surfaces ---------------------------------------------------------

    /// Registers a new surface.
    pub fn add_surface(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(id, Surface::new(id));
        id
    }

    /// Unregisters a surface, releasing its in-flight submissions without
    /// prediction. Returns how many submissions were released.
    pub fn remove_surface(&mut self, id: SurfaceId) -> usize {
        let Some(mut surface) = self.surfaces.remove(&id) else {
            return 0;
        };
        surface.release_outputs();
        let before = self.active.len();
        self.active.retain(|_, subm| subm.surface != id);
        before - self.active.len()
    }

    /// Looks up a surface.
    #[must_use]
    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Records that `surface` entered `output`.
    pub fn surface_enter_output(&mut self, surface: SurfaceId, output: OutputRef) -> bool {
        self.surfaces
            .get_mut(&surface)
            .is_some_and(|s| s.enter_output(output))
    }

    /// Records that `surface` left `output`.
    pub fn surface_leave_output(&mut self, surface: SurfaceId, output: OutputId) -> bool {
        self.surfaces
            .get_mut(&surface)
            .is_some_and(|s| s.leave_output(output))
    }

    /// Explicitly schedules a repaint for `surface`.
    ///
    /// Used to kick off the first frame before any prediction exists.
    pub fn schedule_repaint(&mut self, surface: SurfaceId, target: LogicalTime) -> bool {
        let policy = self.config.overwrite_policy;
        match self.surfaces.get_mut(&surface) {
            Some(s) => {
                s.schedule_repaint(target, policy);
                true
            }
            None => false,
        }
    }

    /// Consumes the pending repaint target of `surface`, if any.
    pub fn take_repaint(&mut self, surface: SurfaceId) -> Option<LogicalTime> {
        self.surfaces.get_mut(&surface)?.take_repaint()
    }

    // -- submissions ------------------------------------------------------

    /// Starts tracking a frame about to be committed to `surface`.
    ///
    /// `target_time` is the logical time the frame was aimed at, if any.
    pub fn begin_submission(
        &mut self,
        surface: SurfaceId,
        target_time: Option<LogicalTime>,
    ) -> Result<SubmissionId, TrackerError> {
        if !self.surfaces.contains_key(&surface) {
            return Err(TrackerError::UnknownSurface(surface));
        }
        let id = SubmissionId(self.next_submission);
        self.next_submission += 1;
        self.active.insert(id, Submission::new(id, surface, target_time));
        Ok(id)
    }

    /// Records the commit time of a submission; call right after the frame
    /// was handed to the display server.
    pub fn mark_committed(&mut self, id: SubmissionId) -> bool {
        let now = self.clock.now();
        match self.active.get_mut(&id) {
            Some(subm) => {
                subm.commit_time = Some(now);
                true
            }
            None => false,
        }
    }

    /// Looks up an in-flight submission.
    #[must_use]
    pub fn get(&self, id: SubmissionId) -> Option<&Submission> {
        self.active.get(&id)
    }

    /// Number of in-flight submissions.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of in-flight submissions for one surface.
    #[must_use]
    pub fn active_for(&self, surface: SurfaceId) -> usize {
        self.active
            .values()
            .filter(|subm| subm.surface == surface)
            .count()
    }

    /// Handles the drawing-complete signal observed at `raw`.
    ///
    /// Finalizes the submission only in
    /// [`FeedbackMode::FrameCallbacksOnly`].
    ///
    /// If `raw` cannot be placed on the logical timeline the signal is not
    /// recorded. Without presentation feedback the submission still
    /// finalizes, anchored at the current time, so the surface gets a target.
    pub fn on_draw_done(&mut self, id: SubmissionId, raw: RawTime) -> Option<Outcome> {
        let stamped = self.clock.checked_to_logical(raw);
        let feedback = self.config.feedback;
        let subm = self.active_mut(id)?;
        if subm.frame_signal_time.is_some() {
            tracing::debug!(submission = id.0, "duplicate draw-done ignored");
            return None;
        }
        let anchor = match stamped {
            Ok(logical) => {
                subm.frame_signal_time = Some(logical);
                subm.state = SubmissionState::DrawDone;
                logical
            }
            Err(err) if feedback == FeedbackMode::FrameCallbacksOnly => {
                tracing::warn!(
                    submission = id.0,
                    "draw-done timestamp unusable ({err}), predicting from now"
                );
                self.clock.now()
            }
            Err(err) => {
                tracing::warn!(submission = id.0, "dropping draw-done: {err}");
                return None;
            }
        };

        if feedback == FeedbackMode::FrameCallbacksOnly {
            let prediction = self.draw_done_prediction(id, anchor);
            return self.finalize(id, OutcomeKind::DrawDoneOnly, prediction);
        }
        None
    }

    /// Records the output the frame will be shown on; only the first call
    /// per submission is retained.
    pub fn on_sync_output(&mut self, id: SubmissionId, output: OutputRef) -> bool {
        let Some(subm) = self.active_mut(id) else {
            return false;
        };
        if subm.sync_output.is_some() {
            return false;
        }
        subm.sync_output = Some(output);
        true
    }

    /// Handles a presentation confirmation.
    ///
    /// A confirmation that arrives before draw-done is accepted as is.
    pub fn on_presented(
        &mut self,
        id: SubmissionId,
        feedback: PresentedFeedback,
    ) -> Option<Outcome> {
        let stamped = self.clock.checked_to_logical(feedback.raw_time);
        let surface_output = self.surface_output_for(id);

        let subm = self.active_mut(id)?;
        let out_of_order = subm.frame_signal_time.is_none();
        let frame_signal_time = subm.frame_signal_time;
        let sync_output = subm.sync_output.clone();

        if out_of_order {
            tracing::debug!(submission = id.0, "presentation confirmed before draw-done");
            self.stats.out_of_order += 1;
        }

        let prediction = match stamped {
            Ok(presented) => {
                tracing::debug!(
                    submission = id.0,
                    output = sync_output.as_ref().map(|o| o.global_name()),
                    "presented at {:.3} ms",
                    presented.as_millis_f64()
                );
                let (period, source) = resolve_period(
                    feedback.refresh,
                    sync_output.as_deref(),
                    surface_output.as_deref(),
                    self.config.nominal_period,
                );
                predict_after_presented(presented, period, source)
            }
            Err(err) => {
                tracing::warn!(
                    submission = id.0,
                    "presentation timestamp unusable ({err}), predicting from draw-done"
                );
                let anchor = frame_signal_time.unwrap_or_else(|| self.clock.now());
                self.draw_done_prediction(id, anchor)
            }
        };
        let kind = OutcomeKind::Presented {
            presented_time: stamped.ok(),
            refresh: feedback.refresh,
            flags: feedback.flags,
            sequence: feedback.sequence,
        };
        self.finalize(id, kind, prediction)
    }

    /// Handles a discard notice.
    ///
    /// The prediction is anchored at the draw-done time if one was recorded,
    /// otherwise at the current time; never at a presentation time.
    pub fn on_discarded(&mut self, id: SubmissionId) -> Option<Outcome> {
        let now = self.clock.now();
        let subm = self.active_mut(id)?;
        tracing::warn!(submission = id.0, "frame discarded unexpectedly");
        let anchor = subm.frame_signal_time.unwrap_or(now);
        let prediction = self.draw_done_prediction(id, anchor);
        self.finalize(id, OutcomeKind::Discarded, prediction)
    }

    /// Releases every in-flight submission without prediction.
    ///
    /// Returns how many submissions were released.
    pub fn shutdown(&mut self) -> usize {
        let released = self.active.len();
        self.active.clear();
        for surface in self.surfaces.values_mut() {
            surface.release_outputs();
        }
        released
    }

    // -- internals --------------------------------------------------------

    fn active_mut(&mut self, id: SubmissionId) -> Option<&mut Submission> {
        let subm = self.active.get_mut(&id);
        if subm.is_none() {
            tracing::debug!(submission = id.0, "signal for inactive submission ignored");
            self.stats.stray_signals += 1;
        }
        subm
    }

    fn surface_output_for(&self, id: SubmissionId) -> Option<OutputRef> {
        let surface = self.active.get(&id)?.surface;
        self.surfaces.get(&surface)?.current_output().map(Rc::clone)
    }

    fn draw_done_prediction(&self, id: SubmissionId, anchor: LogicalTime) -> Prediction {
        let surface_output = self.surface_output_for(id);
        let (period, source) = resolve_period(
            Duration::ZERO,
            None,
            surface_output.as_deref(),
            self.config.nominal_period,
        );
        predict_after_draw_done(anchor, period, source)
    }

    fn finalize(
        &mut self,
        id: SubmissionId,
        kind: OutcomeKind,
        prediction: Prediction,
    ) -> Option<Outcome> {
        let mut subm = self.active.remove(&id)?;

        match kind {
            OutcomeKind::Presented { .. } => self.stats.presented += 1,
            OutcomeKind::Discarded => self.stats.discarded += 1,
            OutcomeKind::DrawDoneOnly => self.stats.draw_done_only += 1,
        }

        let outcome = Outcome {
            submission: id,
            surface: subm.surface,
            kind,
            target_time: subm.target_time,
            commit_time: subm.commit_time,
            frame_signal_time: subm.frame_signal_time,
            sync_output: subm.sync_output.take().map(|o| o.id()),
            prediction,
        };

        let policy = self.config.overwrite_policy;
        if let Some(surface) = self.surfaces.get_mut(&subm.surface) {
            surface.schedule_repaint(prediction.next_target, policy);
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualSource;
    use crate::output::{OutputRegistry, VideoMode};
    use crate::submission::PresentFlags;
    use crate::timing::{PeriodSource, PredictionBasis};

    struct Fixture {
        source: ManualSource,
        tracker: SubmissionTracker<ManualSource>,
        outputs: OutputRegistry,
        surface: SurfaceId,
    }

    /// Clock epoch at raw 1_000, so logical = raw - 1_000.
    fn fixture(config: TrackerConfig) -> Fixture {
        let source = ManualSource::new(RawTime(1_000));
        let clock = LogicalClock::starting_now(source.clone());
        let mut tracker = SubmissionTracker::new(clock, config);
        let surface = tracker.add_surface();
        Fixture {
            source,
            tracker,
            outputs: OutputRegistry::new(),
            surface,
        }
    }

    fn add_output(fx: &mut Fixture, global: u32, refresh_millihz: u32) -> OutputRef {
        let output = fx.outputs.insert(global);
        output.add_mode(VideoMode {
            width: 1280,
            height: 720,
            refresh_millihz,
            current: true,
            preferred: true,
        });
        output
    }

    fn raw(logical: u64) -> RawTime {
        RawTime(1_000 + logical)
    }

    fn presented(logical: u64, refresh: u64) -> PresentedFeedback {
        PresentedFeedback {
            raw_time: raw(logical),
            refresh: Duration(refresh),
            flags: PresentFlags::VSYNC,
            sequence: 1,
        }
    }

    #[test]
    fn draw_done_only_scenario() {
        let mut fx = fixture(TrackerConfig::frame_callbacks_only());
        let output = add_output(&mut fx, 10, 60_000);
        fx.tracker.surface_enter_output(fx.surface, output);

        let id = fx
            .tracker
            .begin_submission(fx.surface, Some(LogicalTime::ZERO))
            .unwrap();
        fx.source.set(raw(100));
        assert!(fx.tracker.mark_committed(id));
        assert_eq!(fx.tracker.get(id).unwrap().commit_time(), Some(LogicalTime(100)));

        let outcome = fx.tracker.on_draw_done(id, raw(120)).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::DrawDoneOnly);
        assert_eq!(outcome.next_target(), LogicalTime(25_000_120));
        assert_eq!(outcome.prediction.period_source, PeriodSource::SurfaceOutput);
        assert_eq!(outcome.frame_signal_time, Some(LogicalTime(120)));
        assert_eq!(fx.tracker.active_len(), 0);
        assert_eq!(fx.tracker.take_repaint(fx.surface), Some(LogicalTime(25_000_120)));
    }

    #[test]
    fn draw_done_without_output_uses_nominal_period() {
        let mut fx = fixture(TrackerConfig::frame_callbacks_only());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        let outcome = fx.tracker.on_draw_done(id, raw(5_000)).unwrap();
        assert_eq!(outcome.next_target(), LogicalTime(5_000 + 25_000_000));
        assert_eq!(outcome.prediction.period_source, PeriodSource::Nominal);
    }

    #[test]
    fn draw_done_waits_for_feedback_when_available() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        assert_eq!(fx.tracker.on_draw_done(id, raw(50)), None);
        assert_eq!(
            fx.tracker.get(id).map(Submission::state),
            Some(SubmissionState::DrawDone)
        );
        assert_eq!(fx.tracker.take_repaint(fx.surface), None, "no prediction yet");
    }

    #[test]
    fn presented_with_hint_predicts_one_period_later() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_draw_done(id, raw(10));

        let outcome = fx
            .tracker
            .on_presented(id, presented(1_000_000, 6_944_444))
            .unwrap();
        assert_eq!(outcome.next_target(), LogicalTime(1_000_000 + 6_944_444));
        assert_eq!(outcome.prediction.period_source, PeriodSource::FeedbackHint);
        assert_eq!(outcome.prediction.basis, PredictionBasis::Presented);
        assert_eq!(outcome.presented_time(), Some(LogicalTime(1_000_000)));
        assert_eq!(fx.tracker.stats().presented, 1);
    }

    #[test]
    fn presented_without_hint_uses_sync_output_mode() {
        let mut fx = fixture(TrackerConfig::default());
        let sync = add_output(&mut fx, 11, 60_000);
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_draw_done(id, raw(10));
        assert!(fx.tracker.on_sync_output(id, Rc::clone(&sync)));
        assert_eq!(Rc::strong_count(&sync), 3);

        let outcome = fx.tracker.on_presented(id, presented(2_000, 0)).unwrap();
        assert_eq!(outcome.next_target(), LogicalTime(2_000 + 16_666_667));
        assert_eq!(outcome.prediction.period_source, PeriodSource::SyncOutput);
        assert_eq!(outcome.sync_output, Some(sync.id()));
        assert_eq!(
            Rc::strong_count(&sync),
            2,
            "finalization releases the sync output reference"
        );
    }

    #[test]
    fn only_first_sync_output_is_retained() {
        let mut fx = fixture(TrackerConfig::default());
        let first = add_output(&mut fx, 1, 144_000);
        let second = add_output(&mut fx, 2, 60_000);
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();

        assert!(fx.tracker.on_sync_output(id, Rc::clone(&first)));
        assert!(!fx.tracker.on_sync_output(id, Rc::clone(&second)));
        assert_eq!(Rc::strong_count(&second), 2, "rejected output is not held");

        let outcome = fx.tracker.on_presented(id, presented(0, 0)).unwrap();
        assert_eq!(outcome.sync_output, Some(first.id()));
        assert_eq!(outcome.next_target(), LogicalTime(6_944_444));
    }

    #[test]
    fn presented_before_draw_done_is_tolerated() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();

        let outcome = fx.tracker.on_presented(id, presented(500, 1_000)).unwrap();
        assert_eq!(outcome.next_target(), LogicalTime(1_500));
        assert_eq!(fx.tracker.stats().out_of_order, 1);

        // The late frame callback finds nothing to update.
        assert_eq!(fx.tracker.on_draw_done(id, raw(600)), None);
        assert_eq!(fx.tracker.stats().stray_signals, 1);
        assert_eq!(fx.tracker.take_repaint(fx.surface), Some(LogicalTime(1_500)));
    }

    #[test]
    fn discard_after_draw_done_predicts_from_draw_done() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_draw_done(id, raw(300));
        fx.source.set(raw(90_000_000));

        let outcome = fx.tracker.on_discarded(id).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Discarded);
        assert_eq!(outcome.presented_time(), None);
        assert_eq!(outcome.next_target(), LogicalTime(300 + 25_000_000));
        assert_eq!(outcome.prediction.basis, PredictionBasis::DrawDone);
        assert_eq!(fx.tracker.stats().discarded, 1);
    }

    #[test]
    fn discard_without_draw_done_predicts_from_now() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.source.set(raw(7_000));
        let outcome = fx.tracker.on_discarded(id).unwrap();
        assert_eq!(outcome.next_target(), LogicalTime(7_000 + 25_000_000));
    }

    #[test]
    fn terminal_signal_is_processed_once() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        assert!(fx.tracker.on_presented(id, presented(10, 100)).is_some());
        assert!(fx.tracker.on_presented(id, presented(20, 100)).is_none());
        assert!(fx.tracker.on_discarded(id).is_none());
        assert_eq!(fx.tracker.stats().presented, 1);
        assert_eq!(fx.tracker.stats().discarded, 0);
    }

    #[test]
    fn begin_then_terminal_leaves_active_set_unchanged() {
        let mut fx = fixture(TrackerConfig::default());
        let older = fx.tracker.begin_submission(fx.surface, None).unwrap();
        let before = fx.tracker.active_len();

        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_discarded(id);
        assert_eq!(fx.tracker.active_len(), before);
        assert!(fx.tracker.get(older).is_some());
    }

    #[test]
    fn consecutive_outcomes_overwrite_repaint_slot() {
        let mut fx = fixture(TrackerConfig::default());
        let a = fx.tracker.begin_submission(fx.surface, None).unwrap();
        let b = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_presented(a, presented(1_000, 100));
        fx.tracker.on_presented(b, presented(900, 100));

        let surface = fx.tracker.surface(fx.surface).unwrap();
        assert_eq!(surface.repaint().overwrites(), 1);
        assert_eq!(fx.tracker.take_repaint(fx.surface), Some(LogicalTime(1_000)));
    }

    #[test]
    fn coalesce_policy_keeps_later_prediction() {
        let mut fx = fixture(TrackerConfig {
            overwrite_policy: OverwritePolicy::Coalesce,
            ..TrackerConfig::default()
        });
        let a = fx.tracker.begin_submission(fx.surface, None).unwrap();
        let b = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_presented(a, presented(1_000, 100));
        fx.tracker.on_presented(b, presented(900, 100));
        assert_eq!(fx.tracker.take_repaint(fx.surface), Some(LogicalTime(1_100)));
    }

    #[test]
    fn unknown_surface_is_rejected() {
        let mut fx = fixture(TrackerConfig::default());
        assert_eq!(
            fx.tracker.begin_submission(SurfaceId(99), None),
            Err(TrackerError::UnknownSurface(SurfaceId(99)))
        );
    }

    #[test]
    fn presentation_before_epoch_falls_back_to_draw_done() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_draw_done(id, raw(40));

        let mut feedback = presented(0, 100);
        feedback.raw_time = RawTime(10);
        let outcome = fx.tracker.on_presented(id, feedback).unwrap();
        assert_eq!(outcome.presented_time(), None);
        assert_eq!(outcome.prediction.basis, PredictionBasis::DrawDone);
        assert_eq!(outcome.next_target(), LogicalTime(40 + 25_000_000));
    }

    #[test]
    fn draw_done_before_epoch_still_finalizes_without_feedback() {
        let mut fx = fixture(TrackerConfig::frame_callbacks_only());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.source.set(raw(300));

        let outcome = fx.tracker.on_draw_done(id, RawTime(500));
        let outcome = outcome.expect("draw-done must finalize without presentation feedback");
        assert_eq!(outcome.kind, OutcomeKind::DrawDoneOnly);
        assert_eq!(outcome.frame_signal_time, None);
        assert_eq!(outcome.prediction.basis, PredictionBasis::DrawDone);
        assert_eq!(outcome.next_target(), LogicalTime(300 + 25_000_000));
        assert_eq!(fx.tracker.active_len(), 0, "submission must leave the active set");
        assert_eq!(fx.tracker.take_repaint(fx.surface), Some(LogicalTime(300 + 25_000_000)));
    }

    #[test]
    fn draw_done_before_epoch_is_dropped_with_feedback() {
        let mut fx = fixture(TrackerConfig::default());
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();

        assert_eq!(fx.tracker.on_draw_done(id, RawTime(500)), None);
        assert_eq!(fx.tracker.active_len(), 1, "still waiting for feedback");
        let subm = fx.tracker.get(id).unwrap();
        assert_eq!(subm.frame_signal_time(), None);
        assert_eq!(subm.state(), SubmissionState::Pending);
    }

    #[test]
    fn frozen_clock_stamps_freeze_value() {
        let mut fx = fixture(TrackerConfig::frame_callbacks_only());
        fx.tracker.clock_mut().freeze(raw(1_000)).unwrap();
        let id = fx.tracker.begin_submission(fx.surface, None).unwrap();
        let outcome = fx.tracker.on_draw_done(id, raw(50_000)).unwrap();
        assert_eq!(outcome.frame_signal_time, Some(LogicalTime(1_000)));
    }

    #[test]
    fn shutdown_releases_pending_without_prediction() {
        let mut fx = fixture(TrackerConfig::default());
        let output = add_output(&mut fx, 4, 60_000);
        fx.tracker.surface_enter_output(fx.surface, Rc::clone(&output));
        let a = fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.on_sync_output(a, Rc::clone(&output));
        assert_eq!(Rc::strong_count(&output), 4);

        assert_eq!(fx.tracker.shutdown(), 2);
        assert_eq!(fx.tracker.active_len(), 0);
        assert_eq!(fx.tracker.take_repaint(fx.surface), None);
        assert_eq!(Rc::strong_count(&output), 2);
    }

    #[test]
    fn remove_surface_drops_its_submissions() {
        let mut fx = fixture(TrackerConfig::default());
        let other = fx.tracker.add_surface();
        fx.tracker.begin_submission(fx.surface, None).unwrap();
        fx.tracker.begin_submission(other, None).unwrap();

        assert_eq!(fx.tracker.remove_surface(fx.surface), 1);
        assert_eq!(fx.tracker.active_for(other), 1);
        assert_eq!(fx.tracker.remove_surface(fx.surface), 0);
    }
}
