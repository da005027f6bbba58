// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend state shared by both integration modes.

use std::collections::{BTreeMap, VecDeque};

use oring_core::clock::LogicalClock;
use oring_core::output::{OutputId, OutputRegistry};
use oring_core::submission::{Outcome, SubmissionId};
use oring_core::surface::SurfaceId;
use oring_core::time::LogicalTime;
use oring_core::tracker::{FeedbackMode, SubmissionTracker, TrackerConfig, TrackerError};
use wayland_client::protocol::{wl_callback, wl_output, wl_surface};
use wayland_client::{Dispatch, Proxy, QueueHandle};
use wayland_protocols::wp::presentation_time::client::{wp_presentation, wp_presentation_feedback};

use crate::time::{CLOCK_MONOTONIC_ID, Clock, clock_name};

/// Failures while setting up presentation timing or starting a frame.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// `wp_presentation` was bound but never announced its clock.
    #[error("wp_presentation clock not received")]
    PresentationClockMissing,
    /// The announced presentation clock cannot be read by this process.
    #[error("presentation clock id {id} ({name}) is not supported")]
    UnsupportedClock {
        /// Protocol clock id.
        id: u32,
        /// Its conventional name.
        name: &'static str,
    },
    /// [`WaylandState::init_timing`] was already called.
    #[error("presentation timing is already initialized")]
    AlreadyInitialized,
    /// [`WaylandState::init_timing`] has not been called yet.
    #[error("presentation timing is not initialized")]
    NotInitialized,
    /// The tracker rejected the request.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Backend-owned state for Wayland protocol handling.
///
/// In embedded mode, host application state should contain one of these,
/// implement `AsMut<WaylandState>`, and delegate backend dispatch to it.
#[derive(Debug)]
pub struct WaylandState {
    config: TrackerConfig,
    pub(crate) outputs: OutputRegistry,
    pub(crate) output_proxies: BTreeMap<OutputId, wl_output::WlOutput>,
    pub(crate) presentation: Option<wp_presentation::WpPresentation>,
    pub(crate) presentation_clock: Option<u32>,
    pub(crate) tracker: Option<SubmissionTracker<Clock>>,
    outcomes: VecDeque<Outcome>,
}

impl Default for WaylandState {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl AsMut<Self> for WaylandState {
    fn as_mut(&mut self) -> &mut Self {
        self
    }
}

impl WaylandState {
    /// Creates empty backend state.
    ///
    /// `config.feedback` is overridden by [`init_timing`](Self::init_timing)
    /// depending on whether `wp_presentation` was found.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            outputs: OutputRegistry::new(),
            output_proxies: BTreeMap::new(),
            presentation: None,
            presentation_clock: None,
            tracker: None,
            outcomes: VecDeque::new(),
        }
    }

    /// Selects the raw clock and creates the tracker.
    ///
    /// Call after the initial roundtrips, once globals and the presentation
    /// clock have been announced.
    pub fn init_timing(&mut self) -> Result<(), BackendError> {
        if self.tracker.is_some() {
            return Err(BackendError::AlreadyInitialized);
        }
        let (clock, clk_id, feedback) = match (&self.presentation, self.presentation_clock) {
            (None, _) => (
                Clock::Monotonic,
                CLOCK_MONOTONIC_ID,
                FeedbackMode::FrameCallbacksOnly,
            ),
            (Some(_), None) => return Err(BackendError::PresentationClockMissing),
            (Some(_), Some(clk_id)) => (
                Clock::from_protocol_id(clk_id).ok_or(BackendError::UnsupportedClock {
                    id: clk_id,
                    name: clock_name(clk_id),
                })?,
                clk_id,
                FeedbackMode::PresentationTime,
            ),
        };

        let source = match feedback {
            FeedbackMode::PresentationTime => "presentation clock",
            FeedbackMode::FrameCallbacksOnly => "fallback clock",
        };
        tracing::info!(
            "using {source}, clock id {clk_id} ({})",
            clock_name(clk_id)
        );

        let config = TrackerConfig {
            feedback,
            ..self.config
        };
        self.tracker = Some(SubmissionTracker::new(
            LogicalClock::starting_now(clock),
            config,
        ));
        Ok(())
    }

    /// Returns `true` when `wp_presentation` was bound.
    #[must_use]
    pub fn has_presentation(&self) -> bool {
        self.presentation.is_some()
    }

    /// The outputs announced by the compositor.
    #[must_use]
    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    /// The tracker, once timing is initialized.
    #[must_use]
    pub fn tracker(&self) -> Option<&SubmissionTracker<Clock>> {
        self.tracker.as_ref()
    }

    /// Mutable tracker access, for freeze/thaw and explicit scheduling.
    pub fn tracker_mut(&mut self) -> Option<&mut SubmissionTracker<Clock>> {
        self.tracker.as_mut()
    }

    /// Registers a surface; create the `wl_surface` with the returned id as
    /// its user data.
    pub fn add_surface(&mut self) -> Result<SurfaceId, BackendError> {
        Ok(self.tracker_or_err()?.add_surface())
    }

    /// Starts tracking the next commit of `surface`.
    ///
    /// Requests the frame callback and, when available, presentation
    /// feedback for the upcoming `wl_surface.commit`. Call
    /// [`mark_committed`](Self::mark_committed) right after committing.
    pub fn begin_frame<D>(
        &mut self,
        surface_id: SurfaceId,
        surface: &wl_surface::WlSurface,
        qh: &QueueHandle<D>,
        target_time: Option<LogicalTime>,
    ) -> Result<SubmissionId, BackendError>
    where
        D: Dispatch<wl_callback::WlCallback, SubmissionId>
            + Dispatch<wp_presentation_feedback::WpPresentationFeedback, SubmissionId>
            + 'static,
    {
        let id = self
            .tracker_or_err()?
            .begin_submission(surface_id, target_time)?;
        surface.frame(qh, id);
        if let Some(presentation) = &self.presentation {
            presentation.feedback(surface, qh, id);
        }
        Ok(id)
    }

    /// Records the commit time of a frame started with
    /// [`begin_frame`](Self::begin_frame).
    pub fn mark_committed(&mut self, id: SubmissionId) -> bool {
        self.tracker
            .as_mut()
            .is_some_and(|tracker| tracker.mark_committed(id))
    }

    /// Consumes the pending repaint target of `surface`.
    pub fn take_repaint(&mut self, surface: SurfaceId) -> Option<LogicalTime> {
        self.tracker.as_mut()?.take_repaint(surface)
    }

    /// Drains outcomes finalized since the last call, oldest first.
    pub fn drain_outcomes(&mut self) -> impl Iterator<Item = Outcome> + '_ {
        self.outcomes.drain(..)
    }

    /// Releases in-flight submissions and outputs.
    ///
    /// Returns how many submissions were still pending.
    pub fn shutdown(&mut self) -> usize {
        let pending = self
            .tracker
            .as_mut()
            .map_or(0, SubmissionTracker::shutdown);
        for proxy in std::mem::take(&mut self.output_proxies).into_values() {
            release_output(&proxy);
        }
        self.outputs.clear();
        pending
    }

    pub(crate) fn record(&mut self, outcome: Option<Outcome>) {
        if let Some(outcome) = outcome {
            self.outcomes.push_back(outcome);
        }
    }

    fn tracker_or_err(&mut self) -> Result<&mut SubmissionTracker<Clock>, BackendError> {
        self.tracker.as_mut().ok_or(BackendError::NotInitialized)
    }
}

/// Sends `wl_output.release` where the bound version has it.
pub(crate) fn release_output(proxy: &wl_output::WlOutput) {
    if proxy.version() >= 3 {
        proxy.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_without_presentation_falls_back_to_monotonic() {
        let mut state = WaylandState::default();
        state.init_timing().unwrap();
        let tracker = state.tracker().unwrap();
        assert_eq!(tracker.config().feedback, FeedbackMode::FrameCallbacksOnly);
        assert_eq!(*tracker.clock().source(), Clock::Monotonic);
        assert!(!state.has_presentation());
    }

    #[test]
    fn timing_initializes_once() {
        let mut state = WaylandState::default();
        state.init_timing().unwrap();
        assert!(matches!(
            state.init_timing(),
            Err(BackendError::AlreadyInitialized)
        ));
    }

    #[test]
    fn surfaces_need_timing_first() {
        let mut state = WaylandState::default();
        assert!(matches!(
            state.add_surface(),
            Err(BackendError::NotInitialized)
        ));
        state.init_timing().unwrap();
        let surface = state.add_surface().unwrap();
        assert_eq!(state.take_repaint(surface), None);
    }

    #[test]
    fn error_messages_name_the_clock() {
        let err = BackendError::UnsupportedClock {
            id: 3,
            name: clock_name(3),
        };
        assert_eq!(
            err.to_string(),
            "presentation clock id 3 (CLOCK_THREAD_CPUTIME_ID) is not supported"
        );
        assert_eq!(
            BackendError::PresentationClockMissing.to_string(),
            "wp_presentation clock not received"
        );
    }

    #[test]
    fn drained_outcomes_are_consumed() {
        let mut state = WaylandState::default();
        state.record(None);
        assert_eq!(state.drain_outcomes().count(), 0);
    }
}
