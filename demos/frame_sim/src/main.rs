// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated compositor that exercises submission tracking and diagnostics.
//!
//! Runs two sessions against a [`ManualSource`]:
//!
//! 1. A server with presentation feedback: frames are synchronized to a
//!    60 Hz output, some confirmations carry a refresh hint, every seventh
//!    frame is discarded, and the clock is paused once mid-run.
//! 2. A server with frame callbacks only: frames finish on draw-done and
//!    predictions fall back to the nominal period.
//!
//! Events go to both a [`PrettyPrintSink`] on stdout and a [`RecorderSink`];
//! the recording is exported to `trace.json` in Chrome trace format.
//! Set `RUST_LOG=debug` to see the tracker's own log lines.

use std::fs::File;
use std::io::{BufWriter, Write};

use oring_core::clock::{LogicalClock, ManualSource, TimeSource};
use oring_core::output::{OutputRef, OutputRegistry, VideoMode};
use oring_core::submission::{PresentFlags, PresentedFeedback, SubmissionId};
use oring_core::surface::SurfaceId;
use oring_core::time::{Duration, LogicalTime, RawTime};
use oring_core::trace::{
    ClockEvent, ClockTransition, CommitEvent, DrawDoneEvent, OutcomeEvent, SubmissionBegunEvent,
    SyncOutputEvent, TraceSink, Tracer,
};
use oring_core::tracker::{SubmissionTracker, TrackerConfig};

use oring_debug::pretty::PrettyPrintSink;
use oring_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 30;
const CALLBACK_FRAME_COUNT: u64 = 8;
/// Raw clock reading when each session starts (1s).
const START: RawTime = RawTime(1_000_000_000);
/// 60 Hz in millihertz.
const REFRESH_MILLIHZ: u32 = 60_000;
const REFRESH_HINT: Duration = Duration(16_666_667);
const RENDER_TIME: Duration = Duration::from_millis(3);
/// Time between commit and the compositor's repaint.
const COMPOSITOR_DELAY: Duration = Duration::from_millis(6);
/// Time between the compositor's repaint and scanout.
const SCANOUT_DELAY: Duration = Duration::from_millis(2);
const DISCARD_EVERY: u64 = 7;
const PAUSE_AT: u64 = 12;
const PAUSE_LENGTH: Duration = Duration::from_millis(250);

/// Forwards every event to both sinks.
struct Sinks {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Sinks {
    fn on_submission_begun(&mut self, e: &SubmissionBegunEvent) {
        self.pretty.on_submission_begun(e);
        self.recorder.on_submission_begun(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.pretty.on_commit(e);
        self.recorder.on_commit(e);
    }

    fn on_draw_done(&mut self, e: &DrawDoneEvent) {
        self.pretty.on_draw_done(e);
        self.recorder.on_draw_done(e);
    }

    fn on_sync_output(&mut self, e: &SyncOutputEvent) {
        self.pretty.on_sync_output(e);
        self.recorder.on_sync_output(e);
    }

    fn on_outcome(&mut self, e: &OutcomeEvent) {
        self.pretty.on_outcome(e);
        self.recorder.on_outcome(e);
    }

    fn on_clock(&mut self, e: &ClockEvent) {
        self.pretty.on_clock(e);
        self.recorder.on_clock(e);
    }
}

/// One simulated client: a tracker on a manual clock with a single surface.
struct Session {
    source: ManualSource,
    tracker: SubmissionTracker<ManualSource>,
    surface: SurfaceId,
}

impl Session {
    fn new(config: TrackerConfig) -> Self {
        let source = ManualSource::new(START);
        let mut tracker = SubmissionTracker::new(LogicalClock::new(source.clone(), START), config);
        let surface = tracker.add_surface();
        Self {
            source,
            tracker,
            surface,
        }
    }

    fn now(&self) -> LogicalTime {
        self.tracker.clock().now()
    }

    /// Starts and commits one frame aimed at `target`.
    fn submit(
        &mut self,
        tracer: &mut Tracer<'_>,
        target: Option<LogicalTime>,
    ) -> Option<SubmissionId> {
        let id = match self.tracker.begin_submission(self.surface, target) {
            Ok(id) => id,
            Err(err) => {
                tracing::error!("cannot start frame: {err}");
                return None;
            }
        };
        tracer.submission_begun(&SubmissionBegunEvent {
            submission: id,
            surface: self.surface,
            target_time: target,
            at: self.now(),
        });

        self.source.advance(RENDER_TIME);
        self.tracker.mark_committed(id);
        tracer.commit(&CommitEvent {
            submission: id,
            at: self.now(),
        });
        Some(id)
    }

    /// Waits until the predicted target, if there is one.
    fn wait_for(&self, target: Option<LogicalTime>) {
        if let Some(target) = target {
            self.source
                .advance(target.saturating_duration_since(self.now()));
        }
    }

    fn pause(&mut self, tracer: &mut Tracer<'_>) {
        let raw = self.source.now();
        if let Err(err) = self.tracker.clock_mut().freeze(raw) {
            tracing::warn!("freeze failed: {err}");
            return;
        }
        tracer.clock(&ClockEvent {
            transition: ClockTransition::Freeze,
            raw,
            logical: self.now(),
        });

        self.source.advance(PAUSE_LENGTH);

        let raw = self.source.now();
        if let Err(err) = self.tracker.clock_mut().thaw(raw) {
            tracing::warn!("thaw failed: {err}");
            return;
        }
        tracer.clock(&ClockEvent {
            transition: ClockTransition::Thaw,
            raw,
            logical: self.now(),
        });
    }
}

fn sixty_hz_output(outputs: &mut OutputRegistry) -> OutputRef {
    let output = outputs.insert(1);
    output.update_info(|info| {
        info.make = "Sim".into();
        info.model = "Panel".into();
    });
    output.add_mode(VideoMode {
        width: 1920,
        height: 1080,
        refresh_millihz: REFRESH_MILLIHZ,
        current: true,
        preferred: true,
    });
    output.mark_done();
    output
}

fn run_presentation_time(tracer: &mut Tracer<'_>) {
    let mut session = Session::new(TrackerConfig::default());
    let mut outputs = OutputRegistry::new();
    let output = sixty_hz_output(&mut outputs);
    session
        .tracker
        .surface_enter_output(session.surface, output.clone());

    let mut target = None;
    for frame in 0..FRAME_COUNT {
        if frame == PAUSE_AT {
            session.pause(tracer);
        }
        let Some(id) = session.submit(tracer, target) else {
            return;
        };

        session.source.advance(COMPOSITOR_DELAY);
        let raw = session.source.now();
        session.tracker.on_draw_done(id, raw);
        tracer.draw_done(&DrawDoneEvent {
            submission: id,
            at: session.now(),
        });

        let outcome = if frame % DISCARD_EVERY == DISCARD_EVERY - 1 {
            session.tracker.on_discarded(id)
        } else {
            session.tracker.on_sync_output(id, output.clone());
            tracer.sync_output(&SyncOutputEvent {
                submission: id,
                output: output.id(),
                at: session.now(),
            });
            session.source.advance(SCANOUT_DELAY);
            // Odd frames come without a hint so the sync output's mode is used.
            let refresh = if frame % 2 == 0 {
                REFRESH_HINT
            } else {
                Duration::ZERO
            };
            session.tracker.on_presented(
                id,
                PresentedFeedback {
                    raw_time: session.source.now(),
                    refresh,
                    flags: PresentFlags(PresentFlags::VSYNC.0 | PresentFlags::HW_CLOCK.0),
                    sequence: frame,
                },
            )
        };
        if let Some(outcome) = &outcome {
            tracer.outcome(&OutcomeEvent::from(outcome));
        }

        target = session.tracker.take_repaint(session.surface);
        session.wait_for(target);
    }

    let stats = session.tracker.stats();
    tracing::info!(
        presented = stats.presented,
        discarded = stats.discarded,
        out_of_order = stats.out_of_order,
        "presentation-time session finished"
    );
    session.tracker.shutdown();
    outputs.withdraw(output.global_name());
}

fn run_frame_callbacks_only(tracer: &mut Tracer<'_>) {
    let mut session = Session::new(TrackerConfig::frame_callbacks_only());

    let mut target = None;
    for _ in 0..CALLBACK_FRAME_COUNT {
        let Some(id) = session.submit(tracer, target) else {
            return;
        };
        session.source.advance(COMPOSITOR_DELAY);
        let raw = session.source.now();
        let outcome = session.tracker.on_draw_done(id, raw);
        tracer.draw_done(&DrawDoneEvent {
            submission: id,
            at: session.now(),
        });
        if let Some(outcome) = &outcome {
            tracer.outcome(&OutcomeEvent::from(outcome));
        }

        target = session.tracker.take_repaint(session.surface);
        session.wait_for(target);
    }

    let stats = session.tracker.stats();
    tracing::info!(
        draw_done_only = stats.draw_done_only,
        "frame-callback session finished"
    );
    session.tracker.shutdown();
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut sinks = Sinks {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: RecorderSink::new(),
    };

    {
        let mut tracer = Tracer::new(&mut sinks);
        run_presentation_time(&mut tracer);
        run_frame_callbacks_only(&mut tracer);
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    oring_debug::chrome::export(sinks.recorder.as_bytes(), &mut writer)?;
    writer.flush()?;

    println!("Wrote {path} ({} frames)", FRAME_COUNT + CALLBACK_FRAME_COUNT);
    Ok(())
}
