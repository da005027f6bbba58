// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Logical
//! times are printed in milliseconds.

use std::io::Write;

use oring_core::time::LogicalTime;
use oring_core::timing::{PeriodSource, PredictionBasis};
use oring_core::trace::{
    ClockEvent, ClockTransition, CommitEvent, DrawDoneEvent, OutcomeEvent, OutcomeTag,
    SubmissionBegunEvent, SyncOutputEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: LogicalTime) -> f64 {
    t.as_millis_f64()
}

fn opt_ms(t: Option<LogicalTime>) -> String {
    t.map_or_else(|| "-".into(), |t| format!("{:.3}ms", ms(t)))
}

fn tag_name(tag: OutcomeTag) -> &'static str {
    match tag {
        OutcomeTag::Presented => "presented",
        OutcomeTag::Discarded => "discarded",
        OutcomeTag::DrawDoneOnly => "draw-done",
    }
}

fn source_name(source: PeriodSource) -> &'static str {
    match source {
        PeriodSource::FeedbackHint => "hint",
        PeriodSource::SyncOutput => "sync-output",
        PeriodSource::SurfaceOutput => "surface-output",
        PeriodSource::Nominal => "nominal",
    }
}

fn basis_name(basis: PredictionBasis) -> &'static str {
    match basis {
        PredictionBasis::Presented => "P",
        PredictionBasis::DrawDone => "D",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_submission_begun(&mut self, e: &SubmissionBegunEvent) {
        let _ = writeln!(
            self.writer,
            "[begin] submission={} surface={} target={} at {:.3}ms",
            e.submission.0,
            e.surface.0,
            opt_ms(e.target_time),
            ms(e.at),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] submission={} at {:.3}ms",
            e.submission.0,
            ms(e.at),
        );
    }

    fn on_draw_done(&mut self, e: &DrawDoneEvent) {
        let _ = writeln!(
            self.writer,
            "[draw-done] submission={} at {:.3}ms",
            e.submission.0,
            ms(e.at),
        );
    }

    fn on_sync_output(&mut self, e: &SyncOutputEvent) {
        let _ = writeln!(
            self.writer,
            "[sync-output] submission={} output={}",
            e.submission.0, e.output.0,
        );
    }

    fn on_outcome(&mut self, e: &OutcomeEvent) {
        let error = e
            .target_error()
            .map_or_else(|| "-".into(), |ns| format!("{ns}ns"));
        let _ = writeln!(
            self.writer,
            "[outcome] submission={} {} presented={} error={error} \
             next={:.3}ms period={}ns ({}, {})",
            e.submission.0,
            tag_name(e.tag),
            opt_ms(e.presented_time),
            ms(e.next_target),
            e.period.nanos(),
            source_name(e.period_source),
            basis_name(e.basis),
        );
    }

    fn on_clock(&mut self, e: &ClockEvent) {
        let what = match e.transition {
            ClockTransition::Freeze => "freeze",
            ClockTransition::Thaw => "thaw",
        };
        let _ = writeln!(
            self.writer,
            "[clock] {what} raw={} logical={:.3}ms",
            e.raw.nanos(),
            ms(e.logical),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oring_core::submission::{PresentFlags, SubmissionId};
    use oring_core::surface::SurfaceId;
    use oring_core::time::{Duration, RawTime};

    #[test]
    fn pretty_print_outcome() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_outcome(&OutcomeEvent {
            submission: SubmissionId(4),
            surface: SurfaceId(1),
            tag: OutcomeTag::Presented,
            target_time: Some(LogicalTime(16_000_000)),
            commit_time: Some(LogicalTime(1_000_000)),
            frame_signal_time: None,
            presented_time: Some(LogicalTime(16_500_000)),
            flags: PresentFlags::VSYNC,
            next_target: LogicalTime(33_166_667),
            period: Duration(16_666_667),
            period_source: PeriodSource::FeedbackHint,
            basis: PredictionBasis::Presented,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[outcome]"), "got: {output}");
        assert!(output.contains("submission=4 presented"), "got: {output}");
        assert!(output.contains("error=500000ns"), "got: {output}");
        assert!(output.contains("(hint, P)"), "got: {output}");
    }

    #[test]
    fn pretty_print_clock() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_clock(&ClockEvent {
            transition: ClockTransition::Freeze,
            raw: RawTime(5_000),
            logical: LogicalTime(2_000_000),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[clock] freeze raw=5000 logical=2.000ms\n");
    }
}
