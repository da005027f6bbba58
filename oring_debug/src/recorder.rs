// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use oring_core::output::OutputId;
use oring_core::submission::{PresentFlags, SubmissionId};
use oring_core::surface::SurfaceId;
use oring_core::time::{Duration, LogicalTime, RawTime};
use oring_core::timing::{PeriodSource, PredictionBasis};
use oring_core::trace::{
    ClockEvent, ClockTransition, CommitEvent, DrawDoneEvent, OutcomeEvent, OutcomeTag,
    SubmissionBegunEvent, SyncOutputEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SUBMISSION_BEGUN: u8 = 1;
const TAG_COMMIT: u8 = 2;
const TAG_DRAW_DONE: u8 = 3;
const TAG_SYNC_OUTPUT: u8 = 4;
const TAG_OUTCOME: u8 = 5;
const TAG_CLOCK: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_time(&mut self, v: Option<LogicalTime>) {
        match v {
            Some(t) => {
                self.write_u8(1);
                self.write_u64(t.nanos());
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_tag(&mut self, tag: OutcomeTag) {
        self.write_u8(match tag {
            OutcomeTag::Presented => 0,
            OutcomeTag::Discarded => 1,
            OutcomeTag::DrawDoneOnly => 2,
        });
    }

    fn write_period_source(&mut self, source: PeriodSource) {
        self.write_u8(match source {
            PeriodSource::FeedbackHint => 0,
            PeriodSource::SyncOutput => 1,
            PeriodSource::SurfaceOutput => 2,
            PeriodSource::Nominal => 3,
        });
    }

    fn write_basis(&mut self, basis: PredictionBasis) {
        self.write_u8(match basis {
            PredictionBasis::Presented => 0,
            PredictionBasis::DrawDone => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_submission_begun(&mut self, e: &SubmissionBegunEvent) {
        self.write_u8(TAG_SUBMISSION_BEGUN);
        self.write_u64(e.submission.0);
        self.write_u32(e.surface.0);
        self.write_option_time(e.target_time);
        self.write_u64(e.at.nanos());
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.submission.0);
        self.write_u64(e.at.nanos());
    }

    fn on_draw_done(&mut self, e: &DrawDoneEvent) {
        self.write_u8(TAG_DRAW_DONE);
        self.write_u64(e.submission.0);
        self.write_u64(e.at.nanos());
    }

    fn on_sync_output(&mut self, e: &SyncOutputEvent) {
        self.write_u8(TAG_SYNC_OUTPUT);
        self.write_u64(e.submission.0);
        self.write_u32(e.output.0);
        self.write_u64(e.at.nanos());
    }

    fn on_outcome(&mut self, e: &OutcomeEvent) {
        self.write_u8(TAG_OUTCOME);
        self.write_u64(e.submission.0);
        self.write_u32(e.surface.0);
        self.write_tag(e.tag);
        self.write_option_time(e.target_time);
        self.write_option_time(e.commit_time);
        self.write_option_time(e.frame_signal_time);
        self.write_option_time(e.presented_time);
        self.write_u32(e.flags.0);
        self.write_u64(e.next_target.nanos());
        self.write_u64(e.period.nanos());
        self.write_period_source(e.period_source);
        self.write_basis(e.basis);
    }

    fn on_clock(&mut self, e: &ClockEvent) {
        self.write_u8(TAG_CLOCK);
        self.write_u8(match e.transition {
            ClockTransition::Freeze => 0,
            ClockTransition::Thaw => 1,
        });
        self.write_u64(e.raw.nanos());
        self.write_u64(e.logical.nanos());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SubmissionBegunEvent`].
    SubmissionBegun(SubmissionBegunEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`DrawDoneEvent`].
    DrawDone(DrawDoneEvent),
    /// A [`SyncOutputEvent`].
    SyncOutput(SyncOutputEvent),
    /// An [`OutcomeEvent`].
    Outcome(OutcomeEvent),
    /// A [`ClockEvent`].
    Clock(ClockEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_time(&mut self) -> Option<LogicalTime> {
        self.read_u64().map(LogicalTime)
    }

    fn read_option_time(&mut self) -> Option<Option<LogicalTime>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some((present != 0).then_some(LogicalTime(val)))
    }

    fn read_tag(&mut self) -> Option<OutcomeTag> {
        Some(match self.read_u8()? {
            0 => OutcomeTag::Presented,
            1 => OutcomeTag::Discarded,
            _ => OutcomeTag::DrawDoneOnly,
        })
    }

    fn read_period_source(&mut self) -> Option<PeriodSource> {
        Some(match self.read_u8()? {
            0 => PeriodSource::FeedbackHint,
            1 => PeriodSource::SyncOutput,
            2 => PeriodSource::SurfaceOutput,
            _ => PeriodSource::Nominal,
        })
    }

    fn read_basis(&mut self) -> Option<PredictionBasis> {
        Some(match self.read_u8()? {
            0 => PredictionBasis::Presented,
            _ => PredictionBasis::DrawDone,
        })
    }

    fn decode_submission_begun(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SubmissionBegun(SubmissionBegunEvent {
            submission: SubmissionId(self.read_u64()?),
            surface: SurfaceId(self.read_u32()?),
            target_time: self.read_option_time()?,
            at: self.read_time()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            submission: SubmissionId(self.read_u64()?),
            at: self.read_time()?,
        }))
    }

    fn decode_draw_done(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DrawDone(DrawDoneEvent {
            submission: SubmissionId(self.read_u64()?),
            at: self.read_time()?,
        }))
    }

    fn decode_sync_output(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SyncOutput(SyncOutputEvent {
            submission: SubmissionId(self.read_u64()?),
            output: OutputId(self.read_u32()?),
            at: self.read_time()?,
        }))
    }

    fn decode_outcome(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Outcome(OutcomeEvent {
            submission: SubmissionId(self.read_u64()?),
            surface: SurfaceId(self.read_u32()?),
            tag: self.read_tag()?,
            target_time: self.read_option_time()?,
            commit_time: self.read_option_time()?,
            frame_signal_time: self.read_option_time()?,
            presented_time: self.read_option_time()?,
            flags: PresentFlags(self.read_u32()?),
            next_target: self.read_time()?,
            period: Duration(self.read_u64()?),
            period_source: self.read_period_source()?,
            basis: self.read_basis()?,
        }))
    }

    fn decode_clock(&mut self) -> Option<RecordedEvent> {
        let transition = match self.read_u8()? {
            0 => ClockTransition::Freeze,
            _ => ClockTransition::Thaw,
        };
        Some(RecordedEvent::Clock(ClockEvent {
            transition,
            raw: RawTime(self.read_u64()?),
            logical: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SUBMISSION_BEGUN => self.decode_submission_begun(),
            TAG_COMMIT => self.decode_commit(),
            TAG_DRAW_DONE => self.decode_draw_done(),
            TAG_SYNC_OUTPUT => self.decode_sync_output(),
            TAG_OUTCOME => self.decode_outcome(),
            TAG_CLOCK => self.decode_clock(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outcome() -> OutcomeEvent {
        OutcomeEvent {
            submission: SubmissionId(7),
            surface: SurfaceId(1),
            tag: OutcomeTag::Presented,
            target_time: Some(LogicalTime(16_666_667)),
            commit_time: Some(LogicalTime(2_000_000)),
            frame_signal_time: None,
            presented_time: Some(LogicalTime(17_000_000)),
            flags: PresentFlags(PresentFlags::VSYNC.0 | PresentFlags::HW_CLOCK.0),
            next_target: LogicalTime(33_666_667),
            period: Duration(16_666_667),
            period_source: PeriodSource::FeedbackHint,
            basis: PredictionBasis::Presented,
        }
    }

    #[test]
    fn outcome_keeps_optional_fields() {
        let mut rec = RecorderSink::new();
        let orig = sample_outcome();
        rec.on_outcome(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Outcome(e) => {
                assert_eq!(e.submission, orig.submission);
                assert_eq!(e.tag, OutcomeTag::Presented);
                assert_eq!(e.frame_signal_time, None);
                assert_eq!(e.presented_time, orig.presented_time);
                assert_eq!(e.flags, orig.flags);
                assert_eq!(e.next_target, orig.next_target);
                assert_eq!(e.period_source, PeriodSource::FeedbackHint);
            }
            other => panic!("expected Outcome, got {other:?}"),
        }
    }

    #[test]
    fn lifecycle_sequence_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_submission_begun(&SubmissionBegunEvent {
            submission: SubmissionId(7),
            surface: SurfaceId(1),
            target_time: None,
            at: LogicalTime(1_000),
        });
        rec.on_commit(&CommitEvent {
            submission: SubmissionId(7),
            at: LogicalTime(2_000),
        });
        rec.on_draw_done(&DrawDoneEvent {
            submission: SubmissionId(7),
            at: LogicalTime(9_000),
        });
        rec.on_sync_output(&SyncOutputEvent {
            submission: SubmissionId(7),
            output: OutputId(2),
            at: LogicalTime(9_500),
        });
        rec.on_outcome(&sample_outcome());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RecordedEvent::SubmissionBegun(_)));
        assert!(matches!(events[1], RecordedEvent::Commit(_)));
        assert!(matches!(events[2], RecordedEvent::DrawDone(_)));
        match &events[3] {
            RecordedEvent::SyncOutput(e) => assert_eq!(e.output, OutputId(2)),
            other => panic!("expected SyncOutput, got {other:?}"),
        }
        assert!(matches!(events[4], RecordedEvent::Outcome(_)));
    }

    #[test]
    fn clock_transitions_decode() {
        let mut rec = RecorderSink::new();
        rec.on_clock(&ClockEvent {
            transition: ClockTransition::Thaw,
            raw: RawTime(9_000),
            logical: LogicalTime(500),
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::Clock(e)) => {
                assert_eq!(e.transition, ClockTransition::Thaw);
                assert_eq!(e.raw, RawTime(9_000));
                assert_eq!(e.logical, LogicalTime(500));
            }
            other => panic!("expected Clock, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_outcome(&sample_outcome());
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
