// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each surface is its own process row. A finalized submission becomes a
//! complete (`X`) slice from commit to presentation (or to draw-done when no
//! presentation time exists), with the prediction in its arguments.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use oring_core::surface::SurfaceId;
use oring_core::time::LogicalTime;
use oring_core::trace::OutcomeTag;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Logical nanoseconds are converted to microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Commit and draw-done events carry no surface; remember it from begin.
    let mut surfaces: BTreeMap<u64, SurfaceId> = BTreeMap::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::SubmissionBegun(e) => {
                surfaces.insert(e.submission.0, e.surface);
                events.push(json!({
                    "ph": "i",
                    "name": "Begin",
                    "cat": "Submission",
                    "ts": to_us(e.at),
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "submission": e.submission.0,
                        "target_ms": e.target_time.map(LogicalTime::as_millis_f64),
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Submission",
                    "ts": to_us(e.at),
                    "pid": pid_for(&surfaces, e.submission.0),
                    "tid": 0,
                    "s": "t",
                    "args": { "submission": e.submission.0 }
                }));
            }
            RecordedEvent::DrawDone(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DrawDone",
                    "cat": "Signal",
                    "ts": to_us(e.at),
                    "pid": pid_for(&surfaces, e.submission.0),
                    "tid": 0,
                    "s": "t",
                    "args": { "submission": e.submission.0 }
                }));
            }
            RecordedEvent::SyncOutput(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SyncOutput",
                    "cat": "Signal",
                    "ts": to_us(e.at),
                    "pid": pid_for(&surfaces, e.submission.0),
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "submission": e.submission.0,
                        "output": e.output.0,
                    }
                }));
            }
            RecordedEvent::Outcome(e) => {
                surfaces.remove(&e.submission.0);
                let end = e.presented_time.or(e.frame_signal_time);
                let start = e.commit_time.or(end);
                if let (Some(start), Some(end)) = (start, end) {
                    events.push(json!({
                        "ph": "X",
                        "name": format!("Frame {}", e.submission.0),
                        "cat": "Submission",
                        "ts": to_us(start),
                        "dur": to_us(end) - to_us(start),
                        "pid": e.surface.0,
                        "tid": 1,
                        "args": {
                            "outcome": format!("{:?}", e.tag),
                            "flags": format!("{:?}", e.flags),
                            "target_error_us": e.target_error().map(|ns| ns as f64 / 1000.0),
                        }
                    }));
                }
                let name = match e.tag {
                    OutcomeTag::Presented => "Presented",
                    OutcomeTag::Discarded => "Discarded",
                    OutcomeTag::DrawDoneOnly => "DrawDoneOnly",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Outcome",
                    "ts": to_us(end.unwrap_or(e.next_target)),
                    "pid": e.surface.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "submission": e.submission.0,
                        "next_target_ms": e.next_target.as_millis_f64(),
                        "period_ns": e.period.nanos(),
                        "period_source": format!("{:?}", e.period_source),
                        "basis": format!("{:?}", e.basis),
                    }
                }));
            }
            RecordedEvent::Clock(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.transition),
                    "cat": "Clock",
                    "ts": to_us(e.logical),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": { "raw_ns": e.raw.nanos() }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn pid_for(surfaces: &BTreeMap<u64, SurfaceId>, submission: u64) -> u32 {
    surfaces.get(&submission).map_or(0, |s| s.0)
}

fn to_us(t: LogicalTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
