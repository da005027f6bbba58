// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation-time accounting for display-server clients.
//!
//! `oring_core` answers one question for a client that commits frames to a
//! compositor-managed surface: *when should the next frame be shown?* It is
//! `no_std` compatible (with `alloc`), single-threaded, and never blocks.
//!
//! # Architecture
//!
//! ```text
//!   TimeSource ──► LogicalClock (freeze / thaw)
//!                        │ stamps every signal
//!                        ▼
//!   begin_submission ──► SubmissionTracker ◄── draw-done / sync output /
//!                        │                      presented / discarded
//!                        ▼
//!                     Outcome ──► Surface repaint slot ──► next redraw
//! ```
//!
//! **[`clock`]**: [`LogicalClock`](clock::LogicalClock) turns raw monotonic
//! readings into pause-aware nanoseconds from an epoch.
//!
//! **[`tracker`]**: [`SubmissionTracker`](tracker::SubmissionTracker) follows
//! each committed frame to one terminal outcome and predicts the next target.
//!
//! **[`timing`]**: refresh-period resolution and the two prediction rules.
//!
//! **[`output`]**: reference-counted outputs with two-guard teardown.
//!
//! **[`surface`]** and **[`repaint`]**: per-surface output membership and the
//! single-value repaint slot.
//!
//! **[`submission`]**: per-frame records and [`Outcome`](submission::Outcome).
//!
//! **[`time`]**: raw and logical timestamp newtypes.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and lifecycle events,
//! with a [`Tracer`](trace::Tracer) wrapper that compiles out without the
//! `trace` feature.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clock;
pub mod output;
pub mod repaint;
pub mod submission;
pub mod surface;
pub mod time;
pub mod timing;
pub mod trace;
pub mod tracker;
