// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for oring.
//!
//! Binds `wl_output` and `wp_presentation`, requests a frame callback and
//! presentation feedback for every commit, and feeds the resulting events into
//! an [`oring_core::tracker::SubmissionTracker`]:
//!
//! - `wl_callback.done` is the draw-done signal.
//! - `wp_presentation_feedback` delivers sync output, presented, or
//!   discarded.
//! - `wl_surface.enter`/`leave` keep each surface's output list current.
//!
//! Without `wp_presentation` the backend falls back to `CLOCK_MONOTONIC`
//! and draw-done-only prediction.
//!
//! A typical owned-queue frame:
//!
//! ```text
//! let mut mode = OwnedQueueMode::connect(&conn, TrackerConfig::default())?;
//! let qh = mode.queue_handle();
//! let surface_id = mode.state_mut().add_surface()?;
//! let wl_surface = compositor.create_surface(&qh, surface_id);
//!
//! let id = mode.state_mut().begin_frame(surface_id, &wl_surface, &qh, target)?;
//! wl_surface.commit();            // or eglSwapBuffers
//! mode.state_mut().mark_committed(id);
//! for outcome in mode.dispatch()? { /* outcome.next_target() */ }
//! if let Some(t) = mode.state_mut().take_repaint(surface_id) { /* redraw for t */ }
//! ```

mod dispatch;
mod event_loop;
mod state;
mod time;

pub use event_loop::{ConnectError, EmbeddedStateMode, OwnedQueueMode};
pub use state::{BackendError, WaylandState};
pub use time::{
    CLOCK_MONOTONIC_ID, Clock, clock_name, feedback_from_presented, now, protocol_to_raw,
};
