// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-value repaint scheduling slot.
//!
//! Every surface holds at most one pending repaint target. Finalized
//! submissions write into the slot; the idle phase of the host event loop
//! takes the value, issues one redraw aimed at it, and leaves the slot empty.
//! Writing while a value is still pending is an anomalous overwrite: the
//! [`OverwritePolicy`] decides the surviving value and the overwrite is
//! counted.

use crate::time::LogicalTime;

/// What to keep when a repaint is scheduled over a pending one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OverwritePolicy {
    /// The newest value replaces the pending one.
    #[default]
    Latest,
    /// Keep the later of the two targets.
    Coalesce,
}

/// At most one pending repaint target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepaintSlot {
    pending: Option<LogicalTime>,
    overwrites: u64,
}

impl RepaintSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            overwrites: 0,
        }
    }

    /// Stores `target`, returning the value it displaced, if any.
    pub fn schedule(
        &mut self,
        target: LogicalTime,
        policy: OverwritePolicy,
    ) -> Option<LogicalTime> {
        let displaced = self.pending;
        self.pending = Some(match (displaced, policy) {
            (Some(prev), OverwritePolicy::Coalesce) => prev.max(target),
            _ => target,
        });
        if displaced.is_some() {
            self.overwrites += 1;
        }
        displaced
    }

    /// Takes the pending target, leaving the slot empty.
    pub fn take(&mut self) -> Option<LogicalTime> {
        self.pending.take()
    }

    /// Returns the pending target without consuming it.
    #[must_use]
    pub fn pending(&self) -> Option<LogicalTime> {
        self.pending
    }

    /// Number of anomalous overwrites seen so far.
    #[must_use]
    pub fn overwrites(&self) -> u64 {
        self.overwrites
    }
}
