// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core-side record of a presentation surface.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::output::{OutputId, OutputRef};
use crate::repaint::{OverwritePolicy, RepaintSlot};
use crate::time::LogicalTime;

/// Identifies a surface registered with a
/// [`SubmissionTracker`](crate::tracker::SubmissionTracker).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// The outputs a surface occupies and its pending repaint.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    outputs: Vec<OutputRef>,
    repaint: RepaintSlot,
}

impl Surface {
    /// Creates a surface that is not yet on any output.
    #[must_use]
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            outputs: Vec::new(),
            repaint: RepaintSlot::new(),
        }
    }

    /// Returns the surface identity.
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Records that the surface entered `output`, holding a reference to it.
    ///
    /// Returns `false` if the surface was already on that output.
    pub fn enter_output(&mut self, output: OutputRef) -> bool {
        if self.outputs.iter().any(|o| Rc::ptr_eq(o, &output)) {
            tracing::debug!(surface = self.id.0, output = output.global_name(), "duplicate enter");
            return false;
        }
        self.outputs.push(output);
        true
    }

    /// Records that the surface left the output, releasing the reference.
    ///
    /// Returns `false` if the surface was not on that output.
    pub fn leave_output(&mut self, id: OutputId) -> bool {
        let before = self.outputs.len();
        self.outputs.retain(|o| o.id() != id);
        before != self.outputs.len()
    }

    /// The output used for timing: the earliest-entered one still occupied.
    #[must_use]
    pub fn current_output(&self) -> Option<&OutputRef> {
        self.outputs.first()
    }

    /// All outputs the surface currently occupies, in enter order.
    #[must_use]
    pub fn outputs(&self) -> &[OutputRef] {
        &self.outputs
    }

    /// Schedules a repaint aimed at `target`.
    ///
    /// Overwriting a pending value is reported as a warning and resolved by
    /// `policy`.
    pub fn schedule_repaint(&mut self, target: LogicalTime, policy: OverwritePolicy) {
        if let Some(prev) = self.repaint.schedule(target, policy) {
            tracing::warn!(
                surface = self.id.0,
                previous = prev.nanos(),
                target = target.nanos(),
                "repaint scheduled while one is already pending"
            );
        }
    }

    /// Takes the pending repaint target, if any.
    pub fn take_repaint(&mut self) -> Option<LogicalTime> {
        self.repaint.take()
    }

    /// Returns the repaint slot.
    #[must_use]
    pub fn repaint(&self) -> &RepaintSlot {
        &self.repaint
    }

    /// Drops every output reference.
    pub(crate) fn release_outputs(&mut self) {
        self.outputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputRegistry;

    #[test]
    fn enter_and_leave_track_references() {
        let mut registry = OutputRegistry::new();
        let a = registry.insert(1);
        let b = registry.insert(2);
        let mut surface = Surface::new(SurfaceId(0));

        assert!(surface.enter_output(Rc::clone(&a)));
        assert!(surface.enter_output(Rc::clone(&b)));
        assert!(!surface.enter_output(Rc::clone(&a)), "second enter is ignored");
        assert_eq!(Rc::strong_count(&a), 3);
        assert_eq!(surface.current_output().map(|o| o.id()), Some(a.id()));

        assert!(surface.leave_output(a.id()));
        assert!(!surface.leave_output(a.id()));
        assert_eq!(Rc::strong_count(&a), 2);
        assert_eq!(surface.current_output().map(|o| o.id()), Some(b.id()));
    }

    #[test]
    fn overwrite_keeps_newest_and_counts() {
        let mut surface = Surface::new(SurfaceId(1));
        surface.schedule_repaint(LogicalTime(100), OverwritePolicy::Latest);
        surface.schedule_repaint(LogicalTime(90), OverwritePolicy::Latest);
        assert_eq!(surface.repaint().overwrites(), 1);
        assert_eq!(surface.take_repaint(), Some(LogicalTime(90)));
        assert_eq!(surface.take_repaint(), None);
    }
}
