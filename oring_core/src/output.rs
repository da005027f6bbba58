// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display outputs and their shared lifetime.
//!
//! An [`Output`] is shared through [`OutputRef`] (`Rc<Output>`) by the
//! [`OutputRegistry`], by every surface that currently occupies it, and by
//! every submission whose presentation feedback named it as the sync output.
//!
//! Teardown needs two independent conditions:
//!
//! 1. the compositor withdrew the global ([`OutputRegistry::withdraw`] drops
//!    the registry's reference and marks the output withdrawn), and
//! 2. every other holder released its reference.
//!
//! Only then does the last `Rc` drop. A withdrawn output that is still
//! referenced keeps answering queries with its last known mode.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;

use crate::time::Duration;
use crate::timing::period_from_millihz;

/// Identifies a specific display output.
///
/// Assigned by the [`OutputRegistry`]; core code passes it through without
/// interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Shared handle to an [`Output`].
pub type OutputRef = Rc<Output>;

/// One video mode advertised for an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VideoMode {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Vertical refresh rate in millihertz, `0` if unknown.
    pub refresh_millihz: u32,
    /// The mode is the output's current mode.
    pub current: bool,
    /// The mode is the output's preferred mode.
    pub preferred: bool,
}

/// Descriptive state reported by the compositor for an output.
#[derive(Clone, Debug, Default)]
pub struct OutputInfo {
    /// Manufacturer name.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Physical width in millimetres.
    pub physical_width_mm: i32,
    /// Physical height in millimetres.
    pub physical_height_mm: i32,
    /// Raw `wl_output.transform` value.
    pub transform: u32,
    /// Integer buffer scale.
    pub scale: i32,
    /// All advertised modes in announcement order.
    pub modes: Vec<VideoMode>,
    /// Index into `modes` of the current mode.
    pub current_mode: Option<usize>,
}

impl OutputInfo {
    /// Returns the current mode, if one was announced.
    #[must_use]
    pub fn current(&self) -> Option<&VideoMode> {
        self.current_mode.and_then(|idx| self.modes.get(idx))
    }
}

/// A display output as seen by the client.
#[derive(Debug)]
pub struct Output {
    id: OutputId,
    global_name: u32,
    info: RefCell<OutputInfo>,
    done: Cell<bool>,
    withdrawn: Cell<bool>,
}

impl Output {
    /// Creates an output for the protocol global `global_name`.
    #[must_use]
    pub fn new(id: OutputId, global_name: u32) -> Self {
        Self {
            id,
            global_name,
            info: RefCell::new(OutputInfo {
                scale: 1,
                ..OutputInfo::default()
            }),
            done: Cell::new(false),
            withdrawn: Cell::new(false),
        }
    }

    /// Returns the registry-assigned identity.
    #[must_use]
    pub fn id(&self) -> OutputId {
        self.id
    }

    /// Returns the protocol global name, used for display (`output-N`).
    #[must_use]
    pub fn global_name(&self) -> u32 {
        self.global_name
    }

    /// Borrows the descriptive state.
    ///
    /// # Panics
    ///
    /// Panics if called while an `update_info` closure is running.
    #[must_use]
    pub fn info(&self) -> Ref<'_, OutputInfo> {
        self.info.borrow()
    }

    /// Mutates the descriptive state.
    pub fn update_info(&self, f: impl FnOnce(&mut OutputInfo)) {
        f(&mut self.info.borrow_mut());
    }

    /// Records a mode announcement; a mode flagged current becomes current.
    pub fn add_mode(&self, mode: VideoMode) {
        let mut info = self.info.borrow_mut();
        info.modes.push(mode);
        if mode.current {
            info.current_mode = Some(info.modes.len() - 1);
        }
    }

    /// Current refresh rate in millihertz, if known and nonzero.
    #[must_use]
    pub fn refresh_millihz(&self) -> Option<u32> {
        self.info
            .borrow()
            .current()
            .map(|mode| mode.refresh_millihz)
            .filter(|&mhz| mhz > 0)
    }

    /// Refresh period derived from the current mode.
    #[must_use]
    pub fn refresh_period(&self) -> Option<Duration> {
        self.refresh_millihz().and_then(period_from_millihz)
    }

    /// Marks the initial batch of output information as complete.
    pub fn mark_done(&self) {
        self.done.set(true);
    }

    /// Returns `true` once the compositor finished describing the output.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Returns `true` once the compositor removed the global.
    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn.get()
    }
}

/// Owns the compositor-announced outputs.
///
/// Lookups go through [`OutputId`] so protocol objects never need to carry a
/// pointer back to their logical output.
#[derive(Debug, Default)]
pub struct OutputRegistry {
    outputs: BTreeMap<OutputId, OutputRef>,
    next_id: u32,
}

impl OutputRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new output for the protocol global `global_name`.
    pub fn insert(&mut self, global_name: u32) -> OutputRef {
        let id = OutputId(self.next_id);
        self.next_id += 1;
        let output = Rc::new(Output::new(id, global_name));
        self.outputs.insert(id, Rc::clone(&output));
        output
    }

    /// Looks up a live output.
    #[must_use]
    pub fn get(&self, id: OutputId) -> Option<&OutputRef> {
        self.outputs.get(&id)
    }

    /// Finds the live output bound to a protocol global.
    #[must_use]
    pub fn find_by_global(&self, global_name: u32) -> Option<OutputId> {
        self.outputs
            .values()
            .find(|output| output.global_name == global_name)
            .map(|output| output.id)
    }

    /// Withdraws the output bound to `global_name`.
    ///
    /// Drops the registry's reference; the output itself lives on while any
    /// surface or submission still holds it. Returns the withdrawn output's
    /// id, or `None` if the global was not an output.
    pub fn withdraw(&mut self, global_name: u32) -> Option<OutputId> {
        let id = self.find_by_global(global_name)?;
        let output = self.outputs.remove(&id)?;
        output.withdrawn.set(true);
        tracing::info!(
            output = global_name,
            "output-{global_name} removed by the compositor"
        );
        Some(id)
    }

    /// Number of live outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` when no outputs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Iterates live outputs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OutputRef> {
        self.outputs.values()
    }

    /// Releases all outputs at shutdown.
    ///
    /// Returns how many outputs were still referenced elsewhere, each of
    /// which is reported as leaked.
    pub fn clear(&mut self) -> usize {
        let mut leaked = 0;
        for output in core::mem::take(&mut self.outputs).into_values() {
            if Rc::strong_count(&output) > 1 {
                tracing::warn!(output = output.global_name, "output leaked");
                leaked += 1;
            }
        }
        leaked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(refresh_millihz: u32, current: bool) -> VideoMode {
        VideoMode {
            width: 1920,
            height: 1080,
            refresh_millihz,
            current,
            preferred: false,
        }
    }

    #[test]
    fn current_mode_drives_refresh_period() {
        let output = Output::new(OutputId(0), 42);
        assert_eq!(output.refresh_period(), None);

        output.add_mode(mode(75_000, false));
        assert_eq!(output.refresh_period(), None, "no current mode yet");

        output.add_mode(mode(60_000, true));
        assert_eq!(output.refresh_millihz(), Some(60_000));
        assert_eq!(output.refresh_period(), Some(Duration(16_666_667)));
    }

    #[test]
    fn zero_refresh_is_unknown() {
        let output = Output::new(OutputId(0), 1);
        output.add_mode(mode(0, true));
        assert_eq!(output.refresh_millihz(), None);
        assert_eq!(output.refresh_period(), None);
    }

    #[test]
    fn withdrawn_output_lives_while_referenced() {
        let mut registry = OutputRegistry::new();
        let output = registry.insert(7);
        let id = output.id();
        assert_eq!(Rc::strong_count(&output), 2);

        assert_eq!(registry.withdraw(7), Some(id));
        assert!(registry.get(id).is_none());
        assert!(output.is_withdrawn());
        assert_eq!(
            Rc::strong_count(&output),
            1,
            "only the external holder remains"
        );
    }

    #[test]
    fn referenced_output_is_not_torn_down_by_refcount_alone() {
        let mut registry = OutputRegistry::new();
        let output = registry.insert(3);
        let weak = Rc::downgrade(&output);
        drop(output);

        assert!(weak.upgrade().is_some(), "registry still holds the output");
        registry.withdraw(3);
        assert!(weak.upgrade().is_none(), "last reference gone after withdrawal");
    }

    #[test]
    fn withdraw_unknown_global_is_none() {
        let mut registry = OutputRegistry::new();
        registry.insert(1);
        assert_eq!(registry.withdraw(99), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clear_reports_leaked_outputs() {
        let mut registry = OutputRegistry::new();
        let held = registry.insert(1);
        registry.insert(2);
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
        assert!(!held.is_withdrawn());
    }

    #[test]
    fn ids_are_unique_across_reinsertions() {
        let mut registry = OutputRegistry::new();
        let a = registry.insert(5).id();
        registry.withdraw(5);
        let b = registry.insert(5).id();
        assert_ne!(a, b);
        assert_eq!(registry.find_by_global(5), Some(b));
    }
}
