// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Who owns the event queue.
//!
//! Every backend object (registry, outputs, frame callbacks, presentation
//! feedback) must be created on the queue whose state type dispatches into
//! [`WaylandState`]; an object on any other queue silently never reports.
//!
//! - [`OwnedQueueMode`] owns `EventQueue<WaylandState>`. It runs the startup
//!   roundtrips, initializes timing, and hands finalized outcomes back after
//!   each dispatch.
//! - [`EmbeddedStateMode`] is for hosts that already own a queue. The host
//!   state holds a `WaylandState`, implements `AsMut<WaylandState>`, and
//!   delegates:
//!
//! ```text
//! delegate_dispatch!(Host: [wl_registry::WlRegistry: ()] => WaylandState);
//! delegate_dispatch!(Host: [wl_output::WlOutput: OutputId] => WaylandState);
//! delegate_dispatch!(Host: [wl_surface::WlSurface: SurfaceId] => WaylandState);
//! delegate_dispatch!(Host: [wl_callback::WlCallback: SubmissionId] => WaylandState);
//! delegate_dispatch!(Host: [wp_presentation::WpPresentation: ()] => WaylandState);
//! delegate_dispatch!(
//!     Host: [wp_presentation_feedback::WpPresentationFeedback: SubmissionId] => WaylandState
//! );
//! ```
//!
//! In both modes the `wl_surface` is created with the [`SurfaceId`] from
//! [`WaylandState::add_surface`] as its user data, so enter/leave events find
//! the surface's output list.
//!
//! [`SurfaceId`]: oring_core::surface::SurfaceId

use oring_core::submission::Outcome;
use oring_core::tracker::TrackerConfig;
use wayland_client::protocol::wl_registry;
use wayland_client::{Connection, Dispatch, DispatchError, EventQueue, QueueHandle};

use crate::state::{BackendError, WaylandState};

/// Backend-owned queue and state.
#[derive(Debug)]
pub struct OwnedQueueMode {
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
    _registry: wl_registry::WlRegistry,
}

impl OwnedQueueMode {
    /// Binds globals on a fresh queue and initializes timing.
    ///
    /// The first roundtrip announces globals; the second delivers what the
    /// bound objects report (output modes, the presentation clock id). Timing
    /// is then selected from what arrived.
    pub fn connect(connection: &Connection, config: TrackerConfig) -> Result<Self, ConnectError> {
        let mut event_queue = connection.new_event_queue();
        let registry = connection.display().get_registry(&event_queue.handle(), ());
        let mut state = WaylandState::new(config);
        event_queue.roundtrip(&mut state)?;
        event_queue.roundtrip(&mut state)?;
        state.init_timing()?;
        Ok(Self {
            event_queue,
            state,
            _registry: registry,
        })
    }

    /// Queue handle for `wl_surface` creation and
    /// [`WaylandState::begin_frame`].
    #[must_use]
    pub fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.event_queue.handle()
    }

    /// Flushes requests, waits for events, dispatches them, and returns the
    /// submissions they finalized, oldest first.
    ///
    /// Each outcome's next target is also in its surface's repaint slot.
    pub fn dispatch(&mut self) -> Result<impl Iterator<Item = Outcome> + '_, DispatchError> {
        self.event_queue.blocking_dispatch(&mut self.state)?;
        Ok(self.state.drain_outcomes())
    }

    /// Backend state, for outputs and the tracker.
    #[must_use]
    pub fn state(&self) -> &WaylandState {
        &self.state
    }

    /// Mutable backend state, for surfaces, frames and freeze/thaw.
    pub fn state_mut(&mut self) -> &mut WaylandState {
        &mut self.state
    }
}

/// Backend wiring on a host-owned queue.
///
/// Holds the registry bound on the host queue. The host runs its own
/// roundtrips, then calls [`WaylandState::init_timing`] on its embedded
/// state.
#[derive(Debug)]
pub struct EmbeddedStateMode<HostState> {
    queue_handle: QueueHandle<HostState>,
    _registry: wl_registry::WlRegistry,
}

impl<HostState> EmbeddedStateMode<HostState>
where
    HostState: Dispatch<wl_registry::WlRegistry, ()> + 'static,
{
    /// Requests the global registry on the host queue.
    #[must_use]
    pub fn bind(connection: &Connection, queue_handle: QueueHandle<HostState>) -> Self {
        let registry = connection.display().get_registry(&queue_handle, ());
        Self {
            queue_handle,
            _registry: registry,
        }
    }

    /// The host queue handle backend objects are created on.
    #[must_use]
    pub fn queue_handle(&self) -> &QueueHandle<HostState> {
        &self.queue_handle
    }
}

/// Failure during [`OwnedQueueMode::connect`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Protocol dispatch failed during a startup roundtrip.
    #[error("startup roundtrip failed: {0}")]
    Dispatch(#[from] DispatchError),
    /// Timing could not be initialized.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
