// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol event handling.
//!
//! Every impl is generic over the dispatching state `D`, which only needs
//! `AsMut<WaylandState>`. In owned-queue mode `D` is [`WaylandState`] itself;
//! in embedded mode the host delegates with
//! `wayland_client::delegate_dispatch!`.
//!
//! Protocol objects carry logical ids as user data (`OutputId`, `SurfaceId`,
//! `SubmissionId`) and are resolved through the output registry and the
//! tracker, never through back-pointers.

use oring_core::output::{OutputId, VideoMode};
use oring_core::submission::SubmissionId;
use oring_core::surface::SurfaceId;
use wayland_client::protocol::{wl_callback, wl_output, wl_registry, wl_surface};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};
use wayland_protocols::wp::presentation_time::client::{wp_presentation, wp_presentation_feedback};

use crate::state::{WaylandState, release_output};
use crate::time::feedback_from_presented;

/// Highest `wl_output` version the backend understands.
const WL_OUTPUT_MAX_VERSION: u32 = 4;
/// `wl_output.mode` refresh and `done` need version 2.
const WL_OUTPUT_MIN_VERSION: u32 = 2;

impl<D> Dispatch<wl_registry::WlRegistry, (), D> for WaylandState
where
    D: Dispatch<wl_output::WlOutput, OutputId>
        + Dispatch<wp_presentation::WpPresentation, ()>
        + AsMut<Self>
        + 'static,
{
    fn event(
        state: &mut D,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<D>,
    ) {
        let wayland = state.as_mut();
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if interface == wl_output::WlOutput::interface().name {
                    if version < WL_OUTPUT_MIN_VERSION {
                        tracing::warn!(
                            version,
                            "unsupported: wl_output needs version {WL_OUTPUT_MIN_VERSION}"
                        );
                        return;
                    }
                    let output = wayland.outputs.insert(name);
                    let proxy = registry.bind::<wl_output::WlOutput, _, D>(
                        name,
                        version.min(WL_OUTPUT_MAX_VERSION),
                        qh,
                        output.id(),
                    );
                    wayland.output_proxies.insert(output.id(), proxy);
                } else if interface == wp_presentation::WpPresentation::interface().name {
                    if wayland.presentation.is_some() {
                        tracing::debug!("ignoring second wp_presentation global");
                        return;
                    }
                    let proxy =
                        registry.bind::<wp_presentation::WpPresentation, _, D>(name, 1, qh, ());
                    wayland.presentation = Some(proxy);
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                if let Some(id) = wayland.outputs.withdraw(name) {
                    if let Some(proxy) = wayland.output_proxies.remove(&id) {
                        release_output(&proxy);
                    }
                }
            }
            _ => {}
        }
    }
}

impl<D: AsMut<WaylandState>> Dispatch<wl_output::WlOutput, OutputId, D> for WaylandState {
    fn event(
        state: &mut D,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        id: &OutputId,
        _: &Connection,
        _: &QueueHandle<D>,
    ) {
        let wayland = state.as_mut();
        let Some(output) = wayland.outputs.get(*id) else {
            tracing::debug!(output = id.0, "event for withdrawn output ignored");
            return;
        };
        match event {
            wl_output::Event::Geometry {
                physical_width,
                physical_height,
                make,
                model,
                transform,
                ..
            } => output.update_info(|info| {
                info.physical_width_mm = physical_width;
                info.physical_height_mm = physical_height;
                info.make = make;
                info.model = model;
                info.transform = match transform {
                    WEnum::Value(t) => u32::from(t),
                    WEnum::Unknown(raw) => raw,
                };
            }),
            wl_output::Event::Mode {
                flags,
                width,
                height,
                refresh,
            } => {
                let (current, preferred) = match flags {
                    WEnum::Value(f) => (
                        f.contains(wl_output::Mode::Current),
                        f.contains(wl_output::Mode::Preferred),
                    ),
                    WEnum::Unknown(_) => (false, false),
                };
                output.add_mode(VideoMode {
                    width,
                    height,
                    refresh_millihz: u32::try_from(refresh).unwrap_or(0),
                    current,
                    preferred,
                });
            }
            wl_output::Event::Scale { factor } => output.update_info(|info| info.scale = factor),
            wl_output::Event::Done => {
                if !output.is_done() {
                    let info = output.info();
                    tracing::info!(
                        output = output.global_name(),
                        refresh_mhz = output.refresh_millihz(),
                        "output-{}: {} {}",
                        output.global_name(),
                        info.make,
                        info.model
                    );
                }
                output.mark_done();
            }
            _ => {}
        }
    }
}

impl<D: AsMut<WaylandState>> Dispatch<wl_surface::WlSurface, SurfaceId, D> for WaylandState {
    fn event(
        state: &mut D,
        _: &wl_surface::WlSurface,
        event: wl_surface::Event,
        surface: &SurfaceId,
        _: &Connection,
        _: &QueueHandle<D>,
    ) {
        let wayland = state.as_mut();
        match event {
            wl_surface::Event::Enter { output } => {
                let Some(output) = output
                    .data::<OutputId>()
                    .and_then(|id| wayland.outputs.get(*id).cloned())
                else {
                    return;
                };
                if let Some(tracker) = wayland.tracker.as_mut() {
                    tracker.surface_enter_output(*surface, output);
                }
            }
            wl_surface::Event::Leave { output } => {
                let Some(&id) = output.data::<OutputId>() else {
                    return;
                };
                if let Some(tracker) = wayland.tracker.as_mut() {
                    tracker.surface_leave_output(*surface, id);
                }
            }
            _ => {}
        }
    }
}

impl<D: AsMut<WaylandState>> Dispatch<wl_callback::WlCallback, SubmissionId, D> for WaylandState {
    fn event(
        state: &mut D,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        id: &SubmissionId,
        _: &Connection,
        _: &QueueHandle<D>,
    ) {
        let wl_callback::Event::Done { .. } = event else {
            return;
        };
        let wayland = state.as_mut();
        let Some(tracker) = wayland.tracker.as_mut() else {
            return;
        };
        let raw = tracker.clock().raw_now();
        let outcome = tracker.on_draw_done(*id, raw);
        wayland.record(outcome);
    }
}

impl<D: AsMut<WaylandState>> Dispatch<wp_presentation::WpPresentation, (), D> for WaylandState {
    fn event(
        state: &mut D,
        _: &wp_presentation::WpPresentation,
        event: wp_presentation::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<D>,
    ) {
        if let wp_presentation::Event::ClockId { clk_id } = event {
            state.as_mut().presentation_clock = Some(clk_id);
        }
    }
}

impl<D: AsMut<WaylandState>>
    Dispatch<wp_presentation_feedback::WpPresentationFeedback, SubmissionId, D> for WaylandState
{
    fn event(
        state: &mut D,
        _: &wp_presentation_feedback::WpPresentationFeedback,
        event: wp_presentation_feedback::Event,
        id: &SubmissionId,
        _: &Connection,
        _: &QueueHandle<D>,
    ) {
        let wayland = state.as_mut();
        match event {
            wp_presentation_feedback::Event::SyncOutput { output } => {
                let Some(output) = output
                    .data::<OutputId>()
                    .and_then(|oid| wayland.outputs.get(*oid).cloned())
                else {
                    return;
                };
                if let Some(tracker) = wayland.tracker.as_mut() {
                    tracker.on_sync_output(*id, output);
                }
            }
            wp_presentation_feedback::Event::Presented {
                tv_sec_hi,
                tv_sec_lo,
                tv_nsec,
                refresh,
                seq_hi,
                seq_lo,
                flags,
            } => {
                let flags = match flags {
                    WEnum::Value(kind) => kind.bits(),
                    WEnum::Unknown(raw) => raw,
                };
                let feedback = feedback_from_presented(
                    tv_sec_hi,
                    tv_sec_lo,
                    tv_nsec,
                    refresh,
                    seq_hi,
                    seq_lo,
                    flags,
                );
                let outcome = wayland
                    .tracker
                    .as_mut()
                    .and_then(|tracker| tracker.on_presented(*id, feedback));
                wayland.record(outcome);
            }
            wp_presentation_feedback::Event::Discarded => {
                let outcome = wayland
                    .tracker
                    .as_mut()
                    .and_then(|tracker| tracker.on_discarded(*id));
                wayland.record(outcome);
            }
            _ => {}
        }
    }
}
