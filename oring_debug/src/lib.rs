// Copyright 2026 the Oring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for oring
//! diagnostics.
//!
//! This crate provides [`TraceSink`](oring_core::trace::TraceSink)
//! implementations for development and post-mortem analysis of submission
//! lifecycles:
//!
//! - [`pretty::PrettyPrintSink`] writes one human-readable line per event.
//! - [`recorder::RecorderSink`] keeps a compact binary recording, played
//!   back with [`recorder::decode`].
//! - [`chrome::export`] turns recorded bytes into Chrome Trace Event Format
//!   JSON.

pub mod chrome;
pub mod pretty;
pub mod recorder;
