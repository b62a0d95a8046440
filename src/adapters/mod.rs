//! Adapter implementations of the port traits.
//!
//! `live` talks to the real world, `memory` keeps state in-process,
//! `recording` wraps a live generator and captures a cassette, and
//! `replaying` serves a captured cassette back.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
