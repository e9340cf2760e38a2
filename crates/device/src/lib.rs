//! LPDDR6 device timing and state engine.
//!
//! This crate implements a cycle-accurate model of an LPDDR6-class DRAM
//! device with the following:
//! 1. **Catalog:** The command set with scopes, durations, and meta flags.
//! 2. **Timing:** Speed presets, density-derived refresh parameters, and the
//!    full inter-command constraint table.
//! 3. **State:** The channel/rank/bank-group/bank node tree with per-node
//!    issue histories and open-row tracking.
//! 4. **Engine:** The per-tick command pump with readiness, prerequisite,
//!    and row-buffer queries for an external controller.
//! 5. **Trace:** Optional VCD waveform output with encoding lookup tables.
//!
//! The model answers "is this command legal now?" and "what must happen
//! first?"; choosing which command to attempt is the controller's job and
//! stays outside this crate.

/// Command catalog (scopes, durations, meta flags, request translation).
pub mod command;
/// Common types (hierarchy levels, address vectors, errors).
pub mod common;
/// Configuration structures (organization, timing, trace options).
pub mod config;
/// Inter-command timing constraint table.
pub mod constraint;
/// The device engine and its controller-facing query surface.
pub mod device;
/// Node arena: per-node state and issue history.
pub mod node;
/// Device organization (density, DQ width, hierarchy counts).
pub mod org;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Timing parameter vector, presets, and JEDEC rounding.
pub mod timing;
/// VCD trace output.
pub mod trace;

/// Root configuration type; deserialize from JSON or use `Config::default()`.
pub use crate::config::Config;
/// The device model; construct with `Device::new`.
pub use crate::device::Device;
/// Command and request vocabulary.
pub use crate::command::{Command, RequestKind};
/// Address vocabulary.
pub use crate::common::{AddrVec, Level, SimError};
/// Node states, exposed for refresh management and inspection.
pub use crate::node::NodeState;
