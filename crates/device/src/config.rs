//! Configuration system for the LPDDR6 device model.
//!
//! This module defines the configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline presets selected when nothing is overridden.
//! 2. **Organization options:** Preset name plus per-level count, density,
//!    and DQ-width overrides.
//! 3. **Timing options:** Speed-preset name plus per-parameter overrides in
//!    cycles (`nRCD`) or nanoseconds (`tRCD`).
//! 4. **Trace options:** Optional output directory enabling the VCD tracer.
//!
//! Configuration is supplied as JSON or built with `Config::default()`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Default configuration constants for the simulator.
mod defaults {
    /// Default organization preset: 8 Gb, x24 device.
    pub const ORG_PRESET: &str = "LPDDR6_8Gb_x24";

    /// Default speed preset: LPDDR6-6400.
    pub const TIMING_PRESET: &str = "LPDDR6_6400";
}

/// Root configuration for the device model.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use lpddr6_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.org.preset.as_deref(), Some("LPDDR6_8Gb_x24"));
/// assert_eq!(config.timing.preset.as_deref(), Some("LPDDR6_6400"));
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use lpddr6_core::config::{Config, TimingOverride};
///
/// let json = r#"{
///     "org": {
///         "preset": "LPDDR6_4Gb_x24",
///         "dq": 12
///     },
///     "timing": {
///         "preset": "LPDDR6_6400",
///         "nRCD": 18,
///         "tRFCab": 210.0
///     },
///     "trace": {
///         "dir": "trace"
///     }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.org.preset.as_deref(), Some("LPDDR6_4Gb_x24"));
/// assert_eq!(config.timing.overrides["nRCD"], TimingOverride::Cycles(18));
/// assert_eq!(config.timing.overrides["tRFCab"], TimingOverride::Nanoseconds(210.0));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Device organization (density, DQ width, per-level counts).
    #[serde(default)]
    pub org: OrgConfig,
    /// Timing parameters (speed preset and overrides).
    #[serde(default)]
    pub timing: TimingConfig,
    /// Trace output options.
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Organization options: a preset plus individual overrides.
///
/// A preset fills density, DQ width, and every per-level count; explicit
/// fields then override individual values. With `preset` set to `null`,
/// every field must be provided.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgConfig {
    /// Organization preset name (e.g. `LPDDR6_8Gb_x24`).
    #[serde(default = "OrgConfig::default_preset")]
    pub preset: Option<String>,

    /// Device density override in Mbit.
    #[serde(default)]
    pub density: Option<u64>,

    /// DQ width override.
    #[serde(default)]
    pub dq: Option<u32>,

    /// Channel count override.
    #[serde(default)]
    pub channel: Option<usize>,

    /// Rank count override.
    #[serde(default)]
    pub rank: Option<usize>,

    /// Bank-group count override.
    #[serde(default)]
    pub bankgroup: Option<usize>,

    /// Banks-per-group count override.
    #[serde(default)]
    pub bank: Option<usize>,

    /// Row count override.
    #[serde(default)]
    pub row: Option<usize>,

    /// Column count override.
    #[serde(default)]
    pub column: Option<usize>,
}

impl OrgConfig {
    /// Returns the default organization preset name.
    fn default_preset() -> Option<String> {
        Some(defaults::ORG_PRESET.to_string())
    }
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            preset: Self::default_preset(),
            density: None,
            dq: None,
            channel: None,
            rank: None,
            bankgroup: None,
            bank: None,
            row: None,
            column: None,
        }
    }
}

/// A single timing override value.
///
/// Overrides keyed by the cycle name (`nRCD`) must be integer cycle counts;
/// overrides keyed by the time name (`tRCD`) are nanoseconds and are
/// converted with JEDEC rounding against the derived clock period.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimingOverride {
    /// A value in clock cycles.
    Cycles(i64),
    /// A value in nanoseconds.
    Nanoseconds(f64),
}

/// Timing options: a speed preset plus per-parameter overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Speed preset name (e.g. `LPDDR6_6400`).
    #[serde(default = "TimingConfig::default_preset")]
    pub preset: Option<String>,

    /// Transfer rate in MT/s. Only valid without a speed preset.
    #[serde(default)]
    pub rate: Option<i64>,

    /// Per-parameter overrides, keyed `nNAME` (cycles) or `tNAME`
    /// (nanoseconds). `rate` and `tCK_ps` cannot be overridden here.
    #[serde(flatten)]
    pub overrides: HashMap<String, TimingOverride>,
}

impl TimingConfig {
    /// Returns the default speed preset name.
    fn default_preset() -> Option<String> {
        Some(defaults::TIMING_PRESET.to_string())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            preset: Self::default_preset(),
            rate: None,
            overrides: HashMap::new(),
        }
    }
}

/// Trace output options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceConfig {
    /// Output directory for the VCD trace and lookup tables. Tracing is
    /// disabled when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
