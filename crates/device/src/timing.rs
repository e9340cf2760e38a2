//! Timing parameters: speed presets, density-derived refresh timings, and
//! user overrides.
//!
//! Parameters are held as a fixed vector of cycle counts indexed by
//! [`TimingParam`]. A speed preset seeds the vector, the refresh-related
//! entries are derived from density-indexed nanosecond tables, and user
//! overrides are applied last. Any parameter still unset afterwards is a
//! configuration error.

use crate::common::SimError;
use crate::config::{TimingConfig, TimingOverride};
use crate::org::Organization;

/// A named timing parameter.
///
/// The discriminant order fixes the layout of [`TimingParams`]; `Rate` and
/// `TckPs` bracket the set and are not user-overridable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingParam {
    /// Transfer rate in MT/s.
    Rate = 0,
    /// Burst length 16 transfer time.
    NBl16,
    /// CAS (read) latency.
    NCl,
    /// WCK post-amble after the last data transfer.
    NWckPst,
    /// Activate-2 to read/write delay.
    NRcd,
    /// All-bank precharge period.
    NRpAb,
    /// Per-bank precharge period.
    NRpPb,
    /// Minimum row-active time.
    NRas,
    /// Activate-to-activate cycle time (same bank).
    NRc,
    /// Write recovery time.
    NWr,
    /// Read to precharge delay.
    NRtp,
    /// CAS write latency.
    NCwl,
    /// Column-to-column delay, different bank group.
    NCcdS,
    /// Column-to-column delay, same bank group.
    NCcdL,
    /// Activate-to-activate delay, different banks.
    NRrd,
    /// Write-to-read turnaround, different bank group.
    NWtrS,
    /// Write-to-read turnaround, same bank group.
    NWtrL,
    /// Four-activate window.
    NFaw,
    /// Precharge-to-precharge delay.
    NPpd,
    /// All-bank refresh cycle time.
    NRfcAb,
    /// Per-bank refresh cycle time.
    NRfcPb,
    /// Average refresh interval.
    NRefi,
    /// Per-bank refresh to per-bank refresh delay.
    NPbr2Pbr,
    /// Per-bank refresh to activate delay.
    NPbr2Act,
    /// Rank-switch (chip-select) gap.
    NCs,
    /// Clock period in picoseconds, derived from the rate.
    TckPs,
}

impl TimingParam {
    /// Number of timing parameters.
    pub const COUNT: usize = 26;

    /// All parameters in vector order.
    pub const ALL: [TimingParam; TimingParam::COUNT] = [
        TimingParam::Rate,
        TimingParam::NBl16,
        TimingParam::NCl,
        TimingParam::NWckPst,
        TimingParam::NRcd,
        TimingParam::NRpAb,
        TimingParam::NRpPb,
        TimingParam::NRas,
        TimingParam::NRc,
        TimingParam::NWr,
        TimingParam::NRtp,
        TimingParam::NCwl,
        TimingParam::NCcdS,
        TimingParam::NCcdL,
        TimingParam::NRrd,
        TimingParam::NWtrS,
        TimingParam::NWtrL,
        TimingParam::NFaw,
        TimingParam::NPpd,
        TimingParam::NRfcAb,
        TimingParam::NRfcPb,
        TimingParam::NRefi,
        TimingParam::NPbr2Pbr,
        TimingParam::NPbr2Act,
        TimingParam::NCs,
        TimingParam::TckPs,
    ];

    /// Returns the parameter's position in the vector.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the parameter's configuration name.
    pub fn name(self) -> &'static str {
        match self {
            TimingParam::Rate => "rate",
            TimingParam::NBl16 => "nBL16",
            TimingParam::NCl => "nCL",
            TimingParam::NWckPst => "nWCKPST",
            TimingParam::NRcd => "nRCD",
            TimingParam::NRpAb => "nRPab",
            TimingParam::NRpPb => "nRPpb",
            TimingParam::NRas => "nRAS",
            TimingParam::NRc => "nRC",
            TimingParam::NWr => "nWR",
            TimingParam::NRtp => "nRTP",
            TimingParam::NCwl => "nCWL",
            TimingParam::NCcdS => "nCCD_S",
            TimingParam::NCcdL => "nCCD_L",
            TimingParam::NRrd => "nRRD",
            TimingParam::NWtrS => "nWTRS",
            TimingParam::NWtrL => "nWTRL",
            TimingParam::NFaw => "nFAW",
            TimingParam::NPpd => "nPPD",
            TimingParam::NRfcAb => "nRFCab",
            TimingParam::NRfcPb => "nRFCpb",
            TimingParam::NRefi => "nREFI",
            TimingParam::NPbr2Pbr => "nPBR2PBR",
            TimingParam::NPbr2Act => "nPBR2ACT",
            TimingParam::NCs => "nCS",
            TimingParam::TckPs => "tCK_ps",
        }
    }

    /// Looks a parameter up by its configuration name.
    pub fn from_name(name: &str) -> Option<TimingParam> {
        TimingParam::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Rounds a nanosecond value up to whole clock cycles.
///
/// JEDEC timing tables specify analog parameters in nanoseconds; devices
/// must honor at least that much time, so the cycle count rounds up.
pub fn jedec_rounding(ns: f64, tck_ps: i64) -> i64 {
    (ns * 1000.0 / tck_ps as f64).ceil() as i64
}

/// Unset-parameter sentinel.
const UNSET: i64 = -1;

/// The timing parameter vector.
///
/// Every entry is non-negative once configuration succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingParams {
    vals: [i64; TimingParam::COUNT],
}

/// All-bank refresh cycle time in nanoseconds, indexed by density
/// (2 Gb, 4 Gb, 8 Gb, 16 Gb).
const TRFCAB_NS: [f64; 4] = [130.0, 180.0, 210.0, 280.0];

/// Per-bank refresh cycle time in nanoseconds.
const TRFCPB_NS: [f64; 4] = [60.0, 90.0, 120.0, 140.0];

/// Per-bank refresh to per-bank refresh delay in nanoseconds.
const TPBR2PBR_NS: [f64; 4] = [60.0, 90.0, 90.0, 90.0];

/// Per-bank refresh to activate delay in nanoseconds.
const TPBR2ACT_NS: [f64; 4] = [8.0, 8.0, 8.0, 8.0];

/// Base average refresh interval in nanoseconds.
const TREFI_BASE_NS: f64 = 3906.0;

/// Returns the refresh-table row for a density, if the tables cover it.
fn density_index(density_mbit: u64) -> Option<usize> {
    match density_mbit {
        2048 => Some(0),
        4096 => Some(1),
        8192 => Some(2),
        16384 => Some(3),
        _ => None,
    }
}

impl TimingParams {
    /// Returns the named speed preset, if it exists.
    ///
    /// The density-dependent refresh parameters are left unset; they are
    /// derived (or overridden) during [`TimingParams::from_config`].
    pub fn preset(name: &str) -> Option<TimingParams> {
        match name {
            "LPDDR6_6400" => {
                let mut t = TimingParams {
                    vals: [UNSET; TimingParam::COUNT],
                };
                let preset = [
                    (TimingParam::Rate, 6400),
                    (TimingParam::NBl16, 2),
                    (TimingParam::NCl, 20),
                    (TimingParam::NWckPst, 7),
                    (TimingParam::NRcd, 15),
                    (TimingParam::NRpAb, 17),
                    (TimingParam::NRpPb, 15),
                    (TimingParam::NRas, 34),
                    (TimingParam::NRc, 30),
                    (TimingParam::NWr, 28),
                    (TimingParam::NRtp, 4),
                    (TimingParam::NCwl, 11),
                    (TimingParam::NCcdS, 2),
                    (TimingParam::NCcdL, 4),
                    (TimingParam::NRrd, 4),
                    (TimingParam::NWtrS, 5),
                    (TimingParam::NWtrL, 10),
                    (TimingParam::NFaw, 16),
                    (TimingParam::NPpd, 2),
                    (TimingParam::NCs, 2),
                ];
                for (p, v) in preset {
                    t.set(p, v);
                }
                Some(t)
            }
            _ => None,
        }
    }

    /// Returns a parameter's value in cycles.
    #[inline(always)]
    pub fn get(&self, p: TimingParam) -> i64 {
        self.vals[p.index()]
    }

    /// Sets a parameter's value in cycles.
    #[inline(always)]
    fn set(&mut self, p: TimingParam, v: i64) {
        self.vals[p.index()] = v;
    }

    /// Read latency: CAS latency plus the burst transfer time.
    #[inline]
    pub fn read_latency(&self) -> i64 {
        self.get(TimingParam::NCl) + self.get(TimingParam::NBl16)
    }

    /// Builds the timing vector from configuration.
    ///
    /// Order of application: speed preset, rate-derived clock period,
    /// density-derived refresh timings, then user overrides. A preset and an
    /// explicit `rate` are mutually exclusive. Every parameter must end up
    /// set.
    pub fn from_config(cfg: &TimingConfig, org: &Organization) -> Result<TimingParams, SimError> {
        let mut t = match &cfg.preset {
            Some(name) => TimingParams::preset(name).ok_or_else(|| {
                SimError::Configuration(format!("unrecognized timing preset \"{}\"", name))
            })?,
            None => TimingParams {
                vals: [UNSET; TimingParam::COUNT],
            },
        };

        if let Some(rate) = cfg.rate {
            if cfg.preset.is_some() {
                return Err(SimError::Configuration(
                    "cannot change the transfer rate when using a speed preset".to_string(),
                ));
            }
            t.set(TimingParam::Rate, rate);
        }
        let rate = t.get(TimingParam::Rate);
        if rate <= 0 {
            return Err(SimError::Configuration(
                "timing rate is not specified".to_string(),
            ));
        }
        let tck_ps = 1_000_000 / (rate / 2);
        t.set(TimingParam::TckPs, tck_ps);

        // Density-derived refresh timings; densities beyond the tables need
        // explicit overrides.
        if let Some(di) = density_index(org.density_mbit) {
            t.set(TimingParam::NRfcAb, jedec_rounding(TRFCAB_NS[di], tck_ps));
            t.set(TimingParam::NRfcPb, jedec_rounding(TRFCPB_NS[di], tck_ps));
            t.set(
                TimingParam::NPbr2Pbr,
                jedec_rounding(TPBR2PBR_NS[di], tck_ps),
            );
            t.set(
                TimingParam::NPbr2Act,
                jedec_rounding(TPBR2ACT_NS[di], tck_ps),
            );
        }
        t.set(TimingParam::NRefi, jedec_rounding(TREFI_BASE_NS, tck_ps));

        t.apply_overrides(cfg, tck_ps)?;

        for p in TimingParam::ALL {
            if t.get(p) == UNSET {
                return Err(SimError::Configuration(format!(
                    "timing {} is not specified",
                    p.name()
                )));
            }
        }
        Ok(t)
    }

    /// Applies user overrides, keyed `nNAME` (cycles) or `tNAME`
    /// (nanoseconds).
    fn apply_overrides(&mut self, cfg: &TimingConfig, tck_ps: i64) -> Result<(), SimError> {
        for (key, value) in &cfg.overrides {
            if key == "rate" || key == "tCK_ps" {
                return Err(SimError::Configuration(format!(
                    "timing parameter {} cannot be overridden",
                    key
                )));
            }
            if let Some(p) = TimingParam::from_name(key) {
                match value {
                    TimingOverride::Cycles(c) => self.set(p, *c),
                    TimingOverride::Nanoseconds(_) => {
                        return Err(SimError::Configuration(format!(
                            "timing {} expects a cycle count; use t{} for nanoseconds",
                            key,
                            &key[1..]
                        )));
                    }
                }
                continue;
            }
            let cycle_name = key
                .strip_prefix('t')
                .map(|rest| format!("n{}", rest))
                .and_then(|n| TimingParam::from_name(&n));
            if let Some(p) = cycle_name {
                let ns = match value {
                    TimingOverride::Nanoseconds(ns) => *ns,
                    TimingOverride::Cycles(c) => *c as f64,
                };
                self.set(p, jedec_rounding(ns, tck_ps));
                continue;
            }
            return Err(SimError::Configuration(format!(
                "unrecognized timing parameter \"{}\"",
                key
            )));
        }
        Ok(())
    }
}
