//! Device organization: density, DQ width, and hierarchy counts.

use crate::common::{Level, SimError};
use crate::config::OrgConfig;

/// Physical organization of the device.
///
/// Set once at initialization and immutable thereafter. The per-level counts
/// must be consistent with the advertised density: the bits addressed below
/// the rank level (`bankgroup × bank × row × column × 8`) must equal
/// `density_mbit << 20`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Organization {
    /// Device density in Mbit.
    pub density_mbit: u64,
    /// DQ (data bus) width.
    pub dq: u32,
    /// Node count per hierarchy level.
    pub count: [usize; Level::COUNT],
}

impl Organization {
    /// Returns the named organization preset, if it exists.
    ///
    /// Presets cover the 2–32 Gb x24 parts, all with one channel, one rank,
    /// four bank groups of four banks, and 2 KiB pages; only the row count
    /// varies with density.
    pub fn preset(name: &str) -> Option<Organization> {
        let org = |density_mbit, row| Organization {
            density_mbit,
            dq: 12,
            count: [1, 1, 4, 4, row, 1 << 11],
        };
        match name {
            "LPDDR6_2Gb_x24" => Some(org(2 << 10, 1 << 13)),
            "LPDDR6_4Gb_x24" => Some(org(4 << 10, 1 << 14)),
            "LPDDR6_8Gb_x24" => Some(org(8 << 10, 1 << 15)),
            "LPDDR6_16Gb_x24" => Some(org(16 << 10, 1 << 16)),
            "LPDDR6_32Gb_x24" => Some(org(32 << 10, 1 << 17)),
            _ => None,
        }
    }

    /// Builds the organization from configuration: preset first, then any
    /// explicit overrides, then the density consistency check.
    pub fn from_config(cfg: &OrgConfig) -> Result<Organization, SimError> {
        let mut org = match &cfg.preset {
            Some(name) => Organization::preset(name).ok_or_else(|| {
                SimError::Configuration(format!("unrecognized organization preset \"{}\"", name))
            })?,
            None => Organization {
                density_mbit: 0,
                dq: 12,
                count: [0; Level::COUNT],
            },
        };

        if let Some(density) = cfg.density {
            org.density_mbit = density;
        }
        if let Some(dq) = cfg.dq {
            org.dq = dq;
        }
        let count_overrides = [
            (Level::Channel, cfg.channel),
            (Level::Rank, cfg.rank),
            (Level::BankGroup, cfg.bankgroup),
            (Level::Bank, cfg.bank),
            (Level::Row, cfg.row),
            (Level::Column, cfg.column),
        ];
        for (level, count) in count_overrides {
            if let Some(count) = count {
                org.count[level.index()] = count;
            }
        }

        for level in Level::ALL {
            if org.count[level.index()] == 0 {
                return Err(SimError::Configuration(format!(
                    "count for level {} is not specified",
                    level.name()
                )));
            }
        }
        org.check_density()?;
        Ok(org)
    }

    /// Verifies that the per-level counts multiply out to the advertised
    /// density.
    pub fn check_density(&self) -> Result<(), SimError> {
        let bits = self.count[Level::BankGroup.index()] as u64
            * self.count[Level::Bank.index()] as u64
            * self.count[Level::Row.index()] as u64
            * self.count[Level::Column.index()] as u64
            * 8;
        let computed_mbit = bits >> 20;
        if computed_mbit != self.density_mbit {
            return Err(SimError::Configuration(format!(
                "calculated chip density {} Mb does not equal the provided density {} Mb",
                computed_mbit, self.density_mbit
            )));
        }
        Ok(())
    }

    /// Total banks in one rank (across all bank groups).
    #[inline]
    pub fn banks_per_rank(&self) -> usize {
        self.count[Level::BankGroup.index()] * self.count[Level::Bank.index()]
    }
}
