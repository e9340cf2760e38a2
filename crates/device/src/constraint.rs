//! Inter-command timing constraints.
//!
//! Every JEDEC timing rule is a record: at some hierarchy level, any command
//! in a *preceding* set blocks any command in a *following* set until
//! `issue_cycle + latency`. A record may look further back than the most
//! recent issue (`window`, used for the four-activate window) or at the
//! target's siblings instead of the target itself (`is_sibling`, used for
//! rank-switch gaps).
//!
//! The table is built once from the timing parameters and then consulted on
//! every readiness query, so records are stored indexed by following command.

use crate::command::Command;
use crate::common::Level;
use crate::timing::{TimingParam, TimingParams};

/// A single timing rule.
#[derive(Clone, Debug)]
pub struct TimingConstraint {
    /// Hierarchy level whose issue history the rule consults.
    pub level: Level,
    /// Commands that arm the rule.
    pub preceding: Vec<Command>,
    /// Commands the rule blocks.
    pub following: Vec<Command>,
    /// Minimum distance, in cycles, from the matching issue.
    pub latency: i64,
    /// Which past issue to measure from: 1 = most recent, k = k-th most
    /// recent. A rule with window k never blocks until k issues exist.
    pub window: usize,
    /// Consult the target's siblings (other nodes under the same parent)
    /// instead of the target itself.
    pub is_sibling: bool,
}

impl TimingConstraint {
    fn new(level: Level, preceding: &[Command], following: &[Command], latency: i64) -> Self {
        Self {
            level,
            preceding: preceding.to_vec(),
            following: following.to_vec(),
            latency,
            window: 1,
            is_sibling: false,
        }
    }

    fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    fn between_siblings(mut self) -> Self {
        self.is_sibling = true;
        self
    }
}

/// The full constraint table, indexed by following command.
pub struct ConstraintTable {
    by_following: Vec<Vec<TimingConstraint>>,
}

impl ConstraintTable {
    /// Builds the LPDDR6 constraint table from a resolved timing vector.
    pub fn build(t: &TimingParams) -> ConstraintTable {
        use Command::*;
        let v = |p: TimingParam| t.get(p);

        let reads: &[Command] = &[Rd24, Rd24A];
        let writes: &[Command] = &[Wr24, Wr24A];
        let cas: &[Command] = &[Rd24, Rd24A, Wr24, Wr24A];

        let records = vec![
            // Channel: data bus occupancy.
            TimingConstraint::new(Level::Channel, reads, reads, v(TimingParam::NBl16)),
            TimingConstraint::new(Level::Channel, writes, writes, v(TimingParam::NBl16)),
            // Rank: CAS to CAS.
            TimingConstraint::new(Level::Rank, reads, reads, v(TimingParam::NCcdS)),
            TimingConstraint::new(Level::Rank, writes, writes, v(TimingParam::NCcdS)),
            // Read to write turnaround, assuming a one-cycle write preamble.
            TimingConstraint::new(
                Level::Rank,
                reads,
                writes,
                v(TimingParam::NCl) + v(TimingParam::NCcdS) + 2 - v(TimingParam::NCwl),
            ),
            // Write to read turnaround.
            TimingConstraint::new(
                Level::Rank,
                writes,
                reads,
                v(TimingParam::NCwl) + v(TimingParam::NBl16) + v(TimingParam::NWtrS),
            ),
            // CAS to CAS across sibling ranks: the new rank needs a
            // chip-select gap to take over the data strobes.
            TimingConstraint::new(
                Level::Rank,
                reads,
                cas,
                v(TimingParam::NBl16) + v(TimingParam::NCs),
            )
            .between_siblings(),
            TimingConstraint::new(
                Level::Rank,
                writes,
                reads,
                v(TimingParam::NCl) + v(TimingParam::NBl16) + v(TimingParam::NCs)
                    - v(TimingParam::NCwl),
            )
            .between_siblings(),
            // CAS to all-bank precharge.
            TimingConstraint::new(
                Level::Rank,
                &[Rd24],
                &[PreA],
                v(TimingParam::NRtp) + v(TimingParam::NCcdS),
            ),
            TimingConstraint::new(
                Level::Rank,
                &[Wr24],
                &[PreA],
                v(TimingParam::NCwl) + v(TimingParam::NCcdS) + 1 + v(TimingParam::NWr),
            ),
            // RAS to RAS.
            TimingConstraint::new(Level::Rank, &[Act1], &[Act1, RefPb], v(TimingParam::NRrd)),
            TimingConstraint::new(Level::Rank, &[Act1], &[Act1], v(TimingParam::NFaw))
                .with_window(4),
            TimingConstraint::new(Level::Rank, &[Act1], &[PreA], v(TimingParam::NRas)),
            TimingConstraint::new(Level::Rank, &[PreA], &[Act1], v(TimingParam::NRpAb)),
            // RAS to refresh.
            TimingConstraint::new(Level::Rank, &[Act1], &[RefAb], v(TimingParam::NRc)),
            TimingConstraint::new(Level::Rank, &[Pre], &[RefAb], v(TimingParam::NRpPb)),
            TimingConstraint::new(Level::Rank, &[PreA], &[RefAb], v(TimingParam::NRpAb)),
            TimingConstraint::new(
                Level::Rank,
                &[Rd24A],
                &[RefAb],
                v(TimingParam::NRpPb) + v(TimingParam::NRtp) + v(TimingParam::NCcdS),
            ),
            TimingConstraint::new(
                Level::Rank,
                &[Wr24A],
                &[RefAb],
                v(TimingParam::NCwl)
                    + v(TimingParam::NCcdS)
                    + 1
                    + v(TimingParam::NWr)
                    + v(TimingParam::NRpPb),
            ),
            TimingConstraint::new(
                Level::Rank,
                &[RefAb],
                &[RefAb, Act1, RefPb],
                v(TimingParam::NRfcAb),
            ),
            TimingConstraint::new(Level::Rank, &[Act1], &[RefPb], v(TimingParam::NPbr2Act)),
            TimingConstraint::new(Level::Rank, &[RefPb], &[RefPb], v(TimingParam::NPbr2Pbr)),
            // Same bank group: CAS to CAS.
            TimingConstraint::new(Level::BankGroup, reads, reads, v(TimingParam::NCcdL)),
            TimingConstraint::new(Level::BankGroup, writes, writes, v(TimingParam::NCcdL)),
            TimingConstraint::new(
                Level::BankGroup,
                writes,
                reads,
                v(TimingParam::NCwl) + v(TimingParam::NBl16) + v(TimingParam::NWtrL),
            ),
            // Same bank group: RAS to RAS.
            TimingConstraint::new(Level::BankGroup, &[Act1], &[Act1], v(TimingParam::NRrd)),
            // Bank.
            TimingConstraint::new(Level::Bank, &[Act1], &[Act1], v(TimingParam::NRc)),
            TimingConstraint::new(Level::Bank, &[Act2], cas, v(TimingParam::NRcd)),
            TimingConstraint::new(Level::Bank, &[Act2], &[Pre], v(TimingParam::NRas)),
            TimingConstraint::new(Level::Bank, &[Pre], &[Act1], v(TimingParam::NRpPb)),
            TimingConstraint::new(
                Level::Bank,
                &[Rd24],
                &[Pre],
                v(TimingParam::NRtp) + v(TimingParam::NCcdS),
            ),
            TimingConstraint::new(
                Level::Bank,
                &[Wr24],
                &[Pre],
                v(TimingParam::NCwl) + v(TimingParam::NCcdS) + 1 + v(TimingParam::NWr),
            ),
            TimingConstraint::new(
                Level::Bank,
                &[Rd24A],
                &[Act1],
                v(TimingParam::NRtp) + v(TimingParam::NRpPb) + v(TimingParam::NCcdS),
            ),
            TimingConstraint::new(
                Level::Bank,
                &[Wr24A],
                &[Act1],
                v(TimingParam::NCwl)
                    + v(TimingParam::NCcdS)
                    + 1
                    + v(TimingParam::NWr)
                    + v(TimingParam::NRpPb),
            ),
        ];

        let mut by_following: Vec<Vec<TimingConstraint>> = Vec::with_capacity(Command::COUNT);
        by_following.resize_with(Command::COUNT, Vec::new);
        for record in &records {
            for &cmd in &record.following {
                by_following[cmd.index()].push(record.clone());
            }
        }
        ConstraintTable { by_following }
    }

    /// Returns every record that restricts the given command.
    #[inline]
    pub fn restricting(&self, cmd: Command) -> &[TimingConstraint] {
        &self.by_following[cmd.index()]
    }

    /// Returns the deepest lookback any record demands for issues of `cmd`
    /// at `level` (1 when only most-recent history is consulted).
    ///
    /// Nodes size their history rings from this.
    pub fn window_depth(&self, level: Level, cmd: Command) -> usize {
        self.by_following
            .iter()
            .flatten()
            .filter(|c| c.level == level && c.preceding.contains(&cmd))
            .map(|c| c.window)
            .max()
            .unwrap_or(1)
    }
}
