//! Device hierarchy levels and address vectors.
//!
//! An LPDDR6 device is organized as a fixed six-level hierarchy. Every
//! command is dispatched against an address vector holding one index per
//! level; coarser-scoped commands simply ignore the trailing entries.

/// A position in the device hierarchy, from coarsest to finest.
///
/// The discriminant order is load-bearing: walking a command path means
/// iterating levels from `Channel` down to the command's scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Independent command/data channel.
    Channel = 0,
    /// Rank of devices sharing the channel bus.
    Rank,
    /// Bank group within a rank.
    BankGroup,
    /// Bank within a bank group.
    Bank,
    /// Row within a bank.
    Row,
    /// Column within a row.
    Column,
}

impl Level {
    /// Number of hierarchy levels.
    pub const COUNT: usize = 6;

    /// All levels in traversal order.
    pub const ALL: [Level; Level::COUNT] = [
        Level::Channel,
        Level::Rank,
        Level::BankGroup,
        Level::Bank,
        Level::Row,
        Level::Column,
    ];

    /// Returns the level's position in the hierarchy (0 = channel).
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the level at the given hierarchy position, if any.
    pub fn from_index(index: usize) -> Option<Level> {
        Level::ALL.get(index).copied()
    }

    /// Returns the configuration/display name of the level.
    pub fn name(self) -> &'static str {
        match self {
            Level::Channel => "channel",
            Level::Rank => "rank",
            Level::BankGroup => "bankgroup",
            Level::Bank => "bank",
            Level::Row => "row",
            Level::Column => "column",
        }
    }
}

/// An address vector: one index per hierarchy level.
///
/// Entries beyond a command's scope are ignored by dispatch. Each entry
/// must be less than the configured count for its level (checked on
/// `issue_command`).
pub type AddrVec = [usize; Level::COUNT];

/// Flattens an address vector into a single integer, row-major across
/// the hierarchy (channel is most significant, column least).
///
/// Used for the `addr` trace signal.
pub fn flatten_addr(addr: &AddrVec, count: &[usize; Level::COUNT]) -> u64 {
    let mut flat: u64 = 0;
    for level in Level::ALL {
        flat = flat * count[level.index()] as u64 + addr[level.index()] as u64;
    }
    flat
}
