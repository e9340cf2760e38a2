//! LPDDR6 command catalog.
//!
//! This module enumerates the device commands and their static properties:
//! 1. **Scope:** The lowest hierarchy level a command touches.
//! 2. **Duration:** Command length on the CA bus in clock cycles.
//! 3. **Meta flags:** Whether a command opens a row, closes a row, accesses
//!    data, or performs refresh.
//!
//! LPDDR6 splits row activation into two phases: `Act1` drives the upper row
//! bits and leaves the bank pre-opened; `Act2` drives the remainder and opens
//! it. Reads and writes move 24-byte bursts, with `A`-suffixed variants
//! carrying auto-precharge.

use crate::common::Level;

/// A DRAM command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// No operation.
    Nop = 0,
    /// Activate, first phase: upper row address.
    Act1,
    /// Activate, second phase: remaining row address; opens the row.
    Act2,
    /// Precharge a single bank.
    Pre,
    /// Precharge all banks in a rank.
    PreA,
    /// Read a 24-byte burst.
    Rd24,
    /// Write a 24-byte burst.
    Wr24,
    /// Read with auto-precharge.
    Rd24A,
    /// Write with auto-precharge.
    Wr24A,
    /// All-bank refresh.
    RefAb,
    /// Per-bank refresh (refreshes the addressed bank pair).
    RefPb,
    /// All-bank refresh management.
    RfmAb,
    /// Per-bank refresh management.
    RfmPb,
}

/// Static per-command flags consulted by controllers and the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandMeta {
    /// Command leaves a row open in the target bank.
    pub opens_row: bool,
    /// Command closes the target row(s).
    pub closes_row: bool,
    /// Command transfers data on the DQ bus.
    pub accesses_data: bool,
    /// Command performs refresh.
    pub is_refresh: bool,
}

impl Command {
    /// Number of commands in the catalog.
    pub const COUNT: usize = 13;

    /// All commands in catalog (encoding) order.
    pub const ALL: [Command; Command::COUNT] = [
        Command::Nop,
        Command::Act1,
        Command::Act2,
        Command::Pre,
        Command::PreA,
        Command::Rd24,
        Command::Wr24,
        Command::Rd24A,
        Command::Wr24A,
        Command::RefAb,
        Command::RefPb,
        Command::RfmAb,
        Command::RfmPb,
    ];

    /// Returns the command's stable catalog index (used for trace encoding).
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the command at the given catalog index, if any.
    pub fn from_index(index: usize) -> Option<Command> {
        Command::ALL.get(index).copied()
    }

    /// Returns the command's display name.
    pub fn name(self) -> &'static str {
        match self {
            Command::Nop => "NOP",
            Command::Act1 => "ACT-1",
            Command::Act2 => "ACT-2",
            Command::Pre => "PRE",
            Command::PreA => "PREA",
            Command::Rd24 => "RD24",
            Command::Wr24 => "WR24",
            Command::Rd24A => "RD24A",
            Command::Wr24A => "WR24A",
            Command::RefAb => "REFab",
            Command::RefPb => "REFpb",
            Command::RfmAb => "RFMab",
            Command::RfmPb => "RFMpb",
        }
    }

    /// Returns the lowest hierarchy level the command addresses.
    pub fn scope(self) -> Level {
        match self {
            Command::Nop => Level::Channel,
            Command::Act1 | Command::Act2 => Level::Row,
            Command::Pre => Level::Bank,
            Command::PreA => Level::Rank,
            Command::Rd24 | Command::Wr24 | Command::Rd24A | Command::Wr24A => Level::Column,
            Command::RefAb | Command::RefPb | Command::RfmAb | Command::RfmPb => Level::Rank,
        }
    }

    /// Returns the command's duration on the CA bus in clock cycles.
    ///
    /// Every LPDDR6 command occupies two clock cycles, which combined with
    /// the even-cycle issue rule gives the controller one issue slot per
    /// command pair.
    #[inline(always)]
    pub fn duration(self) -> u64 {
        2
    }

    /// Returns the command's meta flags.
    pub fn meta(self) -> CommandMeta {
        const fn meta(
            opens_row: bool,
            closes_row: bool,
            accesses_data: bool,
            is_refresh: bool,
        ) -> CommandMeta {
            CommandMeta {
                opens_row,
                closes_row,
                accesses_data,
                is_refresh,
            }
        }
        match self {
            Command::Nop => meta(false, false, false, false),
            Command::Act1 => meta(false, false, false, false),
            Command::Act2 => meta(true, false, false, false),
            Command::Pre => meta(false, true, false, false),
            Command::PreA => meta(false, true, false, false),
            Command::Rd24 => meta(false, false, true, false),
            Command::Wr24 => meta(false, false, true, false),
            Command::Rd24A => meta(false, true, true, false),
            Command::Wr24A => meta(false, true, true, false),
            Command::RefAb => meta(false, false, false, true),
            Command::RefPb => meta(false, false, false, true),
            Command::RfmAb => meta(false, false, false, true),
            Command::RfmPb => meta(false, false, false, true),
        }
    }
}

/// A controller-level request kind, translated to the command that serves it.
///
/// This is the request vocabulary a memory controller speaks; the device
/// itself only ever sees commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Read a burst from an open row.
    Read,
    /// Write a burst to an open row.
    Write,
    /// Refresh all banks of a rank.
    AllBankRefresh,
    /// Open (activate) a row.
    OpenRow,
    /// Close (precharge) a bank.
    CloseRow,
}

impl RequestKind {
    /// Returns the command that serves this request.
    pub fn command(self) -> Command {
        match self {
            RequestKind::Read => Command::Rd24,
            RequestKind::Write => Command::Wr24,
            RequestKind::AllBankRefresh => Command::RefAb,
            RequestKind::OpenRow => Command::Act1,
            RequestKind::CloseRow => Command::Pre,
        }
    }

    /// Returns the request's wire name (as used in command scripts).
    pub fn name(self) -> &'static str {
        match self {
            RequestKind::Read => "read",
            RequestKind::Write => "write",
            RequestKind::AllBankRefresh => "all-bank-refresh",
            RequestKind::OpenRow => "open-row",
            RequestKind::CloseRow => "close-row",
        }
    }

    /// Parses a request kind from its wire name.
    pub fn from_name(name: &str) -> Option<RequestKind> {
        match name {
            "read" => Some(RequestKind::Read),
            "write" => Some(RequestKind::Write),
            "all-bank-refresh" => Some(RequestKind::AllBankRefresh),
            "open-row" => Some(RequestKind::OpenRow),
            "close-row" => Some(RequestKind::CloseRow),
            _ => None,
        }
    }
}
