//! The device node tree: per-node state and issue history.
//!
//! Nodes are stored in one arena per hierarchy level, children contiguous
//! under their parent, so a node's identity is `(level, flat_index)` and
//! parent/child/sibling navigation is index arithmetic. Only the levels that
//! carry state or history are materialized (channel through bank); rows are
//! tracked as a per-bank map of open rows.

use std::collections::{HashMap, VecDeque};

use crate::command::Command;
use crate::common::{AddrVec, Level};
use crate::constraint::ConstraintTable;
use crate::org::Organization;

/// Operational state of a node.
///
/// The encoding order is the trace encoding of the `bank_status` signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Bank after the first activate phase; the row address is partial.
    PreOpened = 0,
    /// Bank with a fully opened row.
    Opened,
    /// Bank with no open row.
    Closed,
    /// Rank powered up but not otherwise initialized.
    PowerUp,
    /// Level carries no state of its own.
    NotApplicable,
    /// Bank undergoing refresh.
    Refreshing,
}

impl NodeState {
    /// Number of node states.
    pub const COUNT: usize = 6;

    /// All states in trace-encoding order.
    pub const ALL: [NodeState; NodeState::COUNT] = [
        NodeState::PreOpened,
        NodeState::Opened,
        NodeState::Closed,
        NodeState::PowerUp,
        NodeState::NotApplicable,
        NodeState::Refreshing,
    ];

    /// Returns the state's trace encoding.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the state's display name.
    pub fn name(self) -> &'static str {
        match self {
            NodeState::PreOpened => "Pre-Opened",
            NodeState::Opened => "Opened",
            NodeState::Closed => "Closed",
            NodeState::PowerUp => "PowerUp",
            NodeState::NotApplicable => "N/A",
            NodeState::Refreshing => "Refreshing",
        }
    }

    /// Initial state for a node at the given level.
    pub fn initial(level: Level) -> NodeState {
        match level {
            Level::Rank => NodeState::PowerUp,
            Level::Bank | Level::Row => NodeState::Closed,
            _ => NodeState::NotApplicable,
        }
    }
}

/// Ring of the most recent issue cycles of one command, kept only as deep as
/// the widest window constraint watching it.
#[derive(Clone, Debug)]
struct IssueWindow {
    depth: usize,
    cycles: VecDeque<u64>,
}

impl IssueWindow {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            cycles: VecDeque::with_capacity(depth),
        }
    }

    fn push(&mut self, clk: u64) {
        if self.cycles.len() == self.depth {
            self.cycles.pop_front();
        }
        self.cycles.push_back(clk);
    }

    /// The `n`-th most recent issue (1 = latest), or `None` if fewer than
    /// `n` issues have been recorded.
    fn nth_recent(&self, n: usize) -> Option<u64> {
        self.cycles.len().checked_sub(n).map(|i| self.cycles[i])
    }
}

/// A single node: state, open-row map (banks), and issue history.
#[derive(Clone, Debug)]
pub struct Node {
    /// Current operational state.
    pub state: NodeState,
    /// Rows currently open (or pre-opened) in this bank, keyed by row index.
    /// Empty for non-bank levels.
    pub open_rows: HashMap<usize, NodeState>,
    last_issue: [Option<u64>; Command::COUNT],
    windows: Vec<(Command, IssueWindow)>,
}

impl Node {
    fn new(level: Level, window_depths: &[(Command, usize)]) -> Self {
        Self {
            state: NodeState::initial(level),
            open_rows: HashMap::new(),
            last_issue: [None; Command::COUNT],
            windows: window_depths
                .iter()
                .map(|&(cmd, depth)| (cmd, IssueWindow::new(depth)))
                .collect(),
        }
    }

    /// Records that `cmd` was launched through this node at `clk`.
    pub fn record_issue(&mut self, cmd: Command, clk: u64) {
        self.last_issue[cmd.index()] = Some(clk);
        if let Some((_, window)) = self.windows.iter_mut().find(|(c, _)| *c == cmd) {
            window.push(clk);
        }
    }

    /// Most recent launch cycle of `cmd` through this node.
    #[inline]
    pub fn last_issue(&self, cmd: Command) -> Option<u64> {
        self.last_issue[cmd.index()]
    }

    /// The `n`-th most recent launch cycle of `cmd` (1 = latest).
    ///
    /// Returns `None` when fewer than `n` launches have been seen, so a
    /// window constraint never blocks a cold node.
    pub fn nth_recent_issue(&self, cmd: Command, n: usize) -> Option<u64> {
        if n <= 1 {
            return self.last_issue(cmd);
        }
        self.windows
            .iter()
            .find(|(c, _)| *c == cmd)
            .and_then(|(_, w)| w.nth_recent(n))
    }
}

/// Deepest level that is materialized as nodes.
pub const DEEPEST_NODE_LEVEL: Level = Level::Bank;

/// Arena of all nodes, one vector per materialized level.
pub struct NodeArena {
    count: [usize; Level::COUNT],
    levels: Vec<Vec<Node>>,
}

impl NodeArena {
    /// Builds the arena for an organization, sizing history rings from the
    /// constraint table's window demands.
    pub fn new(org: &Organization, constraints: &ConstraintTable) -> NodeArena {
        let count = org.count;
        let mut levels = Vec::new();
        let mut nodes_at_level = 1usize;
        for level in Level::ALL {
            if level > DEEPEST_NODE_LEVEL {
                break;
            }
            nodes_at_level *= count[level.index()];
            let window_depths: Vec<(Command, usize)> = Command::ALL
                .iter()
                .filter_map(|&cmd| {
                    let depth = constraints.window_depth(level, cmd);
                    (depth > 1).then_some((cmd, depth))
                })
                .collect();
            levels.push(vec![Node::new(level, &window_depths); nodes_at_level]);
        }
        NodeArena { count, levels }
    }

    /// Flat index of the node at `level` addressed by `addr`.
    pub fn path_index(&self, level: Level, addr: &AddrVec) -> usize {
        let mut index = 0;
        for l in Level::ALL.iter().take(level.index() + 1) {
            index = index * self.count[l.index()] + addr[l.index()];
        }
        index
    }

    /// Number of nodes at `level`.
    #[inline]
    pub fn level_len(&self, level: Level) -> usize {
        self.levels[level.index()].len()
    }

    /// The node at `(level, index)`.
    #[inline]
    pub fn node(&self, level: Level, index: usize) -> &Node {
        &self.levels[level.index()][index]
    }

    /// Mutable access to the node at `(level, index)`.
    #[inline]
    pub fn node_mut(&mut self, level: Level, index: usize) -> &mut Node {
        &mut self.levels[level.index()][index]
    }

    /// Flat indices of every node sharing a parent with `(level, index)`,
    /// including the node itself.
    pub fn sibling_range(&self, level: Level, index: usize) -> std::ops::Range<usize> {
        let fanout = self.count[level.index()];
        let parent = index / fanout;
        parent * fanout..(parent + 1) * fanout
    }

    /// Flat indices of every bank under the rank at `rank_index`.
    pub fn banks_of_rank(&self, rank_index: usize) -> std::ops::Range<usize> {
        let banks = self.count[Level::BankGroup.index()] * self.count[Level::Bank.index()];
        rank_index * banks..(rank_index + 1) * banks
    }
}
