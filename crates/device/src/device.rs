//! The LPDDR6 device engine.
//!
//! `Device` owns the whole model: organization, timing vector, constraint
//! table, node arena, and the per-tick command pump. A controller drives it
//! through a small query/issue surface:
//! 1. **`check_ready`:** May this command launch now, under every timing
//!    rule on its path?
//! 2. **`get_preq_command`:** Which command must go first to make this one
//!    eventually legal?
//! 3. **`check_rowbuffer_hit` / `check_node_open`:** Row-buffer locality of
//!    a data command.
//! 4. **`issue_command` / `tick`:** Commit a command and advance the clock;
//!    a command's actions fire on its final cycle.
//!
//! Queries are side-effect-free; only `tick` and `issue_command` mutate.

use crate::command::Command;
use crate::common::{flatten_addr, AddrVec, Level, SimError};
use crate::config::Config;
use crate::constraint::{ConstraintTable, TimingConstraint};
use crate::node::{Node, NodeArena, NodeState, DEEPEST_NODE_LEVEL};
use crate::org::Organization;
use crate::stats::DeviceStats;
use crate::timing::{TimingParam, TimingParams};
use crate::trace::VcdTracer;

/// Cycle-accurate LPDDR6 device model.
pub struct Device {
    organization: Organization,
    timing: TimingParams,
    constraints: ConstraintTable,
    arena: NodeArena,
    stats: DeviceStats,
    tracer: Option<VcdTracer>,

    clk: u64,
    cur_cmd: Command,
    cur_cmd_countdown: u64,
    cur_addr: AddrVec,
    /// WCK remains synchronized through this cycle after a data command.
    final_synced_cycle: Option<u64>,
    read_latency: i64,
    /// Previous tick's bank states (first rank), for transition reporting.
    last_bank_states: Vec<NodeState>,
}

/// Deepest materialized level a command's path traverses.
fn deepest_level(cmd: Command) -> Level {
    let scope = cmd.scope();
    if scope > DEEPEST_NODE_LEVEL {
        DEEPEST_NODE_LEVEL
    } else {
        scope
    }
}

impl Device {
    /// Builds a device from configuration.
    ///
    /// Fails with a [`SimError::Configuration`] on unrecognized presets,
    /// inconsistent organization, or missing timing parameters, and with
    /// [`SimError::Io`] when the trace directory cannot be prepared.
    pub fn new(config: &Config) -> Result<Device, SimError> {
        let organization = Organization::from_config(&config.org)?;
        let timing = TimingParams::from_config(&config.timing, &organization)?;
        let constraints = ConstraintTable::build(&timing);
        let arena = NodeArena::new(&organization, &constraints);
        let tracer = match &config.trace.dir {
            Some(dir) => Some(VcdTracer::create(
                dir,
                &organization,
                timing.get(TimingParam::TckPs),
            )?),
            None => None,
        };

        let read_latency = timing.read_latency();
        let banks = organization.banks_per_rank();
        log::info!(
            "LPDDR6 device: {} Mbit x{}, tCK {} ps, read latency {} cycles",
            organization.density_mbit,
            organization.dq,
            timing.get(TimingParam::TckPs),
            read_latency
        );

        Ok(Device {
            organization,
            timing,
            constraints,
            arena,
            stats: DeviceStats::default(),
            tracer,
            clk: 0,
            // Power-up: a NOP is in flight so nothing can issue before the
            // first full command slot.
            cur_cmd: Command::Nop,
            cur_cmd_countdown: 1,
            cur_addr: [0; Level::COUNT],
            final_synced_cycle: None,
            read_latency,
            last_bank_states: vec![NodeState::Closed; banks],
        })
    }

    /// Current device cycle.
    #[inline]
    pub fn clk(&self) -> u64 {
        self.clk
    }

    /// Read latency in cycles (CAS latency plus burst time).
    #[inline]
    pub fn read_latency(&self) -> i64 {
        self.read_latency
    }

    /// Last cycle through which WCK is synchronized, if any data command has
    /// been launched.
    #[inline]
    pub fn final_synced_cycle(&self) -> Option<u64> {
        self.final_synced_cycle
    }

    /// The device organization.
    #[inline]
    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    /// The resolved timing vector.
    #[inline]
    pub fn timing(&self) -> &TimingParams {
        &self.timing
    }

    /// Accumulated statistics.
    #[inline]
    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// State of the bank addressed by `addr`.
    pub fn bank_state(&self, addr: &AddrVec) -> NodeState {
        let index = self.arena.path_index(Level::Bank, addr);
        self.arena.node(Level::Bank, index).state
    }

    /// Forces the state of the bank addressed by `addr`.
    ///
    /// Hook for external refresh management, which marks banks `Refreshing`
    /// for the duration of a refresh operation.
    pub fn set_bank_state(&mut self, addr: &AddrVec, state: NodeState) -> Result<(), SimError> {
        self.validate_addr_to(Level::Bank, addr)?;
        let index = self.arena.path_index(Level::Bank, addr);
        self.arena.node_mut(Level::Bank, index).state = state;
        Ok(())
    }

    /// Advances the device by one cycle.
    ///
    /// Emits the per-cycle trace record, reports bank state transitions,
    /// and finalizes the in-flight command when its countdown expires.
    pub fn tick(&mut self) {
        self.clk += 1;
        self.stats.ticks += 1;

        let wck_synced = self.final_synced_cycle.is_some_and(|f| self.clk <= f);
        if let Some(tracer) = &mut self.tracer {
            let _ = tracer.log_cycle(self.clk, wck_synced);
        }
        self.report_bank_transitions();

        if self.cur_cmd_countdown > 0 {
            if self.cur_cmd_countdown == 1 {
                let (cmd, addr) = (self.cur_cmd, self.cur_addr);
                self.launch_command(cmd, &addr);
            }
            self.cur_cmd_countdown -= 1;

            let flat = flatten_addr(&self.cur_addr, &self.organization.count);
            if let Some(tracer) = &mut self.tracer {
                let _ = tracer.log_command(self.cur_cmd, flat);
            }
        }
    }

    /// Places a command on the CA bus.
    ///
    /// The command occupies the bus for its duration; its actions and its
    /// effect on issue histories take hold on its final cycle. The caller is
    /// expected to have consulted [`Device::check_ready`] first; address
    /// indices are validated here and reject the command outright.
    pub fn issue_command(&mut self, cmd: Command, addr: &AddrVec) -> Result<(), SimError> {
        self.validate_addr_to(cmd.scope(), addr)?;

        let row_hit = cmd.meta().accesses_data && self.check_rowbuffer_hit(cmd, addr);
        self.stats.record_issue(cmd, row_hit);

        self.cur_cmd = cmd;
        self.cur_addr = *addr;
        self.cur_cmd_countdown = cmd.duration() - 1;

        let flat = flatten_addr(addr, &self.organization.count);
        if let Some(tracer) = &mut self.tracer {
            let _ = tracer.log_command(cmd, flat);
        }
        Ok(())
    }

    /// Returns whether `cmd` may launch at the current cycle.
    ///
    /// False on odd cycles (LPDDR6 issues commands on even cycles only),
    /// while a command is in flight, or when any timing rule on the path is
    /// still counting down.
    pub fn check_ready(&self, cmd: Command, addr: &AddrVec) -> bool {
        if self.clk % 2 != 0 {
            return false;
        }
        if self.cur_cmd_countdown > 0 {
            return false;
        }

        for record in self.constraints.restricting(cmd) {
            let target = self.arena.path_index(record.level, addr);
            if record.is_sibling {
                for index in self.arena.sibling_range(record.level, target) {
                    if index != target && self.violates(self.arena.node(record.level, index), record)
                    {
                        return false;
                    }
                }
            } else if self.violates(self.arena.node(record.level, target), record) {
                return false;
            }
        }
        true
    }

    /// Returns the command that must be issued before `cmd` becomes legal on
    /// the addressed node, or `cmd` itself when no precursor is needed.
    ///
    /// Fails with [`SimError::InvalidState`] when the addressed bank is in a
    /// state the resolver does not accept for `cmd`.
    pub fn get_preq_command(&self, cmd: Command, addr: &AddrVec) -> Result<Command, SimError> {
        let deepest = deepest_level(cmd);
        for li in 0..=deepest.index() {
            let level = Level::from_index(li).expect("level on path");
            if let Some(preq) = self.preq_at(level, cmd, addr)? {
                if preq != cmd {
                    return Ok(preq);
                }
            }
        }
        Ok(cmd)
    }

    /// Returns whether a data command targets the row currently open in its
    /// bank. Defined for `RD24`/`WR24` only; false otherwise.
    pub fn check_rowbuffer_hit(&self, cmd: Command, addr: &AddrVec) -> bool {
        match cmd {
            Command::Rd24 | Command::Wr24 => {
                let bank = self.bank(addr);
                bank.state == NodeState::Opened
                    && bank.open_rows.contains_key(&addr[Level::Row.index()])
            }
            _ => false,
        }
    }

    /// Returns whether a data command's bank has a row open or pre-opened.
    /// Defined for `RD24`/`WR24` only; false otherwise.
    pub fn check_node_open(&self, cmd: Command, addr: &AddrVec) -> bool {
        match cmd {
            Command::Rd24 | Command::Wr24 => matches!(
                self.bank(addr).state,
                NodeState::Opened | NodeState::PreOpened
            ),
            _ => false,
        }
    }

    /// The bank node addressed by `addr`.
    fn bank(&self, addr: &AddrVec) -> &Node {
        let index = self.arena.path_index(Level::Bank, addr);
        self.arena.node(Level::Bank, index)
    }

    /// Returns whether `record` blocks launching at the current cycle given
    /// `node`'s issue history.
    fn violates(&self, node: &Node, record: &TimingConstraint) -> bool {
        record.preceding.iter().any(|&p| {
            node.nth_recent_issue(p, record.window)
                .is_some_and(|t| t as i64 + record.latency > self.clk as i64)
        })
    }

    /// Finalizes a command: records the launch cycle in every node on the
    /// path, then applies the per-level actions.
    fn launch_command(&mut self, cmd: Command, addr: &AddrVec) {
        let deepest = deepest_level(cmd);
        for li in 0..=deepest.index() {
            let level = Level::from_index(li).expect("level on path");
            let index = self.arena.path_index(level, addr);
            self.arena.node_mut(level, index).record_issue(cmd, self.clk);
        }
        for li in 0..=deepest.index() {
            let level = Level::from_index(li).expect("level on path");
            self.apply_action(level, cmd, addr);
        }
    }

    /// Applies the state action for `(level, cmd)`, if one exists.
    fn apply_action(&mut self, level: Level, cmd: Command, addr: &AddrVec) {
        match (level, cmd) {
            // All-bank precharge: close every bank of the rank that is not
            // refreshing.
            (Level::Rank, Command::PreA) => {
                let rank = self.arena.path_index(Level::Rank, addr);
                for index in self.arena.banks_of_rank(rank) {
                    let bank = self.arena.node_mut(Level::Bank, index);
                    if matches!(bank.state, NodeState::PreOpened | NodeState::Opened) {
                        bank.state = NodeState::Closed;
                        bank.open_rows.clear();
                    }
                }
            }
            // Data commands re-arm the WCK synchronization window.
            (Level::Rank, Command::Rd24) => {
                let synced = self.timing.get(TimingParam::NCl)
                    + self.timing.get(TimingParam::NBl16)
                    + self.timing.get(TimingParam::NWckPst);
                self.final_synced_cycle = Some(self.clk + synced as u64);
            }
            (Level::Rank, Command::Wr24) => {
                let synced = self.timing.get(TimingParam::NCwl)
                    + self.timing.get(TimingParam::NBl16)
                    + self.timing.get(TimingParam::NWckPst);
                self.final_synced_cycle = Some(self.clk + synced as u64);
            }
            (Level::Bank, Command::Act1) => {
                let row = addr[Level::Row.index()];
                let bank = self.bank_mut(addr);
                bank.state = NodeState::PreOpened;
                bank.open_rows.insert(row, NodeState::PreOpened);
            }
            (Level::Bank, Command::Act2) => {
                let row = addr[Level::Row.index()];
                let bank = self.bank_mut(addr);
                bank.state = NodeState::Opened;
                bank.open_rows.insert(row, NodeState::Opened);
            }
            (Level::Bank, Command::Pre) => {
                let bank = self.bank_mut(addr);
                bank.state = NodeState::Closed;
                bank.open_rows.clear();
            }
            // Auto-precharge variants close the bank once the burst is out.
            (Level::Bank, Command::Rd24A | Command::Wr24A) => {
                let bank = self.bank_mut(addr);
                bank.state = NodeState::Closed;
                bank.open_rows.clear();
            }
            _ => {}
        }
    }

    /// The mutable bank node addressed by `addr`.
    fn bank_mut(&mut self, addr: &AddrVec) -> &mut Node {
        let index = self.arena.path_index(Level::Bank, addr);
        self.arena.node_mut(Level::Bank, index)
    }

    /// Evaluates the prerequisite rule for `(level, cmd)`, if one exists.
    ///
    /// `Ok(None)` means no rule at this level; `Ok(Some(cmd))` means the
    /// rule is satisfied and no precursor is needed.
    fn preq_at(
        &self,
        level: Level,
        cmd: Command,
        addr: &AddrVec,
    ) -> Result<Option<Command>, SimError> {
        match (level, cmd) {
            // All-bank refresh needs every bank of the rank closed.
            (Level::Rank, Command::RefAb | Command::RfmAb) => {
                let rank = self.arena.path_index(Level::Rank, addr);
                for index in self.arena.banks_of_rank(rank) {
                    if self.arena.node(Level::Bank, index).state != NodeState::Closed {
                        return Ok(Some(Command::PreA));
                    }
                }
                Ok(Some(cmd))
            }
            // Per-bank refresh targets the addressed bank pair (b, b+8);
            // either one open means it must be precharged first.
            (Level::Rank, Command::RefPb | Command::RfmPb) => {
                let rank = self.arena.path_index(Level::Rank, addr);
                let target = addr[Level::Bank.index()];
                for (local, index) in self.arena.banks_of_rank(rank).enumerate() {
                    if local != target && local != target + 8 {
                        continue;
                    }
                    if matches!(
                        self.arena.node(Level::Bank, index).state,
                        NodeState::PreOpened | NodeState::Opened
                    ) {
                        return Ok(Some(Command::Pre));
                    }
                }
                Ok(Some(cmd))
            }
            (Level::Bank, Command::Rd24 | Command::Wr24) => {
                let bank = self.bank(addr);
                match bank.state {
                    NodeState::Closed => Ok(Some(Command::Act1)),
                    NodeState::PreOpened => Ok(Some(Command::Act2)),
                    NodeState::Opened => {
                        if bank.open_rows.contains_key(&addr[Level::Row.index()]) {
                            Ok(Some(cmd))
                        } else {
                            Ok(Some(Command::Pre))
                        }
                    }
                    other => Err(SimError::InvalidState(format!(
                        "bank in state {} cannot serve {}",
                        other.name(),
                        cmd.name()
                    ))),
                }
            }
            _ => Ok(None),
        }
    }

    /// Validates the address indices for every level down to `deepest`.
    fn validate_addr_to(&self, deepest: Level, addr: &AddrVec) -> Result<(), SimError> {
        for li in 0..=deepest.index() {
            let count = self.organization.count[li];
            if addr[li] >= count {
                let level = Level::from_index(li).expect("level on path");
                return Err(SimError::InvalidCommand(format!(
                    "{} index {} exceeds the configured count {}",
                    level.name(),
                    addr[li],
                    count
                )));
            }
        }
        Ok(())
    }

    /// Reports bank state transitions of the first rank since the previous
    /// tick, to the log and to the trace.
    fn report_bank_transitions(&mut self) {
        let groups = self.organization.count[Level::BankGroup.index()];
        let banks = self.organization.count[Level::Bank.index()];
        for bg in 0..groups {
            for ba in 0..banks {
                let flat = bg * banks + ba;
                let state = self.arena.node(Level::Bank, flat).state;
                let last = self.last_bank_states[flat];
                if state != last {
                    log::debug!(
                        "clk {}: bankgroup {} bank {}: {} -> {}",
                        self.clk,
                        bg,
                        ba,
                        last.name(),
                        state.name()
                    );
                    self.last_bank_states[flat] = state;
                    if let Some(tracer) = &mut self.tracer {
                        let _ = tracer.log_bank_state(bg, ba, state);
                    }
                }
            }
        }
    }
}
