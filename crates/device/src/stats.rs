//! Device statistics collection and reporting.
//!
//! Tracks what the device was asked to do: cycles simulated, commands issued
//! by class, and row-buffer locality of the data commands.

use crate::command::Command;

/// Counters accumulated over a simulation run.
#[derive(Clone, Debug, Default)]
pub struct DeviceStats {
    /// Total device cycles simulated.
    pub ticks: u64,
    /// Total commands issued (excluding the implicit power-up NOP).
    pub commands_issued: u64,
    /// Activate commands issued (both phases).
    pub activates: u64,
    /// Read commands issued.
    pub reads: u64,
    /// Write commands issued.
    pub writes: u64,
    /// Precharge commands issued (single and all-bank).
    pub precharges: u64,
    /// Refresh and refresh-management commands issued.
    pub refreshes: u64,
    /// Data commands that hit an open row.
    pub row_hits: u64,
    /// Data commands that did not hit an open row.
    pub row_misses: u64,
}

impl DeviceStats {
    /// Accounts one issued command. `row_hit` is meaningful only for data
    /// commands and ignored otherwise.
    pub fn record_issue(&mut self, cmd: Command, row_hit: bool) {
        self.commands_issued += 1;
        match cmd {
            Command::Act1 | Command::Act2 => self.activates += 1,
            Command::Rd24 | Command::Rd24A => self.reads += 1,
            Command::Wr24 | Command::Wr24A => self.writes += 1,
            Command::Pre | Command::PreA => self.precharges += 1,
            Command::RefAb | Command::RefPb | Command::RfmAb | Command::RfmPb => {
                self.refreshes += 1
            }
            Command::Nop => {}
        }
        if cmd.meta().accesses_data {
            if row_hit {
                self.row_hits += 1;
            } else {
                self.row_misses += 1;
            }
        }
    }

    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        let data = self.row_hits + self.row_misses;
        let hit_rate = if data > 0 {
            100.0 * self.row_hits as f64 / data as f64
        } else {
            0.0
        };
        println!("\n==========================================================");
        println!("LPDDR6 DEVICE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.ticks);
        println!("commands_issued          {}", self.commands_issued);
        println!("----------------------------------------------------------");
        println!("  cmd.activate           {}", self.activates);
        println!("  cmd.read               {}", self.reads);
        println!("  cmd.write              {}", self.writes);
        println!("  cmd.precharge          {}", self.precharges);
        println!("  cmd.refresh            {}", self.refreshes);
        println!("----------------------------------------------------------");
        println!("  rowbuffer.hits         {}", self.row_hits);
        println!("  rowbuffer.misses       {}", self.row_misses);
        println!("  rowbuffer.hit_rate     {:.2}%", hit_rate);
        println!("==========================================================");
    }
}
