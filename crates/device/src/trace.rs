//! Waveform trace output.
//!
//! When tracing is enabled the device emits, into the configured directory:
//! 1. **`cmd_trans.txt` / `bank_status_trans.txt`:** lookup tables mapping
//!    the binary trace encodings back to command and state names.
//! 2. **`trace.vcd`:** a Value Change Dump (1 ps timescale) carrying the
//!    cycle counter, the command and address on the CA bus, the WCK
//!    synchronization state, and one status signal per bank of the first
//!    rank.
//!
//! Timestamps are `clk × tCK_ps`. The writer is buffered and flushed on
//! drop, so the file is complete on every exit path.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::command::Command;
use crate::common::Level;
use crate::node::NodeState;
use crate::org::Organization;

/// VCD trace writer.
pub struct VcdTracer {
    vcd: BufWriter<File>,
    tck_ps: i64,
}

impl VcdTracer {
    /// Creates the trace directory, writes the lookup tables and the VCD
    /// header, and leaves the VCD stream open at timestamp zero.
    pub fn create(dir: &Path, org: &Organization, tck_ps: i64) -> io::Result<VcdTracer> {
        std::fs::create_dir_all(dir)?;
        write_command_table(&dir.join("cmd_trans.txt"))?;
        write_state_table(&dir.join("bank_status_trans.txt"))?;

        let mut vcd = BufWriter::new(File::create(dir.join("trace.vcd"))?);
        write_vcd_header(&mut vcd, org)?;
        Ok(VcdTracer { vcd, tck_ps })
    }

    /// Emits the timestamp, cycle counter, and WCK state for a new cycle.
    pub fn log_cycle(&mut self, clk: u64, wck_synced: bool) -> io::Result<()> {
        writeln!(self.vcd, "#{}", clk as i64 * self.tck_ps)?;
        writeln!(self.vcd, "b{:064b} cycle", clk)?;
        writeln!(
            self.vcd,
            "b{} WCKSync",
            if wck_synced { "11" } else { "00" }
        )
    }

    /// Emits the command and flattened address on the CA bus.
    pub fn log_command(&mut self, cmd: Command, flat_addr: u64) -> io::Result<()> {
        writeln!(self.vcd, "b{:07b} cmd", cmd.index())?;
        writeln!(self.vcd, "b{:064b} addr", flat_addr)
    }

    /// Emits a bank status change for bank `ba` of bank group `bg`.
    pub fn log_bank_state(&mut self, bg: usize, ba: usize, state: NodeState) -> io::Result<()> {
        writeln!(
            self.vcd,
            "b{:04b} bank_status_{:02}_{:02}",
            state.index(),
            bg,
            ba
        )
    }
}

impl Drop for VcdTracer {
    fn drop(&mut self) {
        let _ = self.vcd.flush();
    }
}

/// Writes the command encoding table, one `<7-bit> <name>` line per command
/// plus a trailing NOP entry one past the catalog.
fn write_command_table(path: &Path) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    for cmd in Command::ALL {
        writeln!(f, "{:07b} {}", cmd.index(), cmd.name())?;
    }
    writeln!(f, "{:07b} NOP", Command::COUNT)?;
    f.flush()
}

/// Writes the bank state encoding table, one `<4-bit> <name>` line per state.
fn write_state_table(path: &Path) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    for state in NodeState::ALL {
        writeln!(f, "{:04b} {}", state.index(), state.name())?;
    }
    f.flush()
}

/// Writes the VCD header: 1 ps timescale, the CA-bus signals, and one
/// status variable per (bank group, bank) of the first rank.
fn write_vcd_header(w: &mut impl Write, org: &Organization) -> io::Result<()> {
    writeln!(w, "$timescale 1ps $end")?;
    writeln!(w, "$scope module dram $end")?;

    writeln!(w, "$scope module cmd $end")?;
    writeln!(w, "$var wire 64 cycle cycle $end")?;
    writeln!(w, "$var wire 7 cmd cmd $end")?;
    writeln!(w, "$var wire 64 addr addr $end")?;
    writeln!(w, "$var wire 2 WCKSync WCKSync $end")?;
    writeln!(w, "$upscope $end")?;

    writeln!(w, "$scope module bank_status $end")?;
    for bg in 0..org.count[Level::BankGroup.index()] {
        writeln!(w, "$scope module bg{:02} $end", bg)?;
        for ba in 0..org.count[Level::Bank.index()] {
            writeln!(w, "$scope module ba{:02} $end", ba)?;
            writeln!(
                w,
                "$var wire 4 bank_status_{0:02}_{1:02} bank_status_{0:02}_{1:02} $end",
                bg, ba
            )?;
            writeln!(w, "$upscope $end")?;
        }
        writeln!(w, "$upscope $end")?;
    }
    writeln!(w, "$upscope $end")?;

    writeln!(w, "$upscope $end")?;
    writeln!(w, "$enddefinitions $end")?;
    writeln!(w, "#0")
}
