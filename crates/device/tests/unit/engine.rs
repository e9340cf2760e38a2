//! # Engine Tests
//!
//! Drives the device through full command sequences and verifies the
//! engine-level rules: the even-cycle issue slot, in-flight exclusion, and
//! the cycle arithmetic of the major timing constraints (nRCD, nRAS, nRC,
//! nRRD, nFAW, write-to-read turnaround, rank switching, refresh recovery).
//!
//! All expected cycles assume the default LPDDR6_8Gb_x24 / LPDDR6_6400
//! configuration. A command issued at an even cycle `t` lands (applies its
//! actions and enters the issue histories) at `t + 1`.

use crate::common::{addr, TestContext};
use lpddr6_core::{Command, SimError};

// ══════════════════════════════════════════════════════════
// 1. Issue slots: even cycles, one command in flight
// ══════════════════════════════════════════════════════════

#[test]
fn test_power_up_nop_blocks_cycle_zero() {
    let ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 0, 0);
    assert_eq!(ctx.device.clk(), 0);
    assert!(!ctx.device.check_ready(Command::Act1, &a));
}

#[test]
fn test_first_issuable_cycle_is_two() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 0, 0);
    assert_eq!(ctx.first_ready(Command::Act1, &a, 10), 2);
}

#[test]
fn test_odd_cycles_never_ready() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 0, 0);
    for _ in 0..50 {
        ctx.device.tick();
        if ctx.device.clk() % 2 == 1 {
            assert!(!ctx.device.check_ready(Command::Act1, &a));
            assert!(!ctx.device.check_ready(Command::Nop, &a));
        }
    }
}

#[test]
fn test_in_flight_command_blocks_everything() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 0, 0);
    let elsewhere = addr(0, 0, 3, 3, 0, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    // Same cycle, different bank: still blocked while the bus is busy.
    assert!(!ctx.device.check_ready(Command::Act1, &elsewhere));
    assert!(!ctx.device.check_ready(Command::Nop, &elsewhere));
}

#[test]
fn test_monotone_readiness() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &a);
    let first = ctx.first_ready(Command::Rd24, &a, 100);
    // With no intervening issues, readiness holds on every later even slot.
    for _ in 0..40 {
        ctx.device.tick();
        if ctx.device.clk() % 2 == 0 {
            assert!(
                ctx.device.check_ready(Command::Rd24, &a),
                "regressed at clk {} (first ready {})",
                ctx.device.clk(),
                first
            );
        }
    }
}

// ══════════════════════════════════════════════════════════
// 2. Activation: ACT-1 → ACT-2 → data
// ══════════════════════════════════════════════════════════

#[test]
fn test_act2_ready_once_act1_lands() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    // In flight at 2, odd at 3; the next slot is the first legal one.
    assert!(!ctx.device.check_ready(Command::Act2, &a));
    ctx.run_to(3);
    assert!(!ctx.device.check_ready(Command::Act2, &a));
    ctx.run_to(4);
    assert!(ctx.device.check_ready(Command::Act2, &a));
}

#[test]
fn test_read_gated_by_nrcd() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &a);
    // ACT-2 lands at 5; nRCD = 15 gates the read until 20.
    ctx.run_to(18);
    assert!(!ctx.device.check_ready(Command::Rd24, &a));
    ctx.run_to(20);
    assert!(ctx.device.check_ready(Command::Rd24, &a));
    assert!(ctx.device.check_rowbuffer_hit(Command::Rd24, &a));
}

#[test]
fn test_precharge_after_read_waits_for_nras() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &a);
    ctx.run_to(20);
    ctx.issue(Command::Rd24, &a);
    // Read-to-precharge alone would allow 21 + nRTP + nCCD_S = 27, but
    // nRAS from ACT-2 (5 + 34 = 39) dominates.
    ctx.run_to(38);
    assert!(!ctx.device.check_ready(Command::Pre, &a));
    ctx.run_to(40);
    assert!(ctx.device.check_ready(Command::Pre, &a));
}

#[test]
fn test_trc_between_activates_of_one_bank() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    // nRC = 30 from the launch at 3; readiness is timing-only, so the
    // bank's state does not matter here.
    ctx.run_to(32);
    assert!(!ctx.device.check_ready(Command::Act1, &a));
    ctx.run_to(34);
    assert!(ctx.device.check_ready(Command::Act1, &a));
}

// ══════════════════════════════════════════════════════════
// 3. nRRD / nFAW across a rank
// ══════════════════════════════════════════════════════════

#[test]
fn test_nrrd_paces_activates() {
    let mut ctx = TestContext::new();
    let banks = [
        addr(0, 0, 0, 0, 1, 0),
        addr(0, 0, 1, 0, 1, 0),
        addr(0, 0, 2, 0, 1, 0),
        addr(0, 0, 3, 0, 1, 0),
    ];
    let mut issue_cycles = Vec::new();
    for bank in &banks {
        let at = ctx.first_ready(Command::Act1, bank, 100);
        ctx.issue(Command::Act1, bank);
        issue_cycles.push(at);
    }
    // Launches land on odd cycles; nRRD = 4 forces six-cycle issue spacing
    // on the even-slot grid.
    assert_eq!(issue_cycles, vec![2, 8, 14, 20]);
    for pair in issue_cycles.windows(2) {
        assert!(pair[1] - pair[0] >= 4);
    }
}

#[test]
fn test_fifth_activate_paced_by_nrrd_when_faw_is_loose() {
    let mut ctx = TestContext::new();
    for bg in 0..4 {
        let bank = addr(0, 0, bg, 0, 1, 0);
        ctx.first_ready(Command::Act1, &bank, 100);
        ctx.issue(Command::Act1, &bank);
    }
    // Four launches at 3, 9, 15, 21. The four-activate window (16 from the
    // launch at 3) expired long ago; only nRRD from 21 gates the fifth.
    let fifth = addr(0, 0, 0, 1, 1, 0);
    assert_eq!(ctx.first_ready(Command::Act1, &fifth, 100), 26);
}

#[test]
fn test_faw_gates_the_fifth_activate_when_tightened() {
    let mut ctx = TestContext::with_overrides(|config| {
        config
            .timing
            .overrides
            .insert("nFAW".to_string(), lpddr6_core::config::TimingOverride::Cycles(40));
    });
    for bg in 0..4 {
        let bank = addr(0, 0, bg, 0, 1, 0);
        ctx.first_ready(Command::Act1, &bank, 100);
        ctx.issue(Command::Act1, &bank);
    }
    // Launches at 3, 9, 15, 21; the fourth-most-recent is 3, so the window
    // holds the fifth activate until 3 + 40 = 43, next slot 44.
    let fifth = addr(0, 0, 0, 1, 1, 0);
    ctx.run_to(42);
    assert!(!ctx.device.check_ready(Command::Act1, &fifth));
    assert_eq!(ctx.first_ready(Command::Act1, &fifth, 100), 44);
}

#[test]
fn test_faw_spans_the_rank_not_the_bank_group() {
    let mut ctx = TestContext::with_overrides(|config| {
        config
            .timing
            .overrides
            .insert("nFAW".to_string(), lpddr6_core::config::TimingOverride::Cycles(40));
    });
    // All four activates in one bank group still arm the rank-level window.
    for ba in 0..4 {
        let bank = addr(0, 0, 0, ba, 1, 0);
        ctx.first_ready(Command::Act1, &bank, 100);
        ctx.issue(Command::Act1, &bank);
    }
    let fifth = addr(0, 0, 1, 0, 1, 0);
    ctx.run_to(42);
    assert!(!ctx.device.check_ready(Command::Act1, &fifth));
}

// ══════════════════════════════════════════════════════════
// 4. Write-to-read turnaround and rank switching
// ══════════════════════════════════════════════════════════

#[test]
fn test_write_to_read_same_rank_uses_nwtrs() {
    let mut ctx = TestContext::new();
    let writer = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &writer);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &writer);
    ctx.run_to(20);
    ctx.issue(Command::Wr24, &writer);
    // Write lands at 21. Cross-bank-group read: 21 + nCWL + nBL16 + nWTRS
    // = 39, next slot 40.
    let other_group = addr(0, 0, 1, 0, 5, 0);
    ctx.run_to(38);
    assert!(!ctx.device.check_ready(Command::Rd24, &other_group));
    ctx.run_to(40);
    assert!(ctx.device.check_ready(Command::Rd24, &other_group));
}

#[test]
fn test_write_to_read_same_bank_group_uses_nwtrl() {
    let mut ctx = TestContext::new();
    let writer = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &writer);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &writer);
    ctx.run_to(20);
    ctx.issue(Command::Wr24, &writer);
    // Same bank group: 21 + nCWL + nBL16 + nWTRL = 44.
    let same_group = addr(0, 0, 0, 1, 5, 0);
    ctx.run_to(42);
    assert!(!ctx.device.check_ready(Command::Rd24, &same_group));
    ctx.run_to(44);
    assert!(ctx.device.check_ready(Command::Rd24, &same_group));
}

#[test]
fn test_sibling_rank_switch_uses_ncs() {
    let mut ctx = TestContext::with_overrides(|config| {
        config.org.rank = Some(2);
    });
    let rank0 = addr(0, 0, 0, 0, 5, 0);
    // Same-rank comparison point in a different bank group, so only the
    // rank-level turnaround applies.
    let rank0_other_group = addr(0, 0, 1, 0, 5, 0);
    let rank1 = addr(0, 1, 0, 0, 5, 0);
    ctx.run_to(2);
    // Readiness is timing-only, so the write can probe a cold bank.
    ctx.issue(Command::Wr24, &rank0);
    // Write lands at 3. The sibling rank pays the rank-switch gap:
    // 3 + nCL + nBL16 + nCS - nCWL = 16; the same rank pays the full
    // write-to-read turnaround: 3 + nCWL + nBL16 + nWTRS = 21 → slot 22.
    ctx.run_to(14);
    assert!(!ctx.device.check_ready(Command::Rd24, &rank1));
    ctx.run_to(16);
    assert!(ctx.device.check_ready(Command::Rd24, &rank1));
    assert!(!ctx.device.check_ready(Command::Rd24, &rank0_other_group));
    ctx.run_to(22);
    assert!(ctx.device.check_ready(Command::Rd24, &rank0_other_group));
}

// ══════════════════════════════════════════════════════════
// 5. Refresh
// ══════════════════════════════════════════════════════════

#[test]
fn test_refresh_sequence_with_open_bank() {
    let mut ctx = TestContext::new();
    let open = addr(0, 0, 1, 2, 9, 0);
    let rank = addr(0, 0, 0, 0, 0, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &open);
    ctx.run_to(3);
    assert_eq!(
        ctx.device.get_preq_command(Command::RefAb, &rank).unwrap(),
        Command::PreA
    );

    // PREA waits for nRAS from the activate (3 + 34 = 37 → 38).
    assert_eq!(ctx.first_ready(Command::PreA, &rank, 100), 38);
    ctx.issue(Command::PreA, &rank);
    ctx.run_to(39);
    assert_eq!(
        ctx.device.get_preq_command(Command::RefAb, &rank).unwrap(),
        Command::RefAb
    );

    // REFab waits for nRPab from the all-bank precharge (39 + 17 = 56).
    ctx.run_to(54);
    assert!(!ctx.device.check_ready(Command::RefAb, &rank));
    ctx.run_to(56);
    assert!(ctx.device.check_ready(Command::RefAb, &rank));
    ctx.issue(Command::RefAb, &rank);

    // Activates are locked out for nRFCab after the refresh lands at 57.
    ctx.run_to(730);
    assert!(!ctx.device.check_ready(Command::Act1, &open));
    ctx.run_to(732);
    assert!(ctx.device.check_ready(Command::Act1, &open));
}

#[test]
fn test_refpb_spacing() {
    let mut ctx = TestContext::new();
    let pair0 = addr(0, 0, 0, 0, 0, 0);
    let pair1 = addr(0, 0, 0, 1, 0, 0);
    ctx.run_to(2);
    ctx.issue(Command::RefPb, &pair0);
    // Lands at 3; the next per-bank refresh waits nPBR2PBR = 289 cycles
    // (3 + 289 = 292).
    ctx.run_to(290);
    assert!(!ctx.device.check_ready(Command::RefPb, &pair1));
    ctx.run_to(292);
    assert!(ctx.device.check_ready(Command::RefPb, &pair1));
}

// ══════════════════════════════════════════════════════════
// 6. WCK synchronization and read latency
// ══════════════════════════════════════════════════════════

#[test]
fn test_read_latency_exposed() {
    let ctx = TestContext::new();
    assert_eq!(ctx.device.read_latency(), 22); // nCL + nBL16
}

#[test]
fn test_wck_sync_window_after_read() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    assert_eq!(ctx.device.final_synced_cycle(), None);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &a);
    ctx.run_to(20);
    ctx.issue(Command::Rd24, &a);
    ctx.run_to(21);
    // Landed at 21: synced through 21 + nCL + nBL16 + nWCKPST = 50.
    assert_eq!(ctx.device.final_synced_cycle(), Some(50));
}

#[test]
fn test_wck_sync_window_after_write() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    ctx.issue(Command::Act1, &a);
    ctx.run_to(4);
    ctx.issue(Command::Act2, &a);
    ctx.run_to(20);
    ctx.issue(Command::Wr24, &a);
    ctx.run_to(21);
    // Landed at 21: synced through 21 + nCWL + nBL16 + nWCKPST = 41.
    assert_eq!(ctx.device.final_synced_cycle(), Some(41));
}

// ══════════════════════════════════════════════════════════
// 7. Address validation
// ══════════════════════════════════════════════════════════

#[test]
fn test_out_of_range_addresses_rejected() {
    let mut ctx = TestContext::new();
    ctx.run_to(2);

    // Row beyond the 8 Gb organization.
    let bad_row = addr(0, 0, 0, 0, 1 << 15, 0);
    assert!(matches!(
        ctx.device.issue_command(Command::Act1, &bad_row),
        Err(SimError::InvalidCommand(_))
    ));

    // Column beyond the page.
    let bad_col = addr(0, 0, 0, 0, 5, 1 << 11);
    assert!(matches!(
        ctx.device.issue_command(Command::Rd24, &bad_col),
        Err(SimError::InvalidCommand(_))
    ));

    // Rank beyond the organization.
    let bad_rank = addr(0, 1, 0, 0, 0, 0);
    assert!(matches!(
        ctx.device.issue_command(Command::RefAb, &bad_rank),
        Err(SimError::InvalidCommand(_))
    ));
}

#[test]
fn test_rejected_issue_leaves_the_device_idle() {
    let mut ctx = TestContext::new();
    let a = addr(0, 0, 0, 0, 5, 0);
    ctx.run_to(2);
    let bad_row = addr(0, 0, 0, 0, 1 << 15, 0);
    let _ = ctx.device.issue_command(Command::Act1, &bad_row);
    // The slot is still usable.
    assert!(ctx.device.check_ready(Command::Act1, &a));
}
