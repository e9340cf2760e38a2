//! # Timing Parameter Tests
//!
//! Verifies the LPDDR6_6400 preset, clock-period derivation, JEDEC rounding
//! of the density-indexed refresh tables, and override handling.

use lpddr6_core::config::{Config, TimingConfig, TimingOverride};
use lpddr6_core::org::Organization;
use lpddr6_core::timing::{jedec_rounding, TimingParam, TimingParams};
use lpddr6_core::SimError;

fn resolve(cfg: &TimingConfig, org_preset: &str) -> Result<TimingParams, SimError> {
    let org = Organization::preset(org_preset).unwrap();
    TimingParams::from_config(cfg, &org)
}

// ══════════════════════════════════════════════════════════
// 1. Preset values
// ══════════════════════════════════════════════════════════

#[test]
fn test_preset_values() {
    let t = resolve(&TimingConfig::default(), "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::Rate), 6400);
    assert_eq!(t.get(TimingParam::NBl16), 2);
    assert_eq!(t.get(TimingParam::NCl), 20);
    assert_eq!(t.get(TimingParam::NWckPst), 7);
    assert_eq!(t.get(TimingParam::NRcd), 15);
    assert_eq!(t.get(TimingParam::NRpAb), 17);
    assert_eq!(t.get(TimingParam::NRpPb), 15);
    assert_eq!(t.get(TimingParam::NRas), 34);
    assert_eq!(t.get(TimingParam::NRc), 30);
    assert_eq!(t.get(TimingParam::NWr), 28);
    assert_eq!(t.get(TimingParam::NRtp), 4);
    assert_eq!(t.get(TimingParam::NCwl), 11);
    assert_eq!(t.get(TimingParam::NCcdS), 2);
    assert_eq!(t.get(TimingParam::NCcdL), 4);
    assert_eq!(t.get(TimingParam::NRrd), 4);
    assert_eq!(t.get(TimingParam::NWtrS), 5);
    assert_eq!(t.get(TimingParam::NWtrL), 10);
    assert_eq!(t.get(TimingParam::NFaw), 16);
    assert_eq!(t.get(TimingParam::NPpd), 2);
    assert_eq!(t.get(TimingParam::NCs), 2);
}

#[test]
fn test_tck_derived_from_rate() {
    // 6400 MT/s → 3200 MHz clock → 312.5 ps, truncated.
    let t = resolve(&TimingConfig::default(), "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::TckPs), 312);
}

#[test]
fn test_read_latency() {
    let t = resolve(&TimingConfig::default(), "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.read_latency(), 22);
}

// ══════════════════════════════════════════════════════════
// 2. Density-derived refresh timings
// ══════════════════════════════════════════════════════════

#[test]
fn test_jedec_rounding_rounds_up() {
    assert_eq!(jedec_rounding(210.0, 312), 674); // 210000/312 = 673.08
    assert_eq!(jedec_rounding(120.0, 312), 385);
    assert_eq!(jedec_rounding(0.0, 312), 0);
    // Exact multiples do not round up.
    assert_eq!(jedec_rounding(312.0, 1000), 312);
}

#[test]
fn test_refresh_timings_8gb() {
    let t = resolve(&TimingConfig::default(), "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::NRfcAb), 674); // 210 ns
    assert_eq!(t.get(TimingParam::NRfcPb), 385); // 120 ns
    assert_eq!(t.get(TimingParam::NPbr2Pbr), 289); // 90 ns
    assert_eq!(t.get(TimingParam::NPbr2Act), 26); // 8 ns
    assert_eq!(t.get(TimingParam::NRefi), 12520); // 3906 ns
}

#[test]
fn test_refresh_timings_scale_with_density() {
    let t2 = resolve(&TimingConfig::default(), "LPDDR6_2Gb_x24").unwrap();
    let t16 = resolve(&TimingConfig::default(), "LPDDR6_16Gb_x24").unwrap();
    assert_eq!(t2.get(TimingParam::NRfcAb), jedec_rounding(130.0, 312));
    assert_eq!(t16.get(TimingParam::NRfcAb), jedec_rounding(280.0, 312));
}

#[test]
fn test_32gb_requires_explicit_refresh_timings() {
    // The refresh tables stop at 16 Gb.
    let err = resolve(&TimingConfig::default(), "LPDDR6_32Gb_x24");
    assert!(matches!(err, Err(SimError::Configuration(_))));

    let mut cfg = TimingConfig::default();
    for (name, cycles) in [
        ("nRFCab", 900),
        ("nRFCpb", 500),
        ("nPBR2PBR", 289),
        ("nPBR2ACT", 26),
    ] {
        cfg.overrides
            .insert(name.to_string(), TimingOverride::Cycles(cycles));
    }
    let t = resolve(&cfg, "LPDDR6_32Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::NRfcAb), 900);
}

// ══════════════════════════════════════════════════════════
// 3. Overrides
// ══════════════════════════════════════════════════════════

#[test]
fn test_cycle_override_wins_over_preset() {
    let mut cfg = TimingConfig::default();
    cfg.overrides
        .insert("nRCD".to_string(), TimingOverride::Cycles(18));
    let t = resolve(&cfg, "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::NRcd), 18);
}

#[test]
fn test_nanosecond_override_converts() {
    let mut cfg = TimingConfig::default();
    cfg.overrides
        .insert("tRCD".to_string(), TimingOverride::Nanoseconds(18.0));
    let t = resolve(&cfg, "LPDDR6_8Gb_x24").unwrap();
    assert_eq!(t.get(TimingParam::NRcd), jedec_rounding(18.0, 312)); // 58
}

#[test]
fn test_cycle_override_rejects_float() {
    let mut cfg = TimingConfig::default();
    cfg.overrides
        .insert("nRCD".to_string(), TimingOverride::Nanoseconds(18.0));
    assert!(matches!(
        resolve(&cfg, "LPDDR6_8Gb_x24"),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn test_param_names_round_trip() {
    for p in TimingParam::ALL {
        assert_eq!(TimingParam::from_name(p.name()), Some(p));
    }
    assert_eq!(TimingParam::from_name("nXYZ"), None);
}

#[test]
fn test_no_preset_requires_rate() {
    let cfg: Config = serde_json::from_str(r#"{"timing": {"preset": null}}"#).unwrap();
    assert!(matches!(
        resolve(&cfg.timing, "LPDDR6_8Gb_x24"),
        Err(SimError::Configuration(_))
    ));
}
