use super::*;

const PART: &str = "DDR2_micron_16M_8b_x8_sg3E";

fn make_oracle(overrides: &[(&str, &str)]) -> DramOracle {
    let overrides: BTreeMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let (timing, system) = resolve_profiles(PART, "system", &overrides).unwrap();
    DramOracle::new(timing, system, 512).unwrap()
}

fn run(oracle: &mut DramOracle, cycles: u64) -> Vec<OracleEvent> {
    let mut events = Vec::new();
    for _ in 0..cycles {
        oracle.advance_one_cycle();
        while let Some(event) = oracle.poll_event() {
            events.push(event);
        }
    }
    events
}

fn completion_cycle(events: &[OracleEvent], handle: TransactionHandle) -> Option<Cycle> {
    events.iter().find_map(|event| match event {
        OracleEvent::ReadComplete { handle: h, cycle } if *h == handle => Some(*cycle),
        OracleEvent::WriteComplete { handle: h, cycle } if *h == handle => Some(*cycle),
        _ => None,
    })
}

#[test]
fn closed_row_read_pays_activate() {
    let mut oracle = make_oracle(&[]);
    let handle = oracle.submit(0x0, Direction::Read);
    let events = run(&mut oracle, 20);
    // issued at cycle 1: tRCD + CL + burst = 5 + 5 + 2
    assert_eq!(completion_cycle(&events, handle), Some(13));
}

#[test]
fn row_hit_skips_activate() {
    let mut oracle = make_oracle(&[]);
    let first = oracle.submit(0x0, Direction::Read);
    let second = oracle.submit(0x40, Direction::Read);
    let events = run(&mut oracle, 40);
    assert_eq!(completion_cycle(&events, first), Some(13));
    assert_eq!(completion_cycle(&events, second), Some(13 + 5 + 2));
}

#[test]
fn row_conflict_pays_precharge() {
    let mut oracle = make_oracle(&[]);
    let first = oracle.submit(0x0, Direction::Read);
    // same bank, next row
    let second = oracle.submit(8192 * 8, Direction::Read);
    let events = run(&mut oracle, 40);
    assert_eq!(completion_cycle(&events, first), Some(13));
    assert_eq!(completion_cycle(&events, second), Some(13 + 5 + 5 + 5 + 2));
}

#[test]
fn different_banks_overlap() {
    let mut oracle = make_oracle(&[]);
    let first = oracle.submit(0x0, Direction::Read);
    let second = oracle.submit(8192, Direction::Read);
    let events = run(&mut oracle, 20);
    assert_eq!(completion_cycle(&events, first), Some(13));
    assert_eq!(completion_cycle(&events, second), Some(14));
}

#[test]
fn writes_complete_as_write_events() {
    let mut oracle = make_oracle(&[]);
    let handle = oracle.submit(0x80, Direction::Write);
    let events = run(&mut oracle, 20);
    assert!(events
        .iter()
        .any(|e| matches!(e, OracleEvent::WriteComplete { handle: h, .. } if *h == handle)));
    assert!(!events
        .iter()
        .any(|e| matches!(e, OracleEvent::ReadComplete { .. })));
}

#[test]
fn queue_depth_limits_admission() {
    let mut oracle = make_oracle(&[("TRANS_QUEUE_DEPTH", "2")]);
    assert!(oracle.can_accept());
    oracle.submit(0x0, Direction::Read);
    oracle.submit(0x40, Direction::Read);
    assert!(!oracle.can_accept());
    assert_eq!(oracle.outstanding(), 2);
    // one transaction moves to a bank per cycle
    oracle.advance_one_cycle();
    assert!(oracle.can_accept());
    assert_eq!(oracle.outstanding(), 2);
}

#[test]
fn handles_are_unique() {
    let mut oracle = make_oracle(&[]);
    let a = oracle.submit(0x0, Direction::Read);
    let b = oracle.submit(0x0, Direction::Read);
    assert_ne!(a, b);
}

#[test]
fn power_sample_per_epoch() {
    let mut oracle = make_oracle(&[("EPOCH_LENGTH", "10")]);
    let events = run(&mut oracle, 30);
    let samples: Vec<PowerSample> = events
        .iter()
        .filter_map(|e| match e {
            OracleEvent::PowerSample(sample) => Some(*sample),
            _ => None,
        })
        .collect();
    assert_eq!(samples.len(), 3);
    for sample in samples {
        assert_eq!(sample.background, 243.0);
        assert_eq!(sample.burst, 0.0);
        assert_eq!(sample.act_pre, 0.0);
    }
}

#[test]
fn busy_epoch_reports_burst_and_activate_power() {
    let mut oracle = make_oracle(&[("EPOCH_LENGTH", "20")]);
    oracle.submit(0x0, Direction::Read);
    let events = run(&mut oracle, 20);
    let sample = events
        .iter()
        .find_map(|e| match e {
            OracleEvent::PowerSample(sample) => Some(*sample),
            _ => None,
        })
        .unwrap();
    assert_eq!(sample.burst, 405.0 * 2.0 / 20.0);
    assert_eq!(sample.act_pre, 297.0 * 10.0 / 20.0);
}

#[test]
fn refresh_blocks_banks() {
    let mut oracle = make_oracle(&[("REFRESH_PERIOD", "20"), ("tRFC", "10"), ("EPOCH_LENGTH", "20")]);
    let events = run(&mut oracle, 20);
    let sample = events
        .iter()
        .find_map(|e| match e {
            OracleEvent::PowerSample(sample) => Some(*sample),
            _ => None,
        })
        .unwrap();
    assert_eq!(sample.refresh, 1134.0 * 10.0 / 20.0);

    let handle = oracle.submit(0x0, Direction::Read);
    let events = run(&mut oracle, 30);
    // banks are free again at 30, then a closed-row access
    assert_eq!(completion_cycle(&events, handle), Some(30 + 12));
}

#[test]
fn clock_ratio_steps_internal_cycles() {
    let mut oracle = make_oracle(&[]);
    oracle.set_clock_ratio(4);
    oracle.advance_one_cycle();
    assert_eq!(oracle.current_cycle(), 4);
    assert_eq!(oracle.clock_ratio(), 4);
}

#[test]
fn overrides_patch_profiles() {
    let oracle = make_oracle(&[("CL", "7"), ("TRANS_QUEUE_DEPTH", "4"), ("tCK", "2500")]);
    assert_eq!(oracle.timing().cl, 7);
    assert_eq!(oracle.timing().t_ck_ps, 2500);
    assert_eq!(oracle.system().trans_queue_depth, 4);
}

#[test]
fn unknown_override_is_rejected() {
    let overrides = BTreeMap::from([("BOGUS".to_string(), "1".to_string())]);
    let err = resolve_profiles(PART, "system", &overrides).unwrap_err();
    assert!(err.to_string().contains("BOGUS"));
}

#[test]
fn unparsable_override_is_rejected() {
    let overrides = BTreeMap::from([("CL".to_string(), "fast".to_string())]);
    assert!(resolve_profiles(PART, "system", &overrides).is_err());
}

#[test]
fn unknown_profile_lists_choices() {
    let err = DramTiming::lookup("SDR_nonexistent").unwrap_err();
    assert!(err.to_string().contains(PART));
    assert!(DramSystem::lookup("nope").is_err());
}

#[test]
fn zero_sized_memory_is_rejected() {
    let timing = DramTiming::lookup(PART).unwrap();
    let system = DramSystem::lookup("system").unwrap();
    assert!(DramOracle::new(timing, system, 0).is_err());
}

#[test]
fn oversized_memory_is_rejected() {
    let timing = DramTiming::lookup(PART).unwrap();
    let system = DramSystem::lookup("system").unwrap();
    let err = DramOracle::new(timing, system, 1 << 44).err().unwrap();
    assert!(err.to_string().contains("overflows"));
    // largest size that still fits
    let mut oracle = DramOracle::new(timing, system, u64::MAX >> 20).unwrap();
    oracle.submit(u64::MAX, Direction::Read);
    oracle.advance_one_cycle();
    assert_eq!(oracle.outstanding(), 1);
}

#[test]
fn from_config_uses_defaults() {
    let oracle = DramOracle::from_config(&MemConfig::default()).unwrap();
    assert_eq!(oracle.timing().t_ck_ps, 3000);
    assert_eq!(oracle.system().trans_queue_depth, 32);
}
