use crate::bridge::sync::SyncInfo;

#[test]
fn test_fix_rate_even_divisor() {
    let mut sync = SyncInfo::new(20, 1000);
    sync.fix_rate();
    assert_eq!(sync.rate, 20);
    // 800 / 20 = 40 frames per pulse, 39 skipped
    assert_eq!(sync.skip_count, 39);
}

#[test]
fn test_fix_rate_uneven_divisor() {
    // 800 % 300 != 0, so the rate is reduced to 800 / (800 / 300) = 400
    let mut sync = SyncInfo::new(300, 1000);
    sync.fix_rate();
    assert_eq!(sync.rate, 400);
    assert_eq!(sync.skip_count, 1);
}

#[test]
fn test_fix_rate_above_base_is_clamped() {
    let mut sync = SyncInfo::new(900, 1000);
    sync.fix_rate();
    assert_eq!(sync.rate, 800);
    // Pulse every base frame, nothing skipped
    assert_eq!(sync.skip_count, 0);
}

#[test]
fn test_fix_rate_disabled() {
    let mut sync = SyncInfo::new(0, 1000);
    sync.fix_rate();
    assert!(!sync.enabled());
    assert_eq!(sync.skip_count, 0);

    let mut sync = SyncInfo::new(-5, 1000);
    sync.fix_rate();
    assert!(!sync.enabled());
}

#[test]
fn test_fix_rate_resets_long_pulse() {
    let mut sync = SyncInfo::new(20, 20_000);
    sync.fix_rate();
    assert_eq!(sync.pulse_width_us, 1000);

    // 10ms exactly is allowed
    let mut sync = SyncInfo::new(20, 10_000);
    sync.fix_rate();
    assert_eq!(sync.pulse_width_us, 10_000);
}

#[test]
fn test_update_records_new_pulses_only() {
    let mut sync = SyncInfo::new(20, 1000);
    sync.fix_rate();

    sync.update(1, 100);
    assert_eq!(sync.count(), 1);
    assert_eq!(sync.time_ns(), 100);

    // Same counter value: the pulse time must not move
    sync.update(1, 250);
    assert_eq!(sync.time_ns(), 100);

    sync.update(2, 300);
    assert_eq!(sync.count(), 2);
    assert_eq!(sync.time_ns(), 300);
}

#[test]
fn test_update_ignored_when_disabled() {
    let mut sync = SyncInfo::new(0, 1000);
    sync.update(5, 100);
    assert_eq!(sync.count(), 0);
    assert_eq!(sync.time_ns(), 0);
}
