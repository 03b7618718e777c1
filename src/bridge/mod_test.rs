use crate::bridge::fix_imu_rate;

#[test]
fn test_fix_imu_rate_even_divisor() {
    assert_eq!(fix_imu_rate(100), 100);
    assert_eq!(fix_imu_rate(800), 800);
    assert_eq!(fix_imu_rate(400), 400);
}

#[test]
fn test_fix_imu_rate_zero_uses_default() {
    assert_eq!(fix_imu_rate(0), 100);
}

#[test]
fn test_fix_imu_rate_above_base_is_clamped() {
    assert_eq!(fix_imu_rate(1000), 800);
    assert_eq!(fix_imu_rate(801), 800);
}

#[test]
fn test_fix_imu_rate_uneven_divisor() {
    // 800 / (800 / 300) = 800 / 2 = 400
    assert_eq!(fix_imu_rate(300), 400);
    // 800 / (800 / 500) = 800 / 1 = 800
    assert_eq!(fix_imu_rate(500), 800);
    // 800 / (800 / 250) = 800 / 3 = 266 (a single correction pass, as in
    // the upstream node)
    assert_eq!(fix_imu_rate(250), 266);
}
