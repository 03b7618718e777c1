use crate::bridge::{
    convert::{fill_imu_message, fill_twist_message, orientation, quaternion_from_ypr_degrees},
    messages::Header,
};
use crate::drivers::vn100::packet::CompositeData;

const EPSILON: f64 = 1e-6;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_quaternion_identity() {
    let q = quaternion_from_ypr_degrees(0.0, 0.0, 0.0);
    assert_close(q.w, 1.0);
    assert_close(q.x, 0.0);
    assert_close(q.y, 0.0);
    assert_close(q.z, 0.0);
}

#[test]
fn test_quaternion_yaw_90() {
    let q = quaternion_from_ypr_degrees(90.0, 0.0, 0.0);
    let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
    assert_close(q.w, half_sqrt2);
    assert_close(q.z, half_sqrt2);
    assert_close(q.x, 0.0);
    assert_close(q.y, 0.0);
}

#[test]
fn test_quaternion_roll_180() {
    let q = quaternion_from_ypr_degrees(0.0, 0.0, 180.0);
    assert_close(q.w, 0.0);
    assert_close(q.x, 1.0);
}

#[test]
fn test_quaternion_is_normalized() {
    let q = quaternion_from_ypr_degrees(123.4, -56.7, 89.0);
    let norm = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
    assert_close(norm, 1.0);
}

#[test]
fn test_orientation_prefers_ypr() {
    let data = CompositeData {
        ypr: Some([90.0, 0.0, 0.0]),
        ..Default::default()
    };
    let q = orientation(&data);
    assert_close(q.z, std::f64::consts::FRAC_1_SQRT_2);
}

#[test]
fn test_orientation_from_device_quaternion() {
    let data = CompositeData {
        quaternion: Some([0.1, 0.2, 0.3, 0.9]),
        ..Default::default()
    };
    let q = orientation(&data);
    assert_close(q.x, 0.1f32 as f64);
    assert_close(q.w, 0.9f32 as f64);
}

#[test]
fn test_fill_imu_message() {
    let data = CompositeData {
        ypr: Some([0.0, 0.0, 0.0]),
        angular_rate: [0.1, -0.2, 0.3],
        acceleration: [0.0, 0.0, -9.81],
        ..Default::default()
    };
    let header = Header {
        stamp_ns: 42,
        frame_id: "imu".to_string(),
    };
    let msg = fill_imu_message(header, &data);
    assert_eq!(msg.header.stamp_ns, 42);
    assert_eq!(msg.header.frame_id, "imu");
    assert_close(msg.angular_velocity.x, 0.1f32 as f64);
    assert_close(msg.linear_acceleration.z, -9.81f32 as f64);
    assert_close(msg.orientation.w, 1.0);
}

#[test]
fn test_fill_twist_message_carries_acceleration() {
    let data = CompositeData {
        angular_rate: [0.1, 0.2, 0.3],
        acceleration: [1.0, 2.0, 3.0],
        ..Default::default()
    };
    let msg = fill_twist_message(Header::default(), &data);
    assert_close(msg.linear.x, 1.0);
    assert_close(msg.angular.z, 0.3f32 as f64);
}
