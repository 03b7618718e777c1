//! Conversions from raw sensor data to message types.

use crate::drivers::vn100::packet::CompositeData;

use super::messages::{Header, Imu, Quaternion, TwistStamped, Vector3};

pub fn vector3(v: [f32; 3]) -> Vector3 {
    Vector3 {
        x: v[0] as f64,
        y: v[1] as f64,
        z: v[2] as f64,
    }
}

/// Converts yaw/pitch/roll in degrees into a normalized quaternion.
/// Rotation order matches the sensor attitude convention: yaw about Z,
/// then pitch about Y, then roll about X.
pub fn quaternion_from_ypr_degrees(yaw: f64, pitch: f64, roll: f64) -> Quaternion {
    let (sy, cy) = (yaw.to_radians() / 2.0).sin_cos();
    let (sp, cp) = (pitch.to_radians() / 2.0).sin_cos();
    let (sr, cr) = (roll.to_radians() / 2.0).sin_cos();

    let mut q = Quaternion {
        w: cr * cp * cy + sr * sp * sy,
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
    };

    let norm = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
    if norm > 0.0 {
        q.w /= norm;
        q.x /= norm;
        q.y /= norm;
        q.z /= norm;
    }
    q
}

/// Returns the orientation quaternion for a measurement packet. Binary
/// packets carry yaw/pitch/roll in degrees; ASCII packets carry the
/// device quaternion directly.
pub fn orientation(data: &CompositeData) -> Quaternion {
    if let Some(ypr) = data.ypr {
        return quaternion_from_ypr_degrees(ypr[0] as f64, ypr[1] as f64, ypr[2] as f64);
    }
    if let Some(q) = data.quaternion {
        return Quaternion {
            x: q[0] as f64,
            y: q[1] as f64,
            z: q[2] as f64,
            w: q[3] as f64,
        };
    }
    Quaternion::default()
}

/// Fills an [Imu] message from a measurement packet.
pub fn fill_imu_message(header: Header, data: &CompositeData) -> Imu {
    Imu {
        header,
        orientation: orientation(data),
        angular_velocity: vector3(data.angular_rate),
        linear_acceleration: vector3(data.acceleration),
    }
}

/// Fills a [TwistStamped] message from a measurement packet. As in the
/// upstream node, the linear component carries the acceleration.
pub fn fill_twist_message(header: Header, data: &CompositeData) -> TwistStamped {
    TwistStamped {
        header,
        linear: vector3(data.acceleration),
        angular: vector3(data.angular_rate),
    }
}
