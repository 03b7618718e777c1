//! Standardized sensor messages published over the bus. Field layout
//! follows the common middleware sensor message definitions so consumers
//! can map them 1:1.

use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

/// Message header carried by every sample.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct Header {
    /// Capture time as nanoseconds since the unix epoch
    pub stamp_ns: u64,
    /// Coordinate frame the sample is expressed in
    pub frame_id: String,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Type)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Inertial sample: orientation, angular velocity and linear
/// acceleration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct Imu {
    pub header: Header,
    pub orientation: Quaternion,
    /// Angular velocity in rad/s
    pub angular_velocity: Vector3,
    /// Linear acceleration in m/s^2
    pub linear_acceleration: Vector3,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct MagneticField {
    pub header: Header,
    /// Magnetic field in Gauss, as reported by the sensor
    pub magnetic_field: Vector3,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct FluidPressure {
    pub header: Header,
    /// Absolute pressure in kPa, as reported by the sensor
    pub fluid_pressure: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct Temperature {
    pub header: Header,
    /// Temperature in degrees Celsius
    pub temperature: f64,
}

/// Velocity sample derived from the inertial data.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Type)]
pub struct TwistStamped {
    pub header: Header,
    /// Linear velocity component (populated with acceleration by the
    /// bridge, matching the upstream node behavior)
    pub linear: Vector3,
    /// Angular velocity in rad/s
    pub angular: Vector3,
}
