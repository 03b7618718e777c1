pub mod diagnostics;
pub mod imu;
