/// Well-known DBus bus name of the daemon
pub const BUS_NAME: &str = "org.imubridge";

/// Root DBus path of all objects
pub const BUS_PREFIX: &str = "/org/imubridge";

/// DBus path of the IMU device object
pub const BUS_IMU_PATH: &str = "/org/imubridge/Imu";

/// DBus path of the diagnostics object
pub const BUS_DIAGNOSTICS_PATH: &str = "/org/imubridge/Diagnostics";
