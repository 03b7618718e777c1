pub mod driver;
pub mod error;
pub mod event;
pub mod packet;
pub mod registers;

#[cfg(test)]
pub mod packet_test;
#[cfg(test)]
pub mod registers_test;

/// Internal sample rate of the VN-100. All output rates must evenly
/// divide this rate.
pub const BASE_IMU_RATE: u32 = 800;

/// Default async output rate in Hz.
pub const DEFAULT_IMU_RATE: u32 = 100;

/// Default rate of the sync out pulse in Hz.
pub const DEFAULT_SYNC_OUT_RATE: i32 = 20;

/// Baud rate the sensor ships with and falls back to after a settings
/// reset.
pub const DEFAULT_BAUDRATE: u32 = 115_200;

// Serial timings
pub const TTY_TIMEOUT_MS: u64 = 100;
pub const COMMAND_TIMEOUT_MS: u64 = 500;
pub const REOPEN_DELAY_MS: u64 = 500;
