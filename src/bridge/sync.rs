use crate::drivers::vn100::BASE_IMU_RATE;

/// Maximum sync-out pulse width before it is reset to the default.
const MAX_PULSE_WIDTH_US: u32 = 10_000;
const DEFAULT_PULSE_WIDTH_US: u32 = 1_000;

/// Bookkeeping for the sync-out pulse used to trigger external devices
/// (e.g. camera shutters). Reconciles the requested pulse rate against
/// the sensor base rate and records the capture time of each observed
/// sync-in count.
#[derive(Clone, Debug)]
pub struct SyncInfo {
    /// Requested sync out rate in Hz. Zero or negative disables the
    /// sync out pulse.
    pub rate: i32,
    /// Width of the sync out pulse in microseconds
    pub pulse_width_us: u32,
    /// Number of base-rate frames skipped between pulses
    pub skip_count: u32,
    count: u32,
    time_ns: u64,
}

impl SyncInfo {
    pub fn new(rate: i32, pulse_width_us: u32) -> Self {
        Self {
            rate,
            pulse_width_us,
            skip_count: 0,
            count: 0,
            time_ns: 0,
        }
    }

    /// Returns true if the sync out pulse is enabled.
    pub fn enabled(&self) -> bool {
        self.rate > 0
    }

    /// Reconciles the configured rate with the sensor base rate. Rates
    /// that do not evenly divide the base rate are corrected to the
    /// nearest rate that does, and over-long pulse widths are reset.
    pub fn fix_rate(&mut self) {
        if !self.enabled() {
            log::info!("Sync out pulse disabled");
            return;
        }

        let base = BASE_IMU_RATE as i32;
        if self.rate > base {
            self.rate = base;
            log::info!("Sync out rate is above base rate. Set to {}", self.rate);
        } else if base % self.rate != 0 {
            self.rate = base / (base / self.rate);
            log::info!("Set sync out rate to {}", self.rate);
        }
        self.skip_count =
            ((BASE_IMU_RATE as f64 / self.rate as f64 + 0.5).floor() as u32).saturating_sub(1);

        if self.pulse_width_us > MAX_PULSE_WIDTH_US {
            log::info!("Sync out pulse width is over 10ms. Reset to 1ms");
            self.pulse_width_us = DEFAULT_PULSE_WIDTH_US;
        }

        log::info!("Sync out rate: {}", self.rate);
    }

    /// Records the capture time of a sync pulse. The time is only
    /// updated when the counter has advanced, so repeated packets within
    /// one sync period keep the original pulse time.
    pub fn update(&mut self, sync_count: u32, sync_time_ns: u64) {
        if !self.enabled() {
            return;
        }
        if self.count != sync_count {
            self.count = sync_count;
            self.time_ns = sync_time_ns;
        }
    }

    /// Last observed sync-in count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Capture time of the last observed sync pulse.
    pub fn time_ns(&self) -> u64 {
        self.time_ns
    }
}

impl Default for SyncInfo {
    fn default() -> Self {
        Self::new(0, DEFAULT_PULSE_WIDTH_US)
    }
}
