pub mod path;

#[cfg(test)]
pub mod config_test;

use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drivers::vn100::{DEFAULT_IMU_RATE, DEFAULT_SYNC_OUT_RATE};

/// Represents all possible errors loading an [ImuConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Configuration of the IMU bridge, loaded from YAML.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct ImuConfig {
    /// Serial device node the sensor is attached to
    pub port: String,
    /// Baud rate to run the serial link at
    pub baudrate: u32,
    /// Coordinate frame id stamped on published messages
    pub frame_id: String,
    /// Async output rate in Hz. Must evenly divide the 800Hz base rate;
    /// other values are corrected at startup.
    pub imu_rate: u32,
    pub enable_mag: bool,
    pub enable_pres: bool,
    pub enable_temp: bool,
    /// Stream binary output packets instead of ASCII sentences
    pub binary_output: bool,
    /// Sync out pulse rate in Hz. Zero or negative disables the pulse.
    pub sync_rate: i32,
    /// Sync out pulse width in microseconds
    pub sync_pulse_width_us: u32,
    /// Optional reference frame rotation written to the sensor at
    /// startup, row major. Identity when unset.
    pub frame_rotation: Option<[[f64; 3]; 3]>,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baudrate: 921_600,
            frame_id: "imu".to_string(),
            imu_rate: DEFAULT_IMU_RATE,
            enable_mag: true,
            enable_pres: true,
            enable_temp: true,
            binary_output: true,
            sync_rate: DEFAULT_SYNC_OUT_RATE,
            sync_pulse_width_us: 1000,
            frame_rotation: None,
        }
    }
}

impl ImuConfig {
    /// Load an [ImuConfig] from the given YAML string
    pub fn from_yaml(content: &str) -> Result<ImuConfig, LoadError> {
        let config: ImuConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load an [ImuConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<ImuConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: ImuConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Loads the config from the first file found in the search paths,
    /// falling back to defaults if none exists.
    pub fn load() -> ImuConfig {
        for path in path::get_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_yaml_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config {}: {e}", path.display());
                }
            }
        }
        log::info!("No config file found. Using defaults.");
        ImuConfig::default()
    }
}
