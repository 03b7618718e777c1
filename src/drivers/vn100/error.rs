use std::io;

use thiserror::Error;

/// Errors that can be returned by the VN-100 driver. Covers both error
/// codes reported by the sensor itself (`$VNERR,<code>`) and failures of
/// the serial transport.
#[derive(Debug, Error)]
pub enum VnError {
    // Sensor-reported error codes
    #[error("sensor hard fault")]
    HardFault,
    #[error("sensor serial buffer overflow")]
    SerialBufferOverflow,
    #[error("invalid checksum")]
    InvalidChecksum,
    #[error("invalid command")]
    InvalidCommand,
    #[error("not enough parameters")]
    NotEnoughParameters,
    #[error("too many parameters")]
    TooManyParameters,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("invalid register")]
    InvalidRegister,
    #[error("unauthorized access")]
    UnauthorizedAccess,
    #[error("sensor watchdog reset")]
    WatchdogReset,
    #[error("sensor output buffer overflow")]
    OutputBufferOverflow,
    #[error("insufficient baud rate")]
    InsufficientBaudRate,
    #[error("sensor error buffer overflow")]
    ErrorBufferOverflow,
    #[error("unknown sensor error code: {0}")]
    UnknownErrorCode(u8),

    // Transport-level failures
    #[error("operation timed out")]
    Timeout,
    #[error("device not connected")]
    NotConnected,
    #[error("permission denied opening {0}")]
    PermissionDenied(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serial port error: {0}")]
    Serial(String),
}

impl VnError {
    /// Returns the [VnError] for a sensor-reported error code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::HardFault,
            2 => Self::SerialBufferOverflow,
            3 => Self::InvalidChecksum,
            4 => Self::InvalidCommand,
            5 => Self::NotEnoughParameters,
            6 => Self::TooManyParameters,
            7 => Self::InvalidParameter,
            8 => Self::InvalidRegister,
            9 => Self::UnauthorizedAccess,
            10 => Self::WatchdogReset,
            11 => Self::OutputBufferOverflow,
            12 => Self::InsufficientBaudRate,
            255 => Self::ErrorBufferOverflow,
            other => Self::UnknownErrorCode(other),
        }
    }

    /// Returns true if the error should abort the stream. Recoverable
    /// errors are logged as warnings and streaming continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HardFault
                | Self::UnauthorizedAccess
                | Self::NotConnected
                | Self::PermissionDenied(_)
                | Self::Io(_)
                | Self::Serial(_)
        )
    }
}

impl From<serialport::Error> for VnError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::NotConnected,
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                Self::PermissionDenied(err.to_string())
            }
            serialport::ErrorKind::Io(io::ErrorKind::TimedOut) => Self::Timeout,
            _ => Self::Serial(err.to_string()),
        }
    }
}
