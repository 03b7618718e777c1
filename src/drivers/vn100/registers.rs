//! ASCII register protocol framing for the VN-100.
//!
//! Commands are sent as `$<body>*<checksum>\r\n` where the checksum is
//! the 8-bit XOR of every byte of the body. Register reads are
//! `VNRRG,<id>`, writes are `VNWRG,<id>,<params...>` and the sensor
//! echoes the command on success or replies with `VNERR,<code>`.

use super::error::VnError;

// Register IDs
pub const REG_MODEL_NUMBER: u8 = 1;
pub const REG_HARDWARE_REVISION: u8 = 2;
pub const REG_SERIAL_NUMBER: u8 = 3;
pub const REG_FIRMWARE_VERSION: u8 = 4;
pub const REG_SERIAL_BAUD_RATE: u8 = 5;
pub const REG_ASYNC_OUTPUT_TYPE: u8 = 6;
pub const REG_ASYNC_OUTPUT_FREQ: u8 = 7;
pub const REG_REFERENCE_FRAME_ROTATION: u8 = 26;
pub const REG_COMM_PROTOCOL_CONTROL: u8 = 30;
pub const REG_SYNCHRONIZATION_CONTROL: u8 = 32;
pub const REG_BINARY_OUTPUT_1: u8 = 75;

/// Async data output types for register 6
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsyncOutputType {
    Off = 0,
    /// Quaternion, magnetic, acceleration and angular rates (`$VNQMR`)
    Qmr = 8,
}

/// Returns the 8-bit XOR checksum of the message body (the bytes between
/// `$` and `*`).
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Frames a message body into a complete serial command.
pub fn frame(body: &str) -> String {
    format!("${body}*{:02X}\r\n", checksum(body))
}

/// Parsed response from the sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// Command word, e.g. "VNRRG" or "VNTAR"
    pub command: String,
    /// Comma separated fields following the command word
    pub fields: Vec<String>,
}

/// Parses and validates a single `$...*XX` response line. Returns a
/// [VnError] for checksum failures, malformed framing or a `VNERR`
/// response.
pub fn parse_response(line: &str) -> Result<Response, VnError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(body_cs) = line.strip_prefix('$') else {
        return Err(VnError::MalformedResponse(line.into()));
    };
    let Some((body, cs)) = body_cs.rsplit_once('*') else {
        return Err(VnError::MalformedResponse(line.into()));
    };
    let Ok(expected) = u8::from_str_radix(cs, 16) else {
        return Err(VnError::MalformedResponse(line.into()));
    };
    if checksum(body) != expected {
        return Err(VnError::InvalidChecksum);
    }

    let mut parts = body.split(',');
    let command = parts.next().unwrap_or_default().to_string();
    let fields: Vec<String> = parts.map(|p| p.to_string()).collect();

    if command == "VNERR" {
        let code = fields
            .first()
            .and_then(|f| f.parse::<u8>().ok())
            .unwrap_or_default();
        return Err(VnError::from_code(code));
    }

    Ok(Response { command, fields })
}

/// Builds a register read command body.
pub fn read_register(id: u8) -> String {
    format!("VNRRG,{id}")
}

/// Builds a register write command body.
pub fn write_register(id: u8, params: &[String]) -> String {
    format!("VNWRG,{id},{}", params.join(","))
}
