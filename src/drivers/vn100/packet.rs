//! Async measurement packet parsing for the VN-100.
//!
//! In binary mode the sensor is configured to stream a single
//! common-group packet:
//!
//! `[0xFA] [groups=0x01] [fields u16 LE] [payload] [crc16 BE]`
//!
//! with the field selection yaw/pitch/roll, angular rate, acceleration,
//! mag/temp/pres and sync-in count (60 byte payload, 66 byte packet).
//! In ASCII mode the sensor streams `$VNQMR` sentences instead.

use super::{error::VnError, event::Event, registers};

/// Sync byte that starts every binary packet
pub const BINARY_SYNC: u8 = 0xFA;

/// Group selection byte: common group only
pub const BINARY_GROUPS: u8 = 0x01;

/// Common-group field selection: YawPitchRoll (3), AngularRate (5),
/// Accel (8), MagPres (10), SyncInCnt (13)
pub const BINARY_FIELDS: u16 = 1 << 3 | 1 << 5 | 1 << 8 | 1 << 10 | 1 << 13;

/// Payload size of the configured field selection in bytes
pub const BINARY_PAYLOAD_SIZE: usize = 60;

/// Total binary packet size: sync + groups + field word + payload + crc
pub const BINARY_PACKET_SIZE: usize = 4 + BINARY_PAYLOAD_SIZE + 2;

/// Measurement data decoded from one async packet. Mirrors the composite
/// data the sensor can report; magnetic, temperature and pressure are
/// not present in ASCII mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompositeData {
    /// Yaw, pitch, roll in degrees (binary mode only)
    pub ypr: Option<[f32; 3]>,
    /// Attitude quaternion as (x, y, z, w) (ASCII mode only)
    pub quaternion: Option<[f32; 4]>,
    /// Angular rate in rad/s
    pub angular_rate: [f32; 3],
    /// Acceleration in m/s^2
    pub acceleration: [f32; 3],
    /// Magnetic field in Gauss
    pub magnetic: Option<[f32; 3]>,
    /// Temperature in deg C
    pub temperature: Option<f32>,
    /// Pressure in kPa
    pub pressure: Option<f32>,
    /// Sync-in pulse counter
    pub sync_in_count: Option<u32>,
}

/// CRC16-CCITT used by VectorNav binary packets. The CRC of a packet
/// including its trailing CRC bytes is zero.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc = crc.rotate_left(8);
        crc ^= byte as u16;
        crc ^= (crc & 0xFF) >> 4;
        crc ^= crc << 12;
        crc ^= (crc & 0x00FF) << 5;
    }
    crc
}

fn read_f32(buf: &[u8], offset: usize) -> f32 {
    let bytes: [u8; 4] = buf[offset..offset + 4].try_into().unwrap_or_default();
    f32::from_le_bytes(bytes)
}

fn read_vec3(buf: &[u8], offset: usize) -> [f32; 3] {
    [
        read_f32(buf, offset),
        read_f32(buf, offset + 4),
        read_f32(buf, offset + 8),
    ]
}

/// Parses a complete binary packet, validating the header and CRC.
pub fn parse_binary(packet: &[u8]) -> Result<CompositeData, VnError> {
    if packet.len() != BINARY_PACKET_SIZE || packet[0] != BINARY_SYNC {
        return Err(VnError::MalformedResponse(format!(
            "bad binary packet of {} bytes",
            packet.len()
        )));
    }
    if packet[1] != BINARY_GROUPS {
        return Err(VnError::MalformedResponse(format!(
            "unexpected group byte: {:#04x}",
            packet[1]
        )));
    }
    let fields = u16::from_le_bytes([packet[2], packet[3]]);
    if fields != BINARY_FIELDS {
        return Err(VnError::MalformedResponse(format!(
            "unexpected field selection: {fields:#06x}"
        )));
    }
    // CRC is computed over everything after the sync byte and appended
    // MSB first, so including it must yield zero.
    if crc16(&packet[1..]) != 0 {
        return Err(VnError::InvalidChecksum);
    }

    let payload = &packet[4..4 + BINARY_PAYLOAD_SIZE];
    let magpres = (
        read_vec3(payload, 36),
        read_f32(payload, 48),
        read_f32(payload, 52),
    );
    Ok(CompositeData {
        ypr: Some(read_vec3(payload, 0)),
        quaternion: None,
        angular_rate: read_vec3(payload, 12),
        acceleration: read_vec3(payload, 24),
        magnetic: Some(magpres.0),
        temperature: Some(magpres.1),
        pressure: Some(magpres.2),
        sync_in_count: Some(u32::from_le_bytes(
            payload[56..60].try_into().unwrap_or_default(),
        )),
    })
}

/// Builds a binary packet from composite data. Used by the packet tests
/// and by the simulated device in the bridge tests.
pub fn build_binary(data: &CompositeData) -> Vec<u8> {
    let mut packet = Vec::with_capacity(BINARY_PACKET_SIZE);
    packet.push(BINARY_SYNC);
    packet.push(BINARY_GROUPS);
    packet.extend_from_slice(&BINARY_FIELDS.to_le_bytes());
    for v in data.ypr.unwrap_or_default() {
        packet.extend_from_slice(&v.to_le_bytes());
    }
    for v in data.angular_rate {
        packet.extend_from_slice(&v.to_le_bytes());
    }
    for v in data.acceleration {
        packet.extend_from_slice(&v.to_le_bytes());
    }
    for v in data.magnetic.unwrap_or_default() {
        packet.extend_from_slice(&v.to_le_bytes());
    }
    packet.extend_from_slice(&data.temperature.unwrap_or_default().to_le_bytes());
    packet.extend_from_slice(&data.pressure.unwrap_or_default().to_le_bytes());
    packet.extend_from_slice(&data.sync_in_count.unwrap_or_default().to_le_bytes());
    let crc = crc16(&packet[1..]);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

/// Parses a `$VNQMR` ASCII sentence: quaternion (x, y, z, w), magnetic,
/// acceleration and angular rate. When the communication protocol
/// control register has the serial count enabled, the sensor appends
/// the sync-out count as a 14th field.
pub fn parse_vnqmr(line: &str) -> Result<CompositeData, VnError> {
    let response = registers::parse_response(line)?;
    if response.command != "VNQMR" {
        return Err(VnError::MalformedResponse(format!(
            "unexpected sentence: {}",
            response.command
        )));
    }
    if response.fields.len() != 13 && response.fields.len() != 14 {
        return Err(VnError::MalformedResponse(format!(
            "expected 13 or 14 fields in VNQMR, got {}",
            response.fields.len()
        )));
    }
    let mut values = [0f32; 13];
    for (i, field) in response.fields.iter().take(13).enumerate() {
        values[i] = field
            .parse::<f32>()
            .map_err(|_| VnError::MalformedResponse(format!("bad float: {field}")))?;
    }
    let sync_in_count = match response.fields.get(13) {
        Some(field) => Some(field.parse::<u32>().map_err(|_| {
            VnError::MalformedResponse(format!("bad sync count: {field}"))
        })?),
        None => None,
    };

    Ok(CompositeData {
        ypr: None,
        quaternion: Some([values[0], values[1], values[2], values[3]]),
        magnetic: Some([values[4], values[5], values[6]]),
        acceleration: [values[7], values[8], values[9]],
        angular_rate: [values[10], values[11], values[12]],
        temperature: None,
        pressure: None,
        sync_in_count,
    })
}

/// Incremental packet scanner. Bytes read from the serial port are
/// pushed into the codec and complete packets are extracted as events.
/// Garbage between packets is discarded by resynchronizing on the next
/// sync byte or `$` delimiter.
#[derive(Debug, Default)]
pub struct Codec {
    buf: Vec<u8>,
}

/// Scan limit for an unterminated ASCII sentence. A stray `$` in a
/// binary stream never sees a newline, so once this many bytes have
/// accumulated behind it the delimiter is treated as noise and dropped.
const MAX_SCAN_BUFFER: usize = 4 * BINARY_PACKET_SIZE;

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly read bytes to the scan buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extracts the next complete packet from the buffer, if any.
    pub fn next_event(&mut self) -> Option<Event> {
        loop {
            // Discard leading bytes that cannot start a packet
            let start = self
                .buf
                .iter()
                .position(|&b| b == BINARY_SYNC || b == b'$')?;
            if start > 0 {
                log::trace!("Discarding {start} bytes of garbage");
                self.buf.drain(..start);
            }

            if self.buf[0] == BINARY_SYNC {
                if self.buf.len() < BINARY_PACKET_SIZE {
                    return None;
                }
                let packet: Vec<u8> = self.buf.drain(..BINARY_PACKET_SIZE).collect();
                match parse_binary(&packet) {
                    Ok(data) => return Some(Event::Composite(data)),
                    Err(e) => {
                        log::warn!("Dropping binary packet: {e}");
                        return Some(Event::BadPacket);
                    }
                }
            }

            // ASCII sentence: wait for a newline
            let Some(end) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.buf.len() > MAX_SCAN_BUFFER {
                    log::trace!("Dropping stray sentence delimiter");
                    self.buf.drain(..1);
                    continue;
                }
                return None;
            };
            let line: Vec<u8> = self.buf.drain(..=end).collect();
            let Ok(line) = String::from_utf8(line) else {
                continue;
            };
            match parse_vnqmr(&line) {
                Ok(data) => return Some(Event::Composite(data)),
                Err(e) => {
                    log::warn!("Dropping sentence: {e}");
                    return Some(Event::BadPacket);
                }
            }
        }
    }
}
