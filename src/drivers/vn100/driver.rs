use std::{
    io::{Read, Write},
    thread,
    time::{Duration, Instant},
};

use serialport::{DataBits, FlowControl, Parity, StopBits, TTYPort};

use super::{
    error::VnError,
    event::Event,
    packet::{self, Codec},
    registers::{self, AsyncOutputType},
    COMMAND_TIMEOUT_MS, REOPEN_DELAY_MS, TTY_TIMEOUT_MS,
};

/// Device identification read from registers 1-4.
#[derive(Clone, Debug, Default)]
pub struct DeviceInfo {
    pub model_number: String,
    pub hardware_revision: i32,
    pub serial_number: String,
    pub firmware_version: String,
}

/// Driver for a VN-100 attached to a serial port. Owns the TTY and
/// implements the register protocol on top of it.
pub struct Driver {
    port: TTYPort,
    devnode: String,
    baudrate: u32,
    codec: Codec,
    read_buf: [u8; 4096],
}

impl Driver {
    /// Opens the serial port at the given baud rate.
    pub fn open(devnode: &str, baudrate: u32) -> Result<Self, VnError> {
        let builder = serialport::new(devnode, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(TTY_TIMEOUT_MS));
        let port = TTYPort::open(&builder)?;
        log::info!("Opened {devnode} at {baudrate} baud");

        Ok(Self {
            port,
            devnode: devnode.to_string(),
            baudrate,
            codec: Codec::new(),
            read_buf: [0; 4096],
        })
    }

    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    /// Changes the sensor baud rate (register 5) and reopens the port at
    /// the new rate. The sensor keeps listening at the old rate until the
    /// write is acknowledged, so the reply is read before reopening.
    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<(), VnError> {
        self.write_register(registers::REG_SERIAL_BAUD_RATE, &[baudrate.to_string()])?;
        log::debug!("Reopening {} at {baudrate} baud", self.devnode);
        thread::sleep(Duration::from_millis(REOPEN_DELAY_MS));

        let builder = serialport::new(&self.devnode, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(TTY_TIMEOUT_MS));
        self.port = TTYPort::open(&builder)?;
        self.baudrate = baudrate;
        self.codec = Codec::new();
        Ok(())
    }

    /// Sends a framed command and waits for the matching reply. Async
    /// measurement packets that arrive in between are ignored. A `VNERR`
    /// reply is surfaced as the corresponding [VnError].
    fn transaction(&mut self, body: &str) -> Result<registers::Response, VnError> {
        let command = body.split(',').next().unwrap_or(body).to_string();
        let framed = registers::frame(body);
        log::trace!("TX: {}", framed.trim_end());
        self.port.write_all(framed.as_bytes())?;
        self.port.flush()?;

        let deadline = Instant::now() + Duration::from_millis(COMMAND_TIMEOUT_MS);
        let mut line = Vec::new();
        while Instant::now() < deadline {
            let mut byte = [0u8; 1];
            match self.port.read_exact(&mut byte) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
            // Replies are ASCII sentences; skip any binary packet bytes
            if line.is_empty() && byte[0] != b'$' {
                continue;
            }
            line.push(byte[0]);
            if byte[0] != b'\n' {
                continue;
            }

            let text = String::from_utf8_lossy(&line).to_string();
            line.clear();
            log::trace!("RX: {}", text.trim_end());
            match registers::parse_response(&text) {
                Ok(response) if response.command == command => return Ok(response),
                // Async sentence interleaved with the reply
                Ok(_) => continue,
                Err(VnError::MalformedResponse(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(VnError::Timeout)
    }

    /// Reads a register and returns its fields (without the register id).
    pub fn read_register(&mut self, id: u8) -> Result<Vec<String>, VnError> {
        let response = self.transaction(&registers::read_register(id))?;
        let mut fields = response.fields;
        if fields.is_empty() {
            return Err(VnError::MalformedResponse(format!(
                "empty reply for register {id}"
            )));
        }
        fields.remove(0); // register id echo
        Ok(fields)
    }

    /// Writes a register and waits for the acknowledgement.
    pub fn write_register(&mut self, id: u8, params: &[String]) -> Result<(), VnError> {
        self.transaction(&registers::write_register(id, params))?;
        Ok(())
    }

    /// Reads the device identification registers.
    pub fn device_info(&mut self) -> Result<DeviceInfo, VnError> {
        let model_number = self
            .read_register(registers::REG_MODEL_NUMBER)?
            .first()
            .cloned()
            .unwrap_or_default();
        let hardware_revision = self
            .read_register(registers::REG_HARDWARE_REVISION)?
            .first()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default();
        let serial_number = self
            .read_register(registers::REG_SERIAL_NUMBER)?
            .join("");
        let firmware_version = self
            .read_register(registers::REG_FIRMWARE_VERSION)?
            .first()
            .cloned()
            .unwrap_or_default();

        Ok(DeviceInfo {
            model_number,
            hardware_revision,
            serial_number,
            firmware_version,
        })
    }

    /// Reads the currently configured sensor baud rate (register 5).
    pub fn read_baudrate(&mut self) -> Result<u32, VnError> {
        let fields = self.read_register(registers::REG_SERIAL_BAUD_RATE)?;
        fields
            .first()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| VnError::MalformedResponse("bad baud rate reply".into()))
    }

    /// Pauses async output streaming.
    pub fn pause_async_outputs(&mut self) -> Result<(), VnError> {
        self.transaction("VNASY,0")?;
        Ok(())
    }

    /// Resumes async output streaming.
    pub fn resume_async_outputs(&mut self) -> Result<(), VnError> {
        self.transaction("VNASY,1")?;
        Ok(())
    }

    /// Tares the attitude: the current orientation becomes the zero
    /// reference.
    pub fn tare(&mut self) -> Result<(), VnError> {
        self.transaction("VNTAR")?;
        Ok(())
    }

    /// Writes the active register settings to non-volatile memory.
    pub fn write_settings(&mut self) -> Result<(), VnError> {
        self.transaction("VNWNV")?;
        Ok(())
    }

    /// Resets the sensor. The reset command is not acknowledged after the
    /// device restarts, so no reply is awaited.
    pub fn reset(&mut self) -> Result<(), VnError> {
        let framed = registers::frame("VNRST");
        self.port.write_all(framed.as_bytes())?;
        self.port.flush()?;
        thread::sleep(Duration::from_millis(REOPEN_DELAY_MS));
        self.codec = Codec::new();
        Ok(())
    }

    /// Sets the async data output type (register 6).
    pub fn set_async_output_type(&mut self, kind: AsyncOutputType) -> Result<(), VnError> {
        self.write_register(
            registers::REG_ASYNC_OUTPUT_TYPE,
            &[(kind as u8).to_string()],
        )
    }

    /// Sets the async data output frequency in Hz (register 7).
    pub fn set_async_output_frequency(&mut self, rate: u32) -> Result<(), VnError> {
        self.write_register(registers::REG_ASYNC_OUTPUT_FREQ, &[rate.to_string()])
    }

    /// Sets the reference frame rotation matrix (register 26), row major.
    pub fn set_reference_frame_rotation(&mut self, matrix: &[[f64; 3]; 3]) -> Result<(), VnError> {
        let params: Vec<String> = matrix
            .iter()
            .flatten()
            .map(|v| format!("{v:+.3}"))
            .collect();
        self.write_register(registers::REG_REFERENCE_FRAME_ROTATION, &params)
    }

    /// Sets the synchronization control register (register 32). Sync in
    /// is configured to count rising edges; sync out pulses at the IMU
    /// start of frame, decimated by `skip_count`, with a positive pulse
    /// of `pulse_width_ns` nanoseconds.
    pub fn set_synchronization_control(
        &mut self,
        skip_count: u32,
        pulse_width_ns: u32,
    ) -> Result<(), VnError> {
        let params = [
            "3".to_string(), // sync in mode: count
            "0".to_string(), // sync in edge: rising
            "0".to_string(), // sync in skip factor
            "0".to_string(), // reserved
            "1".to_string(), // sync out mode: imu start
            "1".to_string(), // sync out polarity: positive
            skip_count.to_string(),
            pulse_width_ns.to_string(),
        ];
        self.write_register(registers::REG_SYNCHRONIZATION_CONTROL, &params)
    }

    /// Sets the communication protocol control register (register 30):
    /// sync-out counter appended to serial output, 8-bit checksums,
    /// error codes sent over serial.
    pub fn set_communication_protocol_control(&mut self) -> Result<(), VnError> {
        let params = [
            "3".to_string(), // serial count: sync out count
            "0".to_string(), // serial status: off
            "0".to_string(), // spi count: none
            "0".to_string(), // spi status: off
            "1".to_string(), // serial checksum: 8 bit
            "1".to_string(), // spi checksum: 8 bit
            "1".to_string(), // error mode: send
        ];
        self.write_register(registers::REG_COMM_PROTOCOL_CONTROL, &params)
    }

    /// Configures binary output 1 (register 75) to stream the common
    /// group layout the [Codec] expects on serial port 1, decimated from
    /// the base rate by `rate_divisor`.
    pub fn set_binary_output(&mut self, rate_divisor: u16) -> Result<(), VnError> {
        let params = [
            "1".to_string(), // async mode: serial 1
            rate_divisor.to_string(),
            format!("{:02X}", packet::BINARY_GROUPS),
            format!("{:04X}", packet::BINARY_FIELDS),
        ];
        self.write_register(registers::REG_BINARY_OUTPUT_1, &params)
    }

    /// Polls the serial port for async measurement packets.
    pub fn poll(&mut self) -> Result<Vec<Event>, VnError> {
        let n = match self.port.read(&mut self.read_buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };
        if n > 0 {
            self.codec.push(&self.read_buf[..n]);
        }

        let mut events = Vec::new();
        while let Some(event) = self.codec.next_event() {
            events.push(event);
        }
        Ok(events)
    }
}
