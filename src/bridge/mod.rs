pub mod convert;
pub mod diagnostics;
pub mod messages;
pub mod sync;

#[cfg(test)]
pub mod convert_test;
#[cfg(test)]
pub mod mod_test;
#[cfg(test)]
pub mod sync_test;

use std::{
    error::Error,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::{
    mpsc::{self, error::TryRecvError},
    oneshot,
};
use zbus::{object_server::SignalEmitter, Connection};

use crate::{
    config::ImuConfig,
    constants::{BUS_DIAGNOSTICS_PATH, BUS_IMU_PATH},
    dbus::interface::{diagnostics::DiagnosticsInterface, imu::ImuInterface},
    drivers::vn100::{
        driver::{DeviceInfo, Driver},
        error::VnError,
        event::Event,
        packet::CompositeData,
        registers::AsyncOutputType,
        BASE_IMU_RATE, DEFAULT_BAUDRATE, DEFAULT_IMU_RATE,
    },
};

use self::{diagnostics::Diagnostics, sync::SyncInfo};

const BUFFER_SIZE: usize = 1024;

/// Bridge commands define all the different ways to interact with the
/// serial device from the DBus interface. They are executed on the
/// serial thread between polls and answered over the reply channel.
#[derive(Debug)]
pub enum Command {
    Tare {
        reply: oneshot::Sender<Result<(), String>>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), String>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), String>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), String>>,
    },
}

/// Corrects the configured output rate against the sensor base rate.
/// A zero rate falls back to the default, rates above the base rate are
/// clamped to it, and rates that do not evenly divide the base rate are
/// reduced to the nearest rate that does.
pub fn fix_imu_rate(rate: u32) -> u32 {
    if rate == 0 {
        log::warn!("Imu rate 0 is invalid. Set to {DEFAULT_IMU_RATE}");
        return DEFAULT_IMU_RATE;
    }
    if rate > BASE_IMU_RATE {
        log::warn!("Imu rate {rate} is above base rate {BASE_IMU_RATE}. Set to {BASE_IMU_RATE}");
        return BASE_IMU_RATE;
    }
    if BASE_IMU_RATE % rate != 0 {
        let fixed = BASE_IMU_RATE / (BASE_IMU_RATE / rate);
        log::warn!("Imu rate {rate} cannot evenly decimate base rate {BASE_IMU_RATE}, reset to {fixed}");
        return fixed;
    }
    rate
}

/// Bridges a VN-100 attached to a serial port to DBus.
///
/// The [Bridge] owns the device configuration and the sync pulse state.
/// The serial device itself lives on a blocking task that polls for
/// measurement packets and executes [Command]s; parsed packets cross to
/// the async side over a channel where they are translated into sensor
/// messages and emitted as DBus signals.
pub struct Bridge {
    /// The DBus connection
    dbus: Connection,
    config: ImuConfig,
    sync: Arc<Mutex<SyncInfo>>,
    diagnostics: Arc<Mutex<Diagnostics>>,
    tx: mpsc::Sender<Command>,
    rx: Option<mpsc::Receiver<Command>>,
}

impl Bridge {
    pub fn new(dbus: Connection, mut config: ImuConfig) -> Bridge {
        config.imu_rate = fix_imu_rate(config.imu_rate);
        let mut sync = SyncInfo::new(config.sync_rate, config.sync_pulse_width_us);
        sync.fix_rate();

        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        Bridge {
            dbus,
            config,
            sync: Arc::new(Mutex::new(sync)),
            diagnostics: Arc::new(Mutex::new(Diagnostics::new())),
            tx,
            rx: Some(rx),
        }
    }

    /// Connects to the sensor, configures it, starts streaming and
    /// publishes samples until the device fails or the daemon stops.
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let Some(cmd_rx) = self.rx.take() else {
            return Err("Bridge is already running".into());
        };

        // Connect and configure the device on a blocking task
        let config = self.config.clone();
        let sync = {
            let sync = self.sync.lock().unwrap();
            sync.clone()
        };
        let (mut driver, info) =
            tokio::task::spawn_blocking(move || -> Result<(Driver, DeviceInfo), VnError> {
                let mut driver = initialize(&config, &sync)?;
                let info = driver.device_info()?;
                log::info!("Model number: {}", info.model_number);
                log::info!("Hardware revision: {}", info.hardware_revision);
                log::info!("Serial number: {}", info.serial_number);
                log::info!("Firmware version: {}", info.firmware_version);
                stream(&mut driver, &config, true)?;
                Ok((driver, info))
            })
            .await??;

        // Expose the device over DBus
        self.listen_on_dbus(&info).await?;
        let emitter = ImuInterface::emitter(&self.dbus).await?;

        // Start the serial polling loop
        let config = self.config.clone();
        let (event_tx, mut event_rx) = mpsc::channel(BUFFER_SIZE);
        let serial_task = tokio::task::spawn_blocking(move || {
            serial_loop(&mut driver, &config, cmd_rx, event_tx)
        });

        // Translate and publish incoming packets
        while let Some(event) = event_rx.recv().await {
            let Event::Composite(data) = event else {
                continue;
            };
            if let Err(e) = self.publish(&emitter, &data).await {
                log::error!("Failed to publish sample: {e}");
            }
        }

        // The event channel closed: the serial loop has exited
        match serial_task.await? {
            Ok(()) => {
                log::info!("Serial loop stopped");
                Ok(())
            }
            Err(e) => {
                log::error!("Device failure: {e}");
                Err(Box::new(e) as Box<dyn Error + Send + Sync>)
            }
        }
    }

    /// Registers the DBus interfaces for the device
    async fn listen_on_dbus(&self, info: &DeviceInfo) -> Result<(), Box<dyn Error + Send + Sync>> {
        let iface = ImuInterface::new(
            self.config.clone(),
            info.clone(),
            self.sync.clone(),
            self.tx.clone(),
        );
        self.dbus.object_server().at(BUS_IMU_PATH, iface).await?;

        // One frequency tracker per publisher
        let expected = self.config.imu_rate as f64;
        {
            let mut diagnostics = self.diagnostics.lock().unwrap();
            diagnostics.add_topic("imu", expected);
            diagnostics.add_topic("twist", expected);
            if self.config.enable_mag {
                diagnostics.add_topic("magnetic_field", expected);
            }
            if self.config.enable_pres {
                diagnostics.add_topic("fluid_pressure", expected);
            }
            if self.config.enable_temp {
                diagnostics.add_topic("temperature", expected);
            }
        }

        let hardware_id = format!("vn100-{}{}", info.model_number, info.serial_number);
        let iface = DiagnosticsInterface::new(self.diagnostics.clone(), hardware_id);
        self.dbus
            .object_server()
            .at(BUS_DIAGNOSTICS_PATH, iface)
            .await?;

        Ok(())
    }

    /// Translates one measurement packet into sensor messages and emits
    /// them as DBus signals.
    async fn publish(
        &self,
        emitter: &SignalEmitter<'static>,
        data: &CompositeData,
    ) -> zbus::Result<()> {
        let header = messages::Header {
            stamp_ns: now_ns(),
            frame_id: self.config.frame_id.clone(),
        };

        let imu_msg = convert::fill_imu_message(header.clone(), data);
        let twist_msg = convert::fill_twist_message(header.clone(), data);

        ImuInterface::imu(emitter, imu_msg.clone()).await?;
        ImuInterface::twist(emitter, twist_msg).await?;
        ImuInterface::orientation_x(emitter, imu_msg.orientation.x).await?;
        ImuInterface::orientation_y(emitter, imu_msg.orientation.y).await?;
        ImuInterface::orientation_z(emitter, imu_msg.orientation.z).await?;
        ImuInterface::angular_velocity_z(emitter, imu_msg.angular_velocity.z).await?;

        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.tick("imu");
        diagnostics.tick("twist");
        drop(diagnostics);

        if self.config.enable_mag {
            if let Some(magnetic) = data.magnetic {
                let msg = messages::MagneticField {
                    header: header.clone(),
                    magnetic_field: convert::vector3(magnetic),
                };
                ImuInterface::magnetic_field(emitter, msg).await?;
                self.diagnostics.lock().unwrap().tick("magnetic_field");
            }
        }
        if self.config.enable_pres {
            if let Some(pressure) = data.pressure {
                let msg = messages::FluidPressure {
                    header: header.clone(),
                    fluid_pressure: pressure as f64,
                };
                ImuInterface::fluid_pressure(emitter, msg).await?;
                self.diagnostics.lock().unwrap().tick("fluid_pressure");
            }
        }
        if self.config.enable_temp {
            if let Some(temperature) = data.temperature {
                let msg = messages::Temperature {
                    header: header.clone(),
                    temperature: temperature as f64,
                };
                ImuInterface::temperature(emitter, msg).await?;
                self.diagnostics.lock().unwrap().tick("temperature");
            }
        }

        if let Some(count) = data.sync_in_count {
            let mut sync = self.sync.lock().unwrap();
            sync.update(count, header.stamp_ns);
        }

        Ok(())
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Connects to the sensor and runs the configuration sequence: bring
/// the link up at the configured baud rate, quiet the device, apply the
/// reference frame rotation and sync pulse settings.
fn initialize(config: &ImuConfig, sync: &SyncInfo) -> Result<Driver, VnError> {
    log::debug!("Connecting to device");
    let mut driver = Driver::open(&config.port, DEFAULT_BAUDRATE)?;
    log::info!("Connected to device at {}", config.port);

    // The sensor may still be running at the configured rate from a
    // previous session. If it does not answer at the factory default,
    // retry at the configured rate before giving up.
    let old_baudrate = match driver.read_baudrate() {
        Ok(baudrate) => baudrate,
        Err(VnError::Timeout) => {
            log::debug!("No answer at {DEFAULT_BAUDRATE} baud, retrying at {}", config.baudrate);
            driver = Driver::open(&config.port, config.baudrate)?;
            driver.read_baudrate()?
        }
        Err(e) => return Err(e),
    };
    log::info!("Default serial baudrate: {old_baudrate}");

    if config.baudrate != driver.baudrate() {
        log::info!("Set serial baudrate to {}", config.baudrate);
        driver.set_baudrate(config.baudrate)?;
        log::info!("New serial baudrate: {}", driver.read_baudrate()?);
    }

    // Idle the device for initialization
    driver.pause_async_outputs()?;

    if let Some(matrix) = config.frame_rotation.as_ref() {
        log::info!("Set reference frame rotation (id:26)");
        driver.set_reference_frame_rotation(matrix)?;
        driver.write_settings()?;
        driver.reset()?;
        driver.pause_async_outputs()?;
    }

    if sync.enabled() {
        log::info!("Set synchronization control register (id:32)");
        driver.set_synchronization_control(sync.skip_count, sync.pulse_width_us * 1000)?;

        if !config.binary_output {
            log::info!("Set communication protocol control register (id:30)");
            driver.set_communication_protocol_control()?;
        }
    }

    Ok(driver)
}

/// Starts or stops async output streaming. The device is paused while
/// the output configuration is changed and resumed afterwards.
fn stream(driver: &mut Driver, config: &ImuConfig, enable: bool) -> Result<(), VnError> {
    driver.pause_async_outputs()?;

    if enable {
        driver.set_async_output_type(AsyncOutputType::Off)?;
        if config.binary_output {
            let divisor = (BASE_IMU_RATE / config.imu_rate) as u16;
            driver.set_binary_output(divisor)?;
        } else {
            driver.set_async_output_type(AsyncOutputType::Qmr)?;
        }
        log::info!("Setting IMU rate to {}", config.imu_rate);
        driver.set_async_output_frequency(config.imu_rate)?;
    } else {
        log::debug!("Mute the device");
        driver.set_async_output_type(AsyncOutputType::Off)?;
    }

    driver.resume_async_outputs()
}

/// Tares the attitude: idle the device, zero the orientation, resume.
/// Each step is checked before the next is attempted.
fn zero_orientation(driver: &mut Driver) -> Result<(), VnError> {
    driver.pause_async_outputs()?;
    driver.tare()?;
    driver.resume_async_outputs()
}

/// Serial polling loop. Runs on a blocking task: executes pending
/// commands between polls and forwards parsed packets to the publisher.
/// Recoverable device errors are logged and streaming continues; fatal
/// errors abort the loop.
fn serial_loop(
    driver: &mut Driver,
    config: &ImuConfig,
    mut rx: mpsc::Receiver<Command>,
    tx: mpsc::Sender<Event>,
) -> Result<(), VnError> {
    loop {
        loop {
            match rx.try_recv() {
                Ok(cmd) => handle_command(driver, config, cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        let events = match driver.poll() {
            Ok(events) => events,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Device error: {e}");
                continue;
            }
        };
        for event in events {
            if tx.blocking_send(event).is_err() {
                // Receiver is gone, the daemon is shutting down
                return Ok(());
            }
        }
    }
}

/// Executes one [Command] against the device and answers the caller.
fn handle_command(driver: &mut Driver, config: &ImuConfig, cmd: Command) {
    log::debug!("Received command: {cmd:?}");
    let (result, reply) = match cmd {
        Command::Tare { reply } => (zero_orientation(driver), reply),
        Command::Reset { reply } => {
            // Streaming configuration is not stored in non-volatile
            // memory, so it must be reapplied after the restart.
            let result = driver.reset().and_then(|_| stream(driver, config, true));
            (result, reply)
        }
        Command::Pause { reply } => (driver.pause_async_outputs(), reply),
        Command::Resume { reply } => (driver.resume_async_outputs(), reply),
    };

    if let Err(e) = &result {
        log::warn!("Command failed: {e}");
    }
    if reply.send(result.map_err(|e| e.to_string())).is_err() {
        log::debug!("Command reply receiver dropped");
    }
}
