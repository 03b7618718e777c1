use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use tokio::sync::{mpsc, oneshot};
use zbus::{fdo, object_server::SignalEmitter, Connection};
use zbus_macros::interface;

use crate::{
    bridge::{
        messages::{FluidPressure, Imu, MagneticField, Temperature, TwistStamped},
        sync::SyncInfo,
        Command,
    },
    config::ImuConfig,
    constants::BUS_IMU_PATH,
    drivers::vn100::driver::DeviceInfo,
};

/// DBus interface exposing the IMU device. Sensor samples are emitted
/// as signals, device control is dispatched to the bridge over a
/// command channel.
pub struct ImuInterface {
    config: ImuConfig,
    info: DeviceInfo,
    sync: Arc<Mutex<SyncInfo>>,
    tx: mpsc::Sender<Command>,
}

impl ImuInterface {
    pub fn new(
        config: ImuConfig,
        info: DeviceInfo,
        sync: Arc<Mutex<SyncInfo>>,
        tx: mpsc::Sender<Command>,
    ) -> ImuInterface {
        ImuInterface {
            config,
            info,
            sync,
            tx,
        }
    }

    /// Sends a command to the bridge and waits for the result.
    async fn dispatch(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), String>>) -> Command,
    ) -> fdo::Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        match reply_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(fdo::Error::Failed(e)),
            Err(e) => Err(fdo::Error::Failed(e.to_string())),
        }
    }
}

#[interface(name = "org.imubridge.Imu")]
impl ImuInterface {
    /// Serial port the sensor is attached to
    #[zbus(property)]
    async fn port(&self) -> fdo::Result<String> {
        Ok(self.config.port.clone())
    }

    /// Frame id stamped on published samples
    #[zbus(property)]
    async fn frame_id(&self) -> fdo::Result<String> {
        Ok(self.config.frame_id.clone())
    }

    /// Async output rate in Hz
    #[zbus(property)]
    async fn imu_rate(&self) -> fdo::Result<u32> {
        Ok(self.config.imu_rate)
    }

    /// Sync out pulse rate in Hz (zero when disabled)
    #[zbus(property)]
    async fn sync_rate(&self) -> fdo::Result<i32> {
        let sync = self.sync.lock().unwrap();
        Ok(sync.rate.max(0))
    }

    /// Base-rate frames skipped between sync out pulses
    #[zbus(property)]
    async fn sync_skip_count(&self) -> fdo::Result<u32> {
        let sync = self.sync.lock().unwrap();
        Ok(sync.skip_count)
    }

    /// Sync out pulse width in microseconds
    #[zbus(property)]
    async fn sync_pulse_width_us(&self) -> fdo::Result<u32> {
        let sync = self.sync.lock().unwrap();
        Ok(sync.pulse_width_us)
    }

    /// Last observed sync-in pulse count
    #[zbus(property)]
    async fn sync_count(&self) -> fdo::Result<u32> {
        let sync = self.sync.lock().unwrap();
        Ok(sync.count())
    }

    /// Capture time of the last sync pulse, nanoseconds since the epoch
    #[zbus(property)]
    async fn sync_time_ns(&self) -> fdo::Result<u64> {
        let sync = self.sync.lock().unwrap();
        Ok(sync.time_ns())
    }

    #[zbus(property)]
    async fn model_number(&self) -> fdo::Result<String> {
        Ok(self.info.model_number.clone())
    }

    #[zbus(property)]
    async fn hardware_revision(&self) -> fdo::Result<i32> {
        Ok(self.info.hardware_revision)
    }

    #[zbus(property)]
    async fn serial_number(&self) -> fdo::Result<String> {
        Ok(self.info.serial_number.clone())
    }

    #[zbus(property)]
    async fn firmware_version(&self) -> fdo::Result<String> {
        Ok(self.info.firmware_version.clone())
    }

    /// Zeroes the attitude: the current orientation becomes the new
    /// reference. Returns 0 on success.
    async fn tare(&self) -> fdo::Result<i32> {
        self.dispatch(|reply| Command::Tare { reply }).await?;
        Ok(0)
    }

    /// Resets the sensor
    async fn reset(&self) -> fdo::Result<()> {
        self.dispatch(|reply| Command::Reset { reply }).await
    }

    /// Pauses async output streaming
    async fn pause(&self) -> fdo::Result<()> {
        self.dispatch(|reply| Command::Pause { reply }).await
    }

    /// Resumes async output streaming
    async fn resume(&self) -> fdo::Result<()> {
        self.dispatch(|reply| Command::Resume { reply }).await
    }

    #[zbus(signal)]
    pub async fn imu(emitter: &SignalEmitter<'_>, sample: Imu) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn twist(emitter: &SignalEmitter<'_>, sample: TwistStamped) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn magnetic_field(
        emitter: &SignalEmitter<'_>,
        sample: MagneticField,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn fluid_pressure(
        emitter: &SignalEmitter<'_>,
        sample: FluidPressure,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn temperature(emitter: &SignalEmitter<'_>, sample: Temperature)
        -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn orientation_x(emitter: &SignalEmitter<'_>, value: f64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn orientation_y(emitter: &SignalEmitter<'_>, value: f64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn orientation_z(emitter: &SignalEmitter<'_>, value: f64) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn angular_velocity_z(emitter: &SignalEmitter<'_>, value: f64) -> zbus::Result<()>;
}

impl ImuInterface {
    /// Returns the signal emitter for the IMU object so the bridge can
    /// emit sample signals.
    pub async fn emitter(
        conn: &Connection,
    ) -> Result<SignalEmitter<'static>, Box<dyn Error + Send + Sync>> {
        let iface_ref = conn
            .object_server()
            .interface::<_, ImuInterface>(BUS_IMU_PATH)
            .await?;
        Ok(iface_ref.signal_emitter().to_owned())
    }
}
