use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use zbus::fdo;
use zbus_macros::interface;

use crate::bridge::diagnostics::Diagnostics;

/// DBus interface exposing publish-frequency diagnostics for each
/// sensor topic.
pub struct DiagnosticsInterface {
    diagnostics: Arc<Mutex<Diagnostics>>,
    /// Hardware id string: model and serial number of the device
    hardware_id: String,
}

impl DiagnosticsInterface {
    pub fn new(diagnostics: Arc<Mutex<Diagnostics>>, hardware_id: String) -> DiagnosticsInterface {
        DiagnosticsInterface {
            diagnostics,
            hardware_id,
        }
    }
}

#[interface(name = "org.imubridge.Diagnostics")]
impl DiagnosticsInterface {
    #[zbus(property)]
    async fn hardware_id(&self) -> fdo::Result<String> {
        Ok(self.hardware_id.clone())
    }

    /// Measured publish frequency per topic in Hz
    #[zbus(property)]
    async fn frequencies(&self) -> fdo::Result<HashMap<String, f64>> {
        let diagnostics = self.diagnostics.lock().unwrap();
        Ok(diagnostics.frequencies())
    }

    /// Frequency status per topic: "ok", "stale" or "out of range"
    #[zbus(property)]
    async fn statuses(&self) -> fdo::Result<HashMap<String, String>> {
        let diagnostics = self.diagnostics.lock().unwrap();
        Ok(diagnostics.statuses())
    }
}
