use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use zbus::fdo::ObjectManager;
use zbus::Connection;

use crate::bridge::Bridge;
use crate::config::ImuConfig;
use crate::constants::BUS_NAME;
use crate::constants::BUS_PREFIX;

mod bridge;
mod config;
mod constants;
mod dbus;
mod drivers;

#[derive(Parser, Debug)]
#[command(name = "imubridge", about = "VN-100 serial IMU bridge daemon")]
struct Args {
    /// Path to a config file. Defaults to searching the XDG data dirs.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Serial port override
    #[arg(short, long)]
    port: Option<String>,
    /// Baud rate override
    #[arg(short, long)]
    baudrate: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting imubridge v{}", VERSION);

    let args = Args::parse();
    let mut config = match args.config {
        Some(path) => ImuConfig::from_yaml_file(&path).map_err(|e| {
            log::error!("Failed to load config {}: {e}", path.display());
            e
        })?,
        None => ImuConfig::load(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(baudrate) = args.baudrate {
        config.baudrate = baudrate;
    }

    // Setup CTRL+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for shutdown signal: {e}");
            return;
        }
        log::info!("Shutting down");
        process::exit(0);
    });

    // Configure the DBus connection
    let connection = Connection::system().await?;

    // Create an ObjectManager to signal when objects are added/removed
    let object_manager = ObjectManager {};
    connection
        .object_server()
        .at(BUS_PREFIX, object_manager)
        .await?;

    // Create the bridge instance
    let mut bridge = Bridge::new(connection.clone(), config);

    let (bridge_result, request_name_result) = tokio::join!(
        // Run the bridge and publish over DBus
        bridge.run(),
        // Request the named bus
        connection.request_name(BUS_NAME)
    );

    if let Err(e) = request_name_result {
        log::error!("Error in dbus request name operation: {e}");
        return Err(Box::new(e) as Box<dyn Error + Send + Sync>);
    }

    match bridge_result {
        Ok(_) => {
            log::info!("The bridge task has exited");
        }
        Err(e) => {
            log::error!("Error running the bridge: {e}");
            return Err(e);
        }
    }

    log::info!("imubridge stopped");

    Ok(())
}
