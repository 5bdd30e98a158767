//! Take one photo with a VC0706 camera and save it as a JPEG file.
//!
//! Usage:
//!   vc0706-snap [OPTIONS]
//!
//! Examples:
//!   vc0706-snap --port /dev/ttyUSB0 --size l -o garden.jpg
//!   vc0706-snap --tcp 192.168.1.20:4001
//!   RUST_LOG=vc0706_core=debug vc0706-snap --config camera.json

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vc0706_core::camera::{Camera, CameraConfig};
use vc0706_core::protocol::{
    list_ports, open_port, CommunicationChannel, PhotoSize, SerialChannel, TcpChannel,
};

#[derive(Parser, Debug)]
#[command(name = "vc0706-snap", version, about = "Take a photo with a VC0706 serial camera")]
struct Args {
    /// Serial port (overrides the config file)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Connect to a serial-over-TCP bridge instead of a local port
    #[arg(long, value_name = "HOST:PORT", conflicts_with = "port")]
    tcp: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Photo size: l, m or s (anything else means m)
    #[arg(short, long)]
    size: Option<String>,

    /// JPEG compression ratio (0-255)
    #[arg(long)]
    compression: Option<u8>,

    /// Output file (default: photo-<timestamp>.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the reset before capturing
    #[arg(long)]
    no_reset: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list_ports {
        for port in list_ports() {
            println!("{}\t{}", port.name, port.product.as_deref().unwrap_or(""));
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => CameraConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CameraConfig::default(),
    };
    if let Some(port) = &args.port {
        config.port_name = port.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }

    let channel: Box<dyn CommunicationChannel> = match &args.tcp {
        Some(addr) => {
            info!("connecting to {}", addr);
            Box::new(
                TcpChannel::connect(addr, Duration::from_millis(100))
                    .with_context(|| format!("connecting to {}", addr))?,
            )
        }
        None => {
            info!("opening {} at {} baud", config.port_name, config.baud_rate);
            let port = open_port(&config.port_name, Some(config.baud_rate))
                .with_context(|| format!("opening {}", config.port_name))?;
            Box::new(SerialChannel::new(port))
        }
    };

    let mut camera = Camera::new(channel, config);

    if !args.no_reset {
        info!("resetting camera");
        camera.reset().context("reset")?;
    }

    match camera.get_version() {
        Ok(version) => println!("Camera version: {}", version),
        Err(e) => warn!("could not read firmware version: {}", e),
    }

    if let Some(code) = &args.size {
        camera
            .set_photo_size(PhotoSize::parse_lenient(code))
            .context("setting photo size")?;
    }
    if let Some(rate) = args.compression {
        camera
            .set_compression(rate)
            .context("setting compression")?;
    }

    let jpeg = camera.take_photo().context("taking photo")?;
    info!("captured {} bytes", jpeg.len());

    if let Err(e) = camera.resume_video() {
        warn!("could not resume video: {}", e);
    }

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "photo-{}.jpg",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ))
    });
    std::fs::write(&output, &jpeg).with_context(|| format!("writing {}", output.display()))?;
    println!("Saved {} ({} bytes)", output.display(), jpeg.len());

    Ok(())
}
