//! Pi-snapshot binary: capture one frame and print it as a data URL.

use std::env;

use pi_snapshot::device::DEFAULT_BUFFER_COUNT;
use pi_snapshot::{CameraError, ImageCapture, V4L2Provider};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the device index.
const DEVICE_ENV: &str = "PI_SNAPSHOT_DEVICE";
/// Environment variable overriding the mmap buffer count.
const BUFFERS_ENV: &str = "PI_SNAPSHOT_BUFFERS";

/// Settings read from the command line and environment.
#[derive(Debug, PartialEq, Eq)]
struct Config {
    device_index: u32,
    buffer_count: u32,
}

impl Config {
    fn load() -> Result<Self, CameraError> {
        Self::from_sources(
            env::args().nth(1),
            env::var(DEVICE_ENV).ok(),
            env::var(BUFFERS_ENV).ok(),
        )
    }

    /// The positional argument wins over the environment.
    fn from_sources(
        arg: Option<String>,
        device_env: Option<String>,
        buffers_env: Option<String>,
    ) -> Result<Self, CameraError> {
        let device_index = arg
            .or(device_env)
            .map_or(Ok(0), |raw| parse_number("device index", &raw))?;
        let buffer_count = buffers_env.map_or(Ok(DEFAULT_BUFFER_COUNT), |raw| {
            parse_number("buffer count", &raw)
        })?;

        Ok(Self {
            device_index,
            buffer_count,
        })
    }
}

fn parse_number(what: &str, raw: &str) -> Result<u32, CameraError> {
    raw.trim().parse().map_err(|err| {
        CameraError::InvalidConfig(format!("{what} {raw:?}: {err}"))
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> pi_snapshot::Result<()> {
    let config = Config::load()?;
    tracing::info!(
        device = config.device_index,
        buffers = config.buffer_count,
        "capturing snapshot"
    );

    let provider = V4L2Provider::new(config.device_index).with_buffer_count(config.buffer_count);
    let mut capture = ImageCapture::new(provider);

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let image = runtime.block_on(capture.capture_image())?;

    println!("{image}");
    Ok(())
}
