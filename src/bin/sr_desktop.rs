//! Desktop relay or switch module.
//!
//! Runs either role on a host machine: relays are simulated outputs that
//! only log their state, settings are JSON files in the working directory,
//! and the HTTP API is served with axum.
//!
//! # Usage
//!
//! ```sh
//! # relay module with two relays
//! cargo run --bin sr_desktop --features web -- relay --relays hall,porch
//!
//! # switch module bound to them, on another machine of the same subnet
//! cargo run --bin sr_desktop --features web -- switch --relays hall,porch \
//!     --ip 192.168.1.20 --mask 255.255.255.0 --port 8081
//!
//! # UDP only, no HTTP API and no log output
//! cargo run --bin sr_desktop --features web -- relay --no-web --log off
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use log::info;
use tokio::task::JoinHandle;

use sr_control::config::{Config, DeviceConfig, WebConfig};
use sr_control::hal::{JsonFileStore, LogFeedback, MockRelay, UdpTransport};
use sr_control::services::{
    relay_router, serve, switch_router, Device, SharedDevice, WebServerConfig,
};
use sr_control::traits::{ActiveLevel, StaticLink};
use sr_control::{NoButton, RelayControl, SwitchControl};

/// Device tick interval.
const TICK_MS: u64 = 5;

#[derive(Debug)]
struct Args {
    role: String,
    relays: Vec<String>,
    http_port: u16,
    ip: Ipv4Addr,
    mask: Ipv4Addr,
    dir: PathBuf,
    web: bool,
    log: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Args {
            role: "relay".into(),
            relays: vec!["relay1".into()],
            http_port: 8080,
            ip: Ipv4Addr::LOCALHOST,
            mask: Ipv4Addr::new(255, 0, 0, 0),
            dir: PathBuf::from("."),
            web: true,
            log: true,
        };

        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            let mut value =
                |flag: &str| iter.next().with_context(|| format!("{} needs a value", flag));
            match arg.as_str() {
                role @ ("relay" | "switch") => args.role = role.to_owned(),
                "--relays" => {
                    args.relays = value("--relays")?
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect();
                }
                "--port" => args.http_port = value("--port")?.parse().context("--port")?,
                "--ip" => args.ip = value("--ip")?.parse().context("--ip")?,
                "--mask" => args.mask = value("--mask")?.parse().context("--mask")?,
                "--dir" => args.dir = PathBuf::from(value("--dir")?),
                "--no-web" => args.web = false,
                "--log" => {
                    args.log = match value("--log")?.as_str() {
                        "on" => true,
                        "off" => false,
                        other => bail!("--log expects on or off, got '{}'", other),
                    }
                }
                other => bail!("unknown argument '{}'", other),
            }
        }
        Ok(args)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse()?;
    let config = Config::default()
        .with_web(WebConfig::default().with_enabled(args.web))
        .with_device(DeviceConfig::default().with_log_enabled(args.log));
    log::set_max_level(config.device.log_level());

    let web_config = WebServerConfig::new(SocketAddr::from(([0, 0, 0, 0], args.http_port)))
        .cors(config.web.cors_permissive);

    let link = StaticLink {
        address: args.ip,
        netmask: args.mask,
    };
    let transport = UdpTransport::bind(config.udp.port, link)
        .with_context(|| format!("bind udp port {}", config.udp.port))?;
    let store = JsonFileStore::new(
        args.dir.join(config.device.relay_file.as_str()),
        args.dir.join(config.device.switch_file.as_str()),
    );
    let capacity = args.relays.len().max(1);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match args.role.as_str() {
            "switch" => {
                let mut switch: SwitchControl<_, _, _, NoButton> =
                    SwitchControl::new(capacity, transport, store, LogFeedback)
                        .with_description(&config.device.description)
                        .with_discovery(config.discovery.clone());
                for name in &args.relays {
                    switch
                        .add_relay(name)
                        .map_err(|e| anyhow::anyhow!("add {}: {}", name, e))?;
                }
                let shared = Arc::new(SharedDevice::new(switch));
                let now = shared.now_ms();
                shared.with_device(|switch| switch.start(now));

                info!("switch module for {:?}", args.relays);
                let ticker = spawn_tick_loop(Arc::clone(&shared));
                if config.web.enabled {
                    serve(switch_router(shared, &web_config), &web_config).await?;
                } else {
                    ticker.await?;
                }
            }
            _ => {
                let mut relays: RelayControl<MockRelay, _, _, _, NoButton> =
                    RelayControl::new(capacity, transport, store, LogFeedback)
                        .with_description(&config.device.description);
                for name in &args.relays {
                    relays
                        .add_relay(name, MockRelay::new(), ActiveLevel::High, "")
                        .map_err(|e| anyhow::anyhow!("add {}: {}", name, e))?;
                }
                relays.start();

                info!("relay module with {:?}", args.relays);
                let shared = Arc::new(SharedDevice::new(relays));
                let ticker = spawn_tick_loop(Arc::clone(&shared));
                if config.web.enabled {
                    serve(relay_router(shared, &web_config), &web_config).await?;
                } else {
                    ticker.await?;
                }
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Tick the device from a blocking thread; the device does socket I/O.
fn spawn_tick_loop<D: Device + Send + 'static>(device: Arc<SharedDevice<D>>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        device.tick();
        std::thread::sleep(Duration::from_millis(TICK_MS));
    })
}
