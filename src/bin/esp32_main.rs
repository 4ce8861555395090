//! ESP32 relay or switch module firmware.
//!
//! One image serves both roles; the role is fixed at build time:
//!
//! - **relay**: two relay outputs (GPIO4/5), each with a local button
//!   (GPIO6/7), answering UDP commands and restoring state after reboot
//! - **switch**: two buttons (GPIO6/7) bound to remote relays by name
//!
//! Both roles beep on GPIO10, keep their settings in NVS, and serve the
//! HTTP API on port 80.
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=... WIFI_PASSWORD=... SR_ROLE=relay \
//!     cargo build --release --bin esp32_main --features wifi
//!
//! # optional: SR_DESCRIPTION="Kitchen" SR_LOG=off SR_WEB=off
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use sr_control::config::{ButtonSettings, Config, DeviceConfig, WebConfig, WifiConfig};
use sr_control::hal::esp32::{Esp32Buzzer, Esp32Clock, Esp32HttpServer, Esp32Wifi, EspNvsStore};
use sr_control::hal::{InputPinButton, OutputPinRelay, UdpTransport};
use sr_control::services::{Device, SharedDevice};
use sr_control::traits::{ActiveLevel, Clock, Link};
use sr_control::{Button, InputType, RelayControl, SwitchControl};

/// Main loop interval in milliseconds.
const LOOP_INTERVAL_MS: u64 = 5;

/// Relay and button channels on the board.
const CHANNELS: usize = 2;

/// Loop ticks between link checks (about one second).
const LINK_CHECK_TICKS: u32 = 200;

type Out = OutputPinRelay<PinDriver<'static, AnyOutputPin, Output>>;
type In = InputPinButton<PinDriver<'static, AnyIOPin, Input>>;
type Udp = UdpTransport<Esp32Wifi<'static>>;

fn main() -> anyhow::Result<()> {
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_device(
            DeviceConfig::default()
                .with_description(option_env!("SR_DESCRIPTION").unwrap_or(""))
                .with_log_enabled(option_env!("SR_LOG") != Some("off")),
        )
        .with_web(WebConfig::default().with_enabled(option_env!("SR_WEB") != Some("off")));
    log::set_max_level(config.device.log_level());
    let role = option_env!("SR_ROLE").unwrap_or("relay");
    info!("sr-control {} module starting", role);

    if !config.wifi.is_configured() {
        anyhow::bail!("WiFi not configured (set WIFI_SSID/WIFI_PASSWORD at build time)");
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // =========================================================================
    // Network, storage, feedback
    // =========================================================================
    let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs.clone()), &config.wifi)?;
    let transport = UdpTransport::bind(config.udp.port, wifi)?;
    let store = EspNvsStore::with_keys(
        nvs,
        &config.device.relay_file,
        &config.device.switch_file,
    )?;
    let buzzer = Esp32Buzzer::new(peripherals.pins.gpio10.into(), config.buzzer.clone())?;

    let buttons = [
        button(peripherals.pins.gpio6.into(), &config.button)?,
        button(peripherals.pins.gpio7.into(), &config.button)?,
    ];

    let clock = Esp32Clock::new();
    match role {
        "switch" => run_switch(&config, &clock, transport, store, buzzer, buttons),
        _ => {
            let outputs = [
                PinDriver::output(AnyOutputPin::from(peripherals.pins.gpio4))?,
                PinDriver::output(AnyOutputPin::from(peripherals.pins.gpio5))?,
            ];
            run_relay(&config, &clock, transport, store, buzzer, buttons, outputs)
        }
    }
}

fn button(pin: AnyIOPin, settings: &ButtonSettings) -> anyhow::Result<Button<In>> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(match settings.input {
        InputType::PullUp => Pull::Up,
        InputType::PullDown => Pull::Down,
    })?;
    Ok(Button::with_wiring(
        InputPinButton::new(driver),
        settings.input,
        settings.contact,
        settings.timing,
    ))
}

fn run_relay(
    config: &Config,
    clock: &Esp32Clock,
    transport: Udp,
    store: EspNvsStore,
    buzzer: Esp32Buzzer,
    buttons: [Button<In>; CHANNELS],
    outputs: [PinDriver<'static, AnyOutputPin, Output>; CHANNELS],
) -> anyhow::Result<()> {
    let mut relays: RelayControl<Out, _, _, _, In> =
        RelayControl::new(CHANNELS, transport, store, buzzer)
            .with_description(&config.device.description)
            .with_pages(&config.device.config_page, &config.device.wifi_page);

    for (i, (pin, button)) in outputs.into_iter().zip(buttons).enumerate() {
        let name = format!("relay{}", i + 1);
        relays
            .add_relay_with_button(&name, OutputPinRelay::new(pin), ActiveLevel::High, "", button)
            .map_err(|e| anyhow::anyhow!("add {}: {}", name, e))?;
    }
    relays.start();

    let shared = Arc::new(SharedDevice::new(relays));
    let _server = if config.web.enabled {
        Some(Esp32HttpServer::relay(&config.web, Arc::clone(&shared))?)
    } else {
        info!("http api disabled");
        None
    };
    run_loop(&shared, clock, |relays| relays.transport_mut().link_mut())
}

fn run_switch(
    config: &Config,
    clock: &Esp32Clock,
    transport: Udp,
    store: EspNvsStore,
    buzzer: Esp32Buzzer,
    buttons: [Button<In>; CHANNELS],
) -> anyhow::Result<()> {
    let mut switch: SwitchControl<_, _, _, In> =
        SwitchControl::new(CHANNELS, transport, store, buzzer)
            .with_description(&config.device.description)
            .with_pages(&config.device.config_page, &config.device.wifi_page)
            .with_discovery(config.discovery.clone());

    // placeholders; stored settings rename the bindings in start()
    for (i, button) in buttons.into_iter().enumerate() {
        let name = format!("relay{}", i + 1);
        switch
            .add_relay_with_button(&name, button)
            .map_err(|e| anyhow::anyhow!("add {}: {}", name, e))?;
    }
    switch.start(clock.now_ms());

    let shared = Arc::new(SharedDevice::new(switch));
    let _server = if config.web.enabled {
        Some(Esp32HttpServer::switch(&config.web, Arc::clone(&shared))?)
    } else {
        info!("http api disabled");
        None
    };
    run_loop(&shared, clock, |switch| switch.transport_mut().link_mut())
}

/// Tick the device forever, rejoining WiFi when the link drops.
fn run_loop<D, F>(shared: &SharedDevice<D>, clock: &Esp32Clock, wifi: F) -> anyhow::Result<()>
where
    D: Device,
    F: Fn(&mut D) -> &mut Esp32Wifi<'static>,
{
    let mut ticks: u32 = 0;
    loop {
        shared.with_device(|device| device.tick(clock.now_ms()));

        ticks += 1;
        if ticks >= LINK_CHECK_TICKS {
            ticks = 0;
            shared.with_device(|device| {
                let link = wifi(device);
                if !link.is_connected() {
                    warn!("wifi link lost, reconnecting");
                    if let Err(e) = link.reconnect() {
                        warn!("wifi reconnect failed: {}", e);
                    }
                }
            });
        }

        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
