//! Station-mode WiFi for the ESP32.
//!
//! [`Esp32Wifi`] joins the configured network at construction and then
//! serves as the [`Link`] of the UDP transport, reporting the station
//! address and subnet the broadcast address is derived from.
//!
//! ```ignore
//! use sr_control::config::WifiConfig;
//! use sr_control::hal::esp32::Esp32Wifi;
//! use sr_control::hal::UdpTransport;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//! let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config)?;
//! let transport = UdpTransport::bind(4210, wifi)?;
//! ```

use std::net::Ipv4Addr;
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::WifiConfig;
use crate::traits::{mask_from_prefix, Link};

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connected WiFi station.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    timeout: Duration,
}

impl<'a> Esp32Wifi<'a> {
    /// Start the driver and join the network.
    ///
    /// Connection attempts repeat until `config.connect_timeout_ms` has
    /// passed; the last failure is returned.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let mut ssid: heapless::String<32> = heapless::String::new();
        ssid.push_str(config.ssid.as_str())
            .map_err(|_| anyhow::anyhow!("ssid longer than 32 bytes"))?;
        let mut password: heapless::String<64> = heapless::String::new();
        password
            .push_str(config.password.as_str())
            .map_err(|_| anyhow::anyhow!("password longer than 64 bytes"))?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            ..Default::default()
        }))?;
        wifi.start()?;

        let mut station = Self {
            wifi,
            timeout: Duration::from_millis(u64::from(config.connect_timeout_ms)),
        };
        info!("wifi: connecting to '{}'", config.ssid);
        station.reconnect()?;
        Ok(station)
    }

    /// Join again after the link dropped.
    pub fn reconnect(&mut self) -> Result<(), EspError> {
        let started = Instant::now();
        loop {
            match self.try_connect() {
                Ok(()) => break,
                Err(e) if started.elapsed() < self.timeout => {
                    warn!("wifi: connect failed ({}), retrying", e);
                    thread::sleep(RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
        if let Some((ip, mask)) = self.station() {
            info!("wifi: connected, ip {} mask {}", ip, mask);
        }
        Ok(())
    }

    fn try_connect(&mut self) -> Result<(), EspError> {
        if self.wifi.is_connected()? {
            self.wifi.disconnect()?;
        }
        self.wifi.connect()?;
        self.wifi.wait_netif_up()
    }

    /// Underlying driver.
    pub fn driver(&self) -> &EspWifi<'a> {
        self.wifi.wifi()
    }
}

impl Link for Esp32Wifi<'_> {
    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn station(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        let info = self.wifi.wifi().sta_netif().get_ip_info().ok()?;
        if info.ip.is_unspecified() {
            return None;
        }
        Some((info.ip, mask_from_prefix(info.subnet.mask.0)))
    }
}
