//! Shared configuration for desktop and ESP32 builds.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use sr_control::config::{Config, DiscoveryConfig, UdpConfig};
//!
//! let config = Config::default()
//!     .with_udp(UdpConfig::default().with_port(5000))
//!     .with_discovery(DiscoveryConfig::default().with_check_interval_ms(10_000));
//!
//! assert_eq!(config.udp.port, 5000);
//! ```

use heapless::String as HString;

use crate::button::{ButtonConfig, ContactType, InputType};

/// Maximum length for short config strings (names, descriptions, SSIDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut out = HString::new();
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let _ = out.push_str(&s[..end]);
    out
}

/// Create a ShortString from a &str, truncating on a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating on a char boundary if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Module identification
    pub device: DeviceConfig,
    /// UDP protocol port
    pub udp: UdpConfig,
    /// Remote relay discovery (switch modules)
    pub discovery: DiscoveryConfig,
    /// Button click beep
    pub buzzer: BuzzerConfig,
    /// Button timing and wiring
    pub button: ButtonSettings,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set UDP configuration
    pub fn with_udp(mut self, udp: UdpConfig) -> Self {
        self.udp = udp;
        self
    }

    /// Set discovery configuration
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Set buzzer configuration
    pub fn with_buzzer(mut self, buzzer: BuzzerConfig) -> Self {
        self.buzzer = buzzer;
        self
    }

    /// Set button configuration
    pub fn with_button(mut self, button: ButtonSettings) -> Self {
        self.button = button;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Module identification and storage locations
#[derive(Clone, Debug)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Module description, reported in diagnostics and settings
    pub description: ShortString,
    /// Relay settings file (or storage key)
    pub relay_file: LongString,
    /// Switch settings file (or storage key)
    pub switch_file: LongString,
    /// Relay configuration page path
    pub config_page: LongString,
    /// WiFi configuration page path (empty = none)
    pub wifi_page: LongString,
    /// Log output on or off
    pub log_enabled: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            description: ShortString::new(),
            relay_file: long_string(crate::settings::DEFAULT_RELAY_FILE),
            switch_file: long_string(crate::settings::DEFAULT_SWITCH_FILE),
            config_page: long_string("/relay_config"),
            wifi_page: LongString::new(),
            log_enabled: true,
        }
    }
}

impl DeviceConfig {
    /// Set the module description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = short_string(description);
        self
    }

    /// Set the relay settings file
    pub fn with_relay_file(mut self, file: &str) -> Self {
        self.relay_file = long_string(file);
        self
    }

    /// Set the switch settings file
    pub fn with_switch_file(mut self, file: &str) -> Self {
        self.switch_file = long_string(file);
        self
    }

    /// Set the configuration page paths
    pub fn with_pages(mut self, config_page: &str, wifi_page: &str) -> Self {
        self.config_page = long_string(config_page);
        self.wifi_page = long_string(wifi_page);
        self
    }

    /// Turn log output on or off
    pub fn with_log_enabled(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    /// Logger max level for [`log_enabled`](Self::log_enabled).
    pub fn log_level(&self) -> log::LevelFilter {
        log_level(self.log_enabled)
    }
}

/// Max level that turns log output on (`Info`) or off.
pub fn log_level(enabled: bool) -> log::LevelFilter {
    if enabled {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    }
}

// ============================================================================
// UDP Config
// ============================================================================

/// UDP protocol configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct UdpConfig {
    /// Local port shared by every module of one deployment
    pub port: u16,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self { port: 4210 }
    }
}

impl UdpConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// ============================================================================
// Discovery Config
// ============================================================================

/// Remote relay discovery and error feedback (switch modules)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryConfig {
    /// Interval between periodic discovery broadcasts
    pub check_interval_ms: u32,
    /// Beeps when a command targets an unresolved relay
    pub not_found_beeps: u8,
    /// Beeps when a command is attempted without connectivity
    pub disconnected_beeps: u8,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 30_000,
            not_found_beeps: 2,
            disconnected_beeps: 3,
        }
    }
}

impl DiscoveryConfig {
    /// Set the discovery interval
    pub fn with_check_interval_ms(mut self, ms: u32) -> Self {
        self.check_interval_ms = ms;
        self
    }

    /// Set the beep counts for "not found" and "disconnected"
    pub fn with_error_beeps(mut self, not_found: u8, disconnected: u8) -> Self {
        self.not_found_beeps = not_found;
        self.disconnected_beeps = disconnected;
        self
    }
}

// ============================================================================
// Buzzer Config
// ============================================================================

/// Buzzer timing (active buzzer: the tone is fixed by the part)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BuzzerConfig {
    /// Whether the buzzer is used at all
    pub enabled: bool,
    /// Click beep duration
    pub click_ms: u32,
    /// Error beep duration (the pause between beeps is the same)
    pub error_ms: u32,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            click_ms: 50,
            error_ms: 50,
        }
    }
}

impl BuzzerConfig {
    /// Enable or disable the buzzer
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the click and error beep durations
    pub fn with_durations(mut self, click_ms: u32, error_ms: u32) -> Self {
        self.click_ms = click_ms;
        self.error_ms = error_ms;
        self
    }
}

// ============================================================================
// Button Settings
// ============================================================================

/// Button wiring and timing shared by all buttons of a module
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonSettings {
    /// Pull resistor wiring
    pub input: InputType,
    /// Contact type
    pub contact: ContactType,
    /// Debounce, click, and long-click timing
    pub timing: ButtonConfig,
}

// ============================================================================
// Tests
// ============================================================================
