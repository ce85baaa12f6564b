//! Common types used in the protocol.

use crate::constants::*;
use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Reporting mode for debug and error output of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Off,
    On,
    None,
    All,
    Local,
    Remote,
}

impl Mode {
    /// Get the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Off => MODE_OFF,
            Mode::On => MODE_ON,
            Mode::None => MODE_NONE,
            Mode::All => MODE_ALL,
            Mode::Local => MODE_LOCAL,
            Mode::Remote => MODE_REMOTE,
        }
    }
}

/// Firmware component targeted by an over-the-air upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaModule {
    /// The WRF01 module itself.
    Wrf01,
    /// The host microcontroller.
    Client,
    /// Name not recognised.
    Unknown,
}

impl OtaModule {
    /// Get the wire string. `Unknown` has none.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            OtaModule::Wrf01 => Some(OTA_MODULE_WRF01),
            OtaModule::Client => Some(OTA_MODULE_CLIENT),
            OtaModule::Unknown => None,
        }
    }

    /// Parse a module name. Unrecognised names map to `Unknown`.
    pub fn from_wire(s: &str) -> OtaModule {
        match s {
            OTA_MODULE_WRF01 => OtaModule::Wrf01,
            OTA_MODULE_CLIENT => OtaModule::Client,
            _ => OtaModule::Unknown,
        }
    }
}

/// Transfer protocol the module uses to deliver an upgrade to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaProtocol {
    Raw,
    ArduinoZero,
    Handshake,
}

impl OtaProtocol {
    /// Get the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OtaProtocol::Raw => OTA_PROTOCOL_RAW,
            OtaProtocol::ArduinoZero => OTA_PROTOCOL_ARDUINO,
            OtaProtocol::Handshake => OTA_PROTOCOL_HANDSHAKE,
        }
    }
}

/// Network connection state reported in a status object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not trying to connect.
    Idle,
    /// Trying to join the configured network.
    Connecting,
    /// Joined the local network and online.
    GotIp,
    /// Failed to join the network, still retrying.
    ConnectionFailed,
    /// Online locally but cannot resolve the cloud agent.
    DnsFailed,
    /// Configured SSID not visible, still scanning.
    NoApFound,
    /// Network rejected the configured password.
    WrongPassword,
    /// String not recognised.
    Unknown,
}

impl ConnectionStatus {
    /// Parse the wire string.
    pub fn from_wire(s: &str) -> ConnectionStatus {
        match s {
            CONNECTION_IDLE => ConnectionStatus::Idle,
            CONNECTION_CONNECTING => ConnectionStatus::Connecting,
            CONNECTION_GOT_IP => ConnectionStatus::GotIp,
            CONNECTION_FAILED => ConnectionStatus::ConnectionFailed,
            CONNECTION_DNS_FAILED => ConnectionStatus::DnsFailed,
            CONNECTION_NO_AP_FOUND => ConnectionStatus::NoApFound,
            CONNECTION_WRONG_PASSWORD => ConnectionStatus::WrongPassword,
            _ => ConnectionStatus::Unknown,
        }
    }
}

// ============================================================================
// Response Payloads
// ============================================================================

/// Module status (response to the `status` command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Network connection state.
    pub connection_status: ConnectionStatus,
    /// IP address on the local network.
    pub ip_addr: String,
    /// Whether the access point is visible.
    pub visibility: bool,
    /// Last error the module recorded.
    pub last_error_code: ErrorCode,
    /// Message of the last error.
    pub last_error_msg: String,
    /// Number of successful cloud transfers.
    pub successful_transfer_count: i32,
}

/// Connection report sent when the module joins a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// MAC address as a hex string.
    pub mac: String,
    /// Received signal strength in dBm.
    pub rssi: i32,
}

/// Pending upgrades (response to `check_upgrade`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleList {
    /// Modules with an upgrade waiting.
    pub modules: Vec<OtaModule>,
}

/// Description of an upgrade image about to be streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePackage {
    /// Image size in bytes.
    pub size: i64,
    /// CRC of the image as reported, at most four characters.
    pub crc: String,
}

/// Wall-clock time reported by the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrfTime {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Day of week, 0 (Monday) to 6 (Sunday).
    pub week_day: i32,
    pub day: i32,
    /// Month, 1 to 12.
    pub month: i32,
    pub year: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    /// Offset from GMT in hours, -11 to 13.
    pub timezone: i32,
    /// Daylight saving time in effect.
    pub dst: bool,
}

// ============================================================================
// Request Payloads
// ============================================================================

/// Setup configuration sent with the `setup` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrfConfig {
    /// Debug output mode.
    pub debug_mode: Mode,
    /// Error output mode.
    pub error_mode: Mode,
    /// Prefix of the access point SSID.
    pub ssid_prefix: String,
    /// Seconds the access point stays visible (-1 forever, 0 off).
    pub visibility: i32,
    /// Use TLS towards the cloud.
    pub ssl_enabled: bool,
    /// Suppress the connection report on connect.
    pub silent_connect: bool,
    /// Network to join.
    pub network_ssid: Option<String>,
    /// Password of that network.
    pub network_pwd: Option<String>,
    /// Cloud token.
    pub token: Option<String>,
    /// Product key issued for the device.
    pub product_key: Option<String>,
    /// Host firmware version.
    pub version: Option<String>,
}

impl Default for WrfConfig {
    fn default() -> Self {
        WrfConfig {
            debug_mode: Mode::None,
            error_mode: Mode::All,
            ssid_prefix: DEFAULT_SSID_PREFIX.to_string(),
            visibility: 0,
            ssl_enabled: true,
            silent_connect: true,
            network_ssid: None,
            network_pwd: None,
            token: None,
            product_key: None,
            version: None,
        }
    }
}

/// Parameters of a `get_upgrade` request. `None` fields are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaParams {
    pub module: Option<OtaModule>,
    pub file_no: Option<u32>,
    /// Seconds before the module starts streaming.
    pub delay: Option<u32>,
    /// Pin sequence toggled to put the host into its bootloader.
    pub pin_toggle: Option<String>,
    pub protocol: Option<OtaProtocol>,
}

impl OtaParams {
    /// Parameters that upgrade the module itself.
    pub fn wrf01() -> Self {
        OtaParams {
            module: Some(OtaModule::Wrf01),
            file_no: Some(0),
            delay: Some(0),
            pin_toggle: Some(String::new()),
            protocol: Some(OtaProtocol::Raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_literal_mapping() {
        assert_eq!(ConnectionStatus::from_wire("GOT_IP"), ConnectionStatus::GotIp);
        assert_eq!(ConnectionStatus::from_wire("NO_AP_FOUND"), ConnectionStatus::NoApFound);
        assert_eq!(ConnectionStatus::from_wire("got_ip"), ConnectionStatus::Unknown);
    }

    #[test]
    fn test_ota_module_mapping() {
        assert_eq!(OtaModule::from_wire("WRF01"), OtaModule::Wrf01);
        assert_eq!(OtaModule::from_wire("CLIENT"), OtaModule::Client);
        assert_eq!(OtaModule::from_wire("BOOT"), OtaModule::Unknown);
        assert_eq!(OtaModule::Unknown.as_str(), None);
    }

    #[test]
    fn test_wrf01_upgrade_params() {
        let params = OtaParams::wrf01();
        assert_eq!(params.module, Some(OtaModule::Wrf01));
        assert_eq!(params.file_no, Some(0));
        assert_eq!(params.delay, Some(0));
        assert_eq!(params.pin_toggle.as_deref(), Some(""));
        assert_eq!(params.protocol, Some(OtaProtocol::Raw));
    }

    #[test]
    fn test_config_defaults() {
        let config = WrfConfig::default();
        assert_eq!(config.debug_mode, Mode::None);
        assert_eq!(config.error_mode, Mode::All);
        assert_eq!(config.ssid_prefix, "DeviceDrive");
        assert!(config.ssl_enabled);
        assert!(config.silent_connect);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: WrfConfig =
            serde_json::from_str(r#"{"debug_mode":"all","token":"abc"}"#).unwrap();
        assert_eq!(config.debug_mode, Mode::All);
        assert_eq!(config.error_mode, Mode::All);
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
