//! Protocol constants
//!
//! Control bytes, JSON keys and the literal strings the WRF01 module uses on
//! the wire. Every string-to-enum table in this crate is built from these.

// ============================================================================
// Control Bytes
// ============================================================================

/// Start of text. Prefix of the power-up sentinel.
pub const STX: u8 = 0x02;
/// End of text. Terminates a message that expects no reply.
pub const ETX: u8 = 0x03;
/// End of transmission. Terminates every request and every response.
pub const EOT: u8 = 0x04;
/// File transfer: last packet accepted, send the next one.
pub const ACK: u8 = 0x06;
/// File transfer: last packet rejected, send it again.
pub const NAK: u8 = 0x15;
/// File transfer: peer aborted the transfer.
pub const CAN: u8 = 0x18;

// ============================================================================
// Sizes
// ============================================================================

/// Bytes added around each file packet payload (STX + length + CRC + EOT).
pub const FILE_PACKET_OVERHEAD_SIZE: usize = 10;
/// Number of characters kept from the CRC string of an upgrade package.
pub const CRC_STRING_SIZE: usize = 4;
/// Default SSID prefix used when the module shows its access point.
pub const DEFAULT_SSID_PREFIX: &str = "DeviceDrive";

// ============================================================================
// Envelope Keys
// ============================================================================

/// Top-level key of requests and of responses produced by the module itself.
pub const LOCAL_RESPONSE_KEY: &str = "devicedrive";
/// Top-level key of responses relayed from the cloud.
pub const REMOTE_RESPONSE_KEY: &str = "DeviceDrive";
/// Top-level key of the connection report.
pub const CONFIGURATION_KEY: &str = "configuration";
/// Sibling of [`CONFIGURATION_KEY`] holding the signal strength.
pub const DEVICE_STATE_KEY: &str = "device_state";

/// Key carrying the command tag in a request.
pub const COMMAND_KEY: &str = "command";
pub const RESULT_KEY: &str = "result";
pub const ERROR_KEY: &str = "error";
pub const STATUS_KEY: &str = "status";
pub const UPGRADE_KEY: &str = "upgrade";
pub const MAX_PACKET_SIZE_KEY: &str = "max_packet_size";
pub const TIME_KEY: &str = "time";
pub const REMOTE_ERROR_CODE_KEY: &str = "ErrorCode";

/// First field name of an upgrade package description.
pub const UPGRADE_LENGTH_KEY: &str = "length";

// ============================================================================
// Command Tags
// ============================================================================

pub const COMMAND_CLEAR: &str = "clear";
pub const COMMAND_DEEP_SLEEP: &str = "deep_sleep";
pub const COMMAND_FACTORY_RESET: &str = "factory_reset";
pub const COMMAND_CHECK_UPGRADE: &str = "check_upgrade";
pub const COMMAND_GET_UPGRADE: &str = "get_upgrade";
pub const COMMAND_INTROSPECT: &str = "introspect";
pub const COMMAND_REBOOT: &str = "reboot";
pub const COMMAND_STATUS: &str = "status";
pub const COMMAND_SETUP: &str = "setup";
pub const COMMAND_UPGRADE: &str = "upgrade";
pub const COMMAND_SMART_LINKUP: &str = "smart_linkup";
pub const COMMAND_SEND_FILE: &str = "send_file";
pub const COMMAND_GET_TIME: &str = "get_time";

// ============================================================================
// Parameter Names
// ============================================================================

pub const SETUP_DEBUG_MODE: &str = "debug_mode";
pub const SETUP_ERROR_MODE: &str = "error_mode";
pub const SETUP_SSID_PREFIX: &str = "ssid_prefix";
pub const SETUP_VISIBILITY: &str = "visibility";
pub const SETUP_SSL_ENABLED: &str = "ssl_enabled";
pub const SETUP_NETWORK_SSID: &str = "network_ssid";
pub const SETUP_NETWORK_PWD: &str = "network_pwd";
pub const SETUP_SILENT_CONNECT: &str = "silent_connect";
pub const SETUP_TOKEN: &str = "token";
pub const SETUP_PRODUCT_KEY: &str = "product_key";
pub const SETUP_VERSION: &str = "version";

pub const OTA_MODULE: &str = "module";
pub const OTA_FILE_NO: &str = "file_no";
pub const OTA_DELAY: &str = "delay";
pub const OTA_PIN_TOGGLE: &str = "pin_toggle";
pub const OTA_PROTOCOL: &str = "protocol";

pub const SEND_FILE_LENGTH: &str = "length";
pub const SEND_FILE_NAME: &str = "file_name";

pub const PARAM_SECONDS: &str = "seconds";
pub const PARAM_TIMEOUT: &str = "timeout";

// ============================================================================
// Result Strings
// ============================================================================

pub const RESULT_OK: &str = "OK";
pub const RESULT_EMPTY: &str = "EMPTY";
pub const RESULT_SENT: &str = "SENT";
pub const RESULT_FILE_SENT: &str = "FILE_SENT";
pub const RESULT_FILE_CANCEL: &str = "FILE_TRANSFER_CANCELED";

// ============================================================================
// Enumerated Values
// ============================================================================

pub const MODE_OFF: &str = "off";
pub const MODE_ON: &str = "on";
pub const MODE_NONE: &str = "none";
pub const MODE_ALL: &str = "all";
pub const MODE_LOCAL: &str = "local";
pub const MODE_REMOTE: &str = "remote";

pub const OTA_MODULE_WRF01: &str = "WRF01";
pub const OTA_MODULE_CLIENT: &str = "CLIENT";

pub const OTA_PROTOCOL_RAW: &str = "RAW";
pub const OTA_PROTOCOL_ARDUINO: &str = "ARDUINO_ZERO";
pub const OTA_PROTOCOL_HANDSHAKE: &str = "HANDSHAKE";

pub const CONNECTION_IDLE: &str = "IDLE";
pub const CONNECTION_CONNECTING: &str = "CONNECTING";
pub const CONNECTION_GOT_IP: &str = "GOT_IP";
pub const CONNECTION_FAILED: &str = "CONNECTION_FAILED";
pub const CONNECTION_DNS_FAILED: &str = "DNS_FAILED";
pub const CONNECTION_NO_AP_FOUND: &str = "NO_AP_FOUND";
pub const CONNECTION_WRONG_PASSWORD: &str = "WRONG_PASSWORD";

/// Visibility value reported in a status object when the access point is up.
pub const VISIBILITY_ON: &str = "ON";

// ============================================================================
// Error Strings
// ============================================================================

pub const ERROR_NONE: &str = "NONE";
pub const ERROR_SYSTEM_BUSY: &str = "SYSTEM_BUSY";
pub const ERROR_SEND_REQUEST_FAILED: &str = "SEND_REQUEST_FAILED";
pub const ERROR_RECEIVE_REQUEST_FAILED: &str = "RECEIVE_REQUEST_FAILED";
pub const ERROR_MASTER_REQUEST_FAILED: &str = "MASTER_REQUEST_FAILED";
pub const ERROR_NOT_ONLINE: &str = "NOT_ONLINE";
pub const ERROR_REMOTE_ERROR: &str = "REMOTE_ERROR";
pub const ERROR_RX_OVERFLOW: &str = "RX_OVERFLOW";
pub const ERROR_SET_AP_MODE_FAILED: &str = "SET_AP_MODE_FAILED";
pub const ERROR_UPGRADE: &str = "UPGRADE_ERROR";
pub const ERROR_COMMAND_FAILED: &str = "COMMAND_FAILED";
pub const ERROR_SMART_LINKUP_FAILED: &str = "SMART_LINKUP_FAILED";
pub const ERROR_NO_TIME: &str = "NO_TIME";

pub const ERROR_UNDEFINED: &str = "UNDEFINED_ERROR";
pub const ERROR_INVALID_JSON: &str = "INVALID_JSON";
pub const ERROR_INVALID_INTROSPECT: &str = "INVALID_INTROSPECT";
pub const ERROR_INVALID_HEADER: &str = "INVALID_HEADER";
pub const ERROR_FORWARDING_ERROR: &str = "FORWARDING_ERROR";
pub const ERROR_MISSING_HEADER: &str = "MISSING_HEADER";
pub const ERROR_INVALID_TOKEN: &str = "INVALID_TOKEN";
pub const ERROR_INVALID_APP: &str = "INVALID_APP";

pub const LIB_ERROR_PARSE_STATUS: &str = "ERROR_PARSE_STATUS";
pub const LIB_ERROR_PARSE_UPGRADE: &str = "ERROR_PARSE_UPGRADE";
pub const LIB_ERROR_UNKNOWN_OBJECT: &str = "ERROR_UNKNOWN_OBJECT";
pub const LIB_ERROR_PARSE_TIME: &str = "ERROR_PARSE_TIME";
pub const LIB_ERROR_FRAME_TOO_LONG: &str = "ERROR_FRAME_TOO_LONG";
pub const LIB_ERROR_FILE_PRODUCER_EMPTY: &str = "ERROR_FILE_PRODUCER_EMPTY";

/// Message attached to anything the library could not classify.
pub const ERROR_UNKNOWN_MESSAGE: &str = "Wrf SDK does not recognize message";
