//! Responses from the WRF01 module.
//!
//! A response frame is a JSON object. Its first key decides who produced it:
//!
//! - `devicedrive`: the module itself (results, errors, status, upgrades,
//!   file transfer negotiation, time)
//! - `DeviceDrive`: the cloud, relayed by the module (error codes)
//! - `configuration`: connection report, with the signal strength in a
//!   sibling `device_state` object
//!
//! Anything else that parses as JSON is a message for the application.
//! Field positions matter: the module's JSON is read in document order.

use crate::constants::*;
use crate::error::*;
use crate::types::*;
use log::debug;
use serde_json::{Map, Value};

/// Responses received from the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command accepted.
    Ok,

    /// Message delivered to the cloud.
    Sent,

    /// Poll found nothing waiting.
    Empty,

    /// Module status.
    Status(Status),

    /// Connection report.
    Config(DeviceState),

    /// Modules with an upgrade waiting.
    UpgradePending(ModuleList),

    /// Upgrade image about to be streamed.
    UpgradePackage(UpgradePackage),

    /// Fault raised by the module or by this library.
    LocalError(WrfError),

    /// Fault relayed from the cloud.
    RemoteError(WrfError),

    /// Application message, passed through untouched.
    Message(String),

    /// Module is ready for a file upload.
    SendFile {
        /// Largest payload the module accepts per packet.
        max_packet_size: usize,
    },

    /// Upload stored by the cloud.
    FileSent,

    /// Upload cancelled by the module.
    FileCancel,

    /// Current time.
    Time(WrfTime),
}

impl Response {
    /// Decode the text of one frame (terminator already stripped).
    ///
    /// Never fails: text that is not JSON becomes
    /// `LocalError(UnknownObject)`, JSON without a known top-level key
    /// becomes `Message`.
    pub fn decode(text: &str) -> Response {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                debug!("frame is not JSON ({}): {:?}", e, text);
                return local_error(ErrorCode::UnknownObject);
            }
        };

        match Response::decode_value(&value) {
            Some(response) => response,
            None => Response::Message(text.to_string()),
        }
    }

    /// Classify an already parsed frame.
    ///
    /// Returns `None` when the top-level key is not one this library handles.
    pub fn decode_value(value: &Value) -> Option<Response> {
        let root = value.as_object()?;
        let (name, inner) = root.iter().next()?;

        match name.as_str() {
            LOCAL_RESPONSE_KEY => Some(decode_local(inner)),
            REMOTE_RESPONSE_KEY => Some(decode_remote(inner)),
            CONFIGURATION_KEY => Some(decode_configuration(inner, root)),
            _ => None,
        }
    }

    /// Error code carried by an error response.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Response::LocalError(e) | Response::RemoteError(e) => Some(e.code),
            _ => None,
        }
    }

    /// Whether this is a system-busy error from either side.
    pub fn is_busy(&self) -> bool {
        self.error_code().is_some_and(|code| code.is_busy())
    }
}

fn local_error(code: ErrorCode) -> Response {
    Response::LocalError(WrfError::new(code))
}

fn remote_error(code: ErrorCode) -> Response {
    Response::RemoteError(WrfError::new(code))
}

/// First field of an object, in document order.
fn first_field(value: &Value) -> Option<(&str, &Value)> {
    value
        .as_object()?
        .iter()
        .next()
        .map(|(name, value)| (name.as_str(), value))
}

/// Text of a scalar, whichever JSON type the module chose for it.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Leading integer of a string, 0 when there is none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Integer from a JSON number or a numeric string.
fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

// ============================================================================
// Local (module) responses
// ============================================================================

fn decode_local(value: &Value) -> Response {
    let Some((name, inner)) = first_field(value) else {
        return local_error(ErrorCode::UnknownObject);
    };

    match name {
        RESULT_KEY => decode_result(inner),
        ERROR_KEY => decode_local_error(inner),
        STATUS_KEY => decode_status(inner),
        UPGRADE_KEY => decode_upgrade(inner),
        MAX_PACKET_SIZE_KEY => decode_max_packet_size(inner),
        TIME_KEY => decode_time(inner),
        _ => {
            debug!("unknown devicedrive object '{}'", name);
            local_error(ErrorCode::UnknownObject)
        }
    }
}

fn decode_result(value: &Value) -> Response {
    match value.as_str() {
        Some(RESULT_OK) => Response::Ok,
        Some(RESULT_SENT) => Response::Sent,
        Some(RESULT_EMPTY) => Response::Empty,
        Some(RESULT_FILE_SENT) => Response::FileSent,
        Some(RESULT_FILE_CANCEL) => Response::FileCancel,
        _ => local_error(ErrorCode::ResultUnknown),
    }
}

fn decode_local_error(value: &Value) -> Response {
    let code = value
        .as_str()
        .map(ErrorCode::from_local_str)
        .unwrap_or(ErrorCode::ResultUnknown);
    local_error(code)
}

fn decode_status(value: &Value) -> Response {
    let fields: Vec<&Value> = match value.as_object() {
        Some(map) if map.len() == 6 => map.values().collect(),
        _ => return local_error(ErrorCode::ParseStatus),
    };

    let status = Status {
        connection_status: ConnectionStatus::from_wire(&text_of(fields[0])),
        ip_addr: text_of(fields[1]),
        visibility: text_of(fields[2]) == VISIBILITY_ON,
        last_error_code: ErrorCode::from_status_str(&text_of(fields[3])),
        last_error_msg: text_of(fields[4]),
        successful_transfer_count: leading_int(&text_of(fields[5])) as i32,
    };
    Response::Status(status)
}

fn decode_upgrade(value: &Value) -> Response {
    match value {
        Value::Array(items) => {
            let modules = items
                .iter()
                .map(|item| item.as_str().map_or(OtaModule::Unknown, OtaModule::from_wire))
                .collect();
            Response::UpgradePending(ModuleList { modules })
        }
        Value::Object(map) => {
            let mut fields = map.iter();
            match (fields.next(), fields.next()) {
                (Some((name, size)), Some((_, crc))) if name == UPGRADE_LENGTH_KEY => {
                    let Some(size) = int_of(size) else {
                        return local_error(ErrorCode::ParseUpgrade);
                    };
                    let crc = text_of(crc).chars().take(CRC_STRING_SIZE).collect();
                    Response::UpgradePackage(UpgradePackage { size, crc })
                }
                _ => local_error(ErrorCode::ParseUpgrade),
            }
        }
        _ => local_error(ErrorCode::ParseUpgrade),
    }
}

fn decode_max_packet_size(value: &Value) -> Response {
    match int_of(value) {
        Some(size) if size > 0 => Response::SendFile {
            max_packet_size: size as usize,
        },
        _ => local_error(ErrorCode::UnknownObject),
    }
}

fn decode_time(value: &Value) -> Response {
    let Some(map) = value.as_object() else {
        return local_error(ErrorCode::ParseTime);
    };
    match time_from_map(map) {
        Some(time) => Response::Time(time),
        None => local_error(ErrorCode::ParseTime),
    }
}

fn time_from_map(map: &Map<String, Value>) -> Option<WrfTime> {
    let field = |name: &str| map.get(name).and_then(int_of);
    Some(WrfTime {
        timestamp: u64::try_from(field("timestamp")?).ok()?,
        week_day: field("week_day")? as i32,
        day: field("day")? as i32,
        month: field("month")? as i32,
        year: field("year")? as i32,
        hour: field("hour")? as i32,
        minute: field("minute")? as i32,
        second: field("second")? as i32,
        timezone: field("timezone")? as i32,
        dst: field("dst")? != 0,
    })
}

// ============================================================================
// Remote (cloud) responses
// ============================================================================

fn decode_remote(value: &Value) -> Response {
    match first_field(value) {
        Some((REMOTE_ERROR_CODE_KEY, code)) => {
            let code = code
                .as_str()
                .map(ErrorCode::from_remote_str)
                .unwrap_or(ErrorCode::ResultUnknown);
            remote_error(code)
        }
        _ => remote_error(ErrorCode::ResultUnknown),
    }
}

// ============================================================================
// Connection report
// ============================================================================

/// `value` is the `configuration` object; the signal strength lives in the
/// `device_state` object next to it, so the enclosing `root` is needed too.
fn decode_configuration(value: &Value, root: &Map<String, Value>) -> Response {
    let Some((_, mac)) = first_field(value) else {
        return local_error(ErrorCode::UnknownObject);
    };

    let rssi = root
        .get(DEVICE_STATE_KEY)
        .and_then(first_field)
        .map(|(_, rssi)| leading_int(&text_of(rssi)) as i32)
        .unwrap_or_else(|| {
            debug!("configuration without device_state, rssi defaults to 0");
            0
        });

    Response::Config(DeviceState {
        mac: text_of(mac),
        rssi,
    })
}
