//! Protocol error types.

use crate::constants::*;
use thiserror::Error;

/// Errors raised while building outgoing traffic.
///
/// Faults reported by the module are never returned as `Err`; they decode to
/// [`crate::Response::LocalError`] or [`crate::Response::RemoteError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A parameter name or value contains a quote that would break the envelope.
    #[error("parameter '{name}' contains an unescaped quote")]
    UnescapedQuote {
        /// Name of the offending parameter.
        name: String,
    },

    /// File packet payload does not fit in the 32-bit length field.
    #[error("packet too long: maximum {max} bytes, got {actual}")]
    PacketTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },
}

/// Every error code the module or this library can report.
///
/// The first group mirrors the module's own error strings, the second group
/// the cloud's, and the last group is produced locally when incoming traffic
/// cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    None,
    SystemBusy,
    SendRequestFailed,
    ReceiveRequestFailed,
    MasterRequestFailed,
    NotOnline,
    RemoteError,
    RxOverflow,
    SetApModeFailed,
    Upgrade,
    CommandFailed,
    SmartLinkupFailed,
    NoTime,

    UndefinedError,
    InvalidJson,
    InvalidIntrospect,
    InvalidHeader,
    ForwardingError,
    MissingHeader,
    InvalidToken,
    InvalidApp,

    /// String not found in the relevant table.
    ResultUnknown,
    /// Status object did not have exactly six fields.
    ParseStatus,
    /// Upgrade payload was neither a module list nor a package description.
    ParseUpgrade,
    /// Frame was not valid JSON or had an unrecognised shape.
    UnknownObject,
    /// Time object was missing fields.
    ParseTime,
    /// Incoming frame exceeded the receive buffer.
    FrameTooLong,
    /// File packet producer returned no data while bytes remained.
    FileProducerEmpty,
}

/// Errors the module reports for a local (module-side) failure.
const LOCAL_ERRORS: &[(&str, ErrorCode)] = &[
    (ERROR_SYSTEM_BUSY, ErrorCode::SystemBusy),
    (ERROR_SEND_REQUEST_FAILED, ErrorCode::SendRequestFailed),
    (ERROR_RECEIVE_REQUEST_FAILED, ErrorCode::ReceiveRequestFailed),
    (ERROR_MASTER_REQUEST_FAILED, ErrorCode::MasterRequestFailed),
    (ERROR_NOT_ONLINE, ErrorCode::NotOnline),
    (ERROR_REMOTE_ERROR, ErrorCode::RemoteError),
    (ERROR_RX_OVERFLOW, ErrorCode::RxOverflow),
    (ERROR_SET_AP_MODE_FAILED, ErrorCode::SetApModeFailed),
    (ERROR_UPGRADE, ErrorCode::Upgrade),
    (ERROR_COMMAND_FAILED, ErrorCode::CommandFailed),
    (ERROR_SMART_LINKUP_FAILED, ErrorCode::SmartLinkupFailed),
    (ERROR_NO_TIME, ErrorCode::NoTime),
];

/// Errors relayed from the cloud.
const REMOTE_ERRORS: &[(&str, ErrorCode)] = &[
    (ERROR_UNDEFINED, ErrorCode::UndefinedError),
    (ERROR_INVALID_JSON, ErrorCode::InvalidJson),
    (ERROR_INVALID_INTROSPECT, ErrorCode::InvalidIntrospect),
    (ERROR_INVALID_HEADER, ErrorCode::InvalidHeader),
    (ERROR_FORWARDING_ERROR, ErrorCode::ForwardingError),
    (ERROR_MISSING_HEADER, ErrorCode::MissingHeader),
    (ERROR_INVALID_TOKEN, ErrorCode::InvalidToken),
    (ERROR_INVALID_APP, ErrorCode::InvalidApp),
];

fn lookup(table: &[(&str, ErrorCode)], s: &str) -> Option<ErrorCode> {
    table
        .iter()
        .find(|(name, _)| *name == s)
        .map(|(_, code)| *code)
}

impl ErrorCode {
    /// Map a string from a `devicedrive.error` field.
    pub fn from_local_str(s: &str) -> ErrorCode {
        lookup(LOCAL_ERRORS, s).unwrap_or(ErrorCode::ResultUnknown)
    }

    /// Map a string from a `DeviceDrive.ErrorCode` field.
    pub fn from_remote_str(s: &str) -> ErrorCode {
        lookup(REMOTE_ERRORS, s).unwrap_or(ErrorCode::ResultUnknown)
    }

    /// Map the `last_error_code` field of a status object.
    ///
    /// A status may carry any code the module has seen, so this accepts
    /// `NONE` and both the local and the remote tables.
    pub fn from_status_str(s: &str) -> ErrorCode {
        if s == ERROR_NONE {
            return ErrorCode::None;
        }
        lookup(LOCAL_ERRORS, s)
            .or_else(|| lookup(REMOTE_ERRORS, s))
            .unwrap_or(ErrorCode::ResultUnknown)
    }

    /// Wire string for peer codes, library string for locally produced codes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::None => ERROR_NONE,
            ErrorCode::SystemBusy => ERROR_SYSTEM_BUSY,
            ErrorCode::SendRequestFailed => ERROR_SEND_REQUEST_FAILED,
            ErrorCode::ReceiveRequestFailed => ERROR_RECEIVE_REQUEST_FAILED,
            ErrorCode::MasterRequestFailed => ERROR_MASTER_REQUEST_FAILED,
            ErrorCode::NotOnline => ERROR_NOT_ONLINE,
            ErrorCode::RemoteError => ERROR_REMOTE_ERROR,
            ErrorCode::RxOverflow => ERROR_RX_OVERFLOW,
            ErrorCode::SetApModeFailed => ERROR_SET_AP_MODE_FAILED,
            ErrorCode::Upgrade => ERROR_UPGRADE,
            ErrorCode::CommandFailed => ERROR_COMMAND_FAILED,
            ErrorCode::SmartLinkupFailed => ERROR_SMART_LINKUP_FAILED,
            ErrorCode::NoTime => ERROR_NO_TIME,
            ErrorCode::UndefinedError => ERROR_UNDEFINED,
            ErrorCode::InvalidJson => ERROR_INVALID_JSON,
            ErrorCode::InvalidIntrospect => ERROR_INVALID_INTROSPECT,
            ErrorCode::InvalidHeader => ERROR_INVALID_HEADER,
            ErrorCode::ForwardingError => ERROR_FORWARDING_ERROR,
            ErrorCode::MissingHeader => ERROR_MISSING_HEADER,
            ErrorCode::InvalidToken => ERROR_INVALID_TOKEN,
            ErrorCode::InvalidApp => ERROR_INVALID_APP,
            ErrorCode::ResultUnknown => "ERROR_RESULT_UNKNOWN",
            ErrorCode::ParseStatus => LIB_ERROR_PARSE_STATUS,
            ErrorCode::ParseUpgrade => LIB_ERROR_PARSE_UPGRADE,
            ErrorCode::UnknownObject => LIB_ERROR_UNKNOWN_OBJECT,
            ErrorCode::ParseTime => LIB_ERROR_PARSE_TIME,
            ErrorCode::FrameTooLong => LIB_ERROR_FRAME_TOO_LONG,
            ErrorCode::FileProducerEmpty => LIB_ERROR_FILE_PRODUCER_EMPTY,
        }
    }

    /// Whether the peer is asking the host to retry the same request later.
    pub fn is_busy(&self) -> bool {
        matches!(self, ErrorCode::SystemBusy)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error code together with its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrfError {
    /// Classified error code.
    pub code: ErrorCode,
    /// Fixed message for the code.
    pub message: String,
}

impl WrfError {
    /// Build an error carrying the standard message for `code`.
    pub fn new(code: ErrorCode) -> Self {
        let message = match code {
            ErrorCode::ResultUnknown => ERROR_UNKNOWN_MESSAGE,
            other => other.as_str(),
        };
        WrfError {
            code,
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for WrfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}
