//! Commands that can be sent to the WRF01 module.
//!
//! Every command is a JSON object wrapped in the local envelope:
//!
//! ```text
//! {"devicedrive":{"command":"<tag>","<name>":"<string>","<name>":<int>}}
//! ```
//!
//! Parameters keep their order. String values are quoted verbatim: they are
//! checked for raw quotes but never escaped, so callers must pass text that
//! is already valid inside a JSON string.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// Command tags understood by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    Clear,
    DeepSleep,
    FactoryReset,
    CheckUpgrade,
    GetUpgrade,
    Introspect,
    Reboot,
    Status,
    Setup,
    Upgrade,
    SmartLinkup,
    SendFile,
    GetTime,
}

impl CommandTag {
    /// All tags, in declaration order.
    pub const ALL: [CommandTag; 13] = [
        CommandTag::Clear,
        CommandTag::DeepSleep,
        CommandTag::FactoryReset,
        CommandTag::CheckUpgrade,
        CommandTag::GetUpgrade,
        CommandTag::Introspect,
        CommandTag::Reboot,
        CommandTag::Status,
        CommandTag::Setup,
        CommandTag::Upgrade,
        CommandTag::SmartLinkup,
        CommandTag::SendFile,
        CommandTag::GetTime,
    ];

    /// Get the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandTag::Clear => COMMAND_CLEAR,
            CommandTag::DeepSleep => COMMAND_DEEP_SLEEP,
            CommandTag::FactoryReset => COMMAND_FACTORY_RESET,
            CommandTag::CheckUpgrade => COMMAND_CHECK_UPGRADE,
            CommandTag::GetUpgrade => COMMAND_GET_UPGRADE,
            CommandTag::Introspect => COMMAND_INTROSPECT,
            CommandTag::Reboot => COMMAND_REBOOT,
            CommandTag::Status => COMMAND_STATUS,
            CommandTag::Setup => COMMAND_SETUP,
            CommandTag::Upgrade => COMMAND_UPGRADE,
            CommandTag::SmartLinkup => COMMAND_SMART_LINKUP,
            CommandTag::SendFile => COMMAND_SEND_FILE,
            CommandTag::GetTime => COMMAND_GET_TIME,
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Value of a command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Rendered quoted.
    Str(String),
    /// Rendered bare.
    Int(i64),
}

/// A named command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub value: ParamValue,
}

impl Param {
    /// A quoted string parameter.
    pub fn string(name: &'static str, value: impl Into<String>) -> Self {
        Param {
            name,
            value: ParamValue::Str(value.into()),
        }
    }

    /// A bare integer parameter.
    pub fn int(name: &'static str, value: i64) -> Self {
        Param {
            name,
            value: ParamValue::Int(value),
        }
    }

    /// A numeric boolean rendered as the string "0" or "1".
    pub fn flag(name: &'static str, value: bool) -> Self {
        Param::string(name, if value { "1" } else { "0" })
    }

    fn write_to(&self, out: &mut String) -> Result<(), ProtocolError> {
        reject_raw_quote(self.name, self.name)?;
        out.push_str(",\"");
        out.push_str(self.name);
        out.push_str("\":");
        match &self.value {
            ParamValue::Str(s) => {
                reject_raw_quote(self.name, s)?;
                out.push('"');
                out.push_str(s);
                out.push('"');
            }
            ParamValue::Int(i) => out.push_str(&i.to_string()),
        }
        Ok(())
    }
}

/// A `"` not preceded by a backslash would close the string early.
fn reject_raw_quote(name: &str, text: &str) -> Result<(), ProtocolError> {
    let mut escaped = false;
    for c in text.chars() {
        match c {
            '\\' => escaped = !escaped,
            '"' if !escaped => {
                return Err(ProtocolError::UnescapedQuote {
                    name: name.to_string(),
                })
            }
            _ => escaped = false,
        }
    }
    Ok(())
}

/// Encode a command tag and its parameters into the request envelope.
pub fn encode_command(tag: CommandTag, params: &[Param]) -> Result<String, ProtocolError> {
    let mut out = String::with_capacity(64);
    out.push_str("{\"");
    out.push_str(LOCAL_RESPONSE_KEY);
    out.push_str("\":{\"");
    out.push_str(COMMAND_KEY);
    out.push_str("\":\"");
    out.push_str(tag.as_str());
    out.push('"');
    for param in params {
        param.write_to(&mut out)?;
    }
    out.push_str("}}");
    Ok(out)
}

/// Expand a setup configuration into its parameter list.
///
/// The first six parameters are always present; the optional strings follow
/// in a fixed order and are skipped when absent or empty.
pub fn config_params(config: &WrfConfig) -> Vec<Param> {
    let mut params = vec![
        Param::string(SETUP_DEBUG_MODE, config.debug_mode.as_str()),
        Param::string(SETUP_ERROR_MODE, config.error_mode.as_str()),
        Param::string(SETUP_SSID_PREFIX, config.ssid_prefix.as_str()),
        Param::flag(SETUP_SILENT_CONNECT, config.silent_connect),
        Param::string(SETUP_VISIBILITY, config.visibility.to_string()),
        Param::flag(SETUP_SSL_ENABLED, config.ssl_enabled),
    ];

    let optional = [
        (SETUP_NETWORK_SSID, &config.network_ssid),
        (SETUP_NETWORK_PWD, &config.network_pwd),
        (SETUP_TOKEN, &config.token),
        (SETUP_PRODUCT_KEY, &config.product_key),
        (SETUP_VERSION, &config.version),
    ];
    for (name, value) in optional {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            params.push(Param::string(name, v));
        }
    }

    params
}

fn ota_params(params: &OtaParams) -> Vec<Param> {
    let mut out = Vec::with_capacity(5);
    if let Some(module) = params.module.and_then(|m| m.as_str()) {
        out.push(Param::string(OTA_MODULE, module));
    }
    if let Some(file_no) = params.file_no {
        out.push(Param::int(OTA_FILE_NO, file_no as i64));
    }
    if let Some(delay) = params.delay {
        out.push(Param::int(OTA_DELAY, delay as i64));
    }
    if let Some(pin_toggle) = &params.pin_toggle {
        out.push(Param::string(OTA_PIN_TOGGLE, pin_toggle.as_str()));
    }
    if let Some(protocol) = params.protocol {
        out.push(Param::string(OTA_PROTOCOL, protocol.as_str()));
    }
    out
}

// ============================================================================
// Commands
// ============================================================================

/// Commands that can be sent to the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Full setup configuration.
    Setup(WrfConfig),

    /// Show the access point for a number of seconds (-1 forever).
    SetVisibility {
        seconds: i32,
        /// When set, also tells the module whether to report the connection
        /// once a network is joined.
        trigger_connect_cb: Option<bool>,
    },

    /// Ask the module to connect.
    Connect {
        /// Suppress the connection report.
        silent: bool,
    },

    /// Enable SmartLinkup for a number of seconds.
    SmartLinkup { seconds: i32 },

    /// Reboot the module.
    Reboot,

    /// Deep sleep; 0 sleeps until woken by the external pin.
    DeepSleep { seconds: i32 },

    /// Ask for pending upgrades.
    CheckUpgrade,

    /// Start an upgrade.
    GetUpgrade(OtaParams),

    /// Announce a file upload. The module answers with its packet size.
    InitSendFile { file_name: String, length: usize },

    /// Forget stored network credentials.
    Clear,

    /// Restore factory settings.
    FactoryReset,

    /// Ask for module status.
    Status,

    /// Ask for the current time.
    GetTime,

    /// Send the device capability description.
    ///
    /// `descriptor` is a JSON fragment (for example `"interfaces":[...]`)
    /// inserted verbatim after the command tag.
    Introspect { descriptor: String },

    /// Any tag with an explicit parameter list.
    Custom { tag: CommandTag, params: Vec<Param> },
}

impl Command {
    /// Tag this command is sent under.
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Setup(_)
            | Command::SetVisibility { .. }
            | Command::Connect { .. } => CommandTag::Setup,
            Command::SmartLinkup { .. } => CommandTag::SmartLinkup,
            Command::Reboot => CommandTag::Reboot,
            Command::DeepSleep { .. } => CommandTag::DeepSleep,
            Command::CheckUpgrade => CommandTag::CheckUpgrade,
            Command::GetUpgrade(_) => CommandTag::GetUpgrade,
            Command::InitSendFile { .. } => CommandTag::SendFile,
            Command::Clear => CommandTag::Clear,
            Command::FactoryReset => CommandTag::FactoryReset,
            Command::Status => CommandTag::Status,
            Command::GetTime => CommandTag::GetTime,
            Command::Introspect { .. } => CommandTag::Introspect,
            Command::Custom { tag, .. } => *tag,
        }
    }

    /// Parameters in wire order.
    pub fn params(&self) -> Vec<Param> {
        match self {
            Command::Setup(config) => config_params(config),
            Command::SetVisibility {
                seconds,
                trigger_connect_cb: None,
            } => vec![Param::string(SETUP_VISIBILITY, seconds.to_string())],
            Command::SetVisibility {
                seconds,
                trigger_connect_cb: Some(trigger),
            } => vec![
                Param::flag(SETUP_SILENT_CONNECT, !trigger),
                Param::string(SETUP_VISIBILITY, seconds.to_string()),
            ],
            Command::Connect { silent } => vec![Param::flag(SETUP_SILENT_CONNECT, *silent)],
            Command::SmartLinkup { seconds } => {
                vec![Param::string(PARAM_TIMEOUT, seconds.to_string())]
            }
            Command::DeepSleep { seconds } => {
                vec![Param::string(PARAM_SECONDS, seconds.to_string())]
            }
            Command::GetUpgrade(params) => ota_params(params),
            Command::InitSendFile { file_name, length } => vec![
                Param::string(SEND_FILE_LENGTH, length.to_string()),
                Param::string(SEND_FILE_NAME, file_name.as_str()),
            ],
            Command::Custom { params, .. } => params.clone(),
            Command::Reboot
            | Command::CheckUpgrade
            | Command::Clear
            | Command::FactoryReset
            | Command::Status
            | Command::GetTime
            | Command::Introspect { .. } => Vec::new(),
        }
    }

    /// Encode into the text payload (without terminator).
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Command::Introspect { descriptor } => {
                let mut out = encode_command(CommandTag::Introspect, &[])?;
                // Re-open the inner object to splice the descriptor in.
                out.truncate(out.len() - 2);
                out.push_str(", ");
                out.push_str(descriptor);
                out.push_str("}}");
                Ok(out)
            }
            other => encode_command(other.tag(), &other.params()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_without_params() {
        assert_eq!(
            Command::Reboot.encode().unwrap(),
            r#"{"devicedrive":{"command":"reboot"}}"#
        );
        assert_eq!(
            Command::Status.encode().unwrap(),
            r#"{"devicedrive":{"command":"status"}}"#
        );
    }

    #[test]
    fn test_encode_quotes_strings_not_ints() {
        let params = [Param::string("name", "abc"), Param::int("count", -3)];
        let encoded = encode_command(CommandTag::Upgrade, &params).unwrap();
        assert_eq!(
            encoded,
            r#"{"devicedrive":{"command":"upgrade","name":"abc","count":-3}}"#
        );
    }

    #[test]
    fn test_encode_rejects_raw_quote() {
        let params = [Param::string("name", "a\"b")];
        let err = encode_command(CommandTag::Setup, &params).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnescapedQuote {
                name: "name".to_string()
            }
        );

        // Already escaped quotes pass through untouched.
        let params = [Param::string("name", "a\\\"b")];
        let encoded = encode_command(CommandTag::Setup, &params).unwrap();
        assert!(encoded.contains(r#""name":"a\"b""#));
    }

    #[test]
    fn test_default_config_params_order() {
        let encoded = Command::Setup(WrfConfig::default()).encode().unwrap();
        assert_eq!(
            encoded,
            concat!(
                r#"{"devicedrive":{"command":"setup","debug_mode":"none","error_mode":"all","#,
                r#""ssid_prefix":"DeviceDrive","silent_connect":"1","visibility":"0","ssl_enabled":"1"}}"#
            )
        );
    }

    #[test]
    fn test_config_optional_fields() {
        let config = WrfConfig {
            network_ssid: Some("home".to_string()),
            network_pwd: Some(String::new()),
            token: None,
            product_key: Some("pk".to_string()),
            version: Some("1.0".to_string()),
            ..WrfConfig::default()
        };
        let names: Vec<&str> = config_params(&config).iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "debug_mode",
                "error_mode",
                "ssid_prefix",
                "silent_connect",
                "visibility",
                "ssl_enabled",
                "network_ssid",
                "product_key",
                "version",
            ]
        );
    }

    #[test]
    fn test_set_visibility_variants() {
        let plain = Command::SetVisibility {
            seconds: 30,
            trigger_connect_cb: None,
        };
        assert_eq!(
            plain.encode().unwrap(),
            r#"{"devicedrive":{"command":"setup","visibility":"30"}}"#
        );

        let with_cb = Command::SetVisibility {
            seconds: -1,
            trigger_connect_cb: Some(true),
        };
        assert_eq!(
            with_cb.encode().unwrap(),
            r#"{"devicedrive":{"command":"setup","silent_connect":"0","visibility":"-1"}}"#
        );
    }

    #[test]
    fn test_get_upgrade_params() {
        let encoded = Command::GetUpgrade(OtaParams::wrf01()).encode().unwrap();
        assert_eq!(
            encoded,
            concat!(
                r#"{"devicedrive":{"command":"get_upgrade","module":"WRF01","file_no":0,"#,
                r#""delay":0,"pin_toggle":"","protocol":"RAW"}}"#
            )
        );

        let client = OtaParams {
            module: Some(OtaModule::Client),
            file_no: None,
            delay: Some(5),
            pin_toggle: Some("010".to_string()),
            protocol: Some(OtaProtocol::ArduinoZero),
        };
        assert_eq!(
            Command::GetUpgrade(client).encode().unwrap(),
            concat!(
                r#"{"devicedrive":{"command":"get_upgrade","module":"CLIENT","delay":5,"#,
                r#""pin_toggle":"010","protocol":"ARDUINO_ZERO"}}"#
            )
        );
    }

    #[test]
    fn test_init_send_file() {
        let cmd = Command::InitSendFile {
            file_name: "log.txt".to_string(),
            length: 20,
        };
        assert_eq!(
            cmd.encode().unwrap(),
            r#"{"devicedrive":{"command":"send_file","length":"20","file_name":"log.txt"}}"#
        );
    }

    #[test]
    fn test_introspect_splices_descriptor() {
        let cmd = Command::Introspect {
            descriptor: r#""interfaces":[["com.example.light","@power=b"]]"#.to_string(),
        };
        assert_eq!(
            cmd.encode().unwrap(),
            r#"{"devicedrive":{"command":"introspect", "interfaces":[["com.example.light","@power=b"]]}}"#
        );
    }

    #[test]
    fn test_deep_sleep_and_connect() {
        assert_eq!(
            Command::DeepSleep { seconds: 60 }.encode().unwrap(),
            r#"{"devicedrive":{"command":"deep_sleep","seconds":"60"}}"#
        );
        assert_eq!(
            Command::Connect { silent: false }.encode().unwrap(),
            r#"{"devicedrive":{"command":"setup","silent_connect":"0"}}"#
        );
    }
}
