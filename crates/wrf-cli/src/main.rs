//! `wrf`: talk to a WRF01 module through a TCP bridge to its UART.
//!
//! ```text
//! wrf --address 127.0.0.1:9100 status
//! wrf -c wrf.yaml setup
//! wrf send-file ./log.txt
//! wrf -v monitor
//! ```

mod config;
mod handler;
mod link;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wrf_protocol::{OtaModule, OtaParams, OtaProtocol};
use wrf_session::{CommandSink, PollScheduler, SliceProducer};

use crate::config::CliConfig;
use crate::handler::{ConsoleHandler, UploadState};
use crate::link::{is_idle, Link};

#[derive(Debug, Parser)]
#[command(name = "wrf")]
#[command(author, version, about = "Drive a WRF01 Wi-Fi module over its serial protocol", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, short, env = "WRF_CONFIG")]
    config: Option<PathBuf>,

    /// Address of the UART bridge (host:port); overrides the config file
    #[arg(long, short)]
    address: Option<String>,

    /// Seconds to wait for a reply; overrides the config file
    #[arg(long, short)]
    timeout: Option<u64>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the module status
    Status,
    /// Print the module's clock
    Time,
    /// Send the `setup` section of the config file
    Setup,
    /// List modules with a pending upgrade
    CheckUpgrade,
    /// Upgrade the module firmware
    Upgrade,
    /// Upgrade the host firmware through the module
    ClientUpgrade {
        #[arg(long)]
        file_no: Option<u32>,
        /// Seconds before the module starts streaming
        #[arg(long)]
        delay: Option<u32>,
        /// Pin toggle sequence that enters the bootloader
        #[arg(long)]
        pin_toggle: Option<String>,
        #[arg(long, value_enum, default_value_t = ProtocolArg::Raw)]
        protocol: ProtocolArg,
    },
    /// Show the access point
    Visibility {
        /// Seconds visible, -1 forever, 0 hidden
        seconds: i32,
        /// Also ask for a connection report once joined
        #[arg(long)]
        report_connect: Option<bool>,
    },
    /// Ask the module to connect
    Connect {
        #[arg(long)]
        silent: bool,
    },
    /// Enable SmartLinkup provisioning
    SmartLinkup { seconds: i32 },
    Reboot,
    /// Deep sleep; 0 sleeps until the wake pin
    DeepSleep { seconds: i32 },
    /// Forget network credentials
    Clear,
    FactoryReset,
    /// Send raw application text
    Send {
        text: String,
        /// Terminate with ETX; the module sends no reply
        #[arg(long)]
        no_reply: bool,
    },
    /// Send the capability description, a JSON fragment such as `"interfaces":[...]`
    Introspect { descriptor: String },
    /// Upload a file
    SendFile {
        path: PathBuf,
        /// Name announced to the module; defaults to the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Stay connected, poll for cloud messages and print all traffic
    Monitor {
        /// Resend the setup configuration whenever the module powers up
        #[arg(long)]
        setup: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProtocolArg {
    Raw,
    ArduinoZero,
    Handshake,
}

impl From<ProtocolArg> for OtaProtocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Raw => OtaProtocol::Raw,
            ProtocolArg::ArduinoZero => OtaProtocol::ArduinoZero,
            ProtocolArg::Handshake => OtaProtocol::Handshake,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(address) = cli.address {
        config.address = address;
    }
    if let Some(seconds) = cli.timeout {
        config.timeout_ms = seconds * 1000;
    }
    let timeout = Some(Duration::from_millis(config.timeout_ms));

    let handler = ConsoleHandler::new(PollScheduler::new(&config.poll));
    let mut link = Link::connect(&config.address, handler, config.engine.clone()).await?;
    let engine = link.engine_mut();

    match cli.command {
        Command::Status => engine.request_status()?,
        Command::Time => engine.request_time()?,
        Command::Setup => engine.send_config(&config.setup)?,
        Command::CheckUpgrade => engine.check_pending_upgrades()?,
        Command::Upgrade => engine.start_wrf_upgrade()?,
        Command::ClientUpgrade {
            file_no,
            delay,
            pin_toggle,
            protocol,
        } => engine.start_client_upgrade(&OtaParams {
            module: Some(OtaModule::Client),
            file_no,
            delay,
            pin_toggle,
            protocol: Some(protocol.into()),
        })?,
        Command::Visibility {
            seconds,
            report_connect: None,
        } => engine.set_visibility(seconds)?,
        Command::Visibility {
            seconds,
            report_connect: Some(report),
        } => engine.set_visibility_with_connect(seconds, report)?,
        Command::Connect { silent } => engine.connect(silent)?,
        Command::SmartLinkup { seconds } => engine.smart_linkup(seconds)?,
        Command::Reboot => engine.reboot()?,
        Command::DeepSleep { seconds } => engine.deep_sleep(seconds)?,
        Command::Clear => engine.clear()?,
        Command::FactoryReset => engine.factory_reset()?,
        Command::Send { text, no_reply: true } => {
            engine.send_without_reply(&text)?;
            // Nothing to wait for beyond the write itself.
            link.run_until(timeout, |_| true).await?;
            return Ok(());
        }
        Command::Send { text, no_reply: false } => engine.send(&text)?,
        Command::Introspect { descriptor } => engine.send_introspect(&descriptor)?,
        Command::SendFile { path, name } => {
            let data = tokio::fs::read(&path).await?;
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or("path has no file name")?,
            };
            info!("uploading {} ({} bytes)", name, data.len());
            engine.send_file(&name, data.len(), SliceProducer::new(data))?;
            link.run_until(timeout, |engine| {
                let handler = engine.handler();
                // Refused or aborted uploads leave an error behind.
                handler.upload == UploadState::Finished || (is_idle(engine) && handler.errors > 0)
            })
            .await?;
            return Ok(());
        }
        Command::Monitor { setup } => {
            if setup {
                engine.handler_mut().setup_on_power_up = Some(config.setup.clone());
            }
            let now = link.now();
            link.engine_mut().handler_mut().poll.start(now);
            info!("monitoring, polling every {} ms", config.poll.interval_ms);
            link.run_until(None, |_| false).await?;
            return Ok(());
        }
    }

    link.run_until(timeout, is_idle).await?;
    Ok(())
}
