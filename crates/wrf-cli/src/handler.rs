//! Event handler that reports module traffic on the console.

use tracing::{debug, info, warn};
use wrf_protocol::*;
use wrf_session::{CommandSink, Outbox, PollScheduler, SendFileEvent, SessionEvents};

/// Where an upload started by this process stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Prints results to stdout and logs everything else.
#[derive(Debug)]
pub struct ConsoleHandler {
    /// Released when a poll is answered.
    pub poll: PollScheduler,
    /// Errors reported since start.
    pub errors: usize,
    pub upload: UploadState,
    /// Setup configuration to resend whenever the module powers up.
    pub setup_on_power_up: Option<WrfConfig>,
}

impl ConsoleHandler {
    pub fn new(poll: PollScheduler) -> Self {
        ConsoleHandler {
            poll,
            errors: 0,
            upload: UploadState::Idle,
            setup_on_power_up: None,
        }
    }
}

impl SessionEvents for ConsoleHandler {
    fn pre_handle(&mut self, response: &Response, _out: &mut Outbox<'_>) -> bool {
        self.poll.observe(response);
        false
    }

    fn on_power_up(&mut self, out: &mut Outbox<'_>) {
        info!("module powered up");
        if let Some(config) = &self.setup_on_power_up {
            if let Err(e) = out.send_config(config) {
                warn!("could not queue setup: {}", e);
            }
        }
    }

    fn on_error(&mut self, error: &WrfError, _out: &mut Outbox<'_>) {
        self.errors += 1;
        if error.code.is_busy() {
            debug!("module busy, waiting");
        } else {
            warn!("error {}: {}", error.code, error.message);
        }
    }

    fn on_connected(&mut self, state: &DeviceState, _out: &mut Outbox<'_>) {
        println!("connected: mac {} rssi {} dBm", state.mac, state.rssi);
    }

    fn on_not_connected(&mut self, _out: &mut Outbox<'_>) {
        println!("module is not online");
    }

    fn on_message_sent(&mut self, _out: &mut Outbox<'_>) {
        println!("message delivered");
    }

    fn on_message_received(&mut self, text: &str, _out: &mut Outbox<'_>) {
        println!("{}", text);
    }

    fn on_status_received(&mut self, status: &Status, _out: &mut Outbox<'_>) {
        println!("connection:  {:?}", status.connection_status);
        println!("ip address:  {}", status.ip_addr);
        println!("visible:     {}", status.visibility);
        println!("last error:  {} {}", status.last_error_code, status.last_error_msg);
        println!("transfers:   {}", status.successful_transfer_count);
    }

    fn on_pending_upgrades(&mut self, modules: &ModuleList, _out: &mut Outbox<'_>) {
        if modules.modules.is_empty() {
            println!("no upgrades pending");
        }
        for module in &modules.modules {
            println!("upgrade pending: {}", module.as_str().unwrap_or("unknown"));
        }
    }

    fn on_time_received(&mut self, time: &WrfTime, _out: &mut Outbox<'_>) {
        println!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} (GMT{:+}{}) unix {}",
            time.year,
            time.month,
            time.day,
            time.hour,
            time.minute,
            time.second,
            time.timezone,
            if time.dst { ", DST" } else { "" },
            time.timestamp
        );
    }

    fn on_send_file_event(&mut self, event: &SendFileEvent, _out: &mut Outbox<'_>) {
        match event {
            SendFileEvent::Started { max_packet_size } => {
                info!("upload started, {} byte packets", max_packet_size);
                self.upload = UploadState::Running;
            }
            SendFileEvent::Sent => {
                println!("file stored");
                self.upload = UploadState::Finished;
            }
            SendFileEvent::Canceled => {
                println!("upload cancelled by module");
                self.upload = UploadState::Finished;
            }
        }
    }
}
