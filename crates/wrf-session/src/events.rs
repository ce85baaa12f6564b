//! Event surface and command surface of a session.
//!
//! The engine reports decoded traffic through [`SessionEvents`]. Every
//! handler receives an [`Outbox`], so it can queue follow-up requests (for
//! example sending the setup configuration from `on_power_up`) without
//! holding a reference to the engine.

use wrf_protocol::*;

use crate::error::{SessionError, SessionResult};
use crate::queue::MessageQueue;

/// Progress of a file upload, reported through
/// [`SessionEvents::on_send_file_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFileEvent {
    /// Module accepted the upload; packets are flowing.
    Started {
        /// Payload size the module negotiated.
        max_packet_size: usize,
    },
    /// Module reported the file stored (`FILE_SENT`).
    Sent,
    /// Module reported the upload cancelled (`FILE_TRANSFER_CANCELED`).
    Canceled,
}

/// Callbacks invoked by the engine. Every method defaults to doing nothing.
pub trait SessionEvents {
    /// Sees every decoded response first. Returning `true` marks it handled:
    /// no other callback runs and the send queue is left untouched.
    fn pre_handle(&mut self, _response: &Response, _out: &mut Outbox<'_>) -> bool {
        false
    }

    /// Module signalled power-up (STX ETX).
    fn on_power_up(&mut self, _out: &mut Outbox<'_>) {}

    /// Any local or remote error, including the ones raised by this library.
    fn on_error(&mut self, _error: &WrfError, _out: &mut Outbox<'_>) {}

    /// Module joined a network.
    fn on_connected(&mut self, _state: &DeviceState, _out: &mut Outbox<'_>) {}

    /// Module reported `NOT_ONLINE`. Runs before `on_error` for the same
    /// response.
    fn on_not_connected(&mut self, _out: &mut Outbox<'_>) {}

    /// A message reached the cloud.
    fn on_message_sent(&mut self, _out: &mut Outbox<'_>) {}

    /// Application payload, passed through untouched.
    fn on_message_received(&mut self, _text: &str, _out: &mut Outbox<'_>) {}

    fn on_status_received(&mut self, _status: &Status, _out: &mut Outbox<'_>) {}

    fn on_pending_upgrades(&mut self, _modules: &ModuleList, _out: &mut Outbox<'_>) {}

    fn on_time_received(&mut self, _time: &WrfTime, _out: &mut Outbox<'_>) {}

    fn on_send_file_event(&mut self, _event: &SendFileEvent, _out: &mut Outbox<'_>) {}
}

/// Ignores every event.
impl SessionEvents for () {}

// ============================================================================
// Command surface
// ============================================================================

/// Requests an application can queue.
///
/// Implementors only provide [`CommandSink::enqueue`]; every request is built
/// on top of it. Nothing is written until the engine services its queue.
pub trait CommandSink {
    /// Queue raw text. The EOT terminator is appended here.
    fn enqueue(&mut self, text: &str) -> SessionResult<()>;

    /// Queue raw application text.
    fn send(&mut self, text: &str) -> SessionResult<()> {
        self.enqueue(text)
    }

    fn send_command(&mut self, command: &Command) -> SessionResult<()> {
        let text = command.encode()?;
        self.enqueue(&text)
    }

    /// Queue a command built from a tag and an explicit parameter list.
    fn send_tagged(&mut self, tag: CommandTag, params: &[Param]) -> SessionResult<()> {
        let text = encode_command(tag, params)?;
        self.enqueue(&text)
    }

    fn send_config(&mut self, config: &WrfConfig) -> SessionResult<()> {
        self.send_command(&Command::Setup(config.clone()))
    }

    /// Queue the capability description. `descriptor` is a JSON fragment
    /// such as `"interfaces":[...]`.
    fn send_introspect(&mut self, descriptor: &str) -> SessionResult<()> {
        self.send_command(&Command::Introspect {
            descriptor: descriptor.to_string(),
        })
    }

    fn request_status(&mut self) -> SessionResult<()> {
        self.send_command(&Command::Status)
    }

    fn request_time(&mut self) -> SessionResult<()> {
        self.send_command(&Command::GetTime)
    }

    fn check_pending_upgrades(&mut self) -> SessionResult<()> {
        self.send_command(&Command::CheckUpgrade)
    }

    /// Upgrade the module itself with the stock parameters.
    fn start_wrf_upgrade(&mut self) -> SessionResult<()> {
        self.send_command(&Command::GetUpgrade(OtaParams::wrf01()))
    }

    fn start_client_upgrade(&mut self, params: &OtaParams) -> SessionResult<()> {
        self.send_command(&Command::GetUpgrade(params.clone()))
    }

    /// Show the access point for `seconds` (-1 forever, 0 hides it).
    fn set_visibility(&mut self, seconds: i32) -> SessionResult<()> {
        self.send_command(&Command::SetVisibility {
            seconds,
            trigger_connect_cb: None,
        })
    }

    fn set_visibility_with_connect(
        &mut self,
        seconds: i32,
        trigger_connect_cb: bool,
    ) -> SessionResult<()> {
        self.send_command(&Command::SetVisibility {
            seconds,
            trigger_connect_cb: Some(trigger_connect_cb),
        })
    }

    fn connect(&mut self, silent: bool) -> SessionResult<()> {
        self.send_command(&Command::Connect { silent })
    }

    fn smart_linkup(&mut self, seconds: i32) -> SessionResult<()> {
        self.send_command(&Command::SmartLinkup { seconds })
    }

    fn reboot(&mut self) -> SessionResult<()> {
        self.send_command(&Command::Reboot)
    }

    /// 0 sleeps until the wake pin is toggled.
    fn deep_sleep(&mut self, seconds: i32) -> SessionResult<()> {
        self.send_command(&Command::DeepSleep { seconds })
    }

    fn clear(&mut self) -> SessionResult<()> {
        self.send_command(&Command::Clear)
    }

    fn factory_reset(&mut self) -> SessionResult<()> {
        self.send_command(&Command::FactoryReset)
    }

    /// Queue an empty message. The module answers with a waiting cloud
    /// message or `EMPTY`.
    fn poll(&mut self) -> SessionResult<()> {
        self.enqueue("")
    }
}

/// Push a terminated message, mapping a full queue to an error.
pub(crate) fn push_message(queue: &mut MessageQueue, text: &str) -> SessionResult<()> {
    if queue.push(encode_message(text)) {
        Ok(())
    } else {
        Err(SessionError::QueueFull {
            capacity: queue.capacity(),
        })
    }
}

/// Handle to the engine's send queue, lent to event handlers.
pub struct Outbox<'a> {
    queue: &'a mut MessageQueue,
}

impl<'a> Outbox<'a> {
    pub(crate) fn new(queue: &'a mut MessageQueue) -> Self {
        Outbox { queue }
    }

    /// Requests waiting for transmission.
    pub fn queue_count(&self) -> usize {
        self.queue.count()
    }
}

impl CommandSink for Outbox<'_> {
    fn enqueue(&mut self, text: &str) -> SessionResult<()> {
        push_message(self.queue, text)
    }
}
