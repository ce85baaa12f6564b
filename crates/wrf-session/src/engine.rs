//! Session engine.
//!
//! Owns the receive buffer, the send queue and the upload state, and turns
//! the byte stream from the module into events. The host drives it from a
//! single loop:
//!
//! - every received byte goes to [`Engine::register_byte`]
//! - [`Engine::handle_send_queue`] is called periodically to transmit the
//!   next request once the previous one has been answered
//!
//! Nothing blocks. Waiting for a reply is the `awaiting_response` flag and
//! nothing else; timeouts belong to the caller (see [`crate::PollScheduler`]).

use std::io::Write;

use bytes::BytesMut;
use tracing::{debug, trace, warn};
use wrf_protocol::*;

use crate::config::EngineConfig;
use crate::error::{SessionError, SessionResult};
use crate::events::{push_message, CommandSink, Outbox, SendFileEvent, SessionEvents};
use crate::queue::MessageQueue;
use crate::transfer::{FileTransfer, NextPacket, PacketProducer};

/// How incoming bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Bytes accumulate into EOT-terminated text frames.
    Normal,
    /// Bytes are upload control codes (ACK, NAK, CAN).
    FileTransfer,
}

/// Upload announced to the module but not yet accepted.
struct PendingFile {
    /// Queued `send_file` request, terminator included.
    request: String,
    size: usize,
    producer: Box<dyn PacketProducer>,
}

/// One session with one module.
pub struct Engine<W, H> {
    writer: W,
    handler: H,
    receive_buffer: BytesMut,
    receive_capacity: usize,
    /// Dropping the rest of an oversized frame up to its EOT.
    discarding: bool,
    queue: MessageQueue,
    awaiting_response: bool,
    pending_file: Option<PendingFile>,
    transfer: Option<FileTransfer>,
}

impl<W: Write, H: SessionEvents> Engine<W, H> {
    /// Create an engine writing to `writer` and reporting to `handler`.
    pub fn new(writer: W, handler: H, config: EngineConfig) -> Self {
        Engine {
            writer,
            handler,
            receive_buffer: BytesMut::with_capacity(config.receive_buffer_size),
            receive_capacity: config.receive_buffer_size,
            discarding: false,
            queue: MessageQueue::new(config.queue_size),
            awaiting_response: false,
            pending_file: None,
            transfer: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn mode(&self) -> OperatingMode {
        if self.transfer.is_some() {
            OperatingMode::FileTransfer
        } else {
            OperatingMode::Normal
        }
    }

    /// Whether a request has been written and its reply has not arrived.
    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn is_file_transfer_active(&self) -> bool {
        self.transfer.is_some()
    }

    /// Whether an upload has been announced and the module has not yet
    /// answered with its packet size.
    pub fn is_file_transfer_pending(&self) -> bool {
        self.pending_file.is_some()
    }

    /// Bytes of the running upload the module has acknowledged.
    pub fn file_transfer_progress(&self) -> Option<(usize, usize)> {
        self.transfer
            .as_ref()
            .map(|t| (t.bytes_acknowledged(), t.file_size()))
    }

    pub fn queue_count(&self) -> usize {
        self.queue.count()
    }

    /// Drop every queued request and stop waiting for the one in flight.
    ///
    /// An announced upload goes with its request. A running upload is kept.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.awaiting_response = false;
        if self.pending_file.take().is_some() {
            debug!("Engine: announced upload dropped with the queue");
        }
    }

    /// Bytes of the frame being accumulated.
    pub fn receive_buffer_len(&self) -> usize {
        self.receive_buffer.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_parts(self) -> (W, H) {
        (self.writer, self.handler)
    }

    // ========================================================================
    // Outgoing
    // ========================================================================

    /// Write the head of the queue if nothing is outstanding.
    ///
    /// The head stays queued until its reply arrives. Does nothing while an
    /// upload is running.
    pub fn handle_send_queue(&mut self) -> SessionResult<()> {
        if self.awaiting_response || self.transfer.is_some() {
            return Ok(());
        }
        let Some(head) = self.queue.peek() else {
            return Ok(());
        };

        trace!("Engine: sending {:?}", head);
        self.writer.write_all(head.as_bytes())?;
        self.writer.flush()?;
        self.awaiting_response = true;
        Ok(())
    }

    /// Write ETX-terminated text straight to the module. Not queued and no
    /// reply is expected.
    pub fn send_without_reply(&mut self, text: &str) -> SessionResult<()> {
        if self.transfer.is_some() {
            return Err(SessionError::TransferInProgress);
        }
        trace!("Engine: sending without reply {:?}", text);
        self.writer.write_all(encode_send_only(text).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Announce an upload of `size` bytes named `name`.
    ///
    /// Packets are pulled from `producer` once the module answers with its
    /// packet size. Only one upload can be announced or running at a time.
    pub fn send_file(
        &mut self,
        name: &str,
        size: usize,
        producer: impl PacketProducer + 'static,
    ) -> SessionResult<()> {
        if self.transfer.is_some() || self.pending_file.is_some() {
            return Err(SessionError::TransferInProgress);
        }

        let command = Command::InitSendFile {
            file_name: name.to_string(),
            length: size,
        };
        let request = encode_message(&command.encode()?);
        if !self.queue.push(request.clone()) {
            return Err(SessionError::QueueFull {
                capacity: self.queue.capacity(),
            });
        }

        debug!("Engine: announced upload '{}' ({} bytes)", name, size);
        self.pending_file = Some(PendingFile {
            request,
            size,
            producer: Box::new(producer),
        });
        Ok(())
    }

    /// Forget the announced or running upload without telling the module.
    pub fn abandon_file_transfer(&mut self) {
        let pending = self.pending_file.take().is_some();
        let active = self.transfer.take().is_some();
        if pending || active {
            debug!("Engine: upload abandoned locally");
        }
    }

    // ========================================================================
    // Incoming
    // ========================================================================

    /// Feed a chunk of received bytes.
    pub fn register_bytes(&mut self, bytes: &[u8]) -> SessionResult<()> {
        for &byte in bytes {
            self.register_byte(byte)?;
        }
        Ok(())
    }

    /// Feed one received byte.
    ///
    /// Errors only come from writes the byte triggered (upload packets).
    pub fn register_byte(&mut self, byte: u8) -> SessionResult<()> {
        match self.mode() {
            OperatingMode::Normal => self.register_text_byte(byte),
            OperatingMode::FileTransfer => self.register_control_byte(byte),
        }
    }

    fn register_text_byte(&mut self, byte: u8) -> SessionResult<()> {
        if self.discarding {
            if byte == EOT {
                self.discarding = false;
            }
            return Ok(());
        }

        if self.receive_buffer.len() >= self.receive_capacity {
            warn!(
                "Engine: frame exceeds {} bytes, discarding",
                self.receive_capacity
            );
            self.receive_buffer.clear();
            self.discarding = byte != EOT;
            self.report_error(ErrorCode::FrameTooLong);
            return Ok(());
        }

        self.receive_buffer.extend_from_slice(&[byte]);
        let len = self.receive_buffer.len();

        if byte == ETX && len >= 2 && self.receive_buffer[len - 2] == STX {
            // The buffer is kept; only EOT resets it.
            debug!("Engine: power-up");
            let mut out = Outbox::new(&mut self.queue);
            self.handler.on_power_up(&mut out);
        } else if byte == EOT {
            let text = String::from_utf8_lossy(&self.receive_buffer[..len - 1]).into_owned();
            self.receive_buffer.clear();
            trace!("Engine: frame {:?}", text);
            self.dispatch(Response::decode(&text))?;
        }
        Ok(())
    }

    fn register_control_byte(&mut self, byte: u8) -> SessionResult<()> {
        match byte {
            ACK => {
                if let Some(transfer) = self.transfer.as_mut() {
                    transfer.acknowledge();
                    trace!(
                        "Engine: ACK, {}/{} bytes",
                        transfer.bytes_acknowledged(),
                        transfer.file_size()
                    );
                }
                self.send_next_packet()
            }
            NAK => {
                if let Some(transfer) = self.transfer.as_ref() {
                    debug!("Engine: NAK, resending {} bytes", transfer.current_packet().len());
                    self.writer.write_all(transfer.current_packet())?;
                    self.writer.flush()?;
                }
                Ok(())
            }
            CAN => {
                warn!("Engine: upload cancelled by module");
                self.transfer = None;
                Ok(())
            }
            other => {
                trace!("Engine: ignoring byte {:#04x} during upload", other);
                Ok(())
            }
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Run the handler for a decoded response and advance the queue.
    fn dispatch(&mut self, response: Response) -> SessionResult<()> {
        debug!("Engine: received {:?}", response);

        let mut out = Outbox::new(&mut self.queue);
        if self.handler.pre_handle(&response, &mut out) {
            return Ok(());
        }

        match &response {
            Response::Message(text) => self.handler.on_message_received(text, &mut out),
            Response::LocalError(error) | Response::RemoteError(error) => {
                if error.code == ErrorCode::NotOnline {
                    self.handler.on_not_connected(&mut out);
                }
                self.handler.on_error(error, &mut out);
            }
            Response::Config(state) => self.handler.on_connected(state, &mut out),
            Response::Status(status) => self.handler.on_status_received(status, &mut out),
            Response::Sent => self.handler.on_message_sent(&mut out),
            Response::UpgradePending(modules) => {
                self.handler.on_pending_upgrades(modules, &mut out)
            }
            Response::Time(time) => self.handler.on_time_received(time, &mut out),
            Response::FileSent => {
                self.handler.on_send_file_event(&SendFileEvent::Sent, &mut out);
                return Ok(());
            }
            Response::FileCancel => {
                self.handler.on_send_file_event(&SendFileEvent::Canceled, &mut out);
                return Ok(());
            }
            Response::SendFile { .. }
            | Response::Ok
            | Response::Empty
            | Response::UpgradePackage(_) => {}
        }

        let accepted = self.advance_queue(&response);

        if let Response::SendFile { max_packet_size } = response {
            match accepted {
                Some(pending) => self.begin_transfer(pending, max_packet_size)?,
                None => {
                    warn!("Engine: packet size received for no announced upload");
                    self.report_error(ErrorCode::UnknownObject);
                }
            }
        }
        Ok(())
    }

    /// A reply arrived: the head was delivered unless the module is busy.
    ///
    /// Returns the announced upload when this reply answered its request
    /// with a packet size.
    fn advance_queue(&mut self, response: &Response) -> Option<PendingFile> {
        let busy = response.is_busy();
        let mut accepted = None;
        if self.awaiting_response && !busy {
            let delivered = self.queue.pop();
            let announced = self.pending_file.as_ref().map(|p| p.request.as_str());
            if delivered.is_some() && delivered.as_deref() == announced {
                if matches!(response, Response::SendFile { .. }) {
                    accepted = self.pending_file.take();
                } else {
                    debug!("Engine: upload refused: {:?}", response);
                    self.pending_file = None;
                }
            }
        }
        self.awaiting_response = busy && self.awaiting_response;
        accepted
    }

    fn begin_transfer(
        &mut self,
        pending: PendingFile,
        max_packet_size: usize,
    ) -> SessionResult<()> {
        debug!(
            "Engine: upload accepted, {} bytes in packets of {}",
            pending.size, max_packet_size
        );
        self.transfer = Some(FileTransfer::new(
            pending.size,
            max_packet_size,
            pending.producer,
        ));
        let mut out = Outbox::new(&mut self.queue);
        self.handler
            .on_send_file_event(&SendFileEvent::Started { max_packet_size }, &mut out);
        self.send_next_packet()
    }

    /// Produce and write the next packet, or finish the upload.
    fn send_next_packet(&mut self) -> SessionResult<()> {
        let Some(transfer) = self.transfer.as_mut() else {
            return Ok(());
        };

        let next = match transfer.prepare_next() {
            Ok(next) => next,
            Err(e) => {
                self.transfer = None;
                return Err(e.into());
            }
        };

        match next {
            NextPacket::Ready => {
                self.writer.write_all(transfer.current_packet())?;
                self.writer.flush()?;
            }
            NextPacket::Complete => {
                debug!("Engine: upload complete");
                self.transfer = None;
                self.writer.write_all(&[EOT])?;
                self.writer.flush()?;
            }
            NextPacket::Stalled => {
                warn!("Engine: producer returned no data, aborting upload");
                self.transfer = None;
                self.report_error(ErrorCode::FileProducerEmpty);
            }
        }
        Ok(())
    }

    /// Report a library-side fault. No queue side effects.
    fn report_error(&mut self, code: ErrorCode) {
        let error = WrfError::new(code);
        let mut out = Outbox::new(&mut self.queue);
        self.handler.on_error(&error, &mut out);
    }
}

impl<W: Write, H: SessionEvents> CommandSink for Engine<W, H> {
    fn enqueue(&mut self, text: &str) -> SessionResult<()> {
        push_message(&mut self.queue, text)
    }
}

impl<W, H> std::fmt::Debug for Engine<W, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("receive_buffer", &self.receive_buffer.len())
            .field("queue", &self.queue.count())
            .field("awaiting_response", &self.awaiting_response)
            .field("pending_file", &self.pending_file.is_some())
            .field("transfer", &self.transfer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::SliceProducer;

    fn engine() -> Engine<Vec<u8>, ()> {
        Engine::new(Vec::new(), (), EngineConfig::default())
    }

    #[test]
    fn test_send_queue_waits_for_reply() {
        let mut engine = engine();
        engine.request_status().unwrap();
        engine.reboot().unwrap();

        engine.handle_send_queue().unwrap();
        engine.handle_send_queue().unwrap();
        assert_eq!(
            engine.writer().as_slice(),
            b"{\"devicedrive\":{\"command\":\"status\"}}\x04"
        );
        assert!(engine.is_awaiting_response());
        assert_eq!(engine.queue_count(), 2);

        engine
            .register_bytes(b"{\"devicedrive\":{\"result\":\"OK\"}}\x04")
            .unwrap();
        assert!(!engine.is_awaiting_response());
        assert_eq!(engine.queue_count(), 1);
    }

    #[test]
    fn test_reply_without_request_leaves_queue() {
        let mut engine = engine();
        engine.reboot().unwrap();
        engine
            .register_bytes(b"{\"devicedrive\":{\"result\":\"OK\"}}\x04")
            .unwrap();
        assert_eq!(engine.queue_count(), 1);
        assert!(engine.writer().is_empty());
    }

    #[test]
    fn test_eot_resets_buffer() {
        let mut engine = engine();
        engine.register_bytes(b"{\"a\":1}").unwrap();
        assert_eq!(engine.receive_buffer_len(), 7);
        engine.register_byte(EOT).unwrap();
        assert_eq!(engine.receive_buffer_len(), 0);
    }

    #[test]
    fn test_send_without_reply_bypasses_queue() {
        let mut engine = engine();
        engine.send_without_reply("{\"x\":1}").unwrap();
        assert_eq!(engine.writer().as_slice(), b"{\"x\":1}\x03");
        assert!(!engine.is_awaiting_response());
        assert_eq!(engine.queue_count(), 0);
    }

    #[test]
    fn test_second_send_file_rejected() {
        let mut engine = engine();
        engine.send_file("a", 4, SliceProducer::new(b"abcd".to_vec())).unwrap();
        let err = engine
            .send_file("b", 4, SliceProducer::new(b"efgh".to_vec()))
            .unwrap_err();
        assert!(matches!(err, SessionError::TransferInProgress));
        assert_eq!(engine.queue_count(), 1);
    }

    #[test]
    fn test_clear_queue_drops_announced_upload() {
        let mut engine = engine();
        engine.send_file("a", 4, SliceProducer::new(b"abcd".to_vec())).unwrap();
        engine.clear_queue();
        assert!(!engine.is_file_transfer_pending());
        engine.send_file("b", 4, SliceProducer::new(b"efgh".to_vec())).unwrap();
        assert_eq!(engine.queue_count(), 1);
    }

    #[test]
    fn test_refused_upload_is_forgotten() {
        let mut engine = engine();
        engine.send_file("a", 4, SliceProducer::new(b"abcd".to_vec())).unwrap();
        engine.handle_send_queue().unwrap();
        engine
            .register_bytes(b"{\"devicedrive\":{\"error\":\"NOT_ONLINE\"}}\x04")
            .unwrap();
        assert!(!engine.is_file_transfer_pending());
        assert_eq!(engine.mode(), OperatingMode::Normal);
    }
}
