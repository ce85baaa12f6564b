//! File upload packetizer.
//!
//! Once the module has negotiated a packet size, the upload is a lock-step
//! exchange of framed packets and single control bytes:
//!
//! ```text
//! host                                   module
//!  | -- STX len payload crc EOT --------> |
//!  | <------------------------------ ACK  |   next packet
//!  | <------------------------------ NAK  |   same packet again
//!  | <------------------------------ CAN  |   upload abandoned
//!  | -- EOT (after last ACK) -----------> |
//! ```
//!
//! The last framed packet is kept until it is acknowledged so a NAK resends
//! the exact same bytes without asking the producer again.

use wrf_protocol::{encode_file_packet, ProtocolError};

/// Source of file data.
///
/// `produce` fills as much of `dest` as it can and returns the number of
/// bytes written. `dest.len()` is never larger than what is left to send.
pub trait PacketProducer {
    fn produce(&mut self, dest: &mut [u8]) -> usize;
}

impl<F> PacketProducer for F
where
    F: FnMut(&mut [u8]) -> usize,
{
    fn produce(&mut self, dest: &mut [u8]) -> usize {
        self(dest)
    }
}

/// Produces packets from an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceProducer {
    data: Vec<u8>,
    offset: usize,
}

impl SliceProducer {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        SliceProducer {
            data: data.into(),
            offset: 0,
        }
    }

    /// Total bytes this producer will hand out.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl PacketProducer for SliceProducer {
    fn produce(&mut self, dest: &mut [u8]) -> usize {
        let remaining = &self.data[self.offset..];
        let n = remaining.len().min(dest.len());
        dest[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        n
    }
}

/// What the transfer wants to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NextPacket {
    /// A new packet is framed and ready to write.
    Ready,
    /// Every byte has been acknowledged.
    Complete,
    /// The producer returned nothing while bytes remain.
    Stalled,
}

/// State of one running upload.
pub(crate) struct FileTransfer {
    file_size: usize,
    bytes_acknowledged: usize,
    max_packet_size: usize,
    /// Framed packet awaiting ACK.
    packet: Vec<u8>,
    /// Payload bytes in `packet`.
    packet_len: usize,
    producer: Box<dyn PacketProducer>,
}

impl FileTransfer {
    pub(crate) fn new(
        file_size: usize,
        max_packet_size: usize,
        producer: Box<dyn PacketProducer>,
    ) -> Self {
        FileTransfer {
            file_size,
            bytes_acknowledged: 0,
            max_packet_size,
            packet: Vec::new(),
            packet_len: 0,
            producer,
        }
    }

    /// Ask the producer for the next packet and frame it.
    pub(crate) fn prepare_next(&mut self) -> Result<NextPacket, ProtocolError> {
        let remaining = self.file_size.saturating_sub(self.bytes_acknowledged);
        if remaining == 0 {
            return Ok(NextPacket::Complete);
        }

        let packet_size = self.max_packet_size.min(remaining);
        let mut payload = vec![0u8; packet_size];
        let written = self.producer.produce(&mut payload).min(packet_size);
        if written == 0 {
            return Ok(NextPacket::Stalled);
        }

        self.packet = encode_file_packet(&payload[..written])?;
        self.packet_len = written;
        Ok(NextPacket::Ready)
    }

    /// The packet on the wire was accepted.
    pub(crate) fn acknowledge(&mut self) {
        self.bytes_acknowledged += self.packet_len;
        self.packet.clear();
        self.packet_len = 0;
    }

    /// Framed packet awaiting acknowledgement, empty between packets.
    pub(crate) fn current_packet(&self) -> &[u8] {
        &self.packet
    }

    pub(crate) fn file_size(&self) -> usize {
        self.file_size
    }

    pub(crate) fn bytes_acknowledged(&self) -> usize {
        self.bytes_acknowledged
    }
}

impl std::fmt::Debug for FileTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransfer")
            .field("file_size", &self.file_size)
            .field("bytes_acknowledged", &self.bytes_acknowledged)
            .field("max_packet_size", &self.max_packet_size)
            .field("packet_len", &self.packet_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrf_protocol::decode_file_packet;

    #[test]
    fn test_slice_producer() {
        let mut producer = SliceProducer::new(b"abcdef".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(producer.produce(&mut buf), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(producer.produce(&mut buf), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(producer.produce(&mut buf), 0);
    }

    #[test]
    fn test_packet_sizes_follow_remaining_bytes() {
        let data: Vec<u8> = (0..20).collect();
        let mut transfer = FileTransfer::new(20, 8, Box::new(SliceProducer::new(data)));

        let mut sizes = Vec::new();
        while transfer.prepare_next().unwrap() == NextPacket::Ready {
            let payload = decode_file_packet(transfer.current_packet()).unwrap();
            sizes.push(payload.len());
            transfer.acknowledge();
        }
        assert_eq!(sizes, vec![8, 8, 4]);
        assert_eq!(transfer.bytes_acknowledged(), 20);
    }

    #[test]
    fn test_short_producer_is_tolerated() {
        // Producer hands out at most 3 bytes at a time.
        let mut counter = 0u8;
        let producer = move |dest: &mut [u8]| {
            let n = dest.len().min(3);
            for b in &mut dest[..n] {
                *b = counter;
                counter = counter.wrapping_add(1);
            }
            n
        };
        let mut transfer = FileTransfer::new(7, 8, Box::new(producer));

        let mut total = 0;
        while transfer.prepare_next().unwrap() == NextPacket::Ready {
            total += decode_file_packet(transfer.current_packet()).unwrap().len();
            transfer.acknowledge();
        }
        assert_eq!(total, 7);
    }

    #[test]
    fn test_empty_producer_stalls() {
        let mut transfer = FileTransfer::new(5, 8, Box::new(|_: &mut [u8]| 0usize));
        assert_eq!(transfer.prepare_next().unwrap(), NextPacket::Stalled);
    }

    #[test]
    fn test_zero_length_file_completes_at_once() {
        let mut transfer = FileTransfer::new(0, 8, Box::new(SliceProducer::new(Vec::<u8>::new())));
        assert_eq!(transfer.prepare_next().unwrap(), NextPacket::Complete);
    }
}
