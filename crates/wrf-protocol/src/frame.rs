//! Frame encoding utilities.
//!
//! Text traffic is terminated by a single control byte:
//!
//! ```text
//! +---------------------+-----+
//! | JSON text           | EOT |   request, reply expected
//! +---------------------+-----+
//! | JSON text           | ETX |   request, no reply expected
//! +---------------------+-----+
//! ```
//!
//! File uploads use a binary packet, lengths and checksum in native byte order:
//!
//! ```text
//! +-----+-----------+------------------+-----------+-----+
//! | STX | len (i32) | payload[0..len]  | crc (i32) | EOT |
//! +-----+-----------+------------------+-----------+-----+
//! ```

use bytes::{BufMut, BytesMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// CRC-32 (IEEE 802.3, reflected polynomial 0xEDB88320, seed 0xFFFFFFFF,
/// inverted output).
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Terminate text with EOT.
pub fn encode_message(text: &str) -> String {
    let mut buf = String::with_capacity(text.len() + 1);
    buf.push_str(text);
    buf.push(EOT as char);
    buf
}

/// Terminate text with ETX.
pub fn encode_send_only(text: &str) -> String {
    let mut buf = String::with_capacity(text.len() + 1);
    buf.push_str(text);
    buf.push(ETX as char);
    buf
}

/// Frame one file packet.
pub fn encode_file_packet(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = i32::try_from(payload.len()).map_err(|_| ProtocolError::PacketTooLong {
        max: i32::MAX as usize,
        actual: payload.len(),
    })?;

    let mut buf = BytesMut::with_capacity(payload.len() + FILE_PACKET_OVERHEAD_SIZE);
    buf.put_u8(STX);
    buf.put_slice(&len.to_ne_bytes());
    buf.put_slice(payload);
    buf.put_slice(&crc32(payload).to_ne_bytes());
    buf.put_u8(EOT);
    Ok(buf.to_vec())
}

/// Read back a framed file packet, as the module does.
///
/// Returns the payload when framing, length and checksum all check out.
pub fn decode_file_packet(packet: &[u8]) -> Option<&[u8]> {
    if packet.len() < FILE_PACKET_OVERHEAD_SIZE
        || packet[0] != STX
        || packet[packet.len() - 1] != EOT
    {
        return None;
    }

    let len = i32::from_ne_bytes(packet[1..5].try_into().ok()?);
    let len = usize::try_from(len).ok()?;
    if packet.len() != len + FILE_PACKET_OVERHEAD_SIZE {
        return None;
    }

    let payload = &packet[5..5 + len];
    let crc = u32::from_ne_bytes(packet[5 + len..9 + len].try_into().ok()?);
    (crc == crc32(payload)).then_some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // Standard check value for "123456789".
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_text_terminators() {
        assert_eq!(encode_message("{}"), "{}\u{4}");
        assert_eq!(encode_message("").as_bytes(), &[EOT]);
        assert_eq!(encode_send_only("{}").as_bytes(), b"{}\x03");
    }

    #[test]
    fn test_file_packet_layout() {
        let payload = b"hello";
        let packet = encode_file_packet(payload).unwrap();

        assert_eq!(packet.len(), payload.len() + FILE_PACKET_OVERHEAD_SIZE);
        assert_eq!(packet[0], STX);
        assert_eq!(&packet[1..5], &5i32.to_ne_bytes());
        assert_eq!(&packet[5..10], payload);
        assert_eq!(&packet[10..14], &crc32(payload).to_ne_bytes());
        assert_eq!(packet[14], EOT);

        assert_eq!(decode_file_packet(&packet), Some(&payload[..]));
    }

    #[test]
    fn test_decode_file_packet_rejects_corruption() {
        let mut packet = encode_file_packet(b"abcdefgh").unwrap();
        packet[6] ^= 0xFF;
        assert_eq!(decode_file_packet(&packet), None);

        let packet = encode_file_packet(b"abc").unwrap();
        assert_eq!(decode_file_packet(&packet[..packet.len() - 1]), None);
    }
}
