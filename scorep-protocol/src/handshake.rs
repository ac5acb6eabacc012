//! Endianness and protocol-version negotiation (spec.md §4.7, scenario 6/7):
//! the client writes the endianness sentinel in its own native order
//! immediately after connecting; the server decides whether to byte-swap
//! for the rest of the connection by reading it back. Protocol version
//! negotiation follows, always at `min(client_max, server_max)`.
use crate::codec::WireCodec;
use crate::error::ProtocolError;

pub const ENDIANNESS_SENTINEL: u64 = 1;

pub const PROTOCOL_VERSION_0: u32 = 0;
pub const PROTOCOL_VERSION_1: u32 = 1;
pub const MAX_PROTOCOL_VERSION: u32 = PROTOCOL_VERSION_1;

/// The client's first write on a fresh connection: `uint64(1)` in its own
/// native byte order (spec.md §4.7's "Endianness word").
pub fn encode_endianness_word() -> [u8; 8] {
    ENDIANNESS_SENTINEL.to_ne_bytes()
}

/// The server's read of that word: compares on the wire; if it already
/// reads 1, no swap is needed; if byte-swapping it yields 1, this
/// connection needs a swap for every subsequent primitive; otherwise the
/// connection is malformed and must be aborted (spec.md §4.7, scenario 6).
pub fn decode_endianness_word(raw: [u8; 8]) -> Result<bool, ProtocolError> {
    let native = u64::from_ne_bytes(raw);
    if native == ENDIANNESS_SENTINEL {
        return Ok(false);
    }
    if native.swap_bytes() == ENDIANNESS_SENTINEL {
        return Ok(true);
    }
    Err(ProtocolError::EndiannessMismatch)
}

/// `NegotiateProtocol(maxClientVersion)`'s server-side resolution: the
/// negotiated version both sides register their request catalogue for.
pub fn negotiate_protocol_version(client_max: u32, server_max: u32) -> u32 {
    client_max.min(server_max)
}

/// Encode a `NegotiateProtocol` request body: just the client's maximum
/// supported version, as a `uint32`.
pub fn encode_negotiate_protocol_body(codec: &WireCodec, client_max: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4);
    codec.write_u32(&mut buf, client_max);
    buf
}

pub fn decode_negotiate_protocol_body(codec: &WireCodec, bytes: &[u8]) -> Result<u32, ProtocolError> {
    codec.read_u32(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_endianness_needs_no_swap() {
        let raw = encode_endianness_word();
        assert_eq!(decode_endianness_word(raw).unwrap(), false);
    }

    #[test]
    fn mismatched_endianness_is_detected_and_swap_enabled() {
        let raw = ENDIANNESS_SENTINEL.swap_bytes().to_ne_bytes();
        assert_eq!(decode_endianness_word(raw).unwrap(), true);
    }

    #[test]
    fn garbage_word_aborts_the_connection() {
        let raw = 0xdead_beef_dead_beefu64.to_ne_bytes();
        assert!(decode_endianness_word(raw).is_err());
    }

    #[test]
    fn negotiated_version_is_the_min() {
        assert_eq!(negotiate_protocol_version(2, 1), 1);
        assert_eq!(negotiate_protocol_version(0, 1), 0);
        assert_eq!(negotiate_protocol_version(5, 5), 5);
    }
}
