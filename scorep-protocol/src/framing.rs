//! Per-message framing (spec.md §4.7/§6): `marker | request-id | sequence |
//! body-length | body`, with responses additionally carrying a
//! `response-code` as the first four bytes of their body.
use crate::codec::WireCodec;
use crate::error::ProtocolError;

/// ASCII `"CUBE"`, written/read in the connection's negotiated order like
/// every other frame field — a mismatched marker after a successful
/// endianness handshake means framing itself has drifted.
pub const FRAME_MARKER: u32 = 0x4355_4245;

pub const FRAME_HEADER_LEN: usize = 4 + 4 + 8 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub marker: u32,
    pub request_id: u32,
    pub sequence: u64,
    pub body_len: u32,
}

impl FrameHeader {
    pub fn new(request_id: u32, sequence: u64, body_len: u32) -> FrameHeader {
        FrameHeader { marker: FRAME_MARKER, request_id, sequence, body_len }
    }

    pub fn encode(&self, codec: &WireCodec, buf: &mut Vec<u8>) {
        codec.write_u32(buf, self.marker);
        codec.write_u32(buf, self.request_id);
        codec.write_u64(buf, self.sequence);
        codec.write_u32(buf, self.body_len);
    }

    pub fn decode(codec: &WireCodec, bytes: &[u8]) -> Result<FrameHeader, ProtocolError> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(ProtocolError::TruncatedFrame {
                expected: FRAME_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let marker = codec.read_u32(&bytes[0..4])?;
        let request_id = codec.read_u32(&bytes[4..8])?;
        let sequence = codec.read_u64(&bytes[8..16])?;
        let body_len = codec.read_u32(&bytes[16..20])?;
        Ok(FrameHeader { marker, request_id, sequence, body_len })
    }
}

/// The first `uint32` of every response body (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ok,
    ErrorRecoverable,
    ErrorUnrecoverable,
}

impl ResponseCode {
    pub fn to_u32(self) -> u32 {
        match self {
            ResponseCode::Ok => 0,
            ResponseCode::ErrorRecoverable => 1,
            ResponseCode::ErrorUnrecoverable => 2,
        }
    }

    pub fn from_u32(v: u32) -> Option<ResponseCode> {
        match v {
            0 => Some(ResponseCode::Ok),
            1 => Some(ResponseCode::ErrorRecoverable),
            2 => Some(ResponseCode::ErrorUnrecoverable),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let codec = WireCodec::new(false);
        let header = FrameHeader::new(7, 42, 128);
        let mut buf = Vec::new();
        header.encode(&codec, &mut buf);
        assert_eq!(FrameHeader::decode(&codec, &buf).unwrap(), header);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let codec = WireCodec::new(false);
        let err = FrameHeader::decode(&codec, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedFrame { .. }));
    }

    #[test]
    fn response_code_round_trips() {
        for code in [ResponseCode::Ok, ResponseCode::ErrorRecoverable, ResponseCode::ErrorUnrecoverable] {
            assert_eq!(ResponseCode::from_u32(code.to_u32()), Some(code));
        }
    }
}
