mod codec;
mod error;
mod framing;
mod handshake;

pub use codec::WireCodec;
pub use error::{ProtocolError, Severity};
pub use framing::{FrameHeader, ResponseCode, FRAME_HEADER_LEN, FRAME_MARKER};
pub use handshake::{
    decode_endianness_word, decode_negotiate_protocol_body, encode_endianness_word,
    encode_negotiate_protocol_body, negotiate_protocol_version, ENDIANNESS_SENTINEL,
    MAX_PROTOCOL_VERSION, PROTOCOL_VERSION_0, PROTOCOL_VERSION_1,
};
