//! Reading and writing one length-framed message (spec.md §4.7): `marker |
//! request-id | sequence | body-length | body`. Blocking variants back the
//! client's reader thread and its request-sending calls (spec.md §4.9
//! asymmetry: client blocks on plain sockets); async variants back the
//! server's per-connection tokio task.
use std::io::{Read, Write};

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use scorep_protocol::{FrameHeader, WireCodec, FRAME_HEADER_LEN};

use crate::error::ConnectionError;

pub fn write_frame_blocking(
    stream: &mut impl Write,
    codec: &WireCodec,
    header: FrameHeader,
    body: &[u8],
) -> Result<(), ConnectionError> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    header.encode(codec, &mut buf);
    buf.extend_from_slice(body);
    stream.write_all(&buf)?;
    stream.flush()?;
    Ok(())
}

pub fn read_frame_blocking(
    stream: &mut impl Read,
    codec: &WireCodec,
) -> Result<(FrameHeader, Vec<u8>), ConnectionError> {
    let mut header_buf = [0u8; FRAME_HEADER_LEN];
    stream.read_exact(&mut header_buf)?;
    let header = FrameHeader::decode(codec, &header_buf)?;
    let mut body = vec![0u8; header.body_len as usize];
    stream.read_exact(&mut body)?;
    Ok((header, body))
}

pub async fn write_frame_async(
    stream: &mut (impl tokio::io::AsyncWrite + Unpin),
    codec: &WireCodec,
    header: FrameHeader,
    body: &[u8],
) -> Result<(), ConnectionError> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    header.encode(codec, &mut buf);
    buf.extend_from_slice(body);
    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn read_frame_async(
    stream: &mut (impl tokio::io::AsyncRead + Unpin),
    codec: &WireCodec,
) -> Result<(FrameHeader, Vec<u8>), ConnectionError> {
    let mut header_buf = [0u8; FRAME_HEADER_LEN];
    stream.read_exact(&mut header_buf).await?;
    let header = FrameHeader::decode(codec, &header_buf)?;
    let mut body = vec![0u8; header.body_len as usize];
    stream.read_exact(&mut body).await?;
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_round_trips_over_a_cursor() {
        let codec = WireCodec::new(false);
        let mut buf: Vec<u8> = Vec::new();
        write_frame_blocking(&mut buf, &codec, FrameHeader::new(3, 1, 4), &[1, 2, 3, 4]).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let (header, body) = read_frame_blocking(&mut cursor, &codec).unwrap();
        assert_eq!(header.request_id, 3);
        assert_eq!(header.sequence, 1);
        assert_eq!(body, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn async_round_trips_over_a_duplex_stream() {
        let codec = WireCodec::new(false);
        let (mut a, mut b) = tokio::io::duplex(256);
        write_frame_async(&mut a, &codec, FrameHeader::new(7, 42, 3), &[9, 8, 7]).await.unwrap();
        let (header, body) = read_frame_async(&mut b, &codec).await.unwrap();
        assert_eq!(header.request_id, 7);
        assert_eq!(header.sequence, 42);
        assert_eq!(body, vec![9, 8, 7]);
    }
}
