//! The server side of a cube connection (spec.md §4.7/§4.9): one accepted
//! socket, handshake, then a loop of `request -> execute -> response`.
//! Async and tokio-based throughout, unlike the client's blocking design
//! (spec.md's explicit server/client asymmetry) — this is the half meant
//! to hold many connections at once behind `cubed`'s accept loop.
use std::sync::Arc;

use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use scorep_protocol::{decode_endianness_word, FrameHeader, ResponseCode, Severity, WireCodec};
use scorep_requests::{CubeSession, Request, RequestId};

use crate::error::ConnectionError;
use crate::wire::{read_frame_async, write_frame_async};

/// Drives one accepted connection to completion: the endianness handshake,
/// then request/response exchanges against `session`, until the client
/// disconnects, sends `Disconnect`, or an unrecoverable error occurs.
/// `session` is shared so a future revision can split reads from the
/// single-writer `DefineMetric` path without changing this loop's shape.
pub async fn serve_connection(
    mut stream: TcpStream,
    session: Arc<Mutex<CubeSession>>,
) -> Result<(), ConnectionError> {
    let mut word = [0u8; 8];
    stream.read_exact(&mut word).await?;
    let swap = decode_endianness_word(word)?;
    stream.write_all(&[swap as u8]).await?;
    stream.flush().await?;

    let codec = WireCodec::new(swap);
    let mut negotiated_version = 0u32;
    let (mut read_half, write_half) = stream.into_split();
    let write_half = Arc::new(Mutex::new(write_half));

    loop {
        let (header, body) = match read_frame_async(&mut read_half, &codec).await {
            Ok(pair) => pair,
            Err(ConnectionError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("client closed the connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let id = match RequestId::from_u32(header.request_id) {
            Some(id) if id.is_registered_for(negotiated_version) => id,
            _ => {
                write_error(
                    &write_half,
                    &codec,
                    header.sequence,
                    Severity::Unrecoverable,
                    format!(
                        "request id {} is not registered for protocol version {}",
                        header.request_id, negotiated_version
                    ),
                )
                .await?;
                return Ok(());
            }
        };

        let disconnect = id == RequestId::Disconnect;

        let outcome = match Request::decode_payload(id, &codec, &body) {
            Ok(request) => {
                let mut session = session.lock().await;
                request.execute(&mut session, &mut negotiated_version)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => {
                let mut payload = Vec::new();
                codec.write_u32(&mut payload, ResponseCode::Ok.to_u32());
                payload.extend_from_slice(&response.encode_payload(&codec));
                let header_out = FrameHeader::new(id.to_u32(), header.sequence, payload.len() as u32);
                let mut w = write_half.lock().await;
                write_frame_async(&mut *w, &codec, header_out, &payload).await?;
            }
            Err(e) => {
                let severity = e.severity();
                write_error(&write_half, &codec, header.sequence, severity, e.to_string()).await?;
                if severity == Severity::Unrecoverable {
                    return Ok(());
                }
            }
        }

        if disconnect {
            return Ok(());
        }
    }
}

async fn write_error(
    write_half: &Arc<Mutex<OwnedWriteHalf>>,
    codec: &WireCodec,
    sequence: u64,
    severity: Severity,
    message: String,
) -> Result<(), ConnectionError> {
    let code = match severity {
        Severity::Recoverable => ResponseCode::ErrorRecoverable,
        Severity::Unrecoverable => ResponseCode::ErrorUnrecoverable,
    };
    let mut payload = Vec::new();
    codec.write_u32(&mut payload, code.to_u32());
    codec.write_string(&mut payload, &message);
    let header = FrameHeader::new(0, sequence, payload.len() as u32);
    let mut w = write_half.lock().await;
    write_frame_async(&mut *w, codec, header, &payload).await
}
