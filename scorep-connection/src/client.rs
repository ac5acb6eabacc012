//! The client side of a cube connection (spec.md §4.9): one socket, one
//! reader thread, and a `sequence -> waiter` table guarded by a plain
//! `Mutex`/`Condvar` pair. Deliberately not async — the client is a thin,
//! blocking library meant to be called from tools like `scorep-score`
//! that have no event loop of their own.
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use log::warn;

use scorep_protocol::{encode_endianness_word, ResponseCode, Severity, WireCodec};
use scorep_requests::{Request, RequestId, Response};

use crate::error::ConnectionError;
use crate::wire::{read_frame_blocking, write_frame_blocking};

/// Outcome the reader thread deposits for a pending request.
enum Outcome {
    Ok { body: Vec<u8> },
    Error { severity: Severity, message: String },
}

/// One in-flight request's wakeup slot (spec.md §4.9: "a sequence number
/// to waiter table").
struct Waiter {
    slot: Mutex<Option<Outcome>>,
    condvar: Condvar,
}

type WaiterTable = Arc<Mutex<HashMap<u64, Arc<Waiter>>>>;

/// A client's single connection to a `cubed` server: handshake done,
/// reader thread running, ready to exchange requests for responses.
pub struct ClientConnection {
    writer: Mutex<TcpStream>,
    codec: WireCodec,
    waiters: WaiterTable,
    next_seq: AtomicU64,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    negotiated_version: u32,
}

impl ClientConnection {
    /// Connects to `addr`, performs the endianness handshake (spec.md
    /// §4.7, scenario 6) followed by protocol-version negotiation
    /// (scenario 7), and starts the reader thread. `max_client_version`
    /// is this client's own ceiling; the server may negotiate down to
    /// its own maximum.
    pub fn connect(addr: &str, max_client_version: u32) -> Result<ClientConnection, ConnectionError> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true).ok();

        stream.write_all(&encode_endianness_word())?;
        stream.flush()?;

        // The server decides whether a swap is needed and echoes that
        // decision back as a single byte so both ends agree on a codec
        // before anything else is exchanged.
        let mut ack = [0u8; 1];
        stream.read_exact(&mut ack)?;
        let swap = ack[0] != 0;
        let codec = WireCodec::new(swap);

        let reader_stream = stream.try_clone()?;
        let waiters: WaiterTable = Arc::new(Mutex::new(HashMap::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(reader_stream, codec, Arc::clone(&waiters), Arc::clone(&stop));

        let conn = ClientConnection {
            writer: Mutex::new(stream),
            codec,
            waiters,
            next_seq: AtomicU64::new(0),
            stop,
            reader: Some(reader),
            negotiated_version: 0,
        };

        let negotiated = conn.negotiate_protocol(max_client_version)?;
        let mut conn = conn;
        conn.negotiated_version = negotiated;
        Ok(conn)
    }

    pub fn negotiated_version(&self) -> u32 {
        self.negotiated_version
    }

    fn negotiate_protocol(&self, max_client_version: u32) -> Result<u32, ConnectionError> {
        match self.call(Request::NegotiateProtocol { max_client_version })? {
            Response::NegotiateProtocol { negotiated_version } => Ok(negotiated_version),
            _ => Err(ConnectionError::UnexpectedResponse),
        }
    }

    /// Sends `request` and blocks the calling thread until its matching
    /// response arrives, however many other threads are doing the same
    /// over this same connection (spec.md §5: concurrent requests are
    /// told apart by sequence number, not by thread identity).
    pub fn call(&self, request: Request) -> Result<Response, ConnectionError> {
        if self.stop.load(Ordering::SeqCst) {
            return Err(ConnectionError::Stopped);
        }

        let request_id = request.id();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let waiter = Arc::new(Waiter { slot: Mutex::new(None), condvar: Condvar::new() });
        self.waiters.lock().unwrap().insert(seq, Arc::clone(&waiter));

        let body = request.encode_payload(&self.codec);
        let header = scorep_protocol::FrameHeader::new(request_id.to_u32(), seq, body.len() as u32);
        {
            let mut w = self.writer.lock().unwrap();
            if let Err(e) = write_frame_blocking(&mut *w, &self.codec, header, &body) {
                self.waiters.lock().unwrap().remove(&seq);
                return Err(e);
            }
        }

        let mut slot = waiter.slot.lock().unwrap();
        while slot.is_none() {
            slot = waiter.condvar.wait(slot).unwrap();
        }
        let outcome = slot.take().unwrap();
        drop(slot);
        self.waiters.lock().unwrap().remove(&seq);

        match outcome {
            Outcome::Ok { body } => {
                let response = Response::decode_payload(request_id, &self.codec, &body)?;
                Ok(response)
            }
            Outcome::Error { severity, message } => {
                if severity == Severity::Unrecoverable {
                    self.stop.store(true, Ordering::SeqCst);
                }
                match severity {
                    Severity::Recoverable => Err(ConnectionError::ServerRecoverable(message)),
                    Severity::Unrecoverable => Err(ConnectionError::ServerUnrecoverable(message)),
                }
            }
        }
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        let body = Request::Disconnect.encode_payload(&self.codec);
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let header = scorep_protocol::FrameHeader::new(RequestId::Disconnect.to_u32(), seq, body.len() as u32);
        if let Ok(mut w) = self.writer.lock() {
            let _ = write_frame_blocking(&mut *w, &self.codec, header, &body);
            let _ = w.shutdown(std::net::Shutdown::Both);
        }
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

fn spawn_reader(
    mut stream: TcpStream,
    codec: WireCodec,
    waiters: WaiterTable,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match read_frame_blocking(&mut stream, &codec) {
                Ok((header, body)) => {
                    if body.len() < 4 {
                        warn!("dropping response with no response-code prefix");
                        continue;
                    }
                    let code_word = match codec.read_u32(&body[0..4]) {
                        Ok(w) => w,
                        Err(_) => continue,
                    };
                    let rest = body[4..].to_vec();
                    let outcome = match ResponseCode::from_u32(code_word) {
                        Some(ResponseCode::Ok) => Outcome::Ok { body: rest },
                        Some(ResponseCode::ErrorRecoverable) => {
                            let message = codec.read_string(&rest).map(|(s, _)| s).unwrap_or_default();
                            Outcome::Error { severity: Severity::Recoverable, message }
                        }
                        Some(ResponseCode::ErrorUnrecoverable) => {
                            let message = codec.read_string(&rest).map(|(s, _)| s).unwrap_or_default();
                            Outcome::Error { severity: Severity::Unrecoverable, message }
                        }
                        None => {
                            warn!("dropping response with unknown response-code {code_word}");
                            continue;
                        }
                    };
                    deliver(&waiters, header.sequence, outcome);
                }
                Err(_) => {
                    stop.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
        // Wake anyone still waiting so a dropped connection never hangs a
        // caller forever.
        let table = waiters.lock().unwrap();
        for waiter in table.values() {
            let mut slot = waiter.slot.lock().unwrap();
            if slot.is_none() {
                *slot = Some(Outcome::Error {
                    severity: Severity::Unrecoverable,
                    message: "connection closed".to_string(),
                });
            }
            waiter.condvar.notify_all();
        }
    })
}

fn deliver(waiters: &WaiterTable, sequence: u64, outcome: Outcome) {
    let waiter = waiters.lock().unwrap().get(&sequence).cloned();
    if let Some(waiter) = waiter {
        let mut slot = waiter.slot.lock().unwrap();
        *slot = Some(outcome);
        waiter.condvar.notify_all();
    }
}
