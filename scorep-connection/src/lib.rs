//! Connection-layer primitives for the cube network protocol (spec.md
//! §4.7/§4.9): the URL grammar that names an endpoint, the framed
//! send/receive helpers both sides share, and the client/server halves
//! built on top of them.

mod client;
mod error;
mod server;
mod url;
mod wire;

pub use client::ClientConnection;
pub use error::ConnectionError;
pub use server::serve_connection;
pub use url::{parse as parse_url, CubeUrl, Proto, UrlError, DEFAULT_PORT};
pub use wire::{read_frame_async, read_frame_blocking, write_frame_async, write_frame_blocking};
