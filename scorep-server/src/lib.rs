//! `cubed`'s accept loop (spec.md §4.9): one `tokio::net::TcpListener`,
//! one `tokio::spawn`'d task per accepted connection, each against its
//! own freshly opened [`CubeSession`] so two clients never see each
//! other's `DefineMetric`s.
use std::sync::Arc;

use log::{error, info};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use scorep_connection::serve_connection;
use scorep_report::Profile;
use scorep_requests::CubeSession;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Runs the accept loop on an already-bound `listener` until it errors.
/// `preload` is cloned into every new connection's session, so a server
/// started with `--report` serves that one report to every client
/// without re-reading the file per connection.
pub async fn serve(listener: TcpListener, preload: Option<(String, Profile)>) -> Result<(), ServerError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("accepted connection from {peer}");
        let mut session = CubeSession::new();
        if let Some((path, profile)) = preload.clone() {
            session.open(path, profile);
        }
        let session = Arc::new(Mutex::new(session));
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, session).await {
                error!("connection from {peer} ended with an error: {e}");
            }
        });
    }
}

/// Binds `addr` and runs [`serve`] until the listener itself fails.
pub async fn bind_and_serve(addr: &str, preload: Option<(String, Profile)>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.to_string(), source })?;
    let bound = listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| addr.to_string());
    info!("listening on {bound}");
    serve(listener, preload).await
}
