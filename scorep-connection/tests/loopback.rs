//! End-to-end client/server round trips over a real loopback socket
//! (spec.md's connection-layer scenarios: handshake, version negotiation,
//! concurrent overlapping requests).
use std::net::SocketAddr;
use std::sync::Arc;

use scorep_connection::{serve_connection, ClientConnection};
use scorep_requests::{CubeSession, Request, Response};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => break,
            };
            let session = Arc::new(Mutex::new(CubeSession::new()));
            tokio::spawn(async move {
                let _ = serve_connection(stream, session).await;
            });
        }
    });
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_negotiates_and_round_trips_version() {
    let addr = spawn_server().await;
    let addr_string = addr.to_string();

    let (negotiated, response) = tokio::task::spawn_blocking(move || {
        let conn = ClientConnection::connect(&addr_string, scorep_protocol::MAX_PROTOCOL_VERSION)
            .expect("handshake should succeed between two same-endian peers");
        let negotiated = conn.negotiated_version();
        let response = conn.call(Request::Version).unwrap();
        (negotiated, response)
    })
    .await
    .unwrap();

    assert_eq!(negotiated, scorep_protocol::MAX_PROTOCOL_VERSION);
    assert_eq!(response, Response::Version { version: scorep_requests::LIBRARY_VERSION });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_negotiates_down_to_a_lower_client_ceiling() {
    let addr = spawn_server().await;
    let addr_string = addr.to_string();

    let negotiated = tokio::task::spawn_blocking(move || {
        let conn = ClientConnection::connect(&addr_string, scorep_protocol::PROTOCOL_VERSION_0).unwrap();
        conn.negotiated_version()
    })
    .await
    .unwrap();

    assert_eq!(negotiated, scorep_protocol::PROTOCOL_VERSION_0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_on_one_connection_each_get_their_own_response() {
    let addr = spawn_server().await;
    let addr_string = addr.to_string();

    let responses = tokio::task::spawn_blocking(move || {
        let conn = Arc::new(
            ClientConnection::connect(&addr_string, scorep_protocol::MAX_PROTOCOL_VERSION).unwrap(),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let conn = Arc::clone(&conn);
                std::thread::spawn(move || conn.call(Request::Version).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    })
    .await
    .unwrap();

    assert_eq!(responses.len(), 8);
    for response in responses {
        assert_eq!(response, Response::Version { version: scorep_requests::LIBRARY_VERSION });
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_ends_the_server_side_session_cleanly() {
    let addr = spawn_server().await;
    let addr_string = addr.to_string();

    tokio::task::spawn_blocking(move || {
        let conn = ClientConnection::connect(&addr_string, scorep_protocol::MAX_PROTOCOL_VERSION).unwrap();
        // Dropping the connection sends Disconnect and waits for the reader
        // thread to join; a panic here would mean the server half hung.
        drop(conn);
    })
    .await
    .unwrap();
}
