//! WebSocket transport
//!
//! This file implements the WebSocket server that carries the relay protocol.
//! Responsibilities:
//! - Accept TCP connections and perform the WebSocket upgrade on the
//!   configured path (other paths get `404 Not Found`)
//! - Give each connection a `Connection` handle whose frames are drained onto
//!   the socket by a dedicated writer task
//! - Feed inbound frames to the connection's `Session` one at a time
//! - Leave the joined room when the socket goes away

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, error, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::Message as WsMessage;

use crate::config::Settings;
use crate::connection::Connection;
use crate::persistence::EventLog;
use crate::room::RoomRegistry;
use crate::transport::session::{Flow, Session};
use crate::utils::RelayError;

/// Binds the configured address and serves connections until the listener fails.
pub async fn start_websocket_server(
    settings: &Settings,
    registry: Arc<RoomRegistry>,
    log: Arc<dyn EventLog>,
) -> Result<(), RelayError> {
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    serve(listener, settings.server.ws_path.clone(), registry, log).await
}

/// Accept loop over an already bound listener. Each connection runs in its
/// own task.
pub async fn serve(
    listener: TcpListener,
    ws_path: String,
    registry: Arc<RoomRegistry>,
    log: Arc<dyn EventLog>,
) -> Result<(), RelayError> {
    let local = listener.local_addr()?;
    info!("WebSocket server listening on ws://{local}{ws_path}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {e}");
                return Err(e.into());
            }
        };

        let registry = registry.clone();
        let log = log.clone();
        let ws_path = ws_path.clone();

        spawn(async move {
            handle_connection(stream, peer, &ws_path, registry, log).await;
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ws_path: &str,
    registry: Arc<RoomRegistry>,
    log: Arc<dyn EventLog>,
) {
    let check_path = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == ws_path {
            Ok(resp)
        } else {
            let mut not_found = ErrorResponse::new(Some("Not Found".to_string()));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Err(not_found)
        }
    };

    let ws_stream = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error from {peer}: {e}");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (connection, mut rx) = Connection::channel();
    let client_id = connection.id.clone();
    info!("{client_id} connected from {peer}");

    // Forward queued frames to the socket. Stops after a close frame or the
    // first write error; dropping `rx` then makes further sends fail.
    let mut writer = {
        let client_id = client_id.clone();
        spawn(async move {
            while let Some(frame) = rx.recv().await {
                let closing = frame.is_close();
                if let Err(e) = ws_sender.send(frame).await {
                    warn!("Failed to send message to {client_id}: {e}");
                    break;
                }
                if closing {
                    break;
                }
            }
            debug!("Send loop closed for {client_id}");
        })
    };

    let mut session = Session::new(connection, registry, log);
    let mut writer_done = false;

    loop {
        // A finished writer means the socket can no longer be written to,
        // so stop reading as well.
        let frame = tokio::select! {
            frame = ws_receiver.next() => frame,
            _ = &mut writer => {
                writer_done = true;
                debug!("Writer for {client_id} finished, closing the read side");
                break;
            }
        };
        let Some(frame) = frame else {
            break;
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Read error on {client_id}: {e}");
                break;
            }
        };

        let flow = match frame {
            WsMessage::Text(text) => session.handle_text(text.as_str()).await,
            WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => session.handle_text(text).await,
                Err(_) => {
                    warn!("Dropping non UTF-8 binary frame from {client_id}");
                    Flow::Continue
                }
            },
            // Close, ping and pong are answered by tungstenite itself; the
            // stream ends once the close handshake is done.
            _ => Flow::Continue,
        };

        if flow == Flow::Close {
            break;
        }
    }

    session.disconnect();
    // The writer stops once every handle to the connection is gone.
    drop(session);
    if !writer_done {
        let _ = writer.await;
    }

    info!("{client_id} disconnected");
}
