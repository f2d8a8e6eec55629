//! CLI for PairSub
//!
//! Subcommands:
//! - `server`: run the relay
//! - `client`: join a topic, send one message and print the replies (useful for smoke tests)

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pairsub::config::load_config;
use pairsub::persistence::{EventLog, SledEventLog};
use pairsub::room::{EchoPolicy, RoomRegistry};
use pairsub::transport::start_websocket_server;
use pairsub::utils::{RelayError, logging};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pairsub")]
enum Command {
    /// Start the relay server
    Server,
    /// Run the smoke-test client
    Client {
        /// WebSocket endpoint to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,
        /// Topic to join
        #[arg(long, default_value = "lobby")]
        topic: String,
        /// Username announced after joining
        #[arg(long, default_value = "smoke")]
        username: String,
        /// Chat message to send
        #[arg(long, default_value = "Hello from pairsub")]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let result = match cmd {
        Command::Server => run_server().await,
        Command::Client {
            url,
            topic,
            username,
            message,
        } => {
            logging::init("info");
            run_client(&url, &topic, &username, &message).await
        }
    };

    if let Err(e) = result {
        // no-op when the subscriber is already installed
        logging::init("error");
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server() -> Result<(), RelayError> {
    let config = load_config()?;
    logging::init(&config.log.level);

    // Without its durable log the relay has nothing to forward to.
    let log = match SledEventLog::open(&config.log.path) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            error!("Failed to open event log at {}: {e}", config.log.path);
            return Err(e.into());
        }
    };
    info!("Event log opened at {}", config.log.path);

    let registry = Arc::new(RoomRegistry::new(EchoPolicy::from_echo(
        config.relay.echo_to_sender,
    )));

    let outcome = tokio::select! {
        res = start_websocket_server(&config, registry, log.clone()) => {
            error!("WebSocket server exited unexpectedly.");
            res
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    log.flush().await?;
    info!("Event log flushed");
    outcome
}

async fn run_client(
    url: &str,
    topic: &str,
    username: &str,
    message: &str,
) -> Result<(), RelayError> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    for frame in [
        json!({ "type": "setTopic", "topic": topic }),
        json!({ "type": "setUsername", "data": username }),
        json!({ "type": "message", "data": message }),
    ] {
        ws_stream
            .send(WsMessage::Text(frame.to_string().into()))
            .await?;
    }

    // Print whatever comes back until the server goes quiet
    while let Ok(Some(incoming)) =
        tokio::time::timeout(Duration::from_secs(2), ws_stream.next()).await
    {
        match incoming? {
            WsMessage::Text(text) => println!("Incoming: {text}"),
            WsMessage::Close(_) => {
                println!("Server closed the connection");
                break;
            }
            _ => {}
        }
    }

    ws_stream.close(None).await.ok();
    Ok(())
}
