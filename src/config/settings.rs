use serde::Deserialize;

/// Top-level configuration settings for the relay.
///
/// Includes settings for the WebSocket server, the room relay and the
/// durable event log.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to, and the request path
/// on which WebSocket upgrades are accepted.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub ws_path: String,
}

/// Room relay behaviour.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    /// Whether a chat message is also delivered back to the participant that sent it.
    pub echo_to_sender: bool,
}

/// Durable event log and diagnostics settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    /// Directory of the sled database backing the event log.
    pub path: String,
    /// Default tracing level, used when `RUST_LOG` is not set.
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ws_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub echo_to_sender: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub path: Option<String>,
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the relay has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                ws_path: "/ws".to_string(),
            },
            relay: RelaySettings {
                echo_to_sender: true,
            },
            log: LogSettings {
                path: "pairsub_log".to_string(),
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Overlays whatever the partial settings specify on top of the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let server = partial.server;
        let relay = partial.relay;
        let log = partial.log;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                ws_path: server
                    .as_ref()
                    .and_then(|s| s.ws_path.clone())
                    .unwrap_or(default.server.ws_path),
            },
            relay: RelaySettings {
                echo_to_sender: relay
                    .as_ref()
                    .and_then(|r| r.echo_to_sender)
                    .unwrap_or(default.relay.echo_to_sender),
            },
            log: LogSettings {
                path: log
                    .as_ref()
                    .and_then(|l| l.path.clone())
                    .unwrap_or(default.log.path),
                level: log
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.log.level),
            },
        }
    }

    /// `host:port` string the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
