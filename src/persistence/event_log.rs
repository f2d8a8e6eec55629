use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the event log.
///
/// `timestamp` is milliseconds since the UNIX epoch, taken when the entry is
/// appended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Append-only publish target, one stream per topic.
///
/// Implementations must keep publishes to the same topic in call order.
/// Nothing is guaranteed across topics.
#[async_trait]
pub trait EventLog: Send + Sync + std::fmt::Debug {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), LogError>;

    /// Make everything published so far durable.
    async fn flush(&self) -> Result<(), LogError>;
}
