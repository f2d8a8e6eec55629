//! Event log backed by `sled`
//!
//! Each topic gets its own tree. Keys are big-endian ids from
//! `Db::generate_id`, which only grow, so iterating a tree yields the topic's
//! records in publish order.

use async_trait::async_trait;
use chrono::Utc;
use sled::Db;
use tracing::debug;

use crate::persistence::event_log::{EventLog, LogError, LogRecord};

#[derive(Clone)]
pub struct SledEventLog {
    db: Db,
}

impl SledEventLog {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str) -> Result<Self, LogError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Append a record to the topic's tree and return its sequence id.
    pub fn append(&self, topic: &str, payload: &str) -> Result<u64, LogError> {
        let record = LogRecord {
            topic: topic.to_string(),
            payload: payload.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let serialized = serde_json::to_vec(&record)?;

        let id = self.db.generate_id()?;
        let tree = self.db.open_tree(topic)?;
        tree.insert(id.to_be_bytes(), serialized)?;
        Ok(id)
    }

    /// All records of a topic in publish order. Entries that fail to decode
    /// are skipped.
    pub fn records(&self, topic: &str) -> Result<Vec<LogRecord>, LogError> {
        let tree = self.db.open_tree(topic)?;
        let mut records = Vec::with_capacity(tree.len());
        for entry in tree.iter() {
            let (_, value) = entry?;
            if let Ok(record) = serde_json::from_slice(&value) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl EventLog for SledEventLog {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), LogError> {
        let id = self.append(topic, payload)?;
        debug!("Logged record {id} under {topic}");
        Ok(())
    }

    async fn flush(&self) -> Result<(), LogError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

impl std::fmt::Debug for SledEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledEventLog")
            .field("db", &"sled::Db")
            .finish()
    }
}
