//! The `persistence` module provides the durable event log every chat message
//! is republished to.
//!
//! The relay only appends; reading the log back is left to downstream
//! consumers. [`EventLog`] is the seam between the session handler and the
//! storage backend: [`SledEventLog`] keeps one `sled` tree per topic, and
//! [`MemoryEventLog`] backs tests.

pub mod event_log;
pub mod memory;
pub mod sled_log;

pub use event_log::{EventLog, LogError, LogRecord};
pub use memory::MemoryEventLog;
pub use sled_log::SledEventLog;
