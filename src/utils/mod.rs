//! The `utils` module provides the pieces shared by every other module of the
//! relay: the top-level error type and tracing initialisation.

pub mod error;
pub mod logging;

pub use error::RelayError;
