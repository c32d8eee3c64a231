//! Shared utilities for the tessera wallet engine.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
