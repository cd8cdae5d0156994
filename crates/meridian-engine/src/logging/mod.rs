//! Logging utilities.
//!
//! Centralizes logger initialization. Library code logs through the `log`
//! facade only; `env_logger` is installed by the binary.

mod init;

pub use init::{LoggingConfig, init_logging};
