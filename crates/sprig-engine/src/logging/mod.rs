//! Logger set-up for binaries built on the renderer.
//!
//! Library code only talks to the `log` facade; this wires it to `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
