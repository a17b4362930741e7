//! Tracing setup: structured JSON logs, plus OTLP span export when a
//! collector endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - **No field contents, passwords, or key material** may appear in any span
//!   attribute or log field. Log lengths and identifiers instead.
//! - Log level is configurable via `RUST_LOG`, falling back to `LOG_LEVEL`
//!   (default: `info`).

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
