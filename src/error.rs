//! Typed error kinds for the scanning core.
//!
//! The library surfaces structured errors via [`ScanError`]; the CLI
//! boundary (`main.rs`) wraps configuration and I/O failures with
//! `anyhow::Context` before printing them.

use thiserror::Error;

/// One of the error kinds a scan can fail with.
///
/// `PartialReadTolerated` from the design notes is deliberately absent
/// here: a short read is a normal return value, not a failure.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not open source `{source_name}`: {cause}")]
    SourceOpen {
        source_name: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("read error on source `{source_name}`: {cause}")]
    OsRead {
        source_name: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error("sink error: {0}")]
    Sink(String),
}

/// Convenience alias; named `ScanOutcome` (not `ScanResult`) to avoid
/// clashing with `sink::ScanResult`, the emitted-record type.
pub type ScanOutcome<T> = std::result::Result<T, ScanError>;
