//! Extracts printable, Unicode-block-filtered text runs from binary
//! byte sources and from live process memory.
//!
//! The crate root wires together the constant-time classifier (C1),
//! the block set (C2), the three streaming decoders (C3), the filter
//! (C4), the sink (C5), and the scan orchestrator (C6); `process`
//! supplies the classifier (P1) and stream (P2) used by process
//! sources. `main.rs` is a thin `clap`-based front end over
//! [`config::ScanConfig`].

pub mod blockset;
pub mod classify;
pub mod config;
pub mod decode;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod process;
pub mod sink;
pub mod source;

/// A running byte offset into a source; wide enough for any file or
/// process-memory region this crate will ever address.
pub type ByteCounter = u64;
