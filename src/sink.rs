//! C5: ordered, buffered emission of results with provenance.

use std::io::Write;
use std::sync::Mutex;

use crate::error::{ScanError, ScanOutcome};
use crate::process::Kind as RegionKind;
use crate::ByteCounter;

/// Provenance attached to a `Result` originating from a process source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessProvenance {
    pub pid: u32,
    pub executable_path: Option<String>,
    pub region_kind: RegionKind,
    /// Heap id, thread id, or mapped-file name, rendered for display.
    pub region_detail: Option<String>,
}

/// One emitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub offset: ByteCounter,
    pub encoding: &'static str,
    pub byte_len: usize,
    pub text: String,
    pub process_info: Option<ProcessProvenance>,
}

impl PartialOrd for ScanResult {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScanResult {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.offset
            .cmp(&other.offset)
            .then_with(|| self.encoding.cmp(other.encoding))
    }
}

/// C5's contract. Implementations must be safe to call concurrently.
pub trait Sink: Send + Sync {
    fn emit(&self, result: ScanResult) -> ScanOutcome<()>;
    fn flush(&self) -> ScanOutcome<()>;
    fn close(&self) -> ScanOutcome<()> {
        self.flush()
    }
}

/// Minimal plain-text writer exercising the sink contract. Richer
/// output formats (CSV/XML/JSON) are an external collaborator's job.
pub struct BufferedSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> BufferedSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Sink for BufferedSink<W> {
    fn emit(&self, result: ScanResult) -> ScanOutcome<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| ScanError::Sink("output lock poisoned".to_string()))?;
        writeln!(
            out,
            "{:>10} ({}) {}",
            result.offset, result.encoding, result.text
        )
        .map_err(|e| ScanError::Sink(e.to_string()))
    }

    fn flush(&self) -> ScanOutcome<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| ScanError::Sink("output lock poisoned".to_string()))?;
        out.flush().map_err(|e| ScanError::Sink(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(offset: ByteCounter, text: &str) -> ScanResult {
        ScanResult {
            offset,
            encoding: "UTF-8",
            byte_len: text.len(),
            text: text.to_string(),
            process_info: None,
        }
    }

    #[test]
    fn buffered_sink_writes_each_result() {
        let sink = BufferedSink::new(Vec::new());
        sink.emit(result(0, "Hello")).unwrap();
        sink.emit(result(6, "World")).unwrap();
        sink.flush().unwrap();
        let out = sink.out.lock().unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
    }

    #[test]
    fn results_order_by_offset_then_encoding() {
        let mut v = vec![result(6, "b"), result(0, "a"), result(0, "c")];
        v.sort();
        assert_eq!(v[0].offset, 0);
        assert_eq!(v[2].offset, 6);
    }
}
