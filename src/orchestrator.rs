//! C6: the scan orchestrator.
//!
//! Drives one or more `DecodeInformation`s over a source's bytes,
//! buffer by buffer, and hands accepted runs to the sink. The
//! sequential driver mirrors the original single-thread-per-mission
//! shape this codebase is built around; the parallel driver fans the
//! live decoders of one buffer out onto a `scoped_threadpool::Pool`
//! and merges their output with `itertools::kmerge()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::decode::{drive_once, DecodeInformation, DecodedRun, OutputEncoding};
use crate::error::ScanOutcome;
use crate::sink::{ProcessProvenance, ScanResult, Sink};
use crate::source::Source;
use crate::ByteCounter;

/// A decoded run paired with the encoding that produced it, used to
/// order multi-encoding output within one buffer.
struct TaggedRun {
    label: &'static str,
    source_offset: ByteCounter,
    run: DecodedRun,
}

impl TaggedRun {
    fn key(&self) -> ByteCounter {
        self.source_offset
    }
}

/// Runs one scan to completion against `source`, emitting results to
/// `sink`. `cancel` is checked before each buffer read and before each
/// decoder step; when set, the scan stops and already-emitted results
/// are retained.
pub fn run(
    config: &ScanConfig,
    source: &mut dyn Source,
    sink: &dyn Sink,
    cancel: &Arc<AtomicBool>,
) -> ScanOutcome<()> {
    let span = tracing::info_span!(
        "scan_source",
        source = source.name(),
        length = source.len(),
        start_offset = config.start_offset,
    );
    let _enter = span.enter();

    let length = source.len();
    let (bytes_to_scan, buffer_size) = config.validate_against_length(length)?;

    let mut decoders: Vec<(&'static str, DecodeInformation)> = config
        .encodings
        .kinds()
        .into_iter()
        .map(|kind| {
            let label = kind.label();
            let mut state = DecodeInformation::new(
                kind,
                config.min_length,
                config.exclude_control_cp,
                OutputEncoding::Raw,
            );
            // Results are reported at source-relative (file/process)
            // offsets, not buffer-relative ones, so the running total
            // must start at `start_offset` rather than 0.
            state.running_offset = config.start_offset;
            (label, state)
        })
        .collect();

    let mut buffer = vec![0u8; buffer_size as usize];
    let mut source_offset = config.start_offset;
    let end_offset = config.start_offset + bytes_to_scan;

    while source_offset < end_offset {
        if cancel.load(Ordering::Relaxed) {
            debug!(source_offset, "scan cancelled before buffer read");
            return Err(crate::error::ScanError::Cancelled);
        }

        let want = ((end_offset - source_offset) as usize).min(buffer.len());
        let read_buf = &mut buffer[..want];
        let read_n = source.read_at(source_offset, read_buf)?;
        if read_n == 0 {
            break;
        }
        let buf = &buffer[..read_n];

        debug!(bytes_read = read_n, running_offset = source_offset, "buffer read");

        let runs = if config.sync {
            drive_sequential(buf, &mut decoders, &config.blocks, cancel)
        } else {
            drive_parallel(buf, &mut decoders, &config.blocks, cancel)
        };

        for tagged in runs {
            if !config.filter.is_match(&tagged.run.text) {
                continue;
            }
            let process_info = source
                .region_kind_at(tagged.source_offset)
                .map(|(kind, detail)| ProcessProvenance {
                    pid: source.process_context().map(|c| c.pid).unwrap_or(0),
                    executable_path: source
                        .process_context()
                        .and_then(|c| c.executable_path.clone()),
                    region_kind: kind,
                    region_detail: detail,
                });
            sink.emit(ScanResult {
                offset: tagged.source_offset,
                encoding: tagged.label,
                byte_len: tagged.run.payload_bytes,
                text: tagged.run.text,
                process_info,
            })
            .map_err(|e| {
                warn!("sink error, aborting source");
                e
            })?;
        }

        source_offset += read_n as ByteCounter;
        if read_n < want {
            break; // short read: end of source
        }
    }

    sink.flush()?;
    Ok(())
}

/// Sequential per-buffer driver (§4.6): round-robin each live decoder
/// exactly once per outer iteration until all report "not running".
fn drive_sequential(
    buf: &[u8],
    decoders: &mut [(&'static str, DecodeInformation)],
    blocks: &crate::blockset::BlockSet,
    cancel: &Arc<AtomicBool>,
) -> Vec<TaggedRun> {
    let mut out = Vec::new();
    for (_, state) in decoders.iter_mut() {
        state.begin_buffer();
    }

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let mut any_running = false;
        for (label, state) in decoders.iter_mut() {
            let label = *label;
            if !state.running {
                continue;
            }
            any_running = true;
            let before = state.running_offset;
            if let Some(run) = drive_once(state, buf, blocks) {
                out.push(TaggedRun {
                    label,
                    source_offset: before,
                    run,
                });
            }
        }
        if !any_running {
            break;
        }
    }
    out.sort_by_key(TaggedRun::key);
    out
}

/// Parallel per-buffer driver (§4.6, §5): one task per live decoder on
/// a `scoped_threadpool::Pool`, each pushing runs to an
/// `mpsc::sync_channel` a single merger drains with `kmerge()`.
fn drive_parallel(
    buf: &[u8],
    decoders: &mut [(&'static str, DecodeInformation)],
    blocks: &crate::blockset::BlockSet,
    cancel: &Arc<AtomicBool>,
) -> Vec<TaggedRun> {
    for (_, state) in decoders.iter_mut() {
        state.begin_buffer();
    }

    let (tx, rx) = mpsc::sync_channel::<Vec<TaggedRun>>(decoders.len().max(1));
    let mut pool = scoped_threadpool::Pool::new(decoders.len().max(1) as u32);

    pool.scoped(|scope| {
        for (label, state) in decoders.iter_mut() {
            let tx = tx.clone();
            let cancel = Arc::clone(cancel);
            let label = *label;
            scope.execute(move || {
                let mut out = Vec::new();
                while state.running {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let before = state.running_offset;
                    if let Some(run) = drive_once(state, buf, blocks) {
                        out.push(TaggedRun {
                            label,
                            source_offset: before,
                            run,
                        });
                    }
                }
                let _ = tx.send(out);
            });
        }
    });
    drop(tx);

    let per_decoder: Vec<Vec<TaggedRun>> = rx.iter().collect();
    per_decoder
        .into_iter()
        .kmerge_by(|a, b| a.key() < b.key())
        .collect()
}
