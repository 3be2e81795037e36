//! §4.3.1 ASCII decoder: byte-by-byte, no block concept at all.

use super::{DecodeInformation, DecodedRun};
use crate::classify::is_printable;

pub(super) fn try_decode(buffer: &[u8], state: &mut DecodeInformation) -> Option<DecodedRun> {
    let start = state.offset;
    let mut i = start;
    while i < buffer.len() && is_printable(buffer[i], state.exclude_control_cp) {
        i += 1;
    }
    let payload_bytes = i - start;

    // Open question (preserved, not "fixed"): the breaking byte is
    // consumed even when the run is rejected for being too short.
    // This guarantees forward progress on pathological buffers.
    let breaking_byte_consumed = i < buffer.len();
    let bytes_consumed = payload_bytes + usize::from(breaking_byte_consumed);
    state.offset = start + bytes_consumed;

    if payload_bytes < state.min_length as usize {
        return None;
    }

    let text = std::str::from_utf8(&buffer[start..start + payload_bytes])
        .expect("printable ASCII bytes are always valid UTF-8")
        .to_string();

    Some(DecodedRun {
        text,
        bytes_consumed,
        payload_bytes,
    })
}
