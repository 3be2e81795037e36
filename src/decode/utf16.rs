//! §4.3.2 UTF-16 decoder, parameterized over byte order.

use super::{ByteOrder, DecodeInformation, DecodedRun};
use crate::blockset::BlockSet;
use crate::classify::is_printable;

fn code_unit(b0: u8, b1: u8, order: ByteOrder) -> u16 {
    match order {
        ByteOrder::Le => u16::from_le_bytes([b0, b1]),
        ByteOrder::Be => u16::from_be_bytes([b0, b1]),
    }
}

pub(super) fn try_decode(
    buffer: &[u8],
    state: &mut DecodeInformation,
    blocks: &BlockSet,
    order: ByteOrder,
) -> Option<DecodedRun> {
    let start = state.offset;
    let mut i = start;
    let mut run_block: Option<u8> = None;
    let mut text = String::new();

    // 0 = ended at buffer boundary (no breaking unit), 2 = breaking
    // code unit was read and is consumed.
    let mut breaking_unit_len = 0usize;

    loop {
        if i + 2 > buffer.len() {
            break;
        }
        let cp = code_unit(buffer[i], buffer[i + 1], order);

        if cp < 0x100 && is_printable(cp as u8, state.exclude_control_cp) {
            // Fast path: the code unit is a plain printable ASCII byte
            // with a zero high byte. No block check, does not fix or
            // need to match `run_block`.
            text.push(cp as u8 as char);
            i += 2;
            continue;
        }

        let is_surrogate = (0xD800..=0xDFFF).contains(&cp);
        let tag = if is_surrogate { None } else { crate::classify::block_of(cp) };

        let accept = match tag {
            None => false,
            Some(t) => {
                if !blocks.contains(t) {
                    false
                } else {
                    match run_block {
                        None => {
                            run_block = Some(t);
                            true
                        }
                        Some(rb) => blocks.compatible(rb, t),
                    }
                }
            }
        };

        if !accept {
            breaking_unit_len = 2;
            break;
        }

        text.push(char::from_u32(cp as u32).expect("non-surrogate BMP code point"));
        i += 2;
    }

    let payload_bytes = i - start;
    let bytes_consumed = payload_bytes + breaking_unit_len;
    state.offset = start + bytes_consumed;

    // Threshold is compared in code units (bytes / 2).
    if payload_bytes / 2 < state.min_length as usize {
        return None;
    }

    Some(DecodedRun {
        text,
        bytes_consumed,
        payload_bytes,
    })
}
