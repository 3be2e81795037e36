//! §4.3.3 UTF-8 decoder.
//!
//! Implemented directly over the leading-byte dispatch table from the
//! design rather than through a generic decoder, because the exact
//! `bytes_consumed` / overlong / surrogate semantics required here are
//! more specific than a general-purpose UTF-8 validator provides.

use super::{DecodeInformation, DecodedRun};
use crate::blockset::BlockSet;
use crate::classify::{block_of, is_printable};

enum Step {
    /// Accepted a character that is `len` bytes long, code point `cp`.
    Accept { len: usize, cp: u32 },
    /// Not enough bytes left in the buffer to resolve this candidate;
    /// stop here, no breaking unit consumed.
    EndOfBuffer,
    /// The run ends here; `extra` bytes of the rejected candidate are
    /// still consumed (progress guarantee).
    Break { extra: usize },
}

fn step(buffer: &[u8], i: usize, exclude_cc: bool) -> Step {
    let leading = buffer[i];

    if leading < 0x80 {
        return if is_printable(leading, exclude_cc) {
            Step::Accept {
                len: 1,
                cp: leading as u32,
            }
        } else {
            Step::Break { extra: 1 }
        };
    }

    if (0x80..=0xBF).contains(&leading) || leading == 0xC0 || leading == 0xC1 || leading >= 0xF5 {
        return Step::Break { extra: 1 };
    }

    if (0xC2..=0xDF).contains(&leading) {
        if i + 2 > buffer.len() {
            return Step::EndOfBuffer;
        }
        let c1 = buffer[i + 1];
        if !(0x80..=0xBF).contains(&c1) {
            return Step::Break { extra: 2 };
        }
        let cp = ((leading as u32 - 0xC0) << 6) | (c1 as u32 - 0x80);
        return Step::Accept { len: 2, cp };
    }

    if (0xE0..=0xEF).contains(&leading) {
        if i + 3 > buffer.len() {
            return Step::EndOfBuffer;
        }
        let c1 = buffer[i + 1];
        let c2 = buffer[i + 2];
        if !(0x80..=0xBF).contains(&c1) || !(0x80..=0xBF).contains(&c2) {
            return Step::Break { extra: 3 };
        }
        let cp = ((leading as u32 - 0xE0) << 12) | ((c1 as u32 - 0x80) << 6) | (c2 as u32 - 0x80);
        if cp < 0x0800 || (0xD800..=0xDFFF).contains(&cp) {
            return Step::Break { extra: 3 };
        }
        return Step::Accept { len: 3, cp };
    }

    // 0xF0..=0xF4: four-byte form, always breaks; non-BMP is out of scope.
    debug_assert!((0xF0..=0xF4).contains(&leading));
    Step::Break {
        extra: (4).min(buffer.len() - i),
    }
}

pub(super) fn try_decode(
    buffer: &[u8],
    state: &mut DecodeInformation,
    blocks: &BlockSet,
) -> Option<DecodedRun> {
    let start = state.offset;
    let mut i = start;
    let mut run_block: Option<u8> = None;
    let mut char_count = 0usize;
    let mut breaking_extra = 0usize;

    loop {
        if i >= buffer.len() {
            break;
        }
        match step(buffer, i, state.exclude_control_cp) {
            Step::EndOfBuffer => break,
            Step::Break { extra } => {
                breaking_extra = extra;
                break;
            }
            Step::Accept { len, cp } => {
                if len == 1 {
                    // ASCII fast path: no block check, doesn't fix run_block.
                    char_count += 1;
                    i += len;
                    continue;
                }
                let tag = block_of(cp as u16);
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
                    breaking_extra = len;
                    break;
                }
                char_count += 1;
                i += len;
            }
        }
    }

    let payload_bytes = i - start;
    let bytes_consumed = payload_bytes + breaking_extra;
    state.offset = start + bytes_consumed;

    if char_count < state.min_length as usize {
        return None;
    }

    let text = std::str::from_utf8(&buffer[start..start + payload_bytes])
        .expect("accepted run is always valid UTF-8")
        .to_string();

    Some(DecodedRun {
        text,
        bytes_consumed,
        payload_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodeInformation, EncodingKind, OutputEncoding};

    fn state(min_length: u8) -> DecodeInformation {
        DecodeInformation::new(EncodingKind::Utf8, min_length, true, OutputEncoding::Raw)
    }

    #[test]
    fn scenario_4_four_byte_always_breaks() {
        let buf = [
            0x41, 0x42, 0x43, 0xF0, 0x9F, 0x98, 0x80, 0x44, 0x45, 0x46,
        ];
        let mut st = state(3);
        let blocks = BlockSet::new();
        let r1 = super::try_decode(&buf, &mut st, &blocks).unwrap();
        assert_eq!(r1.text, "ABC");
        assert_eq!(r1.bytes_consumed, 7); // 3 accepted + 4-byte breaking seq

        let r2 = super::try_decode(&buf, &mut st, &blocks).unwrap();
        assert_eq!(r2.text, "DEF");
        assert_eq!(r2.bytes_consumed, 3);
    }

    #[test]
    fn scenario_3_snowman_in_misc_symbols_block() {
        let buf = [
            0xE2, 0x98, 0x83, 0xE2, 0x98, 0x83, 0xE2, 0x98, 0x83, 0x00,
        ];
        let blocks = BlockSet::from_names(["MiscellaneousSymbols"].into_iter()).unwrap();
        let mut st = state(3);
        let r = super::try_decode(&buf, &mut st, &blocks).unwrap();
        assert_eq!(r.text, "\u{2603}\u{2603}\u{2603}");
        assert_eq!(r.payload_bytes, 9);
    }

    #[test]
    fn scenario_3_with_basic_latin_only_emits_nothing() {
        let buf = [
            0xE2, 0x98, 0x83, 0xE2, 0x98, 0x83, 0xE2, 0x98, 0x83, 0x00,
        ];
        let blocks = BlockSet::new(); // BasicLatin only
        let mut st = state(3);
        let r = super::try_decode(&buf, &mut st, &blocks);
        assert!(r.is_none());
    }

    #[test]
    fn overlong_two_byte_sequence_is_rejected() {
        // 0xC0 0x80 would overlong-encode NUL; 0xC0 is an invalid
        // leading byte outright and must break immediately.
        let buf = [0xC0, 0x80, b'a', b'b', b'c'];
        let blocks = BlockSet::new();
        let mut st = state(1);
        let r = super::try_decode(&buf, &mut st, &blocks);
        assert!(r.is_none());
        assert_eq!(st.offset, 1);
    }

    #[test]
    fn surrogate_encoded_in_three_bytes_is_rejected() {
        // 0xED 0xA0 0x80 would encode U+D800, a surrogate.
        let buf = [0xED, 0xA0, 0x80];
        let blocks = BlockSet::new();
        let mut st = state(1);
        let r = super::try_decode(&buf, &mut st, &blocks);
        assert!(r.is_none());
        assert_eq!(st.offset, 3);
    }

    #[test]
    fn incompatible_block_breaks_run_before_consuming_it() {
        // Latin "ab" then a Cyrillic character; blocks = BasicLatin only.
        let mut buf = vec![b'a', b'b'];
        buf.extend_from_slice("\u{0410}".as_bytes()); // CYRILLIC CAPITAL А
        let blocks = BlockSet::new();
        let mut st = state(1);
        let r = super::try_decode(&buf, &mut st, &blocks).unwrap();
        assert_eq!(r.text, "ab");
        assert_eq!(r.bytes_consumed, 4); // 2 latin + 2-byte cyrillic breaking unit
    }
}
