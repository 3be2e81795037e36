//! C3: the three streaming byte-run decoders.
//!
//! Each decoder is a free function with the shared `try_decode`
//! signature from the design; [`EncodingKind`] dispatches to the right
//! one by tagged variant instead of a trait object, keeping the hot
//! scan loop free of dynamic dispatch (see DESIGN.md).

mod ascii;
mod utf16;
mod utf8;

use crate::blockset::BlockSet;
use crate::ByteCounter;

/// Byte order for the UTF-16 decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Le,
    Be,
}

/// Which of the three encodings a `DecodeInformation` drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    Ascii,
    Utf8,
    Utf16(ByteOrder),
}

impl EncodingKind {
    pub fn label(&self) -> &'static str {
        match self {
            EncodingKind::Ascii => "ASCII",
            EncodingKind::Utf8 => "UTF-8",
            EncodingKind::Utf16(ByteOrder::Le) => "UTF-16LE",
            EncodingKind::Utf16(ByteOrder::Be) => "UTF-16BE",
        }
    }

    fn try_decode(
        &self,
        buffer: &[u8],
        state: &mut DecodeInformation,
        blocks: &BlockSet,
    ) -> Option<DecodedRun> {
        match self {
            EncodingKind::Ascii => ascii::try_decode(buffer, state),
            EncodingKind::Utf8 => utf8::try_decode(buffer, state, blocks),
            EncodingKind::Utf16(order) => utf16::try_decode(buffer, state, blocks, *order),
        }
    }
}

/// Raw output keeps the decoded run as its native UTF-8 text; unicode
/// output additionally transcodes it to UTF-16LE via `encoding_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Raw,
    Unicode,
}

/// Persists across buffers for one (source, encoding) pair.
#[derive(Debug, Clone)]
pub struct DecodeInformation {
    pub min_length: u8,
    /// Offset within the *current* buffer; reset to 0 each buffer.
    pub offset: usize,
    /// Cumulative bytes processed by this decoder across all buffers.
    pub running_offset: ByteCounter,
    pub exclude_control_cp: bool,
    pub output_encoding: OutputEncoding,
    pub encoding: EncodingKind,
    /// False once this decoder has exhausted the current buffer; the
    /// orchestrator elides a decoder that is no longer running.
    pub running: bool,
}

impl DecodeInformation {
    pub fn new(encoding: EncodingKind, min_length: u8, exclude_control_cp: bool, output_encoding: OutputEncoding) -> Self {
        Self {
            min_length: min_length.max(1),
            offset: 0,
            running_offset: 0,
            exclude_control_cp,
            output_encoding,
            encoding,
            running: true,
        }
    }

    /// Reset the per-buffer offset and running flag at the start of a
    /// new buffer; the running total is untouched.
    pub fn begin_buffer(&mut self) {
        self.offset = 0;
        self.running = true;
    }

    fn try_decode(&mut self, buffer: &[u8], blocks: &BlockSet) -> Option<DecodedRun> {
        let before = self.offset;
        let result = self.encoding.try_decode(buffer, self, blocks);
        self.running_offset += (self.offset - before) as ByteCounter;
        if self.offset >= buffer.len() {
            self.running = false;
        }
        result
    }
}

/// One accepted run from a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRun {
    /// Always valid UTF-8: the decoded characters, independent of the
    /// output encoding (transcoding to UTF-16LE is a presentation
    /// concern handled separately, see `to_output_bytes`).
    pub text: String,
    /// How far `DecodeInformation::offset` advanced on this call.
    pub bytes_consumed: usize,
    /// Byte length of the accepted run itself (excludes any trailing
    /// breaking unit) — this is `Result`'s "byte length of the
    /// matched slice".
    pub payload_bytes: usize,
}

impl DecodedRun {
    /// Render this run in the requested output encoding.
    pub fn to_output_bytes(&self, output_encoding: OutputEncoding) -> Vec<u8> {
        match output_encoding {
            OutputEncoding::Raw => self.text.as_bytes().to_vec(),
            OutputEncoding::Unicode => {
                let (encoded, _, _) = encoding_rs::UTF_16LE.encode(&self.text);
                encoded.into_owned()
            }
        }
    }
}

/// Drive `state`'s decoder once over `buffer`, starting at
/// `state.offset`. Thin wrapper kept so the orchestrator never has to
/// reach into `EncodingKind` directly.
pub fn drive_once(
    state: &mut DecodeInformation,
    buffer: &[u8],
    blocks: &BlockSet,
) -> Option<DecodedRun> {
    state.try_decode(buffer, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockset::BlockSet;

    #[test]
    fn unicode_output_transcodes_to_utf16le() {
        let run = DecodedRun {
            text: "Hi".to_string(),
            bytes_consumed: 2,
            payload_bytes: 2,
        };
        assert_eq!(
            run.to_output_bytes(OutputEncoding::Unicode),
            vec![b'H', 0, b'i', 0]
        );
    }

    #[test]
    fn raw_output_is_passthrough() {
        let run = DecodedRun {
            text: "Hi".to_string(),
            bytes_consumed: 2,
            payload_bytes: 2,
        };
        assert_eq!(run.to_output_bytes(OutputEncoding::Raw), b"Hi".to_vec());
    }

    #[test]
    fn decoder_marks_itself_stopped_at_buffer_end() {
        let mut state = DecodeInformation::new(EncodingKind::Ascii, 3, true, OutputEncoding::Raw);
        let blocks = BlockSet::new();
        let buf = b"Hello";
        drive_once(&mut state, buf, &blocks);
        assert!(!state.running);
        assert_eq!(state.offset, buf.len());
    }
}
