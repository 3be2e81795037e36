//! G1: validated scan configuration, independent of any CLI crate.

use crate::blockset::BlockSet;
use crate::decode::{ByteOrder, EncodingKind};
use crate::error::{ScanError, ScanOutcome};
use crate::filter::Filter;
use crate::process::Kind as RegionKind;

pub const DEFAULT_MIN_LENGTH: u8 = 3;
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

#[derive(Debug, Clone)]
pub enum SourceSelector {
    File(std::path::PathBuf),
    Processes(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingSet {
    ascii: bool,
    utf8: bool,
    utf16le: bool,
    utf16be: bool,
}

impl EncodingSet {
    pub fn new(ascii: bool, utf8: bool, utf16le: bool, utf16be: bool) -> Self {
        Self {
            ascii,
            utf8,
            utf16le,
            utf16be,
        }
    }

    pub fn default_set() -> Self {
        Self::new(false, true, true, false)
    }

    /// Drops ASCII when UTF-8 is also selected: UTF-8 is a superset for
    /// printable characters in any chosen block set, so keeping both
    /// would duplicate every ASCII run as a UTF-8 run.
    pub fn normalized(mut self) -> Self {
        if self.utf8 && self.ascii {
            self.ascii = false;
        }
        self
    }

    pub fn kinds(&self) -> Vec<EncodingKind> {
        let mut kinds = Vec::new();
        if self.ascii {
            kinds.push(EncodingKind::Ascii);
        }
        if self.utf8 {
            kinds.push(EncodingKind::Utf8);
        }
        if self.utf16le {
            kinds.push(EncodingKind::Utf16(ByteOrder::Le));
        }
        if self.utf16be {
            kinds.push(EncodingKind::Utf16(ByteOrder::Be));
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        !self.ascii && !self.utf8 && !self.utf16le && !self.utf16be
    }
}

/// The validated, crate-internal configuration for one scan.
///
/// Construct via [`ScanConfig::new`]; all §6 option validation happens
/// there, never at the point of use.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub source: SourceSelector,
    pub encodings: EncodingSet,
    pub blocks: BlockSet,
    pub start_offset: u64,
    pub bytes_to_scan: u64,
    pub min_length: u8,
    pub buffer_size: usize,
    pub exclude_control_cp: bool,
    pub region_mask: Vec<RegionKind>,
    pub filter: Filter,
    pub sync: bool,
    pub parallel_items: bool,
}

impl ScanConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: SourceSelector,
        encodings: EncodingSet,
        blocks: BlockSet,
        start_offset: u64,
        bytes_to_scan: u64,
        min_length: u8,
        buffer_size: usize,
        exclude_control_cp: bool,
        region_mask: Vec<RegionKind>,
        filter: Filter,
        sync: bool,
        parallel_items: bool,
    ) -> ScanOutcome<Self> {
        if min_length == 0 {
            return Err(ScanError::Config(
                "min_length must be a positive integer".to_string(),
            ));
        }
        if buffer_size == 0 {
            return Err(ScanError::Config(
                "buffer_size must be a positive integer".to_string(),
            ));
        }
        if buffer_size > MAX_BUFFER_SIZE {
            return Err(ScanError::Config(format!(
                "buffer_size {buffer_size} exceeds the maximum of {MAX_BUFFER_SIZE}"
            )));
        }
        let encodings = encodings.normalized();
        if encodings.is_empty() {
            return Err(ScanError::Config(
                "at least one encoding must be selected".to_string(),
            ));
        }
        if region_mask.is_empty() {
            return Err(ScanError::Config(
                "region_mask must name at least one region kind".to_string(),
            ));
        }

        Ok(Self {
            source,
            encodings,
            blocks,
            start_offset,
            bytes_to_scan,
            min_length,
            buffer_size,
            exclude_control_cp,
            region_mask,
            filter,
            sync,
            parallel_items,
        })
    }

    /// Range validation that needs the source's length, performed by
    /// the orchestrator at source-open time (step 2 of §4.6): not
    /// folded into `new` because the length isn't known until then.
    pub fn validate_against_length(&self, length: u64) -> ScanOutcome<(u64, u64)> {
        if self.start_offset >= length {
            return Err(ScanError::OutOfRange(format!(
                "start_offset {} is not less than source length {length}",
                self.start_offset
            )));
        }
        let remaining = length - self.start_offset;
        let bytes_to_scan = if self.bytes_to_scan == 0 {
            remaining
        } else {
            self.bytes_to_scan
        };
        if bytes_to_scan > remaining {
            return Err(ScanError::OutOfRange(format!(
                "bytes_to_scan {bytes_to_scan} exceeds remaining length {remaining}"
            )));
        }
        let buffer_size = (self.buffer_size as u64).min(length.max(1)) as u64;
        Ok((bytes_to_scan, buffer_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_length: u8, buffer_size: usize) -> ScanOutcome<ScanConfig> {
        ScanConfig::new(
            SourceSelector::File("/tmp/x".into()),
            EncodingSet::default_set(),
            BlockSet::new(),
            0,
            0,
            min_length,
            buffer_size,
            true,
            vec![RegionKind::PrivateData],
            Filter::none(),
            false,
            false,
        )
    }

    #[test]
    fn zero_min_length_is_rejected() {
        assert!(matches!(config(0, 1024), Err(ScanError::Config(_))));
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        assert!(matches!(config(3, 0), Err(ScanError::Config(_))));
    }

    #[test]
    fn ascii_is_dropped_when_utf8_also_selected() {
        let set = EncodingSet::new(true, true, false, false).normalized();
        assert_eq!(set.kinds(), vec![EncodingKind::Utf8]);
    }

    #[test]
    fn out_of_range_start_offset_is_rejected() {
        let cfg = config(3, 1024).unwrap();
        let mut cfg = cfg;
        cfg.start_offset = 100;
        assert!(matches!(
            cfg.validate_against_length(100),
            Err(ScanError::OutOfRange(_))
        ));
    }

    #[test]
    fn zero_bytes_to_scan_means_all_remaining() {
        let cfg = config(3, 1024).unwrap();
        let (bytes_to_scan, _) = cfg.validate_against_length(500).unwrap();
        assert_eq!(bytes_to_scan, 500);
    }
}
