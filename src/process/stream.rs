//! P2: a classified process presented as a seekable byte source.

use super::os_interface::{Address, ProcessOsInterface};
use super::region::{Kind, MemoryRegion, RegionIndex};

/// The selected subset of a process's classified regions, addressable
/// as a single contiguous stream.
pub struct ProcessStream<'a> {
    os: &'a dyn ProcessOsInterface,
    index: RegionIndex,
    /// `offsets[i]` is the stream offset at which `index`'s i-th region
    /// begins; `offsets.last()` is the stream length.
    offsets: Vec<u64>,
    position: u64,
}

impl<'a> ProcessStream<'a> {
    pub fn new(os: &'a dyn ProcessOsInterface, regions: Vec<MemoryRegion>, mask: &[Kind]) -> Self {
        let mut selected: Vec<MemoryRegion> = regions
            .into_iter()
            .filter(|r| mask.contains(&r.kind))
            .collect();
        selected.sort_by_key(|r| r.base);

        let mut offsets = Vec::with_capacity(selected.len() + 1);
        let mut running = 0u64;
        for r in &selected {
            offsets.push(running);
            running += r.size;
        }
        offsets.push(running);

        Self {
            os,
            index: RegionIndex::new(selected),
            offsets,
            position: 0,
        }
    }

    pub fn len(&self) -> u64 {
        *self.offsets.last().unwrap_or(&0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn seek(&mut self, pos: u64) {
        self.position = pos.min(self.len());
    }

    /// Locates the region (and its detail) backing a stream offset.
    pub fn region_at(&self, stream_offset: u64) -> Option<&MemoryRegion> {
        if stream_offset >= self.len() {
            return None;
        }
        let region_idx = self
            .offsets
            .partition_point(|&o| o <= stream_offset)
            .checked_sub(1)?;
        self.index.iter().nth(region_idx)
    }

    fn region_index_at(&self, stream_offset: u64) -> Option<usize> {
        if stream_offset >= self.len() {
            return None;
        }
        self.offsets
            .partition_point(|&o| o <= stream_offset)
            .checked_sub(1)
    }

    /// Copies up to `dst.len()` bytes starting at the current position,
    /// advancing it by the number of bytes copied. Non-readable bytes
    /// inside a selected region are zero-filled; reads may continue
    /// into the next selected region once one ends, but never cross
    /// past the end of the stream.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let mut written = 0;
        while written < dst.len() && self.position < self.len() {
            let Some(region_idx) = self.region_index_at(self.position) else {
                break;
            };
            let region = self.index.iter().nth(region_idx).unwrap();
            let region_start_offset = self.offsets[region_idx];
            let offset_in_region = self.position - region_start_offset;
            let remaining_in_region = region.size - offset_in_region;
            let want = (dst.len() - written) as u64;
            let chunk_len = want.min(remaining_in_region) as usize;

            let addr: Address = region.base + offset_in_region;
            let chunk = &mut dst[written..written + chunk_len];
            let actually_read = self.os.read_memory(addr, chunk);
            if actually_read < chunk_len {
                for b in &mut chunk[actually_read..] {
                    *b = 0;
                }
            }

            written += chunk_len;
            self.position += chunk_len as u64;
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::os_interface::RegionType;
    use crate::process::region::tests::FakeOsInterface;

    fn region(base: Address, size: u64, kind: Kind) -> MemoryRegion {
        MemoryRegion {
            base,
            size,
            allocation_base: base,
            region_type: RegionType::Private,
            kind,
            mapped_file: None,
            heap_id: None,
            thread_id: None,
            valid: true,
        }
    }

    #[test]
    fn len_sums_selected_region_sizes() {
        let os = FakeOsInterface::default();
        let regions = vec![
            region(0x1000, 0x10, Kind::PrivateData),
            region(0x2000, 0x20, Kind::NtHeap),
        ];
        let stream = ProcessStream::new(&os, regions, &[Kind::PrivateData, Kind::NtHeap]);
        assert_eq!(stream.len(), 0x30);
    }

    #[test]
    fn mask_excludes_unselected_kinds() {
        let os = FakeOsInterface::default();
        let regions = vec![
            region(0x1000, 0x10, Kind::PrivateData),
            region(0x2000, 0x20, Kind::Stack),
        ];
        let stream = ProcessStream::new(&os, regions, &[Kind::PrivateData]);
        assert_eq!(stream.len(), 0x10);
    }

    #[test]
    fn read_copies_bytes_and_advances_position() {
        let mut os = FakeOsInterface::default();
        os.memory.insert(0x1000, b"hello world".to_vec());
        let regions = vec![region(0x1000, 16, Kind::PrivateData)];
        let mut stream = ProcessStream::new(&os, regions, &[Kind::PrivateData]);

        let mut buf = [0u8; 5];
        let n = stream.read(&mut buf);
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.position(), 5);
    }

    #[test]
    fn short_os_read_zero_fills_remainder() {
        let mut os = FakeOsInterface::default();
        os.memory.insert(0x1000, b"ab".to_vec());
        let regions = vec![region(0x1000, 8, Kind::PrivateData)];
        let mut stream = ProcessStream::new(&os, regions, &[Kind::PrivateData]);

        let mut buf = [0xFFu8; 8];
        let n = stream.read(&mut buf);
        assert_eq!(n, 8);
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(&buf[2..], &[0u8; 6]);
    }

    #[test]
    fn read_continues_into_next_selected_region() {
        let mut os = FakeOsInterface::default();
        os.memory.insert(0x1000, b"AAAA".to_vec());
        os.memory.insert(0x2000, b"BBBB".to_vec());
        let regions = vec![
            region(0x1000, 4, Kind::PrivateData),
            region(0x2000, 4, Kind::PrivateData),
        ];
        let mut stream = ProcessStream::new(&os, regions, &[Kind::PrivateData]);

        let mut buf = [0u8; 8];
        let n = stream.read(&mut buf);
        assert_eq!(n, 8);
        assert_eq!(&buf, b"AAAABBBB");
    }

    #[test]
    fn region_at_reports_containing_region_kind() {
        let os = FakeOsInterface::default();
        let regions = vec![
            region(0x1000, 4, Kind::Stack),
            region(0x2000, 4, Kind::NtHeap),
        ];
        let stream = ProcessStream::new(&os, regions, &[Kind::Stack, Kind::NtHeap]);
        assert_eq!(stream.region_at(5).unwrap().kind, Kind::NtHeap);
        assert_eq!(stream.region_at(0).unwrap().kind, Kind::Stack);
        assert!(stream.region_at(100).is_none());
    }
}
