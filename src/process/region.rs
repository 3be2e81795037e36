//! P1: the region classifier.
//!
//! Turns the raw region list an OS query returns into regions tagged
//! with a [`Kind`], by cross-referencing the PEB, thread TEBs, heap
//! list, and a handful of well-known fixed addresses.

use std::collections::HashMap;

use tracing::debug;

use super::os_interface::{
    Address, HeapSegmentHeader, ProcessOsInterface, RawRegion, RegionType,
    ACTIVATION_CONTEXT_MAGIC, HEAP_SEGMENT_SIGNATURE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Unknown,
    UserSharedData,
    HypervisorSharedData,
    Peb,
    Teb,
    Stack,
    NtHeap,
    NtHeapSegment,
    SegmentHeap,
    SegmentHeapSegment,
    PrivateData,
    Image,
    MappedFile,
    Shareable,
    ApiSetMap,
    ReadOnlySharedMemory,
    CodePageData,
    GdiSharedHandleTable,
    ShimData,
    ProcessActivationContext,
    SystemActivationContext,
    WerRegistrationData,
    SiloSharedData,
    TelemetryCoverage,
    ActivationContextData,
}

/// A classified region: the raw OS view plus everything §4.7 derives.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    pub base: Address,
    pub size: u64,
    pub allocation_base: Address,
    pub region_type: RegionType,
    pub kind: Kind,
    pub mapped_file: Option<String>,
    pub heap_id: Option<u64>,
    pub thread_id: Option<u32>,
    pub valid: bool,
}

impl MemoryRegion {
    pub fn end(&self) -> Address {
        self.base + self.size
    }

    fn contains(&self, addr: Address) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// Sorted-by-base, non-overlapping view supporting O(log n) lookup.
pub struct RegionIndex {
    regions: Vec<MemoryRegion>,
}

impl RegionIndex {
    pub fn new(mut regions: Vec<MemoryRegion>) -> Self {
        regions.sort_by_key(|r| r.base);
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter()
    }

    /// Binary search for the region containing `addr`, if any.
    pub fn region_containing(&self, addr: Address) -> Option<&MemoryRegion> {
        let idx = self
            .regions
            .partition_point(|r| r.base <= addr)
            .checked_sub(1)?;
        let region = &self.regions[idx];
        region.contains(addr).then_some(region)
    }
}

fn index_by_base(regions: &[MemoryRegion], base: Address) -> Option<usize> {
    regions.iter().position(|r| r.base == base)
}

fn index_containing(regions: &[MemoryRegion], addr: Address) -> Option<usize> {
    regions.iter().position(|r| r.contains(addr))
}

/// Runs the full §4.7 pipeline against any `ProcessOsInterface`.
pub fn classify(os: &dyn ProcessOsInterface) -> Vec<MemoryRegion> {
    let raw: Vec<RawRegion> = os
        .list_regions()
        .into_iter()
        .filter(|r| {
            r.state == super::os_interface::RegionState::Committed
                && !r.protection.no_access
                && !r.protection.guard
        })
        .collect();

    let mut regions: Vec<MemoryRegion> = raw
        .iter()
        .map(|r| MemoryRegion {
            base: r.base,
            size: r.size,
            allocation_base: r.allocation_base,
            region_type: r.region_type,
            kind: Kind::Unknown,
            mapped_file: None,
            heap_id: None,
            thread_id: None,
            valid: true,
        })
        .collect();

    // Step 3: well-known fixed pages.
    if let Some(addr) = os.user_shared_data_address() {
        if let Some(i) = index_containing(&regions, addr) {
            regions[i].kind = Kind::UserSharedData;
        }
    }
    if let Some(addr) = os.hypervisor_shared_data_address() {
        if let Some(i) = index_containing(&regions, addr) {
            regions[i].kind = Kind::HypervisorSharedData;
        }
    }
    for (addr, kind) in os.well_known_addresses() {
        if let Some(i) = index_containing(&regions, addr) {
            regions[i].kind = kind;
        }
    }

    // Step 4: PEB and heaps.
    for addr in os.peb_addresses() {
        if let Some(i) = index_containing(&regions, addr) {
            regions[i].kind = Kind::Peb;
        }
    }
    for heap in os.list_heaps() {
        if let Some(i) = index_by_base(&regions, heap.base) {
            regions[i].kind = if heap.is_segment_heap {
                Kind::SegmentHeap
            } else {
                Kind::NtHeap
            };
            regions[i].heap_id = Some(heap.heap_id);
        }
    }

    // Step 5: threads — TEB page and stack region.
    for thread in os.list_threads() {
        if let Some(i) = index_containing(&regions, thread.teb_address) {
            regions[i].kind = Kind::Teb;
            regions[i].thread_id = Some(thread.thread_id);
        }
        if thread.stack_limit < thread.stack_base {
            if let Some(i) = index_containing(&regions, thread.stack_limit) {
                regions[i].kind = Kind::Stack;
                regions[i].thread_id = Some(thread.thread_id);
            }
        }
    }

    // Step 6: pass over everything still Unknown.
    let allocation_kind: HashMap<Address, Kind> = regions
        .iter()
        .filter(|r| r.base == r.allocation_base)
        .map(|r| (r.base, r.kind))
        .collect();

    for i in 0..regions.len() {
        if regions[i].kind != Kind::Unknown {
            continue;
        }
        let is_allocation_base = regions[i].base == regions[i].allocation_base;
        let region_type = regions[i].region_type;

        if is_allocation_base && matches!(region_type, RegionType::Image | RegionType::Mapped) {
            let name = os.mapped_file_name(regions[i].base);
            regions[i].kind = match (region_type, &name) {
                (RegionType::Image, _) => Kind::Image,
                (RegionType::Mapped, Some(_)) => Kind::MappedFile,
                (RegionType::Mapped, None) => Kind::Shareable,
            };
            regions[i].mapped_file = name;
            continue;
        }

        if let Some(HeapSegmentHeader {
            signature,
            heap_base,
        }) = os.heap_segment_header(regions[i].base)
        {
            if signature == HEAP_SEGMENT_SIGNATURE {
                if let Some(owner) = index_by_base(&regions, heap_base) {
                    let upgraded = match regions[owner].kind {
                        Kind::NtHeap => Some(Kind::NtHeapSegment),
                        Kind::SegmentHeap => Some(Kind::SegmentHeapSegment),
                        _ => None,
                    };
                    if let Some(k) = upgraded {
                        regions[i].kind = k;
                        regions[i].heap_id = regions[owner].heap_id;
                        continue;
                    }
                }
            }
        }

        if raw[i].protection.readable
            && !raw[i].protection.writable
            && region_type == RegionType::Mapped
        {
            if let Some(magic) = os.activation_context_magic(regions[i].base) {
                if magic == ACTIVATION_CONTEXT_MAGIC {
                    regions[i].kind = Kind::ActivationContextData;
                    continue;
                }
            }
        }

        if let Some(&inherited) = allocation_kind.get(&regions[i].allocation_base) {
            if inherited != Kind::Unknown {
                regions[i].kind = inherited;
                continue;
            }
        }

        regions[i].kind = match region_type {
            RegionType::Private => Kind::PrivateData,
            RegionType::Image => Kind::Image,
            RegionType::Mapped => Kind::Shareable,
        };
    }

    let mut counts: HashMap<Kind, usize> = HashMap::new();
    for r in &regions {
        *counts.entry(r.kind).or_insert(0) += 1;
    }
    debug!(region_count = regions.len(), ?counts, "region classification pass complete");

    regions
}
