//! The abstract OS collaborator that the region classifier (P1) and the
//! process stream (P2) are built against.
//!
//! No real Windows FFI bindings live in this repository; production use
//! requires an implementation backed by `ReadProcessMemory`,
//! `VirtualQueryEx`, `NtQuerySystemInformation`, and friends. Tests use
//! `region::tests::FakeOsInterface`, a deterministic in-memory double.

use crate::error::ScanOutcome;
use crate::process::Kind;

pub type Address = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Committed,
    Reserved,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionType {
    Private,
    Mapped,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protection {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub guard: bool,
    pub no_access: bool,
}

/// One region as reported directly by the OS query, before classification.
#[derive(Debug, Clone)]
pub struct RawRegion {
    pub base: Address,
    pub size: u64,
    pub protection: Protection,
    pub state: RegionState,
    pub region_type: RegionType,
    pub allocation_base: Address,
}

impl RawRegion {
    pub fn end(&self) -> Address {
        self.base + self.size
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.base && addr < self.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub thread_id: u32,
    pub teb_address: Address,
    pub stack_base: Address,
    pub stack_limit: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapInfo {
    pub heap_id: u64,
    pub base: Address,
    pub size: u64,
    pub is_segment_heap: bool,
}

/// Header fields of a `HEAP_SEGMENT` as read from a region's base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSegmentHeader {
    pub signature: u32,
    pub heap_base: Address,
}

pub const HEAP_SEGMENT_SIGNATURE: u32 = 0xFFEE_FFEE;
pub const ACTIVATION_CONTEXT_MAGIC: u32 = 0x4163_7478; // 'xtcA'

/// Collaborator abstraction for everything the classifier and the
/// process stream need from a live (or faked) target process.
pub trait ProcessOsInterface {
    fn open(&mut self, pid: u32) -> ScanOutcome<()>;
    fn close(&mut self);

    fn executable_path(&self) -> Option<String>;

    fn list_regions(&self) -> Vec<RawRegion>;
    fn list_threads(&self) -> Vec<ThreadInfo>;
    fn list_heaps(&self) -> Vec<HeapInfo>;

    /// PEB addresses present in this process (one entry per bitness: a
    /// WOW64 process has both a 32- and a 64-bit PEB).
    fn peb_addresses(&self) -> Vec<Address>;

    fn user_shared_data_address(&self) -> Option<Address>;
    fn hypervisor_shared_data_address(&self) -> Option<Address>;

    /// Fixed-address system pages the PEB pass marks directly, paired
    /// with the `Kind` each one receives.
    fn well_known_addresses(&self) -> Vec<(Address, Kind)>;

    fn mapped_file_name(&self, allocation_base: Address) -> Option<String>;

    fn heap_segment_header(&self, base: Address) -> Option<HeapSegmentHeader>;
    fn activation_context_magic(&self, base: Address) -> Option<u32>;

    /// Reads up to `buf.len()` bytes starting at `addr`, returning the
    /// number of bytes actually copied. Short reads (partial copy,
    /// no access) are a normal return value, never an error.
    fn read_memory(&self, addr: Address, buf: &mut [u8]) -> usize;
}
