//! Process-memory scanning (P1 region classifier, P2 process stream).
//!
//! Entirely trait-mediated: no real Windows bindings live here. A
//! production build supplies its own `ProcessOsInterface`.

mod os_interface;
pub(crate) mod region;
mod stream;

pub use os_interface::{
    Address, HeapInfo, HeapSegmentHeader, ProcessOsInterface, Protection, RawRegion, RegionState,
    RegionType, ThreadInfo, ACTIVATION_CONTEXT_MAGIC, HEAP_SEGMENT_SIGNATURE,
};
pub use region::{classify, Kind, MemoryRegion, RegionIndex};
pub use stream::ProcessStream;
