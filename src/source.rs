//! A byte source the orchestrator drives: either a file or a live
//! process's classified memory, behind one small trait.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{ScanError, ScanOutcome};
use crate::process::{classify, Kind as RegionKind, ProcessOsInterface, ProcessStream};

/// Provenance the sink attaches to results from a process source.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub pid: u32,
    pub executable_path: Option<String>,
}

pub trait Source {
    fn name(&self) -> &str;
    fn len(&self) -> u64;
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ScanOutcome<usize>;

    /// `None` for file sources; `Some` for process sources, supplying
    /// the provenance the sink attaches to each emitted result, plus
    /// the region a given in-stream offset falls in.
    fn process_context(&self) -> Option<&ProcessContext> {
        None
    }

    fn region_kind_at(&self, _stream_offset: u64) -> Option<(RegionKind, Option<String>)> {
        None
    }
}

pub struct FileSource {
    name: String,
    file: File,
    length: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> ScanOutcome<Self> {
        let file = File::open(path).map_err(|cause| ScanError::SourceOpen {
            source_name: path.display().to_string(),
            cause,
        })?;
        let length = file
            .metadata()
            .map_err(|cause| ScanError::SourceOpen {
                source_name: path.display().to_string(),
                cause,
            })?
            .len();
        Ok(Self {
            name: path.display().to_string(),
            file,
            length,
        })
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.length
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ScanOutcome<usize> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|cause| {
                tracing::error!(source = %self.name, offset, %cause, "seek failed");
                ScanError::OsRead {
                    source_name: self.name.clone(),
                    cause,
                }
            })?;
        self.file.read(buf).map_err(|cause| {
            tracing::error!(source = %self.name, offset, %cause, "read failed");
            ScanError::OsRead {
                source_name: self.name.clone(),
                cause,
            }
        })
    }
}

/// A process source owns its OS handle (via `os`) and its classified
/// region list for the lifetime of the scan; closing releases both.
pub struct ProcessSource<O: ProcessOsInterface> {
    name: String,
    os: O,
    stream_regions_len: u64,
    stream: OwnedProcessStream<O>,
    context: ProcessContext,
}

/// `ProcessStream` borrows its `&dyn ProcessOsInterface`; this wrapper
/// keeps the owning `O` alive alongside it so `ProcessSource` can be a
/// single self-contained value.
struct OwnedProcessStream<O: ProcessOsInterface> {
    regions: Vec<crate::process::MemoryRegion>,
    mask: Vec<RegionKind>,
    position: u64,
    _marker: std::marker::PhantomData<O>,
}

impl<O: ProcessOsInterface> ProcessSource<O> {
    pub fn open(mut os: O, pid: u32, region_mask: Vec<RegionKind>) -> ScanOutcome<Self> {
        os.open(pid).map_err(|e| match e {
            ScanError::SourceOpen { cause, .. } => ScanError::SourceOpen {
                source_name: format!("pid:{pid}"),
                cause,
            },
            other => other,
        })?;
        let executable_path = os.executable_path();
        let regions = classify(&os);
        let stream_regions_len = {
            let stream = ProcessStream::new(&os, regions.clone(), &region_mask);
            stream.len()
        };
        Ok(Self {
            name: format!("pid:{pid}"),
            os,
            stream_regions_len,
            stream: OwnedProcessStream {
                regions,
                mask: region_mask,
                position: 0,
                _marker: std::marker::PhantomData,
            },
            context: ProcessContext {
                pid,
                executable_path,
            },
        })
    }
}

impl<O: ProcessOsInterface> Source for ProcessSource<O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.stream_regions_len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ScanOutcome<usize> {
        let mut live = ProcessStream::new(&self.os, self.stream.regions.clone(), &self.stream.mask);
        live.seek(offset);
        let n = live.read(buf);
        self.stream.position = offset + n as u64;
        Ok(n)
    }

    fn process_context(&self) -> Option<&ProcessContext> {
        Some(&self.context)
    }

    fn region_kind_at(&self, stream_offset: u64) -> Option<(RegionKind, Option<String>)> {
        let live = ProcessStream::new(&self.os, self.stream.regions.clone(), &self.stream.mask);
        live.region_at(stream_offset)
            .map(|r| (r.kind, r.mapped_file.clone()))
    }
}

impl<O: ProcessOsInterface> Drop for ProcessSource<O> {
    fn drop(&mut self) {
        self.os.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::region::tests::FakeOsInterface;
    use crate::process::RegionType;

    #[test]
    fn process_source_reads_through_classified_regions() {
        let mut os = FakeOsInterface::default();
        os.regions = vec![crate::process::RawRegion {
            base: 0x1000,
            size: 16,
            protection: crate::process::Protection {
                readable: true,
                writable: false,
                executable: false,
                guard: false,
                no_access: false,
            },
            state: crate::process::RegionState::Committed,
            region_type: RegionType::Private,
            allocation_base: 0x1000,
        }];
        os.memory.insert(0x1000, b"hello process!!!".to_vec());

        let mut source =
            ProcessSource::open(os, 1234, vec![RegionKind::PrivateData]).unwrap();
        assert_eq!(source.len(), 16);
        assert_eq!(source.process_context().unwrap().pid, 1234);

        let mut buf = [0u8; 5];
        let n = source.read_at(0, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn region_mask_excludes_unselected_regions_from_length() {
        let mut os = FakeOsInterface::default();
        os.regions = vec![
            crate::process::RawRegion {
                base: 0x1000,
                size: 16,
                protection: crate::process::Protection {
                    readable: true,
                    writable: false,
                    executable: false,
                    guard: false,
                    no_access: false,
                },
                state: crate::process::RegionState::Committed,
                region_type: RegionType::Private,
                allocation_base: 0x1000,
            },
        ];

        let source = ProcessSource::open(os, 1, vec![RegionKind::Stack]).unwrap();
        assert_eq!(source.len(), 0);
    }
}
