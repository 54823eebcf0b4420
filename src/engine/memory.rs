// Region Helper
// Owned, page-aligned anonymous memory for harnesses and tests. Kernels never
// allocate; they only borrow the bytes this hands out.
use memmap2::MmapMut;

/// Anonymous mapping, zero-filled, aligned to the page size.
/// Resources are tied to this struct's lifetime.
pub struct MappedRegion {
    mapping: MmapMut,
    len: usize,
}

impl MappedRegion {
    pub fn new(len: usize) -> std::io::Result<Self> {
        // zero-length anonymous maps are rejected by the OS, keep one page behind an empty view
        let mapping = MmapMut::map_anon(len.max(1))?;
        Ok(Self { mapping, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mapping[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mapping[..self.len]
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mapping.as_mut_ptr()
    }

    /// Ask for transparent huge pages, which changes the TLB behaviour a
    /// large scan or walk observes.
    #[cfg(target_os = "linux")]
    pub fn advise_huge_pages(&self) -> std::io::Result<()> {
        self.mapping.advise(memmap2::Advice::HugePage)
    }
}
