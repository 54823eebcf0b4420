// Kernel Registry
// Name -> (descriptor, kernel). Written once per name, read many times.
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use tracing::{debug, trace, warn};

use crate::engine::catalog;
use crate::engine::config::{KernelConfig, SizePolicy};
use crate::engine::descriptor::{KernelDescriptor, KernelFilter};
use crate::engine::error::{KernelError, Result};
use crate::engine::kernels::{KernelFn, TraceFn};
use crate::engine::walk::{validate_cycle, PermutationRegion};

/// A registered kernel with its metadata
#[derive(Clone)]
pub struct KernelEntry {
    descriptor: KernelDescriptor,
    kernel: KernelFn,
    trace: Option<TraceFn>,
}

impl KernelEntry {
    pub fn new(descriptor: KernelDescriptor, kernel: KernelFn, trace: Option<TraceFn>) -> Self {
        Self {
            descriptor,
            kernel,
            trace,
        }
    }

    pub fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The raw kernel, for harnesses that time the bare call
    pub fn kernel(&self) -> KernelFn {
        self.kernel
    }

    /// Call the raw kernel with no checks.
    ///
    /// # Safety
    /// The caller upholds the kernel's contract: for scans, `region` is valid
    /// for `size` bytes and aligned to the element width; for walks, `region`
    /// is a well-formed single-cycle permutation region.
    #[inline(always)]
    pub unsafe fn invoke(&self, region: *mut u8, size: usize, repeats: usize) {
        unsafe { (self.kernel)(region, size, repeats) }
    }

    /// Run with the default (truncating) configuration
    pub fn run(&self, region: &mut [u8], repeats: usize) -> Result<()> {
        self.run_with(region, repeats, &KernelConfig::default())
    }

    /// Check alignment and size policy, then run. Permutation walks check the
    /// single-cycle property first.
    pub fn run_with(&self, region: &mut [u8], repeats: usize, config: &KernelConfig) -> Result<()> {
        self.check_region(region, config)?;
        if self.descriptor.is_permutation() {
            let mut walk = PermutationRegion::new(region)?;
            return self.run_walk(&mut walk, repeats);
        }
        unsafe { self.invoke(region.as_mut_ptr(), region.len(), repeats) };
        Ok(())
    }

    /// Run a walk kernel over an already validated region
    pub fn run_walk(&self, region: &mut PermutationRegion<'_>, repeats: usize) -> Result<()> {
        if !self.descriptor.is_permutation() {
            return Err(KernelError::InvalidDescriptor(format!(
                "{} is not a permutation kernel",
                self.name()
            )));
        }
        let size = region.len();
        unsafe { self.invoke(region.as_mut_ptr(), size, repeats) };
        Ok(())
    }

    /// Byte offsets one pass of this kernel visits, in order. Nothing in the
    /// region is read or written by a scan trace; a walk trace reads links.
    pub fn visited_offsets(&self, region: &mut [u8]) -> Result<Vec<usize>> {
        let trace = self.trace.ok_or_else(|| {
            KernelError::InvalidDescriptor(format!("{} has no trace function", self.name()))
        })?;
        self.check_region(region, &KernelConfig::default())?;
        if self.descriptor.is_permutation() {
            validate_cycle(region)?;
        }
        let mut log = Vec::new();
        unsafe { trace(region.as_mut_ptr(), region.len(), &mut log) };
        Ok(log)
    }

    fn check_region(&self, region: &[u8], config: &KernelConfig) -> Result<()> {
        let alignment = self.descriptor.element_width().bytes();
        let address = region.as_ptr() as usize;
        if address % alignment != 0 {
            return Err(KernelError::MisalignedRegion {
                name: self.name().to_string(),
                address,
                alignment,
            });
        }
        match config.size_policy {
            SizePolicy::Strict => self.descriptor.check_region_size(region.len())?,
            SizePolicy::Truncate => {
                let covered = self.descriptor.covered_bytes(region.len());
                if covered < region.len() {
                    debug!(
                        kernel = self.name(),
                        size = region.len(),
                        covered,
                        "region tail will not be visited"
                    );
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for KernelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelEntry")
            .field("descriptor", &self.descriptor)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

/// Kernel table. Registration happens before the table is shared; afterwards
/// it is only read, so lookups take no lock.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    entries: Vec<KernelEntry>,
    by_name: HashMap<String, usize>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full built-in catalog
    pub fn with_builtin_kernels() -> Self {
        let mut registry = Self::new();
        for entry in catalog::builtin_entries() {
            if let Err(e) = registry.insert(entry) {
                warn!("skipping built-in kernel: {e}");
            }
        }
        debug!(kernels = registry.len(), "built-in kernel registry ready");
        registry
    }

    pub fn register(&mut self, descriptor: KernelDescriptor, kernel: KernelFn) -> Result<()> {
        self.insert(KernelEntry::new(descriptor, kernel, None))
    }

    pub fn register_traced(&mut self, descriptor: KernelDescriptor, kernel: KernelFn, trace: TraceFn) -> Result<()> {
        self.insert(KernelEntry::new(descriptor, kernel, Some(trace)))
    }

    /// Fails with `DuplicateName` and leaves the existing entry untouched.
    pub fn insert(&mut self, entry: KernelEntry) -> Result<()> {
        if self.by_name.contains_key(entry.name()) {
            warn!(kernel = entry.name(), "duplicate kernel registration rejected");
            return Err(KernelError::DuplicateName {
                name: entry.name().to_string(),
            });
        }
        entry.descriptor().validate()?;
        trace!(kernel = entry.name(), "registered kernel");
        self.by_name.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&KernelEntry> {
        self.by_name
            .get(name)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| KernelError::NotFound { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors matching `filter`, in registration order. The iterator is
    /// lazy and can be cloned to restart it.
    pub fn list(&self, filter: KernelFilter) -> impl Iterator<Item = &KernelDescriptor> + Clone + '_ {
        self.entries
            .iter()
            .map(KernelEntry::descriptor)
            .filter(move |descriptor| filter.matches(descriptor))
    }

    pub fn entries(&self) -> impl Iterator<Item = &KernelEntry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static BUILTIN: LazyLock<KernelRegistry> = LazyLock::new(KernelRegistry::with_builtin_kernels);

/// Process-wide registry, built on first use and immutable afterwards
pub fn registry() -> &'static KernelRegistry {
    &BUILTIN
}
