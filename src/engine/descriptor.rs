// Kernel Metadata
// Everything the harness needs to know about a kernel without running it.
use std::fmt;

use crate::engine::config::{LINK_BYTES, UNROLL_FACTOR};
use crate::engine::error::{KernelError, Result};

/// Size of a single access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementWidth {
    W16,
    W32,
    W64,
    W128,
}

impl ElementWidth {
    pub const ALL: [ElementWidth; 4] = [Self::W16, Self::W32, Self::W64, Self::W128];

    pub const fn bytes(self) -> usize {
        match self {
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
            Self::W128 => 16,
        }
    }

    pub const fn bits(self) -> usize {
        self.bytes() * 8
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.bytes() == bytes)
    }
}

/// Accesses per loop body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unroll {
    Simple,
    Unrolled,
}

impl Unroll {
    pub const fn factor(self) -> usize {
        match self {
            Self::Simple => 1,
            Self::Unrolled => UNROLL_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// How a scan computes its addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Advance a cursor
    Pointer,
    /// Recompute `base + i * width` every access
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    Scan {
        direction: Direction,
        access: AccessMode,
    },
    /// Single-cycle pointer chase; read-only by construction
    Permutation,
}

/// Immutable description of one registered kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDescriptor {
    name: String,
    width: ElementWidth,
    unroll: Unroll,
    traversal: Traversal,
}

impl KernelDescriptor {
    pub fn scan(
        name: impl Into<String>,
        width: ElementWidth,
        unroll: Unroll,
        direction: Direction,
        access: AccessMode,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            unroll,
            traversal: Traversal::Scan { direction, access },
        }
    }

    pub fn permutation(name: impl Into<String>, width: ElementWidth, unroll: Unroll) -> Self {
        Self {
            name: name.into(),
            width,
            unroll,
            traversal: Traversal::Permutation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_width(&self) -> ElementWidth {
        self.width
    }

    pub fn unroll(&self) -> Unroll {
        self.unroll
    }

    pub fn unroll_factor(&self) -> usize {
        self.unroll.factor()
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    pub fn is_scan(&self) -> bool {
        matches!(self.traversal, Traversal::Scan { .. })
    }

    pub fn is_permutation(&self) -> bool {
        matches!(self.traversal, Traversal::Permutation)
    }

    /// `None` for permutation walks
    pub fn direction(&self) -> Option<Direction> {
        match self.traversal {
            Traversal::Scan { direction, .. } => Some(direction),
            Traversal::Permutation => None,
        }
    }

    /// `None` for permutation walks
    pub fn access_mode(&self) -> Option<AccessMode> {
        match self.traversal {
            Traversal::Scan { access, .. } => Some(access),
            Traversal::Permutation => None,
        }
    }

    /// `element_width × unroll_factor`: the smallest region granularity this
    /// kernel consumes completely.
    pub fn stride_unit(&self) -> usize {
        self.width.bytes() * self.unroll.factor()
    }

    /// Bytes a scan actually visits for a region of `size` bytes: the
    /// floor-aligned prefix. Walks follow links, so their whole region counts.
    pub fn covered_bytes(&self, size: usize) -> usize {
        match self.traversal {
            Traversal::Scan { .. } => size - size % self.stride_unit(),
            Traversal::Permutation => size - size % self.width.bytes(),
        }
    }

    pub fn check_region_size(&self, size: usize) -> Result<()> {
        let stride_unit = match self.traversal {
            Traversal::Scan { .. } => self.stride_unit(),
            Traversal::Permutation => self.width.bytes(),
        };
        if size % stride_unit != 0 {
            return Err(KernelError::InvalidRegionSize {
                name: self.name.clone(),
                size,
                stride_unit,
            });
        }
        Ok(())
    }

    /// Structural checks applied at registration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(KernelError::InvalidDescriptor("empty kernel name".into()));
        }
        if self.is_permutation() && self.width.bytes() != LINK_BYTES {
            return Err(KernelError::InvalidDescriptor(format!(
                "{}: permutation links are {} bytes on this target, descriptor says {}",
                self.name,
                LINK_BYTES,
                self.width.bytes()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for KernelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}-bit, unroll {}",
            self.name,
            self.width.bits(),
            self.unroll.factor()
        )?;
        match self.traversal {
            Traversal::Scan { direction, access } => write!(f, ", scan {direction:?} {access:?})"),
            Traversal::Permutation => write!(f, ", permutation)"),
        }
    }
}

/// Predicate over descriptor fields. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelFilter {
    pub width: Option<ElementWidth>,
    pub unroll: Option<Unroll>,
    pub direction: Option<Direction>,
    pub access: Option<AccessMode>,
    pub permutation: Option<bool>,
}

impl KernelFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: ElementWidth) -> Self {
        self.width = Some(width);
        self
    }

    pub fn unroll(mut self, unroll: Unroll) -> Self {
        self.unroll = Some(unroll);
        self
    }

    /// Implies scan kernels only
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Implies scan kernels only
    pub fn access(mut self, access: AccessMode) -> Self {
        self.access = Some(access);
        self
    }

    pub fn scans(mut self) -> Self {
        self.permutation = Some(false);
        self
    }

    pub fn permutations(mut self) -> Self {
        self.permutation = Some(true);
        self
    }

    pub fn matches(&self, descriptor: &KernelDescriptor) -> bool {
        self.width.map_or(true, |w| w == descriptor.element_width())
            && self.unroll.map_or(true, |u| u == descriptor.unroll())
            && self.direction.map_or(true, |d| descriptor.direction() == Some(d))
            && self.access.map_or(true, |a| descriptor.access_mode() == Some(a))
            && self.permutation.map_or(true, |p| p == descriptor.is_permutation())
    }
}
