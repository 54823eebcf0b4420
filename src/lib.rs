//! Memory-hierarchy probing kernels.
//!
//! Each kernel runs a fixed, deterministic pattern of loads or stores over a
//! caller-owned region `repeats` times; a harness times the call and divides
//! by the bytes touched. Kernels are looked up by name in a read-only
//! registry that carries their width, unroll factor and traversal kind.
#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod engine;

pub use engine::config::{KernelConfig, SizePolicy};
pub use engine::descriptor::{AccessMode, Direction, ElementWidth, KernelDescriptor, KernelFilter, Traversal, Unroll};
pub use engine::error::{KernelError, Result};
pub use engine::kernels::{KernelFn, TraceFn};
pub use engine::memory::MappedRegion;
pub use engine::parallel::run_disjoint;
pub use engine::registry::{registry, KernelEntry, KernelRegistry};
pub use engine::walk::{validate_cycle, PermutationRegion};

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn memprobe_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Expose the kernel catalog to Python
    m.add_class::<engine::controller::KernelCatalog>()?;
    Ok(())
}
