// Controller
// Python face of the registry: a harness written in Python enumerates kernels
// and runs them over numpy buffers it owns and times itself.
use numpy::PyReadwriteArray1;
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::engine::config::KernelConfig;
use crate::engine::descriptor::{AccessMode, Direction, ElementWidth, KernelFilter, Unroll};
use crate::engine::error::KernelError;
use crate::engine::registry::{registry, KernelRegistry};

fn to_py_err(err: KernelError) -> PyErr {
    match err {
        KernelError::NotFound { .. } => PyKeyError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn parse_filter(
    width_bytes: Option<usize>,
    unroll: Option<usize>,
    direction: Option<&str>,
    access: Option<&str>,
    traversal: Option<&str>,
) -> PyResult<KernelFilter> {
    let mut filter = KernelFilter::any();
    if let Some(bytes) = width_bytes {
        let width = ElementWidth::from_bytes(bytes)
            .ok_or_else(|| PyValueError::new_err(format!("unsupported element width: {bytes}")))?;
        filter = filter.width(width);
    }
    if let Some(factor) = unroll {
        filter = match factor {
            1 => filter.unroll(Unroll::Simple),
            16 => filter.unroll(Unroll::Unrolled),
            _ => return Err(PyValueError::new_err(format!("unsupported unroll factor: {factor}"))),
        };
    }
    if let Some(direction) = direction {
        filter = match direction.to_lowercase().as_str() {
            "read" => filter.direction(Direction::Read),
            "write" => filter.direction(Direction::Write),
            other => return Err(PyValueError::new_err(format!("unknown direction: {other}"))),
        };
    }
    if let Some(access) = access {
        filter = match access.to_lowercase().as_str() {
            "pointer" | "ptr" => filter.access(AccessMode::Pointer),
            "index" => filter.access(AccessMode::Index),
            other => return Err(PyValueError::new_err(format!("unknown access mode: {other}"))),
        };
    }
    if let Some(traversal) = traversal {
        filter = match traversal.to_lowercase().as_str() {
            "scan" => filter.scans(),
            "permutation" | "perm" => filter.permutations(),
            other => return Err(PyValueError::new_err(format!("unknown traversal: {other}"))),
        };
    }
    Ok(filter)
}

#[pyclass]
pub struct KernelCatalog {
    registry: &'static KernelRegistry,
}

#[pymethods]
impl KernelCatalog {
    #[new]
    pub fn new() -> Self {
        Self { registry: registry() }
    }

    /// Every kernel name, in registration order
    pub fn names(&self) -> Vec<String> {
        self.registry.entries().map(|e| e.name().to_string()).collect()
    }

    /// Names of kernels matching all given fields
    #[pyo3(signature = (width_bytes=None, unroll=None, direction=None, access=None, traversal=None))]
    pub fn select(
        &self,
        width_bytes: Option<usize>,
        unroll: Option<usize>,
        direction: Option<&str>,
        access: Option<&str>,
        traversal: Option<&str>,
    ) -> PyResult<Vec<String>> {
        let filter = parse_filter(width_bytes, unroll, direction, access, traversal)?;
        Ok(self.registry.list(filter).map(|d| d.name().to_string()).collect())
    }

    /// (width_bytes, unroll_factor, traversal, direction, access_mode)
    pub fn describe(&self, name: &str) -> PyResult<(usize, usize, String, Option<String>, Option<String>)> {
        let entry = self.registry.lookup(name).map_err(to_py_err)?;
        let d = entry.descriptor();
        let traversal = if d.is_permutation() { "permutation" } else { "scan" };
        Ok((
            d.element_width().bytes(),
            d.unroll_factor(),
            traversal.to_string(),
            d.direction().map(|v| format!("{v:?}").to_lowercase()),
            d.access_mode().map(|v| format!("{v:?}").to_lowercase()),
        ))
    }

    pub fn stride_unit(&self, name: &str) -> PyResult<usize> {
        let entry = self.registry.lookup(name).map_err(to_py_err)?;
        Ok(entry.descriptor().stride_unit())
    }

    /// Run `name` over a contiguous uint8 array with the GIL released
    #[pyo3(signature = (name, region, repeats, strict=false))]
    pub fn run(
        &self,
        py: Python<'_>,
        name: &str,
        mut region: PyReadwriteArray1<'_, u8>,
        repeats: usize,
        strict: bool,
    ) -> PyResult<()> {
        let entry = self.registry.lookup(name).map_err(to_py_err)?;
        let bytes = region
            .as_slice_mut()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let config = if strict {
            KernelConfig::strict()
        } else {
            KernelConfig::default()
        };
        py.allow_threads(|| entry.run_with(bytes, repeats, &config))
            .map_err(to_py_err)
    }
}
