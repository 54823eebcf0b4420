// Error types
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("kernel already registered: {name}")]
    DuplicateName { name: String },

    #[error("kernel not found: {name}")]
    NotFound { name: String },

    #[error("region of {size} bytes is not a multiple of the {stride_unit}-byte stride unit of {name}")]
    InvalidRegionSize {
        name: String,
        size: usize,
        stride_unit: usize,
    },

    #[error("region base {address:#x} is not {alignment}-byte aligned for {name}")]
    MisalignedRegion {
        name: String,
        address: usize,
        alignment: usize,
    },

    #[error("invalid kernel descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("malformed permutation region: {reason}")]
    MalformedPermutation { reason: String },

    #[error("cannot split {len} bytes into {parts} non-empty stride-aligned parts")]
    InvalidPartition { parts: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, KernelError>;
