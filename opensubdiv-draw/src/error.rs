//! Error types for the opensubdiv-draw crate.

use thiserror::Error;

/// Main error type for patch array conversion and buffer packing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A patch array descriptor is neither a type the tessellation hardware
    /// can draw nor a known transition pattern.
    #[error(
        "Unrecognized descriptor in patch array {array_index} \
         (type: {patch_type}, pattern: {pattern}, rotation: {rotation})"
    )]
    UnrecognizedDescriptor {
        array_index: usize,
        patch_type: u32,
        pattern: u32,
        rotation: u32,
    },

    /// A packing routine addressed more data than the source holds.
    #[error("Buffer underrun: required {required} elements, source has {available}")]
    BufferUnderrun { required: usize, available: usize },

    /// The requested face-varying width does not evenly divide the source
    /// buffer.
    #[error("Face-varying width {width} does not divide source buffer of length {len}")]
    FVarWidthMismatch { width: usize, len: usize },

    /// A patch array offset breaks the append chain of its sequence.
    #[error("Patch array {array_index} has {offset} offset {actual}, expected {expected}")]
    OffsetMismatch {
        array_index: usize,
        offset: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Index out of bounds.
    #[error("Index {index} out of bounds (max: {max})")]
    IndexOutOfBounds { index: usize, max: usize },

    /// Invalid patch configuration.
    #[error("Invalid patch configuration: {0}")]
    InvalidPatch(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
