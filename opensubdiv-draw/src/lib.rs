#![doc(
    html_logo_url = "https://raw.githubusercontent.com/virtualritz/opensubdiv/master/osd-logo.png"
)]
//! # OpenSubdiv Draw Plans
//!
//! Turns an *OpenSubdiv* style patch table into a draw plan for hardware
//! tessellation: a sequence of [`PatchArray`](osd::PatchArray)s, each
//! homogeneous in patch type, plus flat index, sharpness, face-varying and
//! quad-offset buffers addressed by the offsets recorded in those arrays.
//!
//! Fixed-function tessellation stages only support a bounded set of patch
//! topologies. *Transition* patches, whose neighbors force extra subdivision
//! on one or more edges, do not map to a single hardware patch type. The
//! [converter](osd::convert_patch_arrays()) splits every transition array
//! into a fixed set of sub-arrays of supported types while keeping every
//! control vertex accounted for exactly once.
//!
//! The crate does no subdivision math and talks to no graphics API. It
//! computes the logical layout and packs CPU-side buffers; uploading and
//! issuing draw calls is left to a [`DrawBackend`](osd::DrawBackend).
//!
//! ## Example
//!
//! ```
//! use opensubdiv_draw::far::{PatchDescriptor, PatchTable, PatchType, TransitionPattern};
//! use opensubdiv_draw::osd::{ConvertOptions, DrawContext, PackedBuffers};
//! use opensubdiv_draw::Index;
//!
//! let mut table = PatchTable::new(4);
//! let regular = PatchDescriptor::new(PatchType::Regular);
//! let transition = PatchDescriptor::transition(TransitionPattern::Pattern4, 1);
//!
//! let cvs: Vec<Index> = (0..32u32).map(Index).collect();
//! table.push_patch_array(regular, &cvs[..16]).unwrap();
//! table.push_patch_array(transition, &cvs[16..]).unwrap();
//!
//! let context = DrawContext::build(&table, ConvertOptions::default()).unwrap();
//! // The transition array became two sub-arrays.
//! assert_eq!(context.patch_arrays().len(), 3);
//!
//! let buffers = PackedBuffers::pack(&table, context.patch_arrays(), None).unwrap();
//! assert_eq!(buffers.vertex_indices.len(), 32);
//! ```
//!
//! ## Features
#![doc = document_features::document_features!()]
//!
//! ## API Changes From C++
//!
//! Methods follow the naming used across the `opensubdiv-petite` crates:
//! * Use canonical Rust naming – (`GetNumIndices()` becomes
//!   [`indices_len()`](osd::PatchArray::indices_len())).
//! * Static helpers of the C++ `DrawContext` are free functions in
//!   [`osd`].
//! * Use unsigned integer types, specifically `usize` and `u32`, instead of
//!   signed ones (`i32`) for anything that can only contain positive values
//!   (indices, sizes/lengths/counts, valences, etc.).

pub mod error;
pub mod far;
pub mod osd;

pub use error::{Error, Result};

/// A control vertex or face-varying value index.
///
/// # Examples
///
/// ```
/// use opensubdiv_draw::Index;
///
/// // Create an index from a u32
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// // Convert back to u32
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
///
/// // Create from usize
/// let idx = Index::from(100usize);
/// let as_usize: usize = idx.into();
/// assert_eq!(as_usize, 100);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index(value)
    }
}

impl From<Index> for u32 {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
