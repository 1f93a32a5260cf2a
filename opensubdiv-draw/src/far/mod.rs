//! # Feature Adaptive Representation
//!
//! `far` holds the description of the refined surface the draw plan is
//! computed from: the [`PatchDescriptor`] value type and the
//! [`PatchTableSource`] interface of a patch table, plus the in-memory
//! [`PatchTable`].
//!
//! Producing a patch table (topology refinement, end-cap generation) is the
//! job of an external refiner.
pub mod patch_descriptor;
pub use patch_descriptor::*;

pub mod patch_table;
pub use patch_table::*;
