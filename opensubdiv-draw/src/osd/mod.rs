//! # OpenSubdiv Draw
//! `osd` turns [`far`](crate::far) patch tables into draw plans for hardware
//! tessellation. The main roles of this module are:
//! * **Patch Array Conversion**
//!
//!   Split transition patches into supported sub-patches and lay out one
//!   [`PatchArray`] per draw call ([`convert_patch_arrays()`]).
//! * **Buffer Packing**
//!
//!   Flatten control vertex indices, sharpness values, face-varying data and
//!   quad offsets into linear buffers that match the array offsets
//!   ([`pack_patch_verts()`], [`pack_sharpness_values()`],
//!   [`pack_fvar_data()`], [`pack_quad_offsets()`]).
//! * **Draw Contexts**
//!
//!   Own the converted sequence of one surface and hand it to a graphics
//!   [`DrawBackend`] ([`DrawContext`]).
//!
//! Conversion is deterministic: converting the same table twice yields
//! identical arrays and offsets.
pub mod patch_array;
pub use patch_array::*;

pub mod convert;
pub use convert::*;

pub mod pack;
pub use pack::*;

pub mod draw_context;
pub use draw_context::*;
