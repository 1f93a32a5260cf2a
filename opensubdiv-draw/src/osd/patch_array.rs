//! Patch arrays of a draw plan.
use crate::far::PatchDescriptor;

/// A contiguous run of patches sharing one descriptor, forming one hardware
/// draw call.
///
/// The offsets address three buffers shared by all arrays of a sequence: the
/// control vertex index buffer, the global patch numbering used for ptex and
/// face-varying lookups, and the quad-offset buffer of legacy Gregory
/// patches.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchType};
/// use opensubdiv_draw::osd::PatchArray;
///
/// let array = PatchArray::new(PatchDescriptor::new(PatchType::Regular), 6, 64, 4, 0);
/// assert_eq!(array.indices_len(), 96);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchArray {
    descriptor: PatchDescriptor,
    patches_len: usize,
    vert_index: usize,
    patch_index: usize,
    quad_offset_index: usize,
}

impl PatchArray {
    /// Create a patch array.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Defines the type, pattern and rotation of the patches
    ///   in the array.
    /// * `patches_len` - The number of patches in the array.
    /// * `vert_index` - Index of the first control vertex in the array.
    /// * `patch_index` - Global index of the first patch in the array.
    /// * `quad_offset_index` - Index of the first quad-offset entry.
    #[inline]
    pub fn new(
        descriptor: PatchDescriptor,
        patches_len: usize,
        vert_index: usize,
        patch_index: usize,
        quad_offset_index: usize,
    ) -> Self {
        Self {
            descriptor,
            patches_len,
            vert_index,
            patch_index,
            quad_offset_index,
        }
    }

    /// Returns the descriptor of the patches in the array.
    #[inline]
    pub fn descriptor(&self) -> PatchDescriptor {
        self.descriptor
    }

    /// Update the descriptor.
    ///
    /// Only meant for splitting/coalescing. Changing the control vertex count
    /// of an array invalidates the offsets of every array after it.
    #[inline]
    pub fn set_descriptor(&mut self, descriptor: PatchDescriptor) {
        self.descriptor = descriptor;
    }

    /// Returns the index of the first control vertex of the first patch in
    /// the global index buffer.
    #[inline]
    pub fn vert_index(&self) -> usize {
        self.vert_index
    }

    /// Returns the global index of the first patch in this array (used to
    /// access ptex and face-varying data).
    #[inline]
    pub fn patch_index(&self) -> usize {
        self.patch_index
    }

    /// Returns the number of patches in the array.
    #[inline]
    pub fn patches_len(&self) -> usize {
        self.patches_len
    }

    /// Set the number of patches (used when coalescing arrays).
    #[inline]
    pub fn set_patches_len(&mut self, patches_len: usize) {
        self.patches_len = patches_len;
    }

    /// Returns the number of control vertex indices in the array.
    #[inline]
    pub fn indices_len(&self) -> usize {
        self.patches_len * self.descriptor.control_vertices_len()
    }

    /// Returns the index of the first entry in the quad-offset buffer.
    #[inline]
    pub fn quad_offset_index(&self) -> usize {
        self.quad_offset_index
    }

    /// Returns the number of quad-offset entries the array references.
    #[inline]
    pub fn quad_offsets_len(&self) -> usize {
        self.patches_len * self.descriptor.quad_offsets_len()
    }
}
