//! # Patch Table
//!
//! A patch table is the topology-agnostic description of a refined surface
//! that the draw plan is computed from. It is produced by an external
//! refiner; this crate only reads it through the [`PatchTableSource`] trait.
//!
//! The patches in a table are organized into patch arrays, where all patches
//! in a patch array share one descriptor. The control vertex indices of all
//! arrays live in one global buffer and every patch has a global patch index
//! used to address per-patch data such as sharpness and face-varying values.
//!
//! [`PatchTable`] is an in-memory implementation that refiners (and tests)
//! can fill directly.
use super::{PatchDescriptor, RawPatchDescriptor};
use crate::{Error, Index, Result};

/// One patch array as stored in a source patch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePatchArray {
    /// Descriptor codes, decoded during conversion.
    pub descriptor: RawPatchDescriptor,
    /// Number of patches in the array.
    pub patches_len: usize,
    /// Index of the first control vertex in the global index buffer.
    pub vert_index: usize,
    /// Global index of the first patch.
    pub patch_index: usize,
    /// Index of the first entry in the quad-offset buffer.
    pub quad_offset_index: usize,
}

/// Read access to a patch table, the input of conversion and packing.
pub trait PatchTableSource {
    /// Returns the patch arrays in table order.
    fn patch_arrays(&self) -> &[SourcePatchArray];

    /// Returns the global control vertex index buffer.
    fn control_vertices_table(&self) -> &[Index];

    /// Returns the quad-offset buffer of legacy Gregory patches.
    fn quad_offsets_table(&self) -> &[u32];

    /// Returns the maximum vertex valence of the refined topology.
    fn max_valence(&self) -> usize;

    /// Returns the index into [`sharpness_values()`](Self::sharpness_values)
    /// of a patch, or `None` if the patch has no sharpness.
    fn patch_sharpness_index(&self, patch_index: usize) -> Option<usize>;

    /// Returns the sharpness value table.
    fn sharpness_values(&self) -> &[f32];

    /// Returns the face-varying value indices of a patch, one per corner, or
    /// `None` if the table holds no face-varying data for it.
    fn patch_fvar_values(&self, patch_index: usize) -> Option<&[Index]>;

    /// Returns the number of patch arrays.
    fn patch_arrays_len(&self) -> usize {
        self.patch_arrays().len()
    }

    /// Returns the total number of patches.
    fn patches_len(&self) -> usize {
        self.patch_arrays().iter().map(|array| array.patches_len).sum()
    }

    /// Returns the decoded descriptor of a patch array.
    ///
    /// `None` if the index is out of range or the codes are not recognized.
    fn patch_array_descriptor(&self, array_index: usize) -> Option<PatchDescriptor> {
        self.patch_arrays()
            .get(array_index)
            .and_then(|array| PatchDescriptor::from_raw(array.descriptor))
    }

    /// Returns the control vertex indices of a patch array.
    fn patch_array_vertices(&self, array_index: usize) -> Option<&[Index]> {
        let array = self.patch_arrays().get(array_index)?;
        let descriptor = PatchDescriptor::from_raw(array.descriptor)?;
        let end = array.vert_index + array.patches_len * descriptor.control_vertices_len();
        self.control_vertices_table().get(array.vert_index..end)
    }
}

/// An in-memory patch table.
///
/// Arrays are appended in order; their offsets are assigned from the running
/// totals so the table always forms a gapless chain.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchTable, PatchTableSource, PatchType};
/// use opensubdiv_draw::Index;
///
/// let mut table = PatchTable::new(4);
/// let cvs: Vec<Index> = (0..64u32).map(Index).collect();
///
/// table
///     .push_patch_array(PatchDescriptor::new(PatchType::Regular), &cvs)
///     .unwrap();
///
/// assert_eq!(table.patch_arrays_len(), 1);
/// assert_eq!(table.patches_len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PatchTable {
    arrays: Vec<SourcePatchArray>,
    control_vertices: Vec<Index>,
    quad_offsets_len: usize,
    quad_offsets: Vec<u32>,
    max_valence: usize,
    sharpness_indices: Vec<Option<u32>>,
    sharpness_values: Vec<f32>,
    // Prefix sums of corners per patch, `patches_len() + 1` entries.
    fvar_corner_offsets: Vec<usize>,
    fvar_values: Vec<Index>,
}

impl PatchTable {
    /// Create an empty patch table.
    pub fn new(max_valence: usize) -> Self {
        Self {
            arrays: Vec::new(),
            control_vertices: Vec::new(),
            quad_offsets_len: 0,
            quad_offsets: Vec::new(),
            max_valence,
            sharpness_indices: Vec::new(),
            sharpness_values: Vec::new(),
            fvar_corner_offsets: vec![0],
            fvar_values: Vec::new(),
        }
    }

    /// Append a patch array.
    ///
    /// The number of patches is derived from the length of
    /// `control_vertices`, which must be a multiple of the descriptor's
    /// control vertex count. Returns the index of the new array.
    pub fn push_patch_array(
        &mut self,
        descriptor: PatchDescriptor,
        control_vertices: &[Index],
    ) -> Result<usize> {
        if descriptor.sub_patch_slot().is_some() {
            return Err(Error::InvalidPatch(
                "sub-patch descriptors are generated by conversion".into(),
            ));
        }

        let cvs_len = descriptor.control_vertices_len();
        if cvs_len == 0 || control_vertices.len() % cvs_len != 0 {
            return Err(Error::InvalidPatch(format!(
                "{} control vertices do not form whole {} patches",
                control_vertices.len(),
                descriptor.patch_type()
            )));
        }

        Ok(self.push_raw_patch_array(
            descriptor.into(),
            control_vertices.len() / cvs_len,
            control_vertices,
        ))
    }

    /// Append a patch array from undecoded descriptor codes.
    ///
    /// No validation takes place; unknown codes are reported when the table
    /// is converted. Returns the index of the new array.
    pub fn push_raw_patch_array(
        &mut self,
        descriptor: RawPatchDescriptor,
        patches_len: usize,
        control_vertices: &[Index],
    ) -> usize {
        let decoded = PatchDescriptor::from_raw(descriptor);
        let patch_index = self.patches_len();

        self.arrays.push(SourcePatchArray {
            descriptor,
            patches_len,
            vert_index: self.control_vertices.len(),
            patch_index,
            quad_offset_index: self.quad_offsets_len,
        });

        self.control_vertices.extend_from_slice(control_vertices);
        self.quad_offsets_len += patches_len * decoded.map_or(0, |d| d.quad_offsets_len());
        self.sharpness_indices.resize(patch_index + patches_len, None);

        let corners_len = decoded.map_or(0, |d| d.patch_type().corners_len());
        let mut corner_offset = *self.fvar_corner_offsets.last().unwrap_or(&0);
        for _ in 0..patches_len {
            corner_offset += corners_len;
            self.fvar_corner_offsets.push(corner_offset);
        }

        self.arrays.len() - 1
    }

    /// Set the quad-offset buffer of the legacy Gregory patches.
    ///
    /// Holds four entries per Gregory patch, in table order.
    pub fn set_quad_offsets(&mut self, quad_offsets: impl Into<Vec<u32>>) {
        self.quad_offsets = quad_offsets.into();
    }

    /// Returns the number of quad-offset entries the arrays of this table
    /// reference.
    #[inline]
    pub fn quad_offsets_len(&self) -> usize {
        self.quad_offsets_len
    }

    /// Assign a sharpness value to a patch.
    pub fn set_patch_sharpness(&mut self, patch_index: usize, sharpness: f32) -> Result<()> {
        let max = self.sharpness_indices.len();
        let slot = self
            .sharpness_indices
            .get_mut(patch_index)
            .ok_or(Error::IndexOutOfBounds {
                index: patch_index,
                max,
            })?;

        match *slot {
            Some(index) => self.sharpness_values[index as usize] = sharpness,
            None => {
                *slot = Some(self.sharpness_values.len() as u32);
                self.sharpness_values.push(sharpness);
            }
        }
        Ok(())
    }

    /// Set the face-varying value indices of all patches.
    ///
    /// `values` holds one index per corner per patch, in patch order.
    pub fn set_fvar_values(&mut self, values: impl Into<Vec<Index>>) -> Result<()> {
        let values = values.into();
        let expected = *self.fvar_corner_offsets.last().unwrap_or(&0);
        if values.len() != expected {
            return Err(Error::InvalidPatch(format!(
                "expected {} face-varying corner values, got {}",
                expected,
                values.len()
            )));
        }

        self.fvar_values = values;
        Ok(())
    }
}

impl Default for PatchTable {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PatchTableSource for PatchTable {
    #[inline]
    fn patch_arrays(&self) -> &[SourcePatchArray] {
        &self.arrays
    }

    #[inline]
    fn control_vertices_table(&self) -> &[Index] {
        &self.control_vertices
    }

    #[inline]
    fn quad_offsets_table(&self) -> &[u32] {
        &self.quad_offsets
    }

    #[inline]
    fn max_valence(&self) -> usize {
        self.max_valence
    }

    #[inline]
    fn patch_sharpness_index(&self, patch_index: usize) -> Option<usize> {
        self.sharpness_indices
            .get(patch_index)
            .copied()
            .flatten()
            .map(|index| index as usize)
    }

    #[inline]
    fn sharpness_values(&self) -> &[f32] {
        &self.sharpness_values
    }

    fn patch_fvar_values(&self, patch_index: usize) -> Option<&[Index]> {
        if self.fvar_values.is_empty() {
            return None;
        }
        let start = *self.fvar_corner_offsets.get(patch_index)?;
        let end = *self.fvar_corner_offsets.get(patch_index + 1)?;
        self.fvar_values.get(start..end)
    }

    fn patches_len(&self) -> usize {
        self.fvar_corner_offsets.len().saturating_sub(1)
    }
}
