//! # Patch Array Conversion
//!
//! Hardware tessellation supports a fixed set of patch topologies. A
//! transition patch has edges that border a finer level, so it cannot be
//! drawn as one hardware patch. [`convert_patch_arrays()`] walks the arrays
//! of a patch table and replaces every transition array by sub-arrays of
//! supported types.
//!
//! ## Transition Decomposition
//!
//! The decomposition is a fixed function of the pattern. A transition patch
//! has the sixteen control vertices of a regular patch; the sub-patches
//! partition them in slot order:
//!
//! | Pattern    | Slots                                          |
//! |------------|------------------------------------------------|
//! | `Pattern0` | `Corner` (9), `Quads` (4), `Triangles` (3)     |
//! | `Pattern1` | `Corner` (9), `Triangles` (3), `Lines` (2), `Lines` (2) |
//! | `Pattern2` | `Quads` (4) ×4                                 |
//! | `Pattern3` | `Boundary` (12), `Lines` (2), `Points` (1), `Points` (1) |
//! | `Pattern4` | `Boundary` (12), `Quads` (4)                   |
//!
//! The rotation picks the slot the emitted sub-arrays start with: slot
//! `(k + rotation) % slots` is emitted `k`-th. Each sub-array keeps the patch
//! count and global patch index of its source array and gets its own slice of
//! the vertex index buffer.
use std::ops::Range;

use crate::far::{PatchDescriptor, PatchTableSource, PatchType, TransitionPattern};
use crate::osd::PatchArray;
use crate::{Error, Result};

const NON_TRANSITION_SLOTS: &[PatchType] = &[PatchType::Regular];
const PATTERN0_SLOTS: &[PatchType] = &[PatchType::Corner, PatchType::Quads, PatchType::Triangles];
const PATTERN1_SLOTS: &[PatchType] = &[
    PatchType::Corner,
    PatchType::Triangles,
    PatchType::Lines,
    PatchType::Lines,
];
const PATTERN2_SLOTS: &[PatchType] = &[
    PatchType::Quads,
    PatchType::Quads,
    PatchType::Quads,
    PatchType::Quads,
];
const PATTERN3_SLOTS: &[PatchType] = &[
    PatchType::Boundary,
    PatchType::Lines,
    PatchType::Points,
    PatchType::Points,
];
const PATTERN4_SLOTS: &[PatchType] = &[PatchType::Boundary, PatchType::Quads];

/// Returns the sub-patch types a transition pattern decomposes into, in slot
/// order.
///
/// ```
/// use opensubdiv_draw::far::TransitionPattern;
/// use opensubdiv_draw::osd::transition_sub_patches;
///
/// assert_eq!(transition_sub_patches(TransitionPattern::NonTransition).len(), 1);
/// assert_eq!(transition_sub_patches(TransitionPattern::Pattern0).len(), 3);
/// assert_eq!(transition_sub_patches(TransitionPattern::Pattern4).len(), 2);
/// ```
pub fn transition_sub_patches(pattern: TransitionPattern) -> &'static [PatchType] {
    match pattern {
        TransitionPattern::NonTransition => NON_TRANSITION_SLOTS,
        TransitionPattern::Pattern0 => PATTERN0_SLOTS,
        TransitionPattern::Pattern1 => PATTERN1_SLOTS,
        TransitionPattern::Pattern2 => PATTERN2_SLOTS,
        TransitionPattern::Pattern3 => PATTERN3_SLOTS,
        TransitionPattern::Pattern4 => PATTERN4_SLOTS,
    }
}

/// Returns the range of the parent patch's control vertices covered by a
/// sub-patch slot.
pub(crate) fn sub_patch_range(pattern: TransitionPattern, slot: usize) -> Range<usize> {
    let slots = transition_sub_patches(pattern);
    let start = slots[..slot]
        .iter()
        .map(|patch_type| patch_type.control_vertices_len())
        .sum::<usize>();
    start..start + slots[slot].control_vertices_len()
}

/// The running offsets threaded through conversion.
///
/// Each field is the offset the next emitted array starts at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetCursor {
    pub vert_index: usize,
    pub patch_index: usize,
    pub quad_offset_index: usize,
}

impl OffsetCursor {
    /// Create an array at the current offsets and advance the vertex index
    /// and quad-offset index past it.
    ///
    /// The patch index is left alone so sibling sub-arrays share it; call
    /// [`advance_patches()`](Self::advance_patches()) once the source array
    /// is done.
    pub fn emit(&mut self, descriptor: PatchDescriptor, patches_len: usize) -> PatchArray {
        let array = PatchArray::new(
            descriptor,
            patches_len,
            self.vert_index,
            self.patch_index,
            self.quad_offset_index,
        );
        self.vert_index += array.indices_len();
        self.quad_offset_index += array.quad_offsets_len();
        array
    }

    /// Advance the patch index past `patches_len` patches.
    #[inline]
    pub fn advance_patches(&mut self, patches_len: usize) {
        self.patch_index += patches_len;
    }

    /// Move all offsets past an existing array.
    #[inline]
    pub fn advance(&mut self, array: &PatchArray) {
        self.vert_index = array.vert_index() + array.indices_len();
        self.patch_index = array.patch_index() + array.patches_len();
        self.quad_offset_index = array.quad_offset_index() + array.quad_offsets_len();
    }
}

/// Options for [`convert_patch_arrays()`].
///
/// ```
/// use opensubdiv_draw::osd::ConvertOptions;
///
/// let options = ConvertOptions {
///     coalesce: true,
///     ..Default::default()
/// };
/// assert!(!options.drop_empty);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Merge adjacent arrays with equal descriptors ("batch glomming").
    pub coalesce: bool,
    /// Leave out arrays without patches.
    pub drop_empty: bool,
}

impl Default for ConvertOptions {
    /// Create conversion options with the following defaults:
    ///
    /// | Property     | Value   |
    /// |--------------|---------|
    /// | `coalesce`   | `false` |
    /// | `drop_empty` | `false` |
    fn default() -> Self {
        Self {
            coalesce: false,
            drop_empty: false,
        }
    }
}

/// Convert the patch arrays of a patch table into arrays that hardware
/// tessellation can draw.
///
/// Non-transition arrays are passed through with their descriptor and patch
/// count. Transition arrays are replaced by the sub-arrays of their pattern
/// (see the [module documentation](self)). Offsets are assigned append-only
/// from an [`OffsetCursor`] starting at zero, so for a gapless table every
/// non-transition array keeps its source offsets.
///
/// # Errors
///
/// [`Error::UnrecognizedDescriptor`] if an array's descriptor is neither a
/// drawable type nor a known transition pattern. With the
/// `topology_validation` feature, [`Error::OffsetMismatch`] if the table's
/// own offsets do not chain and [`Error::BufferUnderrun`] if an array
/// reaches past the control vertex buffer. No arrays are returned on error.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, name = "osd::convert_patch_arrays")
)]
pub fn convert_patch_arrays<T>(table: &T, options: ConvertOptions) -> Result<Vec<PatchArray>>
where
    T: PatchTableSource + ?Sized,
{
    let source_arrays = table.patch_arrays();

    let mut descriptors = Vec::with_capacity(source_arrays.len());
    let mut output_len = 0;
    for (array_index, source) in source_arrays.iter().enumerate() {
        let descriptor = PatchDescriptor::from_raw(source.descriptor).ok_or(
            Error::UnrecognizedDescriptor {
                array_index,
                patch_type: source.descriptor.patch_type,
                pattern: source.descriptor.pattern,
                rotation: source.descriptor.rotation,
            },
        )?;
        output_len += transition_sub_patches(descriptor.pattern()).len();
        descriptors.push(descriptor);
    }

    let mut arrays = Vec::with_capacity(output_len);
    let mut cursor = OffsetCursor::default();

    for (array_index, (source, descriptor)) in source_arrays.iter().zip(descriptors).enumerate() {
        #[cfg(feature = "topology_validation")]
        validate_source_array(table, array_index, source, &descriptor, &cursor)?;

        if options.drop_empty && source.patches_len == 0 {
            continue;
        }

        if descriptor.is_transition() {
            let slots = transition_sub_patches(descriptor.pattern());
            for k in 0..slots.len() {
                let slot = (k + descriptor.rotation() as usize) % slots.len();
                let sub_descriptor = PatchDescriptor::sub_patch(
                    slots[slot],
                    descriptor.pattern(),
                    descriptor.rotation(),
                    slot as u8,
                );
                arrays.push(cursor.emit(sub_descriptor, source.patches_len));
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(
                array_index,
                pattern = %descriptor.pattern(),
                rotation = descriptor.rotation(),
                sub_arrays = slots.len(),
                "split transition array"
            );
        } else {
            arrays.push(cursor.emit(descriptor, source.patches_len));
        }

        cursor.advance_patches(source.patches_len);
    }

    if options.coalesce {
        coalesce_patch_arrays(&mut arrays);
    }

    #[cfg(feature = "topology_validation")]
    validate_patch_arrays(&arrays)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        source_arrays = source_arrays.len(),
        patch_arrays = arrays.len(),
        indices = cursor.vert_index,
        "converted patch arrays"
    );

    Ok(arrays)
}

#[cfg(feature = "topology_validation")]
fn validate_source_array<T>(
    table: &T,
    array_index: usize,
    source: &crate::far::SourcePatchArray,
    descriptor: &PatchDescriptor,
    cursor: &OffsetCursor,
) -> Result<()>
where
    T: PatchTableSource + ?Sized,
{
    check_offset(array_index, "vertex index", cursor.vert_index, source.vert_index)?;
    check_offset(array_index, "patch index", cursor.patch_index, source.patch_index)?;
    check_offset(
        array_index,
        "quad-offset index",
        cursor.quad_offset_index,
        source.quad_offset_index,
    )?;

    let required = source.vert_index + source.patches_len * descriptor.control_vertices_len();
    let available = table.control_vertices_table().len();
    if required > available {
        return Err(Error::BufferUnderrun {
            required,
            available,
        });
    }
    Ok(())
}

pub(crate) fn check_offset(
    array_index: usize,
    offset: &'static str,
    expected: usize,
    actual: usize,
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::OffsetMismatch {
            array_index,
            offset,
            expected,
            actual,
        })
    }
}

/// Merge adjacent arrays that share a descriptor and whose offsets are
/// contiguous.
///
/// The merged array keeps the offsets of the first array and the sum of the
/// patch counts. Returns the number of arrays removed.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchType};
/// use opensubdiv_draw::osd::{coalesce_patch_arrays, PatchArray};
///
/// let regular = PatchDescriptor::new(PatchType::Regular);
/// let mut arrays = vec![
///     PatchArray::new(regular, 3, 0, 0, 0),
///     PatchArray::new(regular, 5, 48, 3, 0),
/// ];
///
/// assert_eq!(coalesce_patch_arrays(&mut arrays), 1);
/// assert_eq!(arrays, vec![PatchArray::new(regular, 8, 0, 0, 0)]);
/// ```
pub fn coalesce_patch_arrays(arrays: &mut Vec<PatchArray>) -> usize {
    let len = arrays.len();
    let mut merged: Vec<PatchArray> = Vec::with_capacity(len);

    for array in arrays.drain(..) {
        match merged.last_mut() {
            Some(last) if continues(last, &array) => {
                last.set_patches_len(last.patches_len() + array.patches_len());
            }
            _ => merged.push(array),
        }
    }

    let removed = len - merged.len();
    *arrays = merged;

    #[cfg(feature = "tracing")]
    {
        if removed != 0 {
            tracing::trace!(removed, "coalesced patch arrays");
        }
    }

    removed
}

fn continues(last: &PatchArray, next: &PatchArray) -> bool {
    last.descriptor() == next.descriptor()
        && last.vert_index() + last.indices_len() == next.vert_index()
        && last.patch_index() + last.patches_len() == next.patch_index()
        && last.quad_offset_index() + last.quad_offsets_len() == next.quad_offset_index()
}

// Sub-arrays split from one transition array share their patch range.
fn is_sibling(previous: &PatchArray, next: &PatchArray) -> bool {
    let (a, b) = (previous.descriptor(), next.descriptor());
    a.sub_patch_slot().is_some()
        && b.sub_patch_slot().is_some()
        && a.pattern() == b.pattern()
        && a.rotation() == b.rotation()
        && previous.patch_index() == next.patch_index()
        && previous.patches_len() == next.patches_len()
}

/// Check that a sequence of patch arrays forms a gapless append chain
/// starting at zero.
///
/// Every array's vertex index and quad-offset index must equal the end of
/// the previous array. The patch index must continue the previous array's
/// patch range, except for sub-arrays of one transition array which share
/// it.
///
/// Callers that edit a sequence through
/// [`DrawContext::patch_arrays_mut()`](crate::osd::DrawContext::patch_arrays_mut())
/// can use this to verify the result.
pub fn validate_patch_arrays(arrays: &[PatchArray]) -> Result<()> {
    let mut cursor = OffsetCursor::default();
    let mut previous: Option<&PatchArray> = None;

    for (array_index, array) in arrays.iter().enumerate() {
        let expected_patch_index = match previous {
            Some(previous) if is_sibling(previous, array) => previous.patch_index(),
            _ => cursor.patch_index,
        };

        check_offset(array_index, "vertex index", cursor.vert_index, array.vert_index())?;
        check_offset(
            array_index,
            "patch index",
            expected_patch_index,
            array.patch_index(),
        )?;
        check_offset(
            array_index,
            "quad-offset index",
            cursor.quad_offset_index,
            array.quad_offset_index(),
        )?;

        cursor.advance(array);
        previous = Some(array);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERNS: [TransitionPattern; 5] = [
        TransitionPattern::Pattern0,
        TransitionPattern::Pattern1,
        TransitionPattern::Pattern2,
        TransitionPattern::Pattern3,
        TransitionPattern::Pattern4,
    ];

    #[test]
    fn decompositions_partition_a_regular_patch() {
        for pattern in PATTERNS {
            let total: usize = transition_sub_patches(pattern)
                .iter()
                .map(|patch_type| patch_type.control_vertices_len())
                .sum();
            assert_eq!(total, PatchType::Regular.control_vertices_len(), "{pattern}");
        }
    }

    #[test]
    fn sub_patch_ranges_are_adjacent() {
        for pattern in PATTERNS {
            let mut end = 0;
            for slot in 0..transition_sub_patches(pattern).len() {
                let range = sub_patch_range(pattern, slot);
                assert_eq!(range.start, end);
                end = range.end;
            }
            assert_eq!(end, 16);
        }
    }

    #[test]
    fn cursor_keeps_patch_index_until_advanced() {
        let mut cursor = OffsetCursor::default();
        let quads = PatchDescriptor::new(PatchType::Quads);

        let first = cursor.emit(quads, 2);
        let second = cursor.emit(quads, 2);
        assert_eq!(first.patch_index(), second.patch_index());
        assert_eq!(second.vert_index(), 8);

        cursor.advance_patches(2);
        assert_eq!(cursor.patch_index, 2);
        assert_eq!(cursor.vert_index, 16);
    }

    #[test]
    fn gregory_arrays_advance_quad_offsets() {
        let mut cursor = OffsetCursor::default();
        let gregory = cursor.emit(PatchDescriptor::new(PatchType::Gregory), 3);
        cursor.advance_patches(3);
        let boundary = cursor.emit(PatchDescriptor::new(PatchType::GregoryBoundary), 1);

        assert_eq!(gregory.quad_offsets_len(), 12);
        assert_eq!(boundary.quad_offset_index(), 12);
        assert_eq!(cursor.quad_offset_index, 16);
    }

    #[test]
    fn validation_reports_first_gap() {
        let regular = PatchDescriptor::new(PatchType::Regular);
        let arrays = [
            PatchArray::new(regular, 2, 0, 0, 0),
            PatchArray::new(regular, 1, 40, 2, 0),
        ];
        assert_eq!(
            validate_patch_arrays(&arrays),
            Err(Error::OffsetMismatch {
                array_index: 1,
                offset: "vertex index",
                expected: 32,
                actual: 40,
            })
        );
    }
}
