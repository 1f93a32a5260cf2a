//! # Buffer Packing
//!
//! Stateless functions that flatten the per-patch data of a patch table into
//! linear buffers addressed by the offsets of a converted patch array
//! sequence.
//!
//! All packers append to the destination. On error the destination is
//! truncated back to its original length, so no partially packed buffer is
//! ever handed out.
use crate::far::{PatchDescriptor, PatchTableSource, QUAD_OFFSETS_PER_PATCH};
use crate::osd::convert::{check_offset, sub_patch_range};
use crate::osd::PatchArray;
use crate::{Error, Index, Result};

// Where the patches of one source array live.
#[derive(Debug, Clone, Copy)]
struct SourceSpan {
    patch_index: usize,
    patches_len: usize,
    vert_index: usize,
    quad_offset_index: usize,
    control_vertices_len: usize,
}

impl SourceSpan {
    #[inline]
    fn patch_vert_index(&self, patch_index: usize) -> usize {
        self.vert_index + (patch_index - self.patch_index) * self.control_vertices_len
    }

    #[inline]
    fn patch_quad_offset_index(&self, patch_index: usize) -> usize {
        self.quad_offset_index + (patch_index - self.patch_index) * QUAD_OFFSETS_PER_PATCH
    }
}

/// Maps global patch indices back to the source array holding them.
struct SourceLocator {
    spans: Vec<SourceSpan>,
    patches_len: usize,
}

impl SourceLocator {
    fn new<T>(table: &T) -> Result<Self>
    where
        T: PatchTableSource + ?Sized,
    {
        let spans = table
            .patch_arrays()
            .iter()
            .enumerate()
            .map(|(array_index, source)| -> Result<SourceSpan> {
                let descriptor = PatchDescriptor::from_raw(source.descriptor).ok_or(
                    Error::UnrecognizedDescriptor {
                        array_index,
                        patch_type: source.descriptor.patch_type,
                        pattern: source.descriptor.pattern,
                        rotation: source.descriptor.rotation,
                    },
                )?;
                Ok(SourceSpan {
                    patch_index: source.patch_index,
                    patches_len: source.patches_len,
                    vert_index: source.vert_index,
                    quad_offset_index: source.quad_offset_index,
                    control_vertices_len: descriptor.control_vertices_len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patches_len: table.patches_len(),
            spans,
        })
    }

    fn locate(&self, patch_index: usize) -> Result<&SourceSpan> {
        let position = self
            .spans
            .partition_point(|span| span.patch_index + span.patches_len <= patch_index);

        self.spans
            .get(position)
            .filter(|span| span.patch_index <= patch_index)
            .ok_or(Error::IndexOutOfBounds {
                index: patch_index,
                max: self.patches_len,
            })
    }
}

fn pack_or_truncate<E>(
    dst: &mut Vec<E>,
    pack: impl FnOnce(&mut Vec<E>, usize) -> Result<()>,
) -> Result<()> {
    let base = dst.len();
    let result = pack(dst, base);
    if result.is_err() {
        dst.truncate(base);
    }
    result
}

/// Append the control vertex indices of every patch in `arrays` to `dst`.
///
/// Array *k* must start exactly at `vert_index()` relative to the length
/// `dst` had on entry. Sub-arrays of a transition patch gather their slice of
/// the parent patch's control vertices. After a successful call `dst` grew by
/// the sum of [`indices_len()`](PatchArray::indices_len()) over `arrays`.
///
/// # Errors
///
/// * [`Error::OffsetMismatch`] if an array's vertex index breaks the chain.
/// * [`Error::BufferUnderrun`] if the table's control vertex buffer is too
///   short.
/// * [`Error::IndexOutOfBounds`] if an array references patches the table
///   does not have.
/// * [`Error::InvalidPatch`] if an array's descriptor disagrees with the
///   control vertex count of its source patches.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "osd::pack_patch_verts"))]
pub fn pack_patch_verts<T>(table: &T, arrays: &[PatchArray], dst: &mut Vec<Index>) -> Result<()>
where
    T: PatchTableSource + ?Sized,
{
    pack_or_truncate(dst, |dst, base| {
        let locator = SourceLocator::new(table)?;
        let src = table.control_vertices_table();

        dst.reserve(arrays.iter().map(PatchArray::indices_len).sum());

        for (array_index, array) in arrays.iter().enumerate() {
            check_offset(array_index, "vertex index", dst.len() - base, array.vert_index())?;

            let descriptor = array.descriptor();
            let first = array.patch_index();
            for patch_index in first..first + array.patches_len() {
                let span = locator.locate(patch_index)?;
                let start = span.patch_vert_index(patch_index);

                let range = match descriptor.sub_patch_slot() {
                    Some(slot) => {
                        let slice = sub_patch_range(descriptor.pattern(), slot as usize);
                        start + slice.start..start + slice.end
                    }
                    None if descriptor.control_vertices_len() == span.control_vertices_len => {
                        start..start + span.control_vertices_len
                    }
                    None => {
                        return Err(Error::InvalidPatch(format!(
                            "patch array {} describes {} control vertices per patch, \
                             source patch {} has {}",
                            array_index,
                            descriptor.control_vertices_len(),
                            patch_index,
                            span.control_vertices_len
                        )))
                    }
                };

                let available = src.len();
                let control_vertices = src.get(range.clone()).ok_or(Error::BufferUnderrun {
                    required: range.end,
                    available,
                })?;
                dst.extend_from_slice(control_vertices);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(indices = dst.len() - base, "packed patch vertices");

        Ok(())
    })
}

/// Append the sharpness value of every patch that has one to `dst`, in patch
/// order.
///
/// Patches without sharpness contribute nothing, so the result is usually
/// shorter than the number of patches.
///
/// # Errors
///
/// [`Error::BufferUnderrun`] if a patch's sharpness index lies past the
/// table's sharpness values.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, name = "osd::pack_sharpness_values")
)]
pub fn pack_sharpness_values<T>(table: &T, dst: &mut Vec<f32>) -> Result<()>
where
    T: PatchTableSource + ?Sized,
{
    pack_or_truncate(dst, |dst, _| {
        let values = table.sharpness_values();

        for patch_index in 0..table.patches_len() {
            if let Some(index) = table.patch_sharpness_index(patch_index) {
                let sharpness = values.get(index).ok_or(Error::BufferUnderrun {
                    required: index + 1,
                    available: values.len(),
                })?;
                dst.push(*sharpness);
            }
        }
        Ok(())
    })
}

/// Gather face-varying data into patch order.
///
/// `src` holds `fvar_width` wide tuples addressed by the table's face-varying
/// value indices. For every patch, in patch order, one tuple per corner is
/// appended to `dst`.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchTable, PatchType};
/// use opensubdiv_draw::osd::pack_fvar_data;
/// use opensubdiv_draw::{Error, Index};
///
/// let mut table = PatchTable::new(4);
/// let cvs: Vec<Index> = (0..4u32).map(Index).collect();
/// table.push_patch_array(PatchDescriptor::new(PatchType::Quads), &cvs).unwrap();
/// table.set_fvar_values(vec![Index(3), Index(2), Index(1), Index(0)]).unwrap();
///
/// let uvs = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
/// let mut packed = Vec::new();
/// pack_fvar_data(&table, 2, &uvs, &mut packed).unwrap();
/// assert_eq!(packed, [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
///
/// assert_eq!(
///     pack_fvar_data(&table, 3, &uvs, &mut packed),
///     Err(Error::FVarWidthMismatch { width: 3, len: 8 })
/// );
/// ```
///
/// # Errors
///
/// * [`Error::FVarWidthMismatch`] if `fvar_width` is zero or does not evenly
///   divide `src.len()`.
/// * [`Error::BufferUnderrun`] if a patch references a value past the end of
///   `src`.
/// * [`Error::IndexOutOfBounds`] if the table has no face-varying data for a
///   patch.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "osd::pack_fvar_data"))]
pub fn pack_fvar_data<T>(table: &T, fvar_width: usize, src: &[f32], dst: &mut Vec<f32>) -> Result<()>
where
    T: PatchTableSource + ?Sized,
{
    if fvar_width == 0 || src.len() % fvar_width != 0 {
        return Err(Error::FVarWidthMismatch {
            width: fvar_width,
            len: src.len(),
        });
    }

    pack_or_truncate(dst, |dst, _| {
        let patches_len = table.patches_len();
        for patch_index in 0..patches_len {
            let corners = table
                .patch_fvar_values(patch_index)
                .ok_or(Error::IndexOutOfBounds {
                    index: patch_index,
                    max: patches_len,
                })?;

            for corner in corners {
                let underrun = || Error::BufferUnderrun {
                    required: (corner.0 as usize).saturating_add(1).saturating_mul(fvar_width),
                    available: src.len(),
                };
                let start = (corner.0 as usize).checked_mul(fvar_width).ok_or_else(underrun)?;
                let end = start.checked_add(fvar_width).ok_or_else(underrun)?;
                let tuple = src.get(start..end).ok_or_else(underrun)?;
                dst.extend_from_slice(tuple);
            }
        }
        Ok(())
    })
}

/// Append the quad-offset entries of the legacy Gregory arrays in `arrays`
/// to `dst`.
///
/// Array *k* must start at `quad_offset_index()` relative to the length `dst`
/// had on entry. Arrays of other types contribute nothing.
///
/// # Errors
///
/// * [`Error::OffsetMismatch`] if an array's quad-offset index breaks the
///   chain.
/// * [`Error::BufferUnderrun`] if the table's quad-offset buffer is too
///   short.
/// * [`Error::IndexOutOfBounds`] if an array references patches the table
///   does not have.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "osd::pack_quad_offsets"))]
pub fn pack_quad_offsets<T>(table: &T, arrays: &[PatchArray], dst: &mut Vec<u32>) -> Result<()>
where
    T: PatchTableSource + ?Sized,
{
    pack_or_truncate(dst, |dst, base| {
        let locator = SourceLocator::new(table)?;
        let src = table.quad_offsets_table();

        for (array_index, array) in arrays.iter().enumerate() {
            check_offset(
                array_index,
                "quad-offset index",
                dst.len() - base,
                array.quad_offset_index(),
            )?;

            if array.quad_offsets_len() == 0 {
                continue;
            }

            let first = array.patch_index();
            for patch_index in first..first + array.patches_len() {
                let start = locator.locate(patch_index)?.patch_quad_offset_index(patch_index);
                let end = start + QUAD_OFFSETS_PER_PATCH;
                let quad_offsets = src.get(start..end).ok_or(Error::BufferUnderrun {
                    required: end,
                    available: src.len(),
                })?;
                dst.extend_from_slice(quad_offsets);
            }
        }
        Ok(())
    })
}

/// Face-varying input for [`PackedBuffers::pack()`].
#[derive(Debug, Clone, Copy)]
pub struct FVarSource<'a> {
    /// Number of floats per value.
    pub width: usize,
    /// The values, keyed by the table's face-varying value indices.
    pub data: &'a [f32],
}

/// The flat buffers of a draw plan, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedBuffers {
    pub vertex_indices: Vec<Index>,
    pub sharpness_values: Vec<f32>,
    pub fvar_data: Vec<f32>,
    pub quad_offsets: Vec<u32>,
}

impl PackedBuffers {
    /// Run all packers for a converted sequence of patch arrays.
    ///
    /// The face-varying buffer stays empty if `fvar` is `None`.
    pub fn pack<T>(table: &T, arrays: &[PatchArray], fvar: Option<FVarSource<'_>>) -> Result<Self>
    where
        T: PatchTableSource + ?Sized,
    {
        let mut buffers = Self::default();

        pack_patch_verts(table, arrays, &mut buffers.vertex_indices)?;
        pack_sharpness_values(table, &mut buffers.sharpness_values)?;
        pack_quad_offsets(table, arrays, &mut buffers.quad_offsets)?;
        if let Some(fvar) = fvar {
            pack_fvar_data(table, fvar.width, fvar.data, &mut buffers.fvar_data)?;
        }

        Ok(buffers)
    }

    /// Returns the vertex index buffer as bytes.
    #[inline]
    pub fn vertex_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertex_indices)
    }

    /// Returns the sharpness buffer as bytes.
    #[inline]
    pub fn sharpness_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sharpness_values)
    }

    /// Returns the face-varying buffer as bytes.
    #[inline]
    pub fn fvar_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fvar_data)
    }

    /// Returns the quad-offset buffer as bytes.
    #[inline]
    pub fn quad_offset_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.quad_offsets)
    }
}
