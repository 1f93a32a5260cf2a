//! # Draw Context
//!
//! A [`DrawContext`] owns the converted patch array sequence of one surface
//! together with the metadata a rendering backend needs to draw it.
//!
//! A context starts out unbuilt, with no arrays. Building runs
//! [`convert_patch_arrays()`] and replaces the sequence wholesale; there is
//! no incremental update. When the topology changes the context is rebuilt.
//!
//! Graphics backends do not extend the context. They implement
//! [`DrawBackend`] and consume any [`PatchArraySource`].
use crate::far::PatchTableSource;
use crate::osd::{convert_patch_arrays, ConvertOptions, PackedBuffers, PatchArray};
use crate::Result;

/// Read access to a converted patch array sequence and its metadata.
pub trait PatchArraySource {
    /// Returns the patch arrays in draw order.
    fn patch_arrays(&self) -> &[PatchArray];

    /// Returns `true` if the patches stem from feature adaptive refinement.
    fn is_adaptive(&self) -> bool;

    /// Returns the maximum vertex valence, needed for legacy Gregory patch
    /// drawing.
    fn max_valence(&self) -> usize;
}

/// The upload/bind side of a graphics API.
///
/// A backend receives the packed buffers once per topology change and then
/// issues one draw per patch array.
pub trait DrawBackend {
    type Error;

    /// Upload the packed buffers to the device.
    fn upload(&mut self, buffers: &PackedBuffers) -> std::result::Result<(), Self::Error>;

    /// Issue the draw call for one patch array.
    fn draw_patch_array(
        &mut self,
        array: &PatchArray,
        max_valence: usize,
    ) -> std::result::Result<(), Self::Error>;

    /// Draw every non-empty patch array of `source` in order.
    fn draw(&mut self, source: &impl PatchArraySource) -> std::result::Result<(), Self::Error> {
        let max_valence = source.max_valence();
        source
            .patch_arrays()
            .iter()
            .filter(|array| array.patches_len() != 0)
            .try_for_each(|array| self.draw_patch_array(array, max_valence))
    }
}

/// The draw plan of one surface.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchTable, PatchType};
/// use opensubdiv_draw::osd::{ConvertOptions, DrawContext};
/// use opensubdiv_draw::Index;
///
/// let mut context = DrawContext::new(5);
/// assert!(!context.is_built());
/// assert!(!context.is_adaptive());
///
/// let mut table = PatchTable::new(5);
/// let cvs: Vec<Index> = (0..16u32).map(Index).collect();
/// table
///     .push_patch_array(PatchDescriptor::new(PatchType::Regular), &cvs)
///     .unwrap();
///
/// context.rebuild(&table, ConvertOptions::default()).unwrap();
/// assert!(context.is_built());
/// assert!(context.is_adaptive());
/// assert_eq!(context.patch_arrays().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawContext {
    patch_arrays: Vec<PatchArray>,
    is_adaptive: bool,
    max_valence: usize,
    is_built: bool,
}

impl DrawContext {
    /// Create an unbuilt context.
    pub fn new(max_valence: usize) -> Self {
        Self {
            patch_arrays: Vec::new(),
            is_adaptive: false,
            max_valence,
            is_built: false,
        }
    }

    /// Create a context from a patch table, taking the maximum valence from
    /// the table.
    pub fn build<T>(table: &T, options: ConvertOptions) -> Result<Self>
    where
        T: PatchTableSource + ?Sized,
    {
        let mut context = Self::new(table.max_valence());
        context.rebuild(table, options)?;
        Ok(context)
    }

    /// Build contexts for independent surfaces in parallel.
    ///
    /// Results are in the order of `tables`; the first error aborts.
    #[cfg(feature = "rayon")]
    pub fn build_many<T>(tables: &[T], options: ConvertOptions) -> Result<Vec<Self>>
    where
        T: PatchTableSource + Sync,
    {
        use rayon::prelude::*;

        tables
            .par_iter()
            .map(|table| Self::build(table, options))
            .collect()
    }

    /// Replace the patch arrays with the conversion of `table`.
    ///
    /// On error the context keeps its previous state.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "osd::DrawContext::rebuild"))]
    pub fn rebuild<T>(&mut self, table: &T, options: ConvertOptions) -> Result<()>
    where
        T: PatchTableSource + ?Sized,
    {
        let patch_arrays = convert_patch_arrays(table, options)?;

        self.is_adaptive = patch_arrays
            .iter()
            .any(|array| array.descriptor().is_adaptive());
        self.patch_arrays = patch_arrays;
        self.is_built = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            patch_arrays = self.patch_arrays.len(),
            is_adaptive = self.is_adaptive,
            max_valence = self.max_valence,
            "rebuilt draw context"
        );

        Ok(())
    }

    /// Returns `true` once the patch arrays have been built.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// Returns `true` if the primitive uses feature adaptive subdivision.
    #[inline]
    pub fn is_adaptive(&self) -> bool {
        self.is_adaptive
    }

    /// Returns the maximum vertex valence (needed for legacy Gregory patch
    /// drawing).
    #[inline]
    pub fn max_valence(&self) -> usize {
        self.max_valence
    }

    /// Returns the patch arrays in draw order.
    #[inline]
    pub fn patch_arrays(&self) -> &[PatchArray] {
        &self.patch_arrays
    }

    /// Mutable access to the patch arrays, for coalescing by the caller.
    ///
    /// Edits must keep the offsets chained; see
    /// [`validate_patch_arrays()`](crate::osd::validate_patch_arrays()).
    #[inline]
    pub fn patch_arrays_mut(&mut self) -> &mut Vec<PatchArray> {
        &mut self.patch_arrays
    }
}

impl PatchArraySource for DrawContext {
    #[inline]
    fn patch_arrays(&self) -> &[PatchArray] {
        &self.patch_arrays
    }

    #[inline]
    fn is_adaptive(&self) -> bool {
        self.is_adaptive
    }

    #[inline]
    fn max_valence(&self) -> usize {
        self.max_valence
    }
}
