//! # Patch Descriptors
//!
//! A [`PatchDescriptor`] is an immutable value describing the patches in one
//! patch array: their [`PatchType`], the [`TransitionPattern`] and rotation
//! of transition patches and, for sub-patches generated from a transition
//! patch, the sub-patch slot.
//!
//! The number of control vertices of a patch is a pure function of its type.
//! Every size computation in the crate goes through
//! [`PatchDescriptor::control_vertices_len()`].
use derive_more::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Patch types known to the patch table.
#[repr(u32)]
#[derive(TryFromPrimitive, IntoPrimitive, Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchType {
    /// Not a patch.
    NonPatch = 0,
    /// Point patches (1 control vertex).
    Points = 1,
    /// Line patches (2 control vertices).
    Lines = 2,
    /// Quad patches (4 control vertices).
    Quads = 3,
    /// Triangle patches (3 control vertices).
    Triangles = 4,
    /// Loop patches (12 control vertices).
    Loop = 5,
    /// Regular patches (16 control vertices, bi-cubic B-spline).
    Regular = 6,
    /// Boundary patches (12 control vertices).
    Boundary = 7,
    /// Corner patches (9 control vertices).
    Corner = 8,
    /// Legacy Gregory patches (4 control vertices plus quad offsets).
    Gregory = 9,
    /// Legacy Gregory boundary patches (4 control vertices plus quad
    /// offsets).
    GregoryBoundary = 10,
    /// Gregory basis patches (20 control vertices).
    GregoryBasis = 11,
    /// Triangular Gregory patches (18 control vertices).
    GregoryTriangle = 12,
}

impl PatchType {
    /// Returns the number of control vertices of a patch of this type.
    #[inline]
    pub const fn control_vertices_len(self) -> usize {
        match self {
            PatchType::NonPatch => 0,
            PatchType::Points => 1,
            PatchType::Lines => 2,
            PatchType::Quads => 4,
            PatchType::Triangles => 3,
            PatchType::Loop => 12,
            PatchType::Regular => 16,
            PatchType::Boundary => 12,
            PatchType::Corner => 9,
            PatchType::Gregory => 4,
            PatchType::GregoryBoundary => 4,
            PatchType::GregoryBasis => 20,
            PatchType::GregoryTriangle => 18,
        }
    }

    /// Returns the number of parametric corners of the patch domain.
    ///
    /// Face-varying data is stored once per corner.
    #[inline]
    pub const fn corners_len(self) -> usize {
        match self {
            PatchType::NonPatch => 0,
            PatchType::Points => 1,
            PatchType::Lines => 2,
            PatchType::Triangles | PatchType::Loop | PatchType::GregoryTriangle => 3,
            _ => 4,
        }
    }

    /// Returns `true` for the legacy Gregory types that index into the
    /// quad-offset buffer.
    #[inline]
    pub const fn uses_quad_offsets(self) -> bool {
        matches!(self, PatchType::Gregory | PatchType::GregoryBoundary)
    }

    /// Returns `true` for types produced by feature adaptive refinement, as
    /// opposed to the linear primitives of uniform refinement.
    #[inline]
    pub const fn is_adaptive(self) -> bool {
        !matches!(
            self,
            PatchType::NonPatch
                | PatchType::Points
                | PatchType::Lines
                | PatchType::Quads
                | PatchType::Triangles
        )
    }
}

/// The edge configuration of a transition patch.
///
/// A transition patch borders patches of a finer level on one or more edges.
/// The pattern names which edges; the descriptor's rotation orients it.
#[repr(u32)]
#[derive(TryFromPrimitive, IntoPrimitive, Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionPattern {
    /// Not a transition patch.
    NonTransition = 0,
    /// One transition edge.
    Pattern0 = 1,
    /// Two adjacent transition edges.
    Pattern1 = 2,
    /// Two opposite transition edges.
    Pattern2 = 3,
    /// Three transition edges.
    Pattern3 = 4,
    /// Four transition edges.
    Pattern4 = 5,
}

/// Number of quad-offset entries stored per legacy Gregory patch.
pub const QUAD_OFFSETS_PER_PATCH: usize = 4;

/// Describes the type, transition pattern and rotation of the patches in a
/// patch array.
///
/// Two descriptors are equal iff all their fields match. Equality is the
/// grouping key used when adjacent patch arrays are coalesced.
///
/// ```
/// use opensubdiv_draw::far::{PatchDescriptor, PatchType, TransitionPattern};
///
/// let regular = PatchDescriptor::new(PatchType::Regular);
/// assert_eq!(regular.control_vertices_len(), 16);
/// assert!(!regular.is_transition());
///
/// let transition = PatchDescriptor::transition(TransitionPattern::Pattern2, 3);
/// assert_eq!(transition.control_vertices_len(), 16);
/// assert_eq!(transition.rotation(), 3);
/// assert!(transition.is_transition());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchDescriptor {
    patch_type: PatchType,
    pattern: TransitionPattern,
    rotation: u8,
    sub_patch: Option<u8>,
}

impl PatchDescriptor {
    /// Describe non-transition patches of the given type.
    #[inline]
    pub const fn new(patch_type: PatchType) -> Self {
        Self {
            patch_type,
            pattern: TransitionPattern::NonTransition,
            rotation: 0,
            sub_patch: None,
        }
    }

    /// Describe regular transition patches with the given pattern and
    /// rotation.
    ///
    /// The rotation is taken modulo four.
    #[inline]
    pub fn transition(pattern: TransitionPattern, rotation: u8) -> Self {
        debug_assert!(rotation < 4, "Transition rotation {} out of range", rotation);
        Self {
            patch_type: PatchType::Regular,
            pattern,
            rotation: rotation & 3,
            sub_patch: None,
        }
    }

    /// Describe one sub-patch generated from a transition patch.
    #[inline]
    pub(crate) fn sub_patch(
        patch_type: PatchType,
        pattern: TransitionPattern,
        rotation: u8,
        slot: u8,
    ) -> Self {
        Self {
            patch_type,
            pattern,
            rotation,
            sub_patch: Some(slot),
        }
    }

    /// Decode a descriptor from the raw codes of an external patch table.
    ///
    /// Returns `None` if a code is unknown, the type is
    /// [`NonPatch`](PatchType::NonPatch), the rotation is not in `0..4` or a
    /// transition pattern is attached to anything but a
    /// [`Regular`](PatchType::Regular) patch.
    pub fn from_raw(raw: RawPatchDescriptor) -> Option<Self> {
        let patch_type = PatchType::try_from(raw.patch_type).ok()?;
        let pattern = TransitionPattern::try_from(raw.pattern).ok()?;

        if patch_type == PatchType::NonPatch || raw.rotation >= 4 {
            return None;
        }

        if pattern != TransitionPattern::NonTransition && patch_type != PatchType::Regular {
            return None;
        }

        Some(Self {
            patch_type,
            pattern,
            rotation: raw.rotation as u8,
            sub_patch: None,
        })
    }

    /// Returns the patch type.
    #[inline]
    pub fn patch_type(&self) -> PatchType {
        self.patch_type
    }

    /// Returns the transition pattern.
    #[inline]
    pub fn pattern(&self) -> TransitionPattern {
        self.pattern
    }

    /// Returns the rotation of the transition pattern.
    #[inline]
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Returns the slot in the transition decomposition if this describes a
    /// generated sub-patch.
    #[inline]
    pub fn sub_patch_slot(&self) -> Option<u8> {
        self.sub_patch
    }

    /// Returns the number of control vertices of one patch.
    #[inline]
    pub fn control_vertices_len(&self) -> usize {
        self.patch_type.control_vertices_len()
    }

    /// Returns `true` if this describes transition patches that still need
    /// to be split before drawing.
    #[inline]
    pub fn is_transition(&self) -> bool {
        self.pattern != TransitionPattern::NonTransition && self.sub_patch.is_none()
    }

    /// Returns `true` if the patches stem from feature adaptive refinement.
    ///
    /// Transition patches and the sub-patches split from them are adaptive
    /// whatever their primitive type.
    #[inline]
    pub fn is_adaptive(&self) -> bool {
        self.pattern != TransitionPattern::NonTransition || self.patch_type.is_adaptive()
    }

    /// Returns the number of quad-offset entries per patch.
    #[inline]
    pub fn quad_offsets_len(&self) -> usize {
        if self.patch_type.uses_quad_offsets() {
            QUAD_OFFSETS_PER_PATCH
        } else {
            0
        }
    }
}

impl From<PatchType> for PatchDescriptor {
    fn from(patch_type: PatchType) -> Self {
        Self::new(patch_type)
    }
}

/// Undecoded descriptor codes as stored by an external patch table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawPatchDescriptor {
    pub patch_type: u32,
    pub pattern: u32,
    pub rotation: u32,
}

impl From<PatchDescriptor> for RawPatchDescriptor {
    fn from(descriptor: PatchDescriptor) -> Self {
        Self {
            patch_type: descriptor.patch_type.into(),
            pattern: descriptor.pattern.into(),
            rotation: descriptor.rotation as u32,
        }
    }
}
