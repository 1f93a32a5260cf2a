//! Tests for buffer packing.


use opensubdiv_draw::far::*;
use opensubdiv_draw::osd::*;
use opensubdiv_draw::{Error, Index};
use test_utils::*;

fn converted(table: &PatchTable) -> Vec<PatchArray> {
    convert_patch_arrays(table, ConvertOptions::default()).expect("Failed to convert patch arrays")
}

#[test]
fn test_pack_patch_verts_matches_array_offsets() {
    let table = mixed_table();
    let arrays = converted(&table);

    let mut indices = Vec::new();
    pack_patch_verts(&table, &arrays, &mut indices).unwrap();

    let expected_len: usize = arrays.iter().map(PatchArray::indices_len).sum();
    assert_eq!(indices.len(), expected_len);

    // Every control vertex of the table appears exactly once.
    let mut sorted = indices.clone();
    sorted.sort();
    assert_eq!(sorted, control_vertices(0, 109));

    // Non-transition arrays copy their source range verbatim.
    let boundary = arrays[5];
    assert_eq!(
        &indices[boundary.vert_index()..boundary.vert_index() + boundary.indices_len()],
        &control_vertices(80, 12)[..]
    );
}

#[test]
fn test_pack_patch_verts_gathers_sub_patch_slices() {
    let mut table = PatchTable::new(4);
    push_patches(
        &mut table,
        PatchDescriptor::transition(TransitionPattern::Pattern4, 1),
        2,
    );

    let arrays = converted(&table);
    assert_eq!(arrays.len(), 2);

    let mut indices = Vec::new();
    pack_patch_verts(&table, &arrays, &mut indices).unwrap();

    // Rotation 1 emits the quads slot (control vertices 12..16) first.
    assert_eq!(arrays[0].descriptor().patch_type(), PatchType::Quads);
    assert_eq!(arrays[0].indices_len(), 8);
    let mut expected = control_vertices(12, 4);
    expected.extend(control_vertices(28, 4));
    expected.extend(control_vertices(0, 12));
    expected.extend(control_vertices(16, 12));
    assert_eq!(indices, expected);
}

#[test]
fn test_pack_patch_verts_after_coalescing() {
    let table = regular_table();
    let arrays = convert_patch_arrays(
        &table,
        ConvertOptions {
            coalesce: true,
            ..Default::default()
        },
    )
    .unwrap();

    let mut indices = Vec::new();
    pack_patch_verts(&table, &arrays, &mut indices).unwrap();
    assert_eq!(indices, control_vertices(0, 160));
}

#[test]
fn test_pack_patch_verts_rejects_broken_chain() {
    let table = regular_table();
    let mut arrays = converted(&table);
    arrays.swap(0, 1);

    let mut indices = vec![Index(7)];
    let result = pack_patch_verts(&table, &arrays, &mut indices);
    assert_eq!(
        result,
        Err(Error::OffsetMismatch {
            array_index: 0,
            offset: "vertex index",
            expected: 0,
            actual: 64,
        })
    );
    // The destination is left as it was.
    assert_eq!(indices, vec![Index(7)]);
}

#[test]
fn test_pack_patch_verts_rejects_changed_descriptor() {
    let table = regular_table();
    let mut arrays = converted(&table);
    arrays[1].set_descriptor(PatchDescriptor::new(PatchType::Boundary));

    let mut indices = Vec::new();
    let result = pack_patch_verts(&table, &arrays, &mut indices);
    assert!(matches!(result, Err(Error::InvalidPatch(_))));
    assert!(indices.is_empty());
}

#[test]
fn test_pack_patch_verts_unknown_patches() {
    let table = regular_table();
    let arrays = vec![PatchArray::new(
        PatchDescriptor::new(PatchType::Regular),
        1,
        0,
        10,
        0,
    )];

    let mut indices = Vec::new();
    assert_eq!(
        pack_patch_verts(&table, &arrays, &mut indices),
        Err(Error::IndexOutOfBounds { index: 10, max: 10 })
    );
}

#[test]
fn test_pack_sharpness_values_skips_smooth_patches() {
    let mut table = regular_table();
    table.set_patch_sharpness(1, 2.0).unwrap();
    table.set_patch_sharpness(7, 0.5).unwrap();
    table.set_patch_sharpness(3, 10.0).unwrap();

    let mut sharpness = Vec::new();
    pack_sharpness_values(&table, &mut sharpness).unwrap();
    assert_eq!(sharpness, vec![2.0, 10.0, 0.5]);
}

/// A table whose per-patch data is inconsistent.
struct DanglingSharpness {
    arrays: Vec<SourcePatchArray>,
    control_vertices: Vec<Index>,
}

impl DanglingSharpness {
    fn new() -> Self {
        Self {
            arrays: vec![SourcePatchArray {
                descriptor: PatchDescriptor::new(PatchType::Quads).into(),
                patches_len: 2,
                vert_index: 0,
                patch_index: 0,
                quad_offset_index: 0,
            }],
            control_vertices: control_vertices(0, 8),
        }
    }
}

impl PatchTableSource for DanglingSharpness {
    fn patch_arrays(&self) -> &[SourcePatchArray] {
        &self.arrays
    }

    fn control_vertices_table(&self) -> &[Index] {
        &self.control_vertices
    }

    fn quad_offsets_table(&self) -> &[u32] {
        &[]
    }

    fn max_valence(&self) -> usize {
        4
    }

    fn patch_sharpness_index(&self, patch_index: usize) -> Option<usize> {
        Some(patch_index * 3)
    }

    fn sharpness_values(&self) -> &[f32] {
        &[1.0, 2.0]
    }

    fn patch_fvar_values(&self, _patch_index: usize) -> Option<&[Index]> {
        None
    }
}

#[test]
fn test_pack_sharpness_values_underrun() {
    let table = DanglingSharpness::new();

    let mut sharpness = vec![9.0];
    assert_eq!(
        pack_sharpness_values(&table, &mut sharpness),
        Err(Error::BufferUnderrun {
            required: 4,
            available: 2,
        })
    );
    assert_eq!(sharpness, vec![9.0]);
}

#[test]
fn test_custom_source_converts_and_packs() {
    let table = DanglingSharpness::new();
    let context = DrawContext::build(&table, ConvertOptions::default()).unwrap();

    let mut indices = Vec::new();
    pack_patch_verts(&table, context.patch_arrays(), &mut indices).unwrap();
    assert_eq!(indices, control_vertices(0, 8));

    let mut fvar = Vec::new();
    assert_eq!(
        pack_fvar_data(&table, 2, &[0.0; 8], &mut fvar),
        Err(Error::IndexOutOfBounds { index: 0, max: 2 })
    );
    assert!(fvar.is_empty());
}

fn uv_table() -> PatchTable {
    let mut table = PatchTable::new(4);
    push_patches(&mut table, PatchDescriptor::new(PatchType::Quads), 2);
    push_patches(&mut table, PatchDescriptor::new(PatchType::Triangles), 1);
    table
        .set_fvar_values(vec![
            Index(0),
            Index(1),
            Index(2),
            Index(3),
            Index(1),
            Index(4),
            Index(5),
            Index(2),
            Index(5),
            Index(4),
            Index(0),
        ])
        .unwrap();
    table
}

#[test]
fn test_pack_fvar_data_gathers_corners() {
    let table = uv_table();
    let uvs: Vec<f32> = (0..6).flat_map(|value| [value as f32, 10.0 * value as f32]).collect();

    let mut packed = Vec::new();
    pack_fvar_data(&table, 2, &uvs, &mut packed).unwrap();

    // Four corners for each quad, three for the triangle.
    assert_eq!(packed.len(), (4 + 4 + 3) * 2);
    assert_eq!(&packed[..4], &[0.0, 0.0, 1.0, 10.0]);
    assert_eq!(&packed[16..], &[5.0, 50.0, 4.0, 40.0, 0.0, 0.0]);
}

#[test]
fn test_pack_fvar_data_width_must_divide_source() {
    let table = uv_table();
    let uvs = [0.0f32; 12];

    let mut packed = Vec::new();
    assert_eq!(
        pack_fvar_data(&table, 5, &uvs, &mut packed),
        Err(Error::FVarWidthMismatch { width: 5, len: 12 })
    );
    assert_eq!(
        pack_fvar_data(&table, 0, &uvs, &mut packed),
        Err(Error::FVarWidthMismatch { width: 0, len: 12 })
    );
    assert!(packed.is_empty());
}

#[test]
fn test_pack_fvar_data_short_source() {
    let table = uv_table();
    // Only five values for indices up to 5.
    let uvs = [0.0f32; 10];

    let mut packed = Vec::new();
    assert_eq!(
        pack_fvar_data(&table, 2, &uvs, &mut packed),
        Err(Error::BufferUnderrun {
            required: 12,
            available: 10,
        })
    );
    assert!(packed.is_empty());
}

#[test]
fn test_pack_fvar_data_huge_width() {
    let mut table = PatchTable::new(4);
    push_patches(&mut table, PatchDescriptor::new(PatchType::Quads), 1);
    table
        .set_fvar_values(vec![Index(3), Index(2), Index(1), Index(0)])
        .unwrap();
    let width = usize::MAX / 2 + 1;

    // Index 3 times the width no longer fits a usize.
    let mut packed = vec![1.0];
    assert_eq!(
        pack_fvar_data(&table, width, &[], &mut packed),
        Err(Error::BufferUnderrun {
            required: usize::MAX,
            available: 0,
        })
    );
    assert_eq!(packed, vec![1.0]);
}

#[test]
fn test_pack_quad_offsets() {
    let table = mixed_table();
    let arrays = converted(&table);

    let mut quad_offsets = Vec::new();
    pack_quad_offsets(&table, &arrays, &mut quad_offsets).unwrap();
    assert_eq!(quad_offsets, (100..108).collect::<Vec<u32>>());
}

#[test]
fn test_pack_quad_offsets_underrun() {
    let mut table = mixed_table();
    table.set_quad_offsets(vec![0u32; 6]);
    let arrays = converted(&table);

    let mut quad_offsets = Vec::new();
    assert_eq!(
        pack_quad_offsets(&table, &arrays, &mut quad_offsets),
        Err(Error::BufferUnderrun {
            required: 8,
            available: 6,
        })
    );
    assert!(quad_offsets.is_empty());
}

#[test]
fn test_packed_buffers() {
    let mut table = uv_table();
    table.set_patch_sharpness(2, 4.0).unwrap();
    let arrays = converted(&table);
    let uvs = [0.5f32; 12];

    let buffers = PackedBuffers::pack(
        &table,
        &arrays,
        Some(FVarSource {
            width: 2,
            data: &uvs,
        }),
    )
    .unwrap();

    assert_eq!(buffers.vertex_indices, control_vertices(0, 11));
    assert_eq!(buffers.sharpness_values, vec![4.0]);
    assert_eq!(buffers.fvar_data.len(), 22);
    assert!(buffers.quad_offsets.is_empty());

    assert_eq!(buffers.vertex_index_bytes().len(), 44);
    assert_eq!(buffers.sharpness_bytes(), &4.0f32.to_ne_bytes());
    assert_eq!(buffers.fvar_bytes().len(), 88);
    assert!(buffers.quad_offset_bytes().is_empty());
}
