//! Tests for the Index newtype wrapper.

use opensubdiv_draw::Index;

#[test]
fn test_index_from_u32() {
    let idx = Index::from(42u32);
    assert_eq!(idx.0, 42);
}

#[test]
fn test_index_into_u32() {
    let idx = Index(42);
    let value: u32 = idx.into();
    assert_eq!(value, 42);
}

#[test]
fn test_index_from_usize() {
    let idx = Index::from(100usize);
    assert_eq!(idx.0, 100);
}

#[test]
fn test_index_into_usize() {
    let idx = Index(100);
    let value: usize = idx.into();
    assert_eq!(value, 100);
}

#[test]
fn test_index_debug() {
    let idx = Index(42);
    let debug_str = format!("{:?}", idx);
    assert_eq!(debug_str, "Index(42)");
}

#[test]
fn test_index_ordering() {
    let idx1 = Index(1);
    let idx2 = Index(2);
    let idx3 = Index(2);

    assert!(idx1 < idx2);
    assert!(idx2 > idx1);
    assert!(idx2 <= idx3);
    assert!(idx2 >= idx3);
}

#[test]
fn test_index_slice_casts_to_u32() {
    let indices = vec![Index(0), Index(7), Index(u32::MAX)];

    // Index is a transparent u32 so index buffers upload without copying.
    let raw: &[u32] = bytemuck::cast_slice(&indices);
    assert_eq!(raw, &[0, 7, u32::MAX]);

    let bytes: &[u8] = bytemuck::cast_slice(&indices);
    assert_eq!(bytes.len(), 12);
}
