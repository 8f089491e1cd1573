use objscene::data_structures::{edges::EdgesGeometry, geometry::Geometry};

use crate::common::test_utils::{cube_geometry, flat_square};

mod common;

/// The same surface with every triangle owning its own three vertices.
fn unshared(geometry: &Geometry) -> Geometry {
    let positions: Vec<[f32; 3]> = geometry
        .indices()
        .iter()
        .map(|&i| geometry.positions()[i as usize])
        .collect();
    let indices = (0..positions.len() as u32).collect();
    Geometry::new(positions, indices).unwrap()
}

#[test]
fn cube_outline_has_twelve_edges() {
    let edges = EdgesGeometry::new(&cube_geometry(20.0), 1.0);
    assert_eq!(edges.segment_count(), 12);
}

#[test]
fn coplanar_diagonals_are_dropped() {
    let edges = EdgesGeometry::new(&flat_square(), 1.0);

    assert_eq!(edges.segment_count(), 4);
    for [a, b] in edges.segments() {
        // the diagonal is the only edge whose endpoints differ in both x and y
        assert!(a[0] == b[0] || a[1] == b[1]);
    }
}

#[test]
fn a_lone_triangle_is_all_boundary() {
    let triangle = Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2],
    )
    .unwrap();
    assert_eq!(EdgesGeometry::new(&triangle, 1.0).segment_count(), 3);
}

#[test]
fn threshold_decides_whether_a_fold_is_outlined() {
    // two triangles folded by 30 degrees along the x axis
    let (s, c) = 30f32.to_radians().sin_cos();
    let folded = Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, c, s], [0.0, -1.0, 0.0]],
        vec![0, 1, 2, 1, 0, 3],
    )
    .unwrap();

    // 4 boundary edges plus the fold
    assert_eq!(EdgesGeometry::new(&folded, 1.0).segment_count(), 5);
    assert_eq!(EdgesGeometry::new(&folded, 45.0).segment_count(), 4);
}

#[test]
fn wide_threshold_leaves_only_boundaries() {
    assert!(EdgesGeometry::new(&cube_geometry(1.0), 100.0).is_empty());
}

#[test]
fn edges_pair_across_duplicated_vertices() {
    let cube = unshared(&cube_geometry(20.0));
    assert_eq!(cube.vertex_count(), 36);

    let edges = EdgesGeometry::new(&cube, 1.0);
    assert_eq!(edges.segment_count(), 12);
}

#[test]
fn degenerate_triangles_are_skipped() {
    let geometry = Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        vec![0, 1, 2],
    )
    .unwrap();
    assert!(EdgesGeometry::new(&geometry, 1.0).is_empty());
}

#[test]
fn vertices_flatten_segments_into_a_line_list() {
    let edges = EdgesGeometry::new(&cube_geometry(1.0), 1.0);
    let vertices: Vec<_> = edges.vertices().collect();

    assert_eq!(vertices.len(), 24);
    assert_eq!(vertices[0], edges.segments()[0][0]);
    assert_eq!(vertices[1], edges.segments()[0][1]);
}
