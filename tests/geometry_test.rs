use approx::assert_relative_eq;
use objscene::data_structures::geometry::Geometry;

use crate::common::test_utils::{cube_geometry, flat_square};

mod common;

#[test]
fn rejects_index_count_not_multiple_of_three() {
    let result = Geometry::new(vec![[0.0; 3]; 3], vec![0, 1]);
    assert!(result.is_err());
}

#[test]
fn rejects_out_of_range_indices() {
    let result = Geometry::new(vec![[0.0; 3]; 3], vec![0, 1, 3]);
    assert!(result.is_err());
}

#[test]
fn rejects_normals_of_the_wrong_length() {
    let result = flat_square().with_normals(vec![[0.0, 0.0, 1.0]; 3]);
    assert!(result.is_err());
}

#[test]
fn counts_vertices_and_triangles() {
    let cube = cube_geometry(1.0);
    assert_eq!(cube.vertex_count(), 8);
    assert_eq!(cube.triangle_count(), 12);
    assert_eq!(cube.triangles().count(), 12);
}

#[test]
fn face_normals_point_out_of_counter_clockwise_triangles() {
    let mut square = flat_square();
    square.compute_face_normals();

    for n in square.face_normals().unwrap() {
        assert_relative_eq!(n[0], 0.0);
        assert_relative_eq!(n[1], 0.0);
        assert_relative_eq!(n[2], 1.0);
    }
}

#[test]
fn degenerate_triangles_get_a_zero_normal() {
    let mut line = Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        vec![0, 1, 2],
    )
    .unwrap();
    line.compute_face_normals();

    assert_eq!(line.face_normals().unwrap(), [[0.0f32; 3]].as_slice());
}

#[test]
fn cube_vertex_normals_are_unit_length_and_point_outwards() {
    let mut cube = cube_geometry(1.0);
    cube.compute_vertex_normals();

    for (position, normal) in cube.positions().iter().zip(cube.normals().unwrap()) {
        let length = normal.iter().map(|c| c * c).sum::<f32>().sqrt();
        assert_relative_eq!(length, 1.0, epsilon = 1e-5);
        for axis in 0..3 {
            // every adjacent face contributes along its own axis only
            assert!(normal[axis] * position[axis] > 0.0);
        }
    }
}

#[test]
fn ensure_normals_fills_in_what_is_missing() {
    let mut cube = cube_geometry(1.0);
    assert!(!cube.has_normals());
    assert!(cube.face_normals().is_none());

    cube.ensure_normals();

    assert!(cube.has_normals());
    assert_eq!(cube.face_normals().unwrap().len(), 12);
}

#[test]
fn ensure_normals_keeps_existing_normals_and_is_repeatable() {
    let normals = vec![[1.0, 0.0, 0.0]; 4];
    let mut square = flat_square().with_normals(normals.clone()).unwrap();

    square.ensure_normals();
    let once = square.clone();
    square.ensure_normals();

    assert_eq!(square.normals().unwrap(), normals.as_slice());
    assert_eq!(square, once);
}

#[test]
fn merge_rebases_indices() {
    let mut merged = flat_square();
    merged.merge(flat_square());

    assert_eq!(merged.vertex_count(), 8);
    assert_eq!(merged.triangle_count(), 4);
    assert_eq!(&merged.indices()[6..], [4u32, 5, 6, 4, 6, 7].as_slice());
}

#[test]
fn merge_drops_normals_unless_both_sides_have_them() {
    let with = || flat_square().with_normals(vec![[0.0, 0.0, 1.0]; 4]).unwrap();

    let mut both = with();
    both.merge(with());
    assert_eq!(both.normals().map(|n| n.len()), Some(8));

    let mut one = with();
    one.merge(flat_square());
    assert!(!one.has_normals());
}
