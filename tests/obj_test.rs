use objscene::{
    data_structures::edges::EdgesGeometry,
    resources::{
        GeometryProvider, ObjSource, load_obj_source,
        obj::{FaceKind, ObjSummary},
    },
};

const CUBE_OBJ: &str = include_str!("../assets/model.obj");

const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

const MIXED_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v -1 0.5 0
vn 0 0 1
g first
f 1//1 2//1 3//1
g second
f 1//1 3//1 4//1 5//1
";

fn summary(text: &str) -> ObjSummary {
    ObjSource::new("test.obj", text).summary().unwrap()
}

#[test]
fn bundled_cube_triangulates_into_twelve_triangles() {
    let geometry = ObjSource::new("model.obj", CUBE_OBJ).load_geometry().unwrap();

    assert_eq!(geometry.triangle_count(), 12);
    assert!(!geometry.has_normals());
}

#[test]
fn bundled_cube_outline_skips_quad_diagonals() {
    let geometry = ObjSource::new("model.obj", CUBE_OBJ).load_geometry().unwrap();
    assert_eq!(EdgesGeometry::new(&geometry, 1.0).segment_count(), 12);
}

#[test]
fn bundled_cube_summary_lists_six_quads_in_six_groups() {
    let summary = summary(CUBE_OBJ);

    assert!(summary.grouped);
    assert_eq!(summary.groups.len(), 6);
    assert_eq!(summary.face_count(), 6);
    for group in &summary.groups {
        assert_eq!(group.faces.len(), 1);
        assert_eq!(group.faces[0].kind, FaceKind::Quad);
        assert_eq!(group.faces[0].vertices.len(), 4);
    }
}

#[test]
fn summary_without_groups_prints_faces_only() {
    let summary = summary(TRIANGLE_OBJ);

    assert!(!summary.grouped);
    assert_eq!(
        summary.to_string(),
        ">>> f [TRIANGLE]\n\
         0.000000 0.000000 0.000000\n\
         1.000000 0.000000 0.000000\n\
         0.000000 1.000000 0.000000\n"
    );
}

#[test]
fn object_names_alone_do_not_make_a_file_grouped() {
    let named = format!("o triangle\n{}", TRIANGLE_OBJ);
    let summary = summary(&named);

    assert!(!summary.grouped);
    assert!(!summary.to_string().contains(">>> Group:"));
    assert_eq!(summary.face_count(), 1);
}

#[test]
fn smoothing_groups_count_as_groups() {
    let smoothed = format!("s 1\n{}", TRIANGLE_OBJ);
    let summary = summary(&smoothed);

    assert!(summary.grouped);
    assert!(summary.to_string().starts_with(">>> Group:\n>>> f [TRIANGLE]\n"));
}

#[test]
fn summary_classifies_faces_by_vertex_count() {
    let summary = summary(MIXED_OBJ);

    let kinds: Vec<FaceKind> = summary
        .groups
        .iter()
        .flat_map(|g| g.faces.iter().map(|f| f.kind))
        .collect();
    assert_eq!(kinds, vec![FaceKind::Triangle, FaceKind::Polygon(5)]);
    assert_eq!(FaceKind::from_arity(4), FaceKind::Quad);

    let printed = summary.to_string();
    assert_eq!(printed.matches(">>> Group:").count(), 2);
    assert!(printed.contains(">>> f [POLYGON(5)]"));
}

#[test]
fn groups_are_merged_and_normals_kept_when_all_have_them() {
    let geometry = ObjSource::new("mixed.obj", MIXED_OBJ).load_geometry().unwrap();

    // one triangle plus the pentagon fanned into three
    assert_eq!(geometry.triangle_count(), 4);
    assert!(geometry.has_normals());
}

#[test]
fn invalid_face_references_are_reported() {
    let broken = ObjSource::new("broken.obj", "v 0 0 0\nf 1 2 3\n");
    assert!(broken.load_geometry().is_err());
}

#[test]
fn loads_the_bundled_model_from_assets() {
    let source = futures::executor::block_on(load_obj_source("model.obj")).unwrap();

    assert_eq!(source.name, "model.obj");
    assert_eq!(source.text, CUBE_OBJ);
}

#[test]
fn missing_assets_are_an_error() {
    let result = futures::executor::block_on(load_obj_source("does-not-exist.obj"));
    assert!(result.is_err());
}
