#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn render_cube(
    size: u32,
    camera_placement: objscene::config::CameraPlacement,
) -> (image::RgbaImage, objscene::flow::SceneContext) {
    use objscene::{
        config::ViewerConfig,
        context::{Context, Viewport},
        flow::SceneContext,
    };

    use crate::common::test_utils::cube_geometry;

    let config = ViewerConfig {
        camera_placement,
        ..Default::default()
    };
    let mut scene = SceneContext::build(
        &cube_geometry(20.0),
        Viewport::new(size, size, 1.0),
        &config,
    )
    .expect("scene setup succeeds");

    let img = futures::executor::block_on(async {
        let mut ctx = Context::headless(&scene.renderer)
            .await
            .expect("a GPU adapter is available");
        ctx.prepare(&mut scene.scene);
        scene.camera.update_projection_matrix();
        ctx.snapshot(&mut scene.scene, &scene.camera).await
    })
    .expect("snapshot succeeds");
    (img, scene)
}

#[cfg(feature = "integration-tests")]
fn is_background(px: &image::Rgba<u8>) -> bool {
    close(px[0], 0xcc) && close(px[1], 0xcc) && close(px[2], 0xcc)
}

#[cfg(feature = "integration-tests")]
fn close(a: u8, b: u8) -> bool {
    a.abs_diff(b) <= 2
}

#[test]
#[cfg(feature = "integration-tests")]
fn background_uses_the_clear_colour() {
    let (img, _) = render_cube(256, objscene::config::CameraPlacement::Detached);

    assert_eq!(img.dimensions(), (256, 256));
    for (x, y) in [(0, 0), (255, 0), (0, 255), (255, 255)] {
        let px = img.get_pixel(x, y);
        assert!(is_background(px), "{:?}", px);
        assert_eq!(px[3], 0xff);
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn cube_is_drawn_where_the_camera_projects_it() {
    use cgmath::{Vector4, Zero};
    use objscene::{data_structures::scene_graph::SceneNode, flow::GROUP_NAME};

    let size = 256;
    let (img, scene) = render_cube(size, objscene::config::CameraPlacement::Detached);

    let group = scene.scene.get_object_by_name(GROUP_NAME).unwrap();
    let centre = group.position().get();
    let clip = scene.camera.view_projection() * Vector4::new(centre.x, centre.y, centre.z, 1.0);
    assert!(!clip.w.is_zero());
    let (ndc_x, ndc_y) = (clip.x / clip.w, clip.y / clip.w);
    let x = ((ndc_x + 1.0) * 0.5 * size as f32) as u32;
    let y = ((1.0 - ndc_y) * 0.5 * size as f32) as u32;

    let px = img.get_pixel(x, y);
    assert!(!is_background(px), "expected the cube at ({}, {}), got {:?}", x, y, px);
    // a grey material under a white light stays grey
    assert!(close(px[0], px[1]) && close(px[1], px[2]), "{:?}", px);
}

#[test]
#[cfg(feature = "integration-tests")]
fn aliased_camera_sees_only_the_outline_from_inside_the_cube() {
    use objscene::{config::CameraPlacement, data_structures::scene_graph::SceneNode, flow::GROUP_NAME};

    let (img, scene) = render_cube(256, CameraPlacement::Aliased);

    // the group sits on the camera, so the eye is at the cube's centre
    let group = scene.scene.get_object_by_name(GROUP_NAME).unwrap();
    assert_eq!(group.position().get(), scene.camera.position().get());

    // every face is seen from behind and culled
    let total = img.pixels().count();
    let background = img.pixels().filter(|px| is_background(px)).count();
    assert!(background * 10 > total * 9, "{} of {} pixels are background", background, total);

    // the far edges of the cube still show as dark lines
    let dark = img.pixels().filter(|px| px[0] < 0xc0 && px[1] < 0xc0 && px[2] < 0xc0).count();
    assert!(dark > 0, "no outline pixels");
}
