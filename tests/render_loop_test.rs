use objscene::{config::ViewerConfig, flow::SceneContext};

use crate::common::test_utils::{MockRenderer, MockScheduler, cube_geometry, test_viewport};

mod common;

fn build() -> SceneContext {
    SceneContext::build(&cube_geometry(20.0), test_viewport(), &ViewerConfig::default()).unwrap()
}

#[test]
fn each_frame_renders_the_scene_with_the_camera() {
    let mut ctx = build();
    let mut renderer = MockRenderer::default();
    let scheduler = MockScheduler::default();

    for _ in 0..3 {
        ctx.animate(&mut renderer, &scheduler).unwrap();
    }

    assert_eq!(renderer.calls.len(), 3);
    for call in &renderer.calls {
        assert!(std::ptr::eq(call.scene, &ctx.scene));
        assert!(std::ptr::eq(call.camera, &ctx.camera));
    }
}

#[test]
fn projection_is_refreshed_before_every_render() {
    let mut ctx = build();
    let mut renderer = MockRenderer::default();
    let scheduler = MockScheduler::default();
    let before = ctx.camera.projection_revision();

    ctx.animate(&mut renderer, &scheduler).unwrap();
    ctx.animate(&mut renderer, &scheduler).unwrap();

    assert_eq!(renderer.calls[0].projection_revision, before + 1);
    assert_eq!(renderer.calls[1].projection_revision, before + 2);
}

#[test]
fn each_frame_schedules_the_next_one() {
    let mut ctx = build();
    let mut renderer = MockRenderer::default();
    let scheduler = MockScheduler::default();

    ctx.animate(&mut renderer, &scheduler).unwrap();
    ctx.animate(&mut renderer, &scheduler).unwrap();

    assert_eq!(scheduler.requests(), 2);
}

#[test]
fn projection_follows_aspect_changes() {
    let mut ctx = build();
    let mut renderer = MockRenderer::default();
    let scheduler = MockScheduler::default();
    ctx.animate(&mut renderer, &scheduler).unwrap();
    let wide = ctx.camera.projection_matrix();

    ctx.resize(600, 600, 1.0);
    ctx.animate(&mut renderer, &scheduler).unwrap();
    let square = ctx.camera.projection_matrix();

    // x scale is f / aspect
    assert!(square.x.x > wide.x.x);
    assert_eq!(square.y.y, wide.y.y);
}

#[test]
fn render_errors_are_returned_after_scheduling() {
    let mut ctx = build();
    let mut renderer = MockRenderer {
        fail: true,
        ..Default::default()
    };
    let scheduler = MockScheduler::default();

    assert!(ctx.animate(&mut renderer, &scheduler).is_err());
    assert_eq!(scheduler.requests(), 1);
    assert_eq!(renderer.calls.len(), 1);
}
