use approx::assert_relative_eq;
use cgmath::{InnerSpace, Point3, Vector3};
use objscene::camera::{OrbitControls, PerspectiveCamera};

fn camera_at(position: [f32; 3]) -> PerspectiveCamera {
    let mut camera = PerspectiveCamera::new(75.0, 1.0, 1.0, 1000.0);
    camera.position().set(position.into());
    camera
}

fn distance(camera: &PerspectiveCamera, controls: &OrbitControls) -> f32 {
    (camera.eye() - controls.target).magnitude()
}

#[test]
fn new_controls_turn_the_camera_to_the_target() {
    let mut camera = camera_at([0.0, 50.0, 150.0]);
    let controls = OrbitControls::new(&mut camera);

    let to_target = (controls.target - camera.eye()).normalize();
    assert_relative_eq!(camera.direction().dot(to_target), 1.0, epsilon = 1e-5);
    assert_relative_eq!(camera.position().get().z, 150.0, epsilon = 1e-3);
}

#[test]
fn rotating_keeps_the_distance_to_the_target() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);

    controls.rotate_by_pixels(150.0, 0.0, 600.0);
    assert!(controls.update(&mut camera));

    assert_relative_eq!(distance(&camera, &controls), 100.0, epsilon = 1e-2);
    // a quarter of the height turns by half pi
    let p = camera.position().get();
    assert_relative_eq!(p.x, -100.0, epsilon = 1e-2);
    assert_relative_eq!(p.z, 0.0, epsilon = 1e-2);
}

#[test]
fn polar_angle_never_flips_over_the_pole() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);

    controls.rotate_by_pixels(0.0, 10_000.0, 600.0);
    controls.update(&mut camera);

    let p = camera.position().get();
    assert!(p.y > 99.0);
    assert!(camera.view_matrix().x.x.is_finite());
}

#[test]
fn wheel_steps_dolly_towards_the_target() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);

    controls.dolly(1.0);
    controls.update(&mut camera);
    assert_relative_eq!(distance(&camera, &controls), 95.0, epsilon = 1e-3);

    controls.dolly(-1.0);
    controls.update(&mut camera);
    assert_relative_eq!(distance(&camera, &controls), 100.0, epsilon = 1e-3);
}

#[test]
fn distance_is_clamped() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);
    controls.min_distance = 90.0;

    controls.dolly(10.0);
    controls.update(&mut camera);

    assert_relative_eq!(distance(&camera, &controls), 90.0, epsilon = 1e-3);
}

#[test]
fn disabled_zoom_ignores_the_wheel() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);
    controls.enable_zoom = false;

    controls.dolly(3.0);

    assert!(!controls.update(&mut camera));
}

#[test]
fn panning_moves_camera_and_target_together() {
    let mut camera = camera_at([0.0, 0.0, 100.0]);
    let mut controls = OrbitControls::new(&mut camera);
    let offset_before = camera.position().get() - Vector3::new(0.0, 0.0, 0.0);

    controls.pan_by_pixels(100.0, 0.0, 600.0, &camera);
    controls.update(&mut camera);

    // dragging right moves the view to the left
    assert!(controls.target.x < 0.0);
    let offset_after = camera.eye() - controls.target;
    assert_relative_eq!(offset_after.x, offset_before.x, epsilon = 1e-3);
    assert_relative_eq!(offset_after.z, offset_before.z, epsilon = 1e-3);
}

#[test]
fn update_without_input_reports_no_movement() {
    let mut camera = camera_at([10.0, 20.0, 30.0]);
    let mut controls = OrbitControls::new(&mut camera);
    controls.target = Point3::new(0.0, 0.0, 0.0);

    assert!(!controls.update(&mut camera));
}
