use std::cell::Cell;

use cgmath::Vector3;
use objscene::{
    camera::PerspectiveCamera,
    context::Viewport,
    data_structures::{geometry::Geometry, scene_graph::Scene},
    flow::FrameScheduler,
    render::FrameRenderer,
};

/// A closed, axis-aligned cube of edge length `2 * half` centred on the origin,
/// wound counter-clockwise when seen from outside.
pub fn cube_geometry(half: f32) -> Geometry {
    let h = half;
    let positions = vec![
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 0, 2, 3, // front
        5, 4, 7, 5, 7, 6, // back
        4, 0, 3, 4, 3, 7, // left
        1, 5, 6, 1, 6, 2, // right
        3, 2, 6, 3, 6, 7, // top
        4, 5, 1, 4, 1, 0, // bottom
    ];
    Geometry::new(positions, indices).expect("cube geometry is valid")
}

/// Two triangles forming a unit square in the xy plane.
pub fn flat_square() -> Geometry {
    Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![0, 1, 2, 0, 2, 3],
    )
    .expect("square geometry is valid")
}

pub fn test_viewport() -> Viewport {
    Viewport::new(800, 600, 2.0)
}

/// What a [`MockRenderer`] saw on one call.
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub scene: *const Scene,
    pub camera: *const PerspectiveCamera,
    pub projection_revision: u64,
    pub camera_position: Vector3<f32>,
}

/// Records every render call instead of drawing.
#[derive(Default)]
pub struct MockRenderer {
    pub calls: Vec<RenderCall>,
    pub fail: bool,
}

impl FrameRenderer for MockRenderer {
    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        self.calls.push(RenderCall {
            scene: scene as *const Scene,
            camera: camera as *const PerspectiveCamera,
            projection_revision: camera.projection_revision(),
            camera_position: camera.position().get(),
        });
        if self.fail {
            anyhow::bail!("mock renderer failure");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockScheduler {
    requests: Cell<u32>,
}

impl MockScheduler {
    pub fn requests(&self) -> u32 {
        self.requests.get()
    }
}

impl FrameScheduler for MockScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}
