//! Camera types, orbit controls and the camera uniform.
//!
//! [`PerspectiveCamera`] owns its projection parameters and the lights
//! attached to it. Its position is a shared [`Position`] handle so it can be
//! aliased with a scene node. [`OrbitControls`] turns pointer drags and wheel
//! input into orbiting, dollying and panning around a target point.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3, Zero};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::{config::Colour, data_structures::scene_graph::Position, pipelines::basic};

/// wgpu's clip space has z in [0, 1] where cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A point light. Its position is relative to whatever it is attached to.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: Vector3<f32>,
}

impl PointLight {
    pub fn new(colour: Colour, intensity: f32) -> Self {
        Self {
            colour,
            intensity,
            position: Vector3::zero(),
        }
    }
}

#[derive(Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    position: Position,
    direction: Vector3<f32>,
    up: Vector3<f32>,
    lights: Vec<PointLight>,
    projection_matrix: Matrix4<f32>,
    projection_revision: u64,
}

impl PerspectiveCamera {
    /// A camera at the origin looking down -z.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Position::default(),
            direction: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            lights: Vec::new(),
            projection_matrix: Matrix4::zero(),
            projection_revision: 0,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Replace the position handle. Passing a clone of another node's handle
    /// aliases the two.
    pub fn set_position_handle(&mut self, position: Position) {
        self.position = position;
    }

    pub fn eye(&self) -> Point3<f32> {
        Point3::from_vec(self.position.get())
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Unit vector pointing to the right of the view direction.
    pub fn right(&self) -> Vector3<f32> {
        self.direction.cross(self.up).normalize()
    }

    /// Turn the camera towards `target`. Looking at its own position is a no-op.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let dir = target - self.eye();
        if dir.magnitude2() > 0.0 {
            self.direction = dir.normalize();
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.eye(), self.direction, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    /// Recompute the projection from `fov`, `aspect`, `near` and `far`.
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(cgmath::Deg(self.fov), self.aspect, self.near, self.far);
        self.projection_revision += 1;
    }

    /// How many times the projection has been recomputed.
    pub fn projection_revision(&self) -> u64 {
        self.projection_revision
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix * self.view_matrix()
    }

    pub fn add(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// World position of a light attached to this camera.
    pub fn light_world_position(&self, light: &PointLight) -> Vector3<f32> {
        let p = light.position;
        self.position.get() + self.right() * p.x + self.camera_up() * p.y - self.direction * p.z
    }

    fn camera_up(&self) -> Vector3<f32> {
        self.right().cross(self.direction)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ControlState {
    None,
    Rotate,
    Pan,
}

/// Orbit, dolly and pan a camera around a target point.
///
/// Input only accumulates deltas; [`OrbitControls::update`] applies them to
/// the camera and resets them.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    state: ControlState,
    last_cursor: Option<(f64, f64)>,
    // active touches by id, in the order they went down
    touches: Vec<(u64, (f64, f64))>,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

const POLAR_EPS: f32 = 1e-6;

impl OrbitControls {
    /// Bind controls to `camera`, orbiting the origin. The camera is turned
    /// towards the target immediately.
    pub fn new(camera: &mut PerspectiveCamera) -> Self {
        let mut controls = Self {
            target: Point3::new(0.0, 0.0, 0.0),
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            state: ControlState::None,
            last_cursor: None,
            touches: Vec::new(),
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zero(),
        };
        controls.update(camera);
        controls
    }

    /// Orbit by a pointer drag of `(dx, dy)` pixels on a surface `height` pixels tall.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, height: f32) {
        if !self.enable_rotate || height <= 0.0 {
            return;
        }
        self.theta_delta -= 2.0 * PI * dx / height * self.rotate_speed;
        self.phi_delta -= 2.0 * PI * dy / height * self.rotate_speed;
    }

    /// Dolly by wheel steps; positive steps move towards the target.
    pub fn dolly(&mut self, steps: f32) {
        if !self.enable_zoom || steps == 0.0 {
            return;
        }
        let zoom_scale = 0.95f32.powf(self.zoom_speed);
        self.scale *= zoom_scale.powf(steps);
    }

    /// Dolly by a pinch whose finger spread changed by `ratio`; spreading moves
    /// towards the target.
    pub fn pinch(&mut self, ratio: f32) {
        if !self.enable_zoom || ratio <= 0.0 {
            return;
        }
        self.scale /= ratio.powf(self.zoom_speed);
    }

    /// Pan by a pointer drag, scaled so the point under the cursor follows it.
    pub fn pan_by_pixels(&mut self, dx: f32, dy: f32, height: f32, camera: &PerspectiveCamera) {
        if !self.enable_pan || height <= 0.0 {
            return;
        }
        let offset = camera.position().get() - self.target.to_vec();
        let target_distance = offset.magnitude() * (camera.fov.to_radians() / 2.0).tan();
        let left = 2.0 * dx * target_distance / height * self.pan_speed;
        let up = 2.0 * dy * target_distance / height * self.pan_speed;
        self.pan_offset += -camera.right() * left;
        self.pan_offset += camera.right().cross(camera.direction()) * up;
    }

    /// Feed a window event. Returns `true` if the controls consumed it.
    pub fn handle_window_events(&mut self, event: &WindowEvent, camera: &PerspectiveCamera, height: f32) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.state = match (button, state) {
                    (MouseButton::Left, ElementState::Pressed) => ControlState::Rotate,
                    (MouseButton::Right, ElementState::Pressed) => ControlState::Pan,
                    (_, ElementState::Released) => ControlState::None,
                    _ => self.state,
                };
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x, position.y);
                let consumed = self.drag_to(current, camera, height);
                self.last_cursor = Some(current);
                consumed
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
                };
                self.dolly(steps);
                true
            }
            WindowEvent::Touch(touch) => self.touch(
                touch.id,
                (touch.location.x, touch.location.y),
                touch.phase,
                camera,
                height,
            ),
            _ => false,
        }
    }

    /// One finger orbits, two fingers pinch to dolly and drag to pan. Fingers
    /// beyond the first two are tracked but ignored.
    fn touch(
        &mut self,
        id: u64,
        current: (f64, f64),
        phase: TouchPhase,
        camera: &PerspectiveCamera,
        height: f32,
    ) -> bool {
        let slot = self.touches.iter().position(|(t, _)| *t == id);
        match (phase, slot) {
            (TouchPhase::Started, None) => {
                self.touches.push((id, current));
                true
            }
            (TouchPhase::Moved, Some(i)) => {
                let last = std::mem::replace(&mut self.touches[i].1, current);
                match (self.touches.len(), i) {
                    (1, _) => {
                        let (dx, dy) = pixel_delta(last, current);
                        self.rotate_by_pixels(dx, dy, height);
                    }
                    (_, 0 | 1) => {
                        let other = self.touches[1 - i].1;
                        let (before, after) = (span(last, other), span(current, other));
                        if before > 0.0 && after > 0.0 {
                            self.pinch(after / before);
                        }
                        let (dx, dy) = pixel_delta(midpoint(last, other), midpoint(current, other));
                        self.pan_by_pixels(dx, dy, height, camera);
                    }
                    _ => return false,
                }
                true
            }
            (TouchPhase::Ended | TouchPhase::Cancelled, Some(i)) => {
                self.touches.remove(i);
                true
            }
            _ => false,
        }
    }

    fn drag_to(&mut self, current: (f64, f64), camera: &PerspectiveCamera, height: f32) -> bool {
        let Some(last) = self.last_cursor else {
            return false;
        };
        let (dx, dy) = pixel_delta(last, current);
        match self.state {
            ControlState::Rotate => self.rotate_by_pixels(dx, dy, height),
            ControlState::Pan => self.pan_by_pixels(dx, dy, height, camera),
            ControlState::None => return false,
        }
        true
    }

    /// Apply accumulated input to the camera. Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position().get();
        let offset = before - self.target.to_vec();

        let mut radius = offset.magnitude();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        theta += self.theta_delta;
        phi += self.phi_delta;
        phi = phi.clamp(
            self.min_polar_angle.max(POLAR_EPS),
            self.max_polar_angle.min(PI - POLAR_EPS),
        );
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset;

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let after = self.target.to_vec() + offset;
        camera.position().set(after);
        camera.look_at(self.target);

        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vector3::zero();

        // ignore the rounding of the spherical round trip
        (after - before).magnitude() > 1e-5 * radius.max(1.0)
    }
}

fn pixel_delta(from: (f64, f64), to: (f64, f64)) -> (f32, f32) {
    ((to.0 - from.0) as f32, (to.1 - from.1) as f32)
}

fn span(a: (f64, f64), b: (f64, f64)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1) as f32
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// The camera data the shaders see.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &PerspectiveCamera) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = camera.view_projection().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// The buffer starts out with an identity projection until the first
    /// [`CameraResources::write`].
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = basic::mk_uniform_layout(device, "camera_bind_group_layout");
        let bind_group = basic::mk_uniform_bind_group(device, &bind_group_layout, &buffer);

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &PerspectiveCamera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
