//! objscene
//!
//! A small, cross-platform OBJ viewer built on wgpu. It loads one Wavefront
//! OBJ model, computes its normals and outline, and shows it lit by a light
//! that follows an orbiting perspective camera. Runs natively in a window or
//! in the browser through WebGL.
//!
//! High-level modules
//! - `camera`: perspective camera, point light, orbit controls and the camera uniform
//! - `config`: the viewer's fixed constants and colours
//! - `context`: GPU context owning device/queue/pipelines, viewport and renderer settings
//! - `data_structures`: geometry, outlines, scene graph, instances and render targets
//! - `flow`: scene setup, per-frame callback and the winit event loop
//! - `pipelines`: mesh and outline pipelines with their shaders
//! - `resources`: asset loading, OBJ geometry and OBJ summaries
//! - `render`: render batching and on-screen/offscreen frame rendering
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::event::WindowEvent;
