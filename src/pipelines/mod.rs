//! Render pipelines and their WGSL shaders.
//!
//! - `basic` holds the shared pipeline builder, the lit mesh pipeline and material uniforms
//! - `outline` is the unlit line-list pipeline for edge overlays
//! - `light` holds the point light uniform that follows the camera

pub mod basic;
pub mod light;
pub mod outline;

/// All pipelines the renderer switches between in a frame.
#[derive(Debug)]
pub struct Pipelines {
    pub mesh: wgpu::RenderPipeline,
    pub outline: wgpu::RenderPipeline,
}
