use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{LineVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{PipelineTarget, PrimitiveSetup, mk_render_pipeline},
};

/// Unlit line-list pipeline for mesh outlines. `LessEqual` lets segments that
/// sit exactly on a triangle edge pass the depth test.
pub fn mk_outline_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    material_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Outline Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, material_bind_group_layout],
        ..Default::default()
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Outline Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("outline.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        PipelineTarget {
            color_format: format,
            depth_format: Some(Texture::DEPTH_FORMAT),
            sample_count,
        },
        PrimitiveSetup {
            topology: wgpu::PrimitiveTopology::LineList,
            cull_mode: None,
            depth_compare: wgpu::CompareFunction::LessEqual,
            depth_bias: wgpu::DepthBiasState::default(),
        },
        &[LineVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
