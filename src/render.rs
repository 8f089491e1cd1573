//! Render composition and pipeline batching.
//!
//! Scene nodes describe what they want drawn through the [`Render`] enum. The
//! renderer flattens a frame's `Render` tree into one batch per pipeline
//! (lit meshes first, then outlines) and records a single render pass.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the tree of draw requests a scene produces
//! - [`Instanced<'a>`] is one mesh with its instance buffer and material
//! - [`FrameRenderer`] is what the frame callback draws with

use std::iter;

use anyhow::Context as _;
use instant::Duration;

use crate::{
    camera::PerspectiveCamera,
    context::Context,
    data_structures::{model::DrawMesh, model::GpuMesh, scene_graph::Scene, texture::Texture},
};

/// One drawable: mesh buffers, per-instance transforms and a material bind group.
pub struct Instanced<'a> {
    pub mesh: &'a GpuMesh,
    pub instance: &'a wgpu::Buffer,
    pub material: &'a wgpu::BindGroup,
    pub amount: u32,
}

/// Specifies how a scene object should be rendered.
///
/// - `None` renders nothing
/// - `Mesh(Instanced)` renders lit triangles
/// - `Lines(Instanced)` renders an unlit line list
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Mesh(Instanced<'a>),
    Lines(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort the tree into per-pipeline batches, keeping tree order within each.
    pub fn set_pipelines(self, meshes: &mut Vec<Instanced<'a>>, lines: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Mesh(instanced) => meshes.push(instanced),
            Render::Lines(instanced) => lines.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(meshes, lines)),
            Render::None => (),
        }
    }
}

/// Draws a scene as seen from a camera.
pub trait FrameRenderer {
    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
}

impl FrameRenderer for Context {
    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        self.update_frame_state(scene, camera);

        let Some(surface) = &self.surface else {
            anyhow::bail!("this context has no surface, use Context::snapshot instead");
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire the next surface texture"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.record_pass(&mut encoder, scene, &view);
        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Context {
    /// Push world transforms and the camera/light uniforms to the GPU.
    fn update_frame_state(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) {
        scene.update_world_transforms();
        scene.write_to_buffers(&self.queue);
        self.camera.write(&self.queue, camera);
        self.light.write(&self.queue, camera);
    }

    fn record_pass(&self, encoder: &mut wgpu::CommandEncoder, scene: &Scene, target: &wgpu::TextureView) {
        // With MSAA the pass draws into the multisampled buffer and resolves into the target.
        let (view, resolve_target) = match &self.msaa_texture {
            Some(msaa) => (&msaa.view, Some(target)),
            None => (target, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            ..Default::default()
        });

        let mut meshes: Vec<Instanced> = Vec::new();
        let mut lines: Vec<Instanced> = Vec::new();
        scene.get_render().set_pipelines(&mut meshes, &mut lines);

        render_pass.set_pipeline(&self.pipelines.mesh);
        for instanced in meshes {
            if instanced.amount == 0 || instanced.mesh.num_elements == 0 {
                log::warn!("skipping empty mesh {}", instanced.mesh.name);
                continue;
            }
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                0..instanced.amount,
                instanced.material,
                &self.camera.bind_group,
                &self.light.bind_group,
            );
        }

        render_pass.set_pipeline(&self.pipelines.outline);
        for instanced in lines {
            if instanced.amount == 0 || instanced.mesh.num_elements == 0 {
                continue;
            }
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_lines_instanced(
                instanced.mesh,
                0..instanced.amount,
                instanced.material,
                &self.camera.bind_group,
            );
        }
    }

    /// Render one frame offscreen and read it back.
    ///
    /// Works with or without a surface; the image has the drawing buffer size.
    pub async fn snapshot(
        &mut self,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
    ) -> anyhow::Result<image::RgbaImage> {
        self.update_frame_state(scene, camera);

        let [width, height] = self.size();
        let target = Texture::create_readback_target(&self.device, [width, height], self.config.format);

        let u32_size = std::mem::size_of::<u32>() as u32;
        let unpadded_bytes_per_row = u32_size * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snapshot Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Snapshot Encoder"),
            });
        self.record_pass(&mut encoder, scene, &target.view);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .context("GPU did not finish the snapshot in time")?;
        rx.receive()
            .await
            .context("snapshot buffer mapping was cancelled")?
            .context("Failed to map the snapshot buffer")?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in data.chunks(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        output_buffer.unmap();

        if matches!(
            self.config.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            pixels.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
        }

        image::RgbaImage::from_raw(width, height, pixels)
            .context("snapshot buffer does not match the image size")
    }
}
