//! GPU context, viewport and renderer settings.
//!
//! [`Context`] owns everything wgpu needs to draw a frame: surface, device,
//! queue, render targets, pipelines and the camera/light uniforms. It is built
//! either for a window ([`Context::new`]) or without one ([`Context::headless`]),
//! in which case frames can only be read back through [`Context::snapshot`].
//!
//! [`Context::snapshot`]: crate::context::Context::snapshot

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::CameraResources,
    config::{Colour, ViewerConfig},
    data_structures::{scene_graph::Scene, texture::Texture},
    pipelines::{
        Pipelines, basic,
        light::{LightResources, LightUniform},
        outline,
    },
};

const MSAA_SAMPLES: u32 = 4;

/// Inner size of the host window in logical pixels and its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub inner_width: u32,
    pub inner_height: u32,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(inner_width: u32, inner_height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            inner_width,
            inner_height,
            device_pixel_ratio,
        }
    }

    /// Width over height. A zero-height viewport reports an aspect of 1.
    pub fn aspect(&self) -> f32 {
        if self.inner_height == 0 {
            return 1.0;
        }
        self.inner_width as f32 / self.inner_height as f32
    }

    pub fn from_window(window: &Window) -> Self {
        let scale = window.scale_factor();
        let logical = window.inner_size().to_logical::<u32>(scale);
        Self::new(logical.width, logical.height, scale)
    }

    /// Read the browser's `innerWidth`, `innerHeight` and `devicePixelRatio`.
    #[cfg(target_arch = "wasm32")]
    pub fn web_viewport() -> Option<Self> {
        let window = web_sys::window()?;
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        Some(Self::new(
            width as u32,
            height as u32,
            window.device_pixel_ratio(),
        ))
    }
}

/// What the renderer is asked to do, independent of any GPU state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererSettings {
    pub antialias: bool,
    pub clear_colour: Colour,
    pub pixel_ratio: f64,
    /// Logical size of the drawing area.
    pub width: u32,
    pub height: u32,
}

impl RendererSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            antialias: config.antialias,
            clear_colour: config.clear_colour,
            pixel_ratio: 1.0,
            width: 0,
            height: 0,
        }
    }

    /// Settings sized to fill `viewport`.
    pub fn for_viewport(config: &ViewerConfig, viewport: &Viewport) -> Self {
        let mut settings = Self::from_config(config);
        settings.set_pixel_ratio(viewport.device_pixel_ratio);
        settings.set_size(viewport.inner_width, viewport.inner_height);
        settings
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Physical size of the drawing buffer, never smaller than 1x1.
    pub fn drawing_buffer_size(&self) -> [u32; 2] {
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).round() as u32).max(1);
        [scale(self.width), scale(self.height)]
    }
}

#[derive(Debug)]
pub struct Context {
    pub window: Option<Arc<Window>>,
    pub surface: Option<wgpu::Surface<'static>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Surface configuration. Headless contexts keep one too, for size and format.
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) depth_texture: Texture,
    pub(crate) msaa_texture: Option<Texture>,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    pub sample_count: u32,
}

fn mk_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    })
}

async fn mk_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            ..Default::default()
        })
        .await
        .context("Failed to create the GPU device")?;
    Ok((device, queue))
}

impl Context {
    /// Create a context that presents to `window`.
    pub async fn new(window: Arc<Window>, settings: &RendererSettings) -> anyhow::Result<Self> {
        log::info!("WGPU setup");
        let instance = mk_instance();
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No GPU adapter can present to this window")?;
        log::debug!("adapter: {:?}", adapter.get_info());
        let (device, queue) = mk_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are written in linear space and rely on an sRGB target.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no supported formats")?;
        let [width, height] = settings.drawing_buffer_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = sample_count_for(&adapter, surface_format, settings.antialias);
        let mut ctx = Self::assemble(device, queue, config, sample_count, settings);
        ctx.window = Some(window);
        ctx.surface = Some(surface);
        Ok(ctx)
    }

    /// Create a context without a window. Frames are rendered into an
    /// offscreen `Rgba8UnormSrgb` target of the drawing buffer size.
    pub async fn headless(settings: &RendererSettings) -> anyhow::Result<Self> {
        let instance = mk_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("No GPU adapter available for offscreen rendering")?;
        let (device, queue) = mk_device(&adapter).await?;

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let [width, height] = settings.drawing_buffer_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let sample_count = sample_count_for(&adapter, format, settings.antialias);
        Ok(Self::assemble(device, queue, config, sample_count, settings))
    }

    fn assemble(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        sample_count: u32,
        settings: &RendererSettings,
    ) -> Self {
        let camera = CameraResources::new(&device);
        let light = LightResources::new(&device, LightUniform::default());
        let material_layout = basic::mk_uniform_layout(&device, "material_bind_group_layout");

        let pipelines = Pipelines {
            mesh: basic::mk_mesh_pipeline(
                &device,
                config.format,
                sample_count,
                &camera.bind_group_layout,
                &light.bind_group_layout,
                &material_layout,
            ),
            outline: outline::mk_outline_pipeline(
                &device,
                config.format,
                sample_count,
                &camera.bind_group_layout,
                &material_layout,
            ),
        };

        let size = [config.width, config.height];
        let depth_texture =
            Texture::create_depth_texture(&device, size, sample_count, "depth_texture");
        let msaa_texture = (sample_count > 1)
            .then(|| Texture::create_msaa_texture(&device, size, sample_count, config.format));
        log::info!(
            "renderer ready: {}x{} {:?}, {}x MSAA",
            config.width,
            config.height,
            config.format,
            sample_count
        );

        Self {
            window: None,
            surface: None,
            device,
            queue,
            config,
            depth_texture,
            msaa_texture,
            camera,
            light,
            material_layout,
            pipelines,
            clear_colour: settings.clear_colour.to_wgpu(),
            sample_count,
        }
    }

    /// Compute world transforms and create the GPU buffers of every node.
    pub fn prepare(&self, scene: &mut Scene) {
        scene.update_world_transforms();
        scene.upload(&self.device, &self.material_layout);
    }

    /// Resize the drawing buffer. Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        let size = [width, height];
        self.depth_texture =
            Texture::create_depth_texture(&self.device, size, self.sample_count, "depth_texture");
        if self.msaa_texture.is_some() {
            self.msaa_texture = Some(Texture::create_msaa_texture(
                &self.device,
                size,
                self.sample_count,
                self.config.format,
            ));
        }
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }
}

fn sample_count_for(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, antialias: bool) -> u32 {
    if !antialias {
        return 1;
    }
    let flags = adapter.get_texture_format_features(format).flags;
    if flags.sample_count_supported(MSAA_SAMPLES) {
        MSAA_SAMPLES
    } else {
        log::warn!("{:?} does not support {}x MSAA, antialiasing is off", format, MSAA_SAMPLES);
        1
    }
}
