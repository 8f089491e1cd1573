//! Scene setup and the application event loop.
//!
//! [`SceneContext`] is everything the viewer keeps alive between frames: the
//! scene graph, the camera, its orbit controls and the renderer settings. It
//! is built once, after which [`SceneContext::animate`] runs every frame.
//!
//! # Lifecycle
//!
//! 1. Create the window and read the viewport from it
//! 2. Load the model and create the GPU context concurrently
//! 3. Build the scene and upload it
//! 4. On every redraw: refresh the projection, request the next frame, render
//!
//! Natively the async setup runs on a tokio runtime; on the web it is spawned
//! locally and handed back to the loop as a [`FlowEvent::Initialized`].

use std::{fmt::Debug, sync::Arc};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::{
    camera::{OrbitControls, PerspectiveCamera, PointLight},
    config::{CameraPlacement, ViewerConfig},
    context::{Context, RendererSettings, Viewport},
    data_structures::{
        edges::EdgesGeometry,
        scene_graph::{Group, LineMaterial, LineSegments, Mesh, MeshMaterial, Scene, SceneNode},
    },
    render::FrameRenderer,
    resources::{self, GeometryProvider},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub const GROUP_NAME: &str = "group";
pub const MESH_NAME: &str = "mesh";
pub const OUTLINE_NAME: &str = "outline";

/// Something that can be asked to produce another frame.
pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

#[derive(Debug)]
pub struct SceneContext {
    pub scene: Scene,
    /// Held beside the scene rather than under its root; the root has no
    /// transform, so the camera's local and world placement coincide.
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub renderer: RendererSettings,
    pub viewport: Viewport,
}

impl SceneContext {
    /// Build the scene: a camera carrying a point light, and a raised group
    /// holding the outlined mesh.
    pub fn build(
        provider: &impl GeometryProvider,
        viewport: Viewport,
        config: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let mut scene = Scene::new();

        let mut camera =
            PerspectiveCamera::new(config.fov, viewport.aspect(), config.near, config.far);
        camera.add(PointLight::new(config.light_colour, config.light_intensity));

        let mut group = Group::new(GROUP_NAME);
        group.position().update(|p| p.y += config.group_offset_y);

        let mut geometry = provider
            .load_geometry()
            .context("Failed to load the model geometry")?;
        geometry.ensure_normals();

        let edges = EdgesGeometry::new(&geometry, config.edge_threshold_angle);
        log::debug!(
            "{} triangles, {} outline segments",
            geometry.triangle_count(),
            edges.segment_count()
        );

        let mut mesh = Mesh::new(
            MESH_NAME,
            geometry,
            MeshMaterial {
                colour: config.mesh_colour,
                flat_shading: config.flat_shading,
            },
        );
        mesh.add_child(Box::new(LineSegments::new(
            OUTLINE_NAME,
            edges,
            LineMaterial {
                colour: config.edge_colour,
                linewidth: config.edge_linewidth,
            },
        )));
        group.add_child(Box::new(mesh));

        match config.camera_placement {
            CameraPlacement::Aliased => camera.set_position_handle(group.position().clone()),
            CameraPlacement::Detached => camera.set_position_handle(group.position().detached()),
        }
        camera
            .position()
            .update(|p| p.z += config.camera_depth_offset);
        scene.add(Box::new(group));

        let renderer = RendererSettings::for_viewport(config, &viewport);
        let controls = OrbitControls::new(&mut camera);
        log::info!(
            "scene ready, camera at {:?} ({:?})",
            camera.position().get(),
            config.camera_placement
        );

        Ok(Self {
            scene,
            camera,
            controls,
            renderer,
            viewport,
        })
    }

    /// One frame: refresh the projection, schedule the next frame, draw.
    pub fn animate(
        &mut self,
        renderer: &mut impl FrameRenderer,
        scheduler: &impl FrameScheduler,
    ) -> anyhow::Result<()> {
        self.camera.update_projection_matrix();
        scheduler.request_frame();
        renderer.render(&mut self.scene, &self.camera)
    }

    /// Feed input to the orbit controls. Returns `true` if the camera moved.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let height = self.viewport.inner_height as f32 * self.viewport.device_pixel_ratio as f32;
        if self
            .controls
            .handle_window_events(event, &self.camera, height)
        {
            return self.controls.update(&mut self.camera);
        }
        false
    }

    /// Track a new window size in physical pixels.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        let logical = winit::dpi::PhysicalSize::new(width, height).to_logical::<u32>(scale_factor);
        self.viewport = Viewport::new(logical.width, logical.height, scale_factor);
        self.renderer.set_pixel_ratio(scale_factor);
        self.renderer.set_size(logical.width, logical.height);
        self.camera.aspect = self.viewport.aspect();
    }
}

pub struct AppState {
    pub(crate) ctx: Context,
    scene: SceneContext,
}

impl AppState {
    async fn new(window: Arc<Window>, config: ViewerConfig) -> anyhow::Result<Self> {
        #[cfg(target_arch = "wasm32")]
        let viewport = Viewport::web_viewport().unwrap_or_else(|| Viewport::from_window(&window));
        #[cfg(not(target_arch = "wasm32"))]
        let viewport = Viewport::from_window(&window);
        let settings = RendererSettings::for_viewport(&config, &viewport);

        let (source, ctx) = futures::join!(
            resources::load_obj_source(&config.model_file),
            Context::new(window, &settings)
        );
        let (source, ctx) = (source?, ctx?);

        let mut scene = SceneContext::build(&source, viewport, &config)?;
        ctx.prepare(&mut scene.scene);
        Ok(Self { ctx, scene })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let scale_factor = self
            .ctx
            .window
            .as_ref()
            .map_or(1.0, |window| window.scale_factor());
        self.scene.resize(width, height, scale_factor);
        self.ctx.resize(width, height);
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    window: Option<Arc<Window>>,
    // taken once the window exists
    config: Option<ViewerConfig>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime =
            tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            window: None,
            config: Some(config),
            last_time: Instant::now(),
        })
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(anyhow::Result<AppState>),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(Ok(_)) => f.write_str("Initialized(Ok)"),
            Self::Initialized(Err(e)) => write!(f, "Initialized(Err({}))", e),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        // the browser viewport sizes the canvas; natively the platform default is kept
        #[cfg(target_arch = "wasm32")]
        let viewport = Viewport::web_viewport();
        #[cfg(not(target_arch = "wasm32"))]
        let viewport: Option<Viewport> = None;

        #[allow(unused_mut)]
        let mut attributes = window_attributes(viewport.as_ref());

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match web_container() {
                Ok(canvas) => attributes = attributes.with_canvas(Some(canvas)),
                Err(e) => {
                    log::error!("{:#}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let init_future = AppState::new(window, config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(init_future);
            self.on_initialized(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = init_future.await;
                if proxy.send_event(FlowEvent::Initialized(result)).is_err() {
                    log::error!("event loop closed before setup finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(result) => self.on_initialized(event_loop, result),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
            return;
        }
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.scene.handle_window_event(&event);

        match event {
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                log::trace!("frame time {:?}", dt);

                let Some(window) = &self.window else {
                    return;
                };
                if let Err(e) = state.scene.animate(&mut state.ctx, window.as_ref()) {
                    log::error!("render failed: {:#}", e);
                }
            }
            _ => (),
        }
    }
}

impl App {
    fn on_initialized(&mut self, event_loop: &ActiveEventLoop, result: anyhow::Result<AppState>) {
        match result {
            Ok(mut state) => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    state.resize(size.width, size.height);
                    window.request_redraw();
                }
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("setup failed: {:#}", e);
                event_loop.exit();
            }
        }
    }
}

/// Attributes of the viewer window, sized to `viewport` when one is given.
pub fn window_attributes(viewport: Option<&Viewport>) -> WindowAttributes {
    let attributes = Window::default_attributes().with_title("objscene");
    match viewport {
        Some(viewport) => attributes.with_inner_size(LogicalSize::new(
            viewport.inner_width,
            viewport.inner_height,
        )),
        None => attributes,
    }
}

/// Append a container `<div>` to `<body>` and a canvas into it.
#[cfg(target_arch = "wasm32")]
fn web_container() -> anyhow::Result<web_sys::HtmlCanvasElement> {
    use wasm_bindgen::JsCast;

    let js = |e: JsValue| anyhow::anyhow!("{:?}", e);
    let document = web_sys::window()
        .and_then(|w| w.document())
        .context("no document")?;
    let body = document.body().context("document has no body")?;
    let container = document.create_element("div").map_err(js)?;
    body.append_child(&container).map_err(js)?;
    let canvas = document.create_element("canvas").map_err(js)?;
    container.append_child(&canvas).map_err(js)?;
    canvas
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| anyhow::anyhow!("created element is not a canvas"))
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // fails only if a logger is already installed
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
