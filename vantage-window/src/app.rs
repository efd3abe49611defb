use crate::camera::{Camera, Projection, default_pose};
use crate::controls::Controls;
use crate::overlay::Overlay;
use egui_wgpu::ScreenDescriptor;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use vantage_gpu::{CameraUniforms, RenderContext, RenderDelegate, Renderer, ResourceRegistry, SurfaceWrapper, wgpu};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Vertical field of view of the viewer camera.
const CAMERA_FOV: f32 = 75.0 * std::f32::consts::PI / 180.0;
const CAMERA_NEAR: f32 = 0.1;

/// Run the viewer with a render delegate. `configure` is called once with
/// the controls so the caller can attach frame and UI hooks.
pub fn run_with_delegate<D, F>(
    title: &str,
    init_data: D::InitData,
    configure: F,
) -> Result<(), Box<dyn Error>>
where
    D: RenderDelegate + 'static,
    D::InitData: 'static,
    F: FnOnce(&mut Controls) + Send + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let event_loop = EventLoop::new().map_err(|e| format!("Failed to create event loop: {e}"))?;
    let mut app = App::<D>::new(title.to_string(), init_data, Box::new(configure));
    let run_result = event_loop.run_app(&mut app);
    let app_result = app.finish();
    run_result?;
    app_result
}

struct App<D: RenderDelegate> {
    title: String,
    init_data: Option<D::InitData>,
    configure: Option<Box<dyn FnOnce(&mut Controls) + Send>>,
    state: Option<ViewerState<D>>,
    error: Option<String>,
}

impl<D: RenderDelegate> App<D> {
    fn new(
        title: String,
        init_data: D::InitData,
        configure: Box<dyn FnOnce(&mut Controls) + Send>,
    ) -> Self {
        Self {
            title,
            init_data: Some(init_data),
            configure: Some(configure),
            state: None,
            error: None,
        }
    }

    fn finish(self) -> Result<(), Box<dyn Error>> {
        if let Some(err) = self.error {
            Err(err.into())
        } else {
            Ok(())
        }
    }
}

impl<D: RenderDelegate + 'static> ApplicationHandler for App<D> {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.state.is_some() || self.error.is_some() {
            return;
        }

        let init_data = match self.init_data.take() {
            Some(data) => data,
            None => return,
        };
        let configure = self.configure.take();

        match ViewerState::<D>::new(event_loop, &self.title, init_data) {
            Ok(mut state) => {
                if let Some(configure) = configure {
                    configure(&mut state.controls);
                }
                self.state = Some(state);
            }
            Err(err) => {
                error!("Failed to initialize viewer: {err}");
                self.error = Some(err.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        if state.handle_window_event(event_loop, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = state.advance_frame_time(now);
                match state.render(dt) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.window.inner_size();
                        state.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("GPU Out of Memory - exiting");
                        event_loop.exit();
                    }
                    Err(e) => error!("Render error: {:?}", e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }
}

struct ViewerState<D: RenderDelegate> {
    window: Arc<Window>,
    renderer: Renderer,
    surface: SurfaceWrapper,
    registry: ResourceRegistry,
    delegate: D,
    camera: Camera,
    controls: Controls,
    projection: Projection,
    overlay: Overlay,
    last_frame: Instant,
    depth_texture: Option<wgpu::Texture>,
    depth_view: Option<wgpu::TextureView>,
}

impl<D: RenderDelegate> ViewerState<D> {
    fn new(
        event_loop: &winit::event_loop::ActiveEventLoop,
        title: &str,
        init_data: D::InitData,
    ) -> Result<Self, Box<dyn Error>> {
        let window_attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let renderer = pollster::block_on(Renderer::new())?;
        let size = window.inner_size();

        let surface = renderer.instance().create_surface(window.clone())?;
        let surface = renderer.create_surface(surface, size.width.max(1), size.height.max(1))?;

        let mut registry = ResourceRegistry::default();

        let delegate = D::create(&renderer, &mut registry, surface.format(), init_data)?;

        let bounds = delegate.bounds();
        info!(
            "Scene bounds: center={:?}, radius={}",
            bounds.center(),
            bounds.radius()
        );

        let camera = Camera::from_pose(default_pose());
        let projection = Projection::new(
            size.width.max(1),
            size.height.max(1),
            CAMERA_FOV,
            CAMERA_NEAR,
            (bounds.radius() * 10.0).max(1000.0),
        );

        // Create depth texture if the delegate needs one
        let (depth_texture, depth_view) = if let Some(depth_format) = delegate.depth_format() {
            let (tex, view) = Self::create_depth_texture(
                renderer.device(),
                size.width.max(1),
                size.height.max(1),
                depth_format,
            );
            (Some(tex), Some(view))
        } else {
            (None, None)
        };

        let overlay = Overlay::new(renderer.device(), surface.format(), &window);

        Ok(Self {
            window,
            renderer,
            surface,
            registry,
            delegate,
            camera,
            controls: Controls::new(),
            projection,
            overlay,
            last_frame: Instant::now(),
            depth_texture,
            depth_view,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn handle_window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        event: &WindowEvent,
    ) -> bool {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
            ..
        } = event
        {
            event_loop.exit();
            return true;
        }

        // egui first: events over panels must not also move the camera.
        if self.overlay.on_window_event(&self.window, event) {
            return true;
        }

        self.controls.handle_event(event)
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let mut config = self.surface.config().clone();
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.reconfigure(self.renderer.device(), config);
        self.projection.resize(new_size.width, new_size.height);

        if let Some(depth_format) = self.delegate.depth_format() {
            let (tex, view) = Self::create_depth_texture(
                self.renderer.device(),
                new_size.width,
                new_size.height,
                depth_format,
            );
            self.depth_texture = Some(tex);
            self.depth_view = Some(view);
        }
    }

    fn advance_frame_time(&mut self, now: Instant) -> f32 {
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt
    }

    fn render(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        self.controls.update(dt, &mut self.camera);

        let view = self.camera.view_matrix();
        let proj = self.projection.matrix();
        let uniforms = CameraUniforms::from_matrices(view, proj, self.camera.position());

        self.delegate
            .update(&self.renderer, &mut self.registry, &uniforms);

        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let device = self.renderer.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        let ctx = RenderContext {
            color_view: &surface_view,
            depth_view: self.depth_view.as_ref(),
        };

        self.delegate.render(&mut encoder, ctx, &self.registry);

        let screen = ScreenDescriptor {
            size_in_pixels: [
                self.surface.config().width,
                self.surface.config().height,
            ],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let controls = &mut self.controls;
        self.overlay.render(
            self.renderer.device(),
            self.renderer.queue(),
            &mut encoder,
            &self.window,
            &surface_view,
            screen,
            |ctx| controls.run_ui(ctx),
        );

        self.renderer.queue().submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
