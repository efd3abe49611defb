//! Render delegate owning the displayed model and the reference grid.
//!
//! The delegate drains UI actions and loader events once per frame, swaps
//! the displayed model when a load completes, and publishes session
//! status for the panel. "No model displayed" is a steady state: the
//! frame still clears and draws the grid.

use crate::panel::{SharedPanel, UiAction};
use crate::session::{DisplayUpdate, ViewerSession};
use crate::source::ModelSource;
use glam::Vec3;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::info;
use vantage_data::{Aabb, PreparedModel};
use vantage_gpu::{
    BufferUsage, CameraUniforms, Handle, LineVertex, MeshVertex, PointPrimitive, RenderContext,
    RenderDelegate, RenderPipelineBuilder, Renderer, ResourceRegistry, shaders, wgpu,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Half-extent of the reference grid; models are normalized to fit it.
const GRID_HALF: f32 = 5.0;
const GRID_DIVISIONS: i32 = 10;

/// World-space radius of point-cloud splats, sized for the normalized
/// 5-unit model extent.
const POINT_SIZE: f32 = 0.02;

/// Backdrop, the page background of the original viewer.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.925,
    g: 0.941,
    b: 0.945,
    a: 1.0,
};

/// Initialization data for the viewer delegate.
pub struct ViewerInit {
    pub initial: Option<ModelSource>,
    pub timeout: Option<Duration>,
    pub actions: Receiver<UiAction>,
    pub panel: SharedPanel,
    pub reset_signal: Arc<AtomicBool>,
    pub displayed_signal: Arc<AtomicBool>,
    pub show_grid: Arc<AtomicBool>,
}

enum ModelDraw {
    Mesh { vertex_count: u32 },
    Points { point_count: u32 },
}

/// GPU resources of the single displayed model.
struct DisplayedModel {
    draw: ModelDraw,
    buffer: Handle<wgpu::Buffer>,
    bind_group: Handle<wgpu::BindGroup>,
}

pub struct ViewerDelegate {
    session: ViewerSession,
    actions: Receiver<UiAction>,
    panel: SharedPanel,
    reset_signal: Arc<AtomicBool>,
    displayed_signal: Arc<AtomicBool>,
    show_grid: Arc<AtomicBool>,

    camera_buffer: Handle<wgpu::Buffer>,
    bind_group_layout: Handle<wgpu::BindGroupLayout>,
    mesh_pipeline: Handle<wgpu::RenderPipeline>,
    point_pipeline: Handle<wgpu::RenderPipeline>,
    line_pipeline: Handle<wgpu::RenderPipeline>,

    grid_bind_group: Handle<wgpu::BindGroup>,
    grid_vertex_count: u32,

    model: Option<DisplayedModel>,
}

impl RenderDelegate for ViewerDelegate {
    type InitData = ViewerInit;

    fn create(
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        surface_format: wgpu::TextureFormat,
        init_data: Self::InitData,
    ) -> Result<Self, Box<dyn Error>> {
        let device = renderer.device();

        let camera_buffer = renderer
            .create_buffer()
            .label("Camera Buffer")
            .with_pod_data(&[CameraUniforms::identity()])
            .usage(BufferUsage::Uniform)
            .build(registry)?;

        // One layout serves all three pipelines: primitive storage at
        // binding 0, camera at binding 1.
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewer Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(
                            std::num::NonZeroU64::new(
                                std::mem::size_of::<CameraUniforms>() as u64
                            )
                            .unwrap(),
                        ),
                    },
                    count: None,
                },
            ],
        });
        let bind_group_layout = registry.insert(bind_group_layout);

        let mesh_pipeline = build_pipeline(
            renderer,
            registry,
            bind_group_layout,
            surface_format,
            "Mesh Pipeline",
            shaders::MESH_VERTEX,
            shaders::MESH_FRAGMENT,
            wgpu::PrimitiveTopology::TriangleList,
        )?;
        let point_pipeline = build_pipeline(
            renderer,
            registry,
            bind_group_layout,
            surface_format,
            "Point Pipeline",
            shaders::POINT_VERTEX,
            shaders::POINT_FRAGMENT,
            wgpu::PrimitiveTopology::TriangleList,
        )?;
        let line_pipeline = build_pipeline(
            renderer,
            registry,
            bind_group_layout,
            surface_format,
            "Line Pipeline",
            shaders::LINE_VERTEX,
            shaders::LINE_FRAGMENT,
            wgpu::PrimitiveTopology::LineList,
        )?;

        let grid = grid_vertices();
        let grid_vertex_count = grid.len() as u32;
        let grid_buffer = renderer
            .create_buffer()
            .label("Grid Buffer")
            .with_pod_data(&grid)
            .usage(BufferUsage::Storage { read_only: true })
            .build(registry)?;
        let grid_bind_group =
            create_scene_bind_group(renderer, registry, bind_group_layout, grid_buffer, camera_buffer, "Grid Bind Group")?;

        let mut session = ViewerSession::new(
            Box::new(crate::fetch::ThreadedDispatcher),
            init_data.timeout,
        );
        if let Some(source) = init_data.initial {
            session.request_load(source);
        }

        Ok(Self {
            session,
            actions: init_data.actions,
            panel: init_data.panel,
            reset_signal: init_data.reset_signal,
            displayed_signal: init_data.displayed_signal,
            show_grid: init_data.show_grid,
            camera_buffer,
            bind_group_layout,
            mesh_pipeline,
            point_pipeline,
            line_pipeline,
            grid_bind_group,
            grid_vertex_count,
            model: None,
        })
    }

    fn bounds(&self) -> Aabb {
        Aabb {
            min: Vec3::splat(-GRID_HALF),
            max: Vec3::splat(GRID_HALF),
        }
    }

    fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        Some(DEPTH_FORMAT)
    }

    fn update(
        &mut self,
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        camera: &CameraUniforms,
    ) {
        let camera_buffer = registry.get(self.camera_buffer).expect("camera buffer");
        renderer
            .queue()
            .write_buffer(camera_buffer, 0, bytemuck::bytes_of(camera));

        let actions: Vec<UiAction> = self.actions.try_iter().collect();
        for action in actions {
            match action {
                UiAction::LoadFile(path) => {
                    self.session.request_load(ModelSource::LocalFile { path })
                }
                UiAction::LoadUrl(url) => self.session.request_load(ModelSource::RemoteUrl { url }),
                UiAction::LoadSample => self.session.request_load(ModelSource::Sample),
            }
        }

        if let Some(update) = self.session.poll(Instant::now()) {
            self.swap_model(renderer, registry, update);
        }

        let mut view = self.panel.lock().unwrap();
        view.status = self.session.status().clone();
        view.model_info = self.session.model_info().map(str::to_string);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: RenderContext,
        registry: &ResourceRegistry,
    ) {
        let depth_stencil_attachment =
            ctx.depth_view
                .map(|depth_view| wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Viewer Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: ctx.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if self.show_grid.load(Ordering::Relaxed) {
            let pipeline = registry.get(self.line_pipeline).expect("line pipeline");
            let bind_group = registry.get(self.grid_bind_group).expect("grid bind group");
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..self.grid_vertex_count, 0..1);
        }

        if let Some(model) = &self.model {
            let bind_group = registry.get(model.bind_group).expect("model bind group");
            match model.draw {
                ModelDraw::Mesh { vertex_count } => {
                    let pipeline = registry.get(self.mesh_pipeline).expect("mesh pipeline");
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, bind_group, &[]);
                    render_pass.draw(0..vertex_count, 0..1);
                }
                ModelDraw::Points { point_count } => {
                    let pipeline = registry.get(self.point_pipeline).expect("point pipeline");
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, bind_group, &[]);
                    // 3 vertices per point (camera-facing triangle)
                    render_pass.draw(0..point_count * 3, 0..1);
                }
            }
        }
    }
}

impl ViewerDelegate {
    /// Build GPU resources for a freshly prepared model, then replace the
    /// displayed one. The old model is removed only after the new one is
    /// fully constructed; a build failure leaves the display unchanged.
    fn swap_model(
        &mut self,
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        update: DisplayUpdate,
    ) {
        match self.upload_model(renderer, registry, &update.prepared) {
            Ok(new_model) => {
                if let Some(old) = self.model.take() {
                    registry.remove(old.buffer);
                    registry.remove(old.bind_group);
                }
                info!("displaying {}", update.name);
                self.model = Some(new_model);
                self.displayed_signal.store(true, Ordering::Relaxed);
                // Frame the new model like the original viewer does.
                self.reset_signal.store(true, Ordering::Relaxed);
            }
            Err(e) => self.session.on_display_error(&e.to_string()),
        }
    }

    fn upload_model(
        &self,
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        prepared: &PreparedModel,
    ) -> Result<DisplayedModel, Box<dyn Error>> {
        let geometry = &prepared.geometry;

        let (draw, buffer) = if geometry.has_faces() {
            let mut vertices = Vec::with_capacity(geometry.faces.len() * 3);
            for [i0, i1, i2] in &geometry.faces {
                for index in [i0, i1, i2] {
                    vertices.push(MeshVertex::new(
                        geometry.positions[*index as usize],
                        geometry.normals[*index as usize],
                    ));
                }
            }
            let buffer = renderer
                .create_buffer()
                .label("Model Mesh Buffer")
                .with_pod_data(&vertices)
                .usage(BufferUsage::Storage { read_only: true })
                .build(registry)?;
            (
                ModelDraw::Mesh {
                    vertex_count: vertices.len() as u32,
                },
                buffer,
            )
        } else {
            let points: Vec<PointPrimitive> = geometry
                .positions
                .iter()
                .zip(&geometry.colors)
                .map(|(position, color)| PointPrimitive::new(*position, POINT_SIZE, *color, 1.0))
                .collect();
            let buffer = renderer
                .create_buffer()
                .label("Model Point Buffer")
                .with_pod_data(&points)
                .usage(BufferUsage::Storage { read_only: true })
                .build(registry)?;
            (
                ModelDraw::Points {
                    point_count: points.len() as u32,
                },
                buffer,
            )
        };

        let bind_group = create_scene_bind_group(
            renderer,
            registry,
            self.bind_group_layout,
            buffer,
            self.camera_buffer,
            "Model Bind Group",
        )?;

        Ok(DisplayedModel {
            draw,
            buffer,
            bind_group,
        })
    }
}

fn build_pipeline(
    renderer: &Renderer,
    registry: &mut ResourceRegistry,
    bind_group_layout: Handle<wgpu::BindGroupLayout>,
    surface_format: wgpu::TextureFormat,
    label: &str,
    vertex_source: &str,
    fragment_source: &str,
    topology: wgpu::PrimitiveTopology,
) -> Result<Handle<wgpu::RenderPipeline>, Box<dyn Error>> {
    let device = renderer.device();

    let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
    });
    let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
    });

    let layout = registry
        .get(bind_group_layout)
        .ok_or("bind group layout missing")?;
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    let pipeline = RenderPipelineBuilder::new(device)
        .with_label(label)
        .with_vertex_shader(registry.insert(vertex_shader))
        .with_fragment_shader(registry.insert(fragment_shader))
        .with_layout(pipeline_layout)
        .with_primitive(wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Double-sided material: never cull.
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        })
        .with_fragment_target(Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        }))
        .with_depth_stencil(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
        .build(registry)?;

    Ok(pipeline)
}

fn create_scene_bind_group(
    renderer: &Renderer,
    registry: &mut ResourceRegistry,
    layout: Handle<wgpu::BindGroupLayout>,
    primitive_buffer: Handle<wgpu::Buffer>,
    camera_buffer: Handle<wgpu::Buffer>,
    label: &str,
) -> Result<Handle<wgpu::BindGroup>, Box<dyn Error>> {
    let bind_group = renderer.device().create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: registry.get(layout).ok_or("bind group layout missing")?,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: registry
                    .get(primitive_buffer)
                    .ok_or("primitive buffer missing")?
                    .as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: registry
                    .get(camera_buffer)
                    .ok_or("camera buffer missing")?
                    .as_entire_binding(),
            },
        ],
    });
    Ok(registry.insert(bind_group))
}

/// Reference grid on the XZ plane plus RGB axes, like the original
/// viewer's grid and axes helpers.
fn grid_vertices() -> Vec<LineVertex> {
    const GRID_COLOR: Vec3 = Vec3::new(0.55, 0.55, 0.55);
    const CENTER_COLOR: Vec3 = Vec3::new(0.35, 0.35, 0.35);

    let mut vertices = Vec::new();
    let step = 2.0 * GRID_HALF / GRID_DIVISIONS as f32;

    for i in 0..=GRID_DIVISIONS {
        let offset = -GRID_HALF + i as f32 * step;
        let color = if i == GRID_DIVISIONS / 2 {
            CENTER_COLOR
        } else {
            GRID_COLOR
        };
        vertices.push(LineVertex::new(Vec3::new(-GRID_HALF, 0.0, offset), color));
        vertices.push(LineVertex::new(Vec3::new(GRID_HALF, 0.0, offset), color));
        vertices.push(LineVertex::new(Vec3::new(offset, 0.0, -GRID_HALF), color));
        vertices.push(LineVertex::new(Vec3::new(offset, 0.0, GRID_HALF), color));
    }

    // Axes: X red, Y green, Z blue.
    vertices.push(LineVertex::new(Vec3::ZERO, Vec3::X));
    vertices.push(LineVertex::new(Vec3::new(GRID_HALF, 0.0, 0.0), Vec3::X));
    vertices.push(LineVertex::new(Vec3::ZERO, Vec3::Y));
    vertices.push(LineVertex::new(Vec3::new(0.0, GRID_HALF, 0.0), Vec3::Y));
    vertices.push(LineVertex::new(Vec3::ZERO, Vec3::Z));
    vertices.push(LineVertex::new(Vec3::new(0.0, 0.0, GRID_HALF), Vec3::Z));

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_vertices_form_line_pairs() {
        let vertices = grid_vertices();
        assert_eq!(vertices.len() % 2, 0);
        // 11 lines per direction plus 3 axes.
        assert_eq!(vertices.len(), (GRID_DIVISIONS as usize + 1) * 4 + 6);
    }

    #[test]
    fn grid_stays_within_half_extent() {
        for vertex in grid_vertices() {
            for coord in vertex.position {
                assert!(coord.abs() <= GRID_HALF);
            }
        }
    }

    #[test]
    fn axes_carry_rgb_colors() {
        let vertices = grid_vertices();
        let axes = &vertices[vertices.len() - 6..];
        assert_eq!(axes[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(axes[2].color, [0.0, 1.0, 0.0]);
        assert_eq!(axes[4].color, [0.0, 0.0, 1.0]);
    }
}
