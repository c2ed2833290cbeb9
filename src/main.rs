// Glow quad viewer: orbits a camera around a single glowing quad
// The quad is re-extruded every frame for the camera position and streamed to the GPU

use std::sync::Arc;

use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;
use log::{debug, error, info, warn};

use glow_quad::engine::{
    camera::OrbitCamera,
    curve::FadeCurve,
    debug_lines::DebugLines,
    debug_overlay::{DebugOverlay, EdgeDraw, GlowStats},
    input::InputState,
    mesh::GlowVertex,
    sections::{SectionUpdate, FILL_SECTION, GLOW_SECTION},
    GlowQuad, LocalFrame, MaterialId, MeshBuffers, MeshSink, ScaleMode, SectionLayout,
};

const GLOW_MATERIAL: MaterialId = MaterialId(0);
const FILL_MATERIAL: MaterialId = MaterialId(1);

/// Material pairs cycled with M: shared, split, glow only, fill only.
const MATERIAL_CYCLE: [(Option<MaterialId>, Option<MaterialId>); 4] = [
    (Some(GLOW_MATERIAL), Some(GLOW_MATERIAL)),
    (Some(GLOW_MATERIAL), Some(FILL_MATERIAL)),
    (Some(GLOW_MATERIAL), None),
    (None, Some(FILL_MATERIAL)),
];

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

// ============================================================================
// GPU MESH SINK
// ============================================================================

struct GpuSection {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    material: MaterialId,
    /// UVs from creation, reused when an update carries none.
    uvs: Vec<Vec2>,
    /// Interleaving scratch; keeps its capacity between updates.
    staging: Vec<GlowVertex>,
}

/// Turns mesh sections into wgpu buffers. Updates overwrite the vertex buffer in place.
struct GpuMeshSink {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    sections: Vec<Option<GpuSection>>,
}

impl GpuMeshSink {
    fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue, sections: Vec::new() }
    }
}

impl MeshSink for GpuMeshSink {
    fn clear_all_sections(&mut self) {
        self.sections.clear();
    }

    fn create_section(&mut self, section: usize, mesh: &MeshBuffers, material: MaterialId) {
        if let Err(e) = mesh.validate() {
            error!("refusing mesh section {section}: {e}");
            return;
        }
        let staging = mesh.to_gpu_vertices();

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Glow Vertex Buffer"),
            contents: bytemuck::cast_slice(&staging),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Glow Index Buffer"),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        if self.sections.len() <= section {
            self.sections.resize_with(section + 1, || None);
        }
        self.sections[section] = Some(GpuSection {
            vertex_buffer,
            index_buffer,
            num_indices: mesh.indices.len() as u32,
            material,
            uvs: mesh.uv0.clone(),
            staging,
        });
        debug!("created GPU section {section}: {} vertices, {} indices", mesh.vertex_count(), mesh.indices.len());
    }

    fn update_section(&mut self, section: usize, update: SectionUpdate<'_>) {
        let Some(gpu) = self.sections.get_mut(section).and_then(Option::as_mut) else {
            return;
        };
        if update.positions.len() != gpu.staging.len() {
            warn!("section {section} update changes vertex count; ignored");
            return;
        }
        let uvs = update.uv0.unwrap_or(&gpu.uvs);
        gpu.staging.clear();
        gpu.staging.extend(update.positions.iter().zip(update.colors).enumerate().map(|(i, (&p, &c))| {
            GlowVertex::new(p, c, uvs.get(i).copied().unwrap_or(Vec2::ZERO))
        }));
        self.queue.write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&gpu.staging));
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    glow_pipeline: wgpu::RenderPipeline,
    fill_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    window: Arc<Window>,

    // Glow quad and its GPU sections
    quad: GlowQuad,
    sink: GpuMeshSink,
    material_index: usize,
    debug_lines: DebugLines,
    edge_draws: Vec<EdgeDraw>,

    // Camera and input
    camera: OrbitCamera,
    input: InputState,
    overlay: DebugOverlay,
    last_update: std::time::Instant,
    frame_time_ms: f32,
    fps: u32,
}

impl State {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).expect("failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no suitable GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .expect("failed to create device");
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("glow.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Glow Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let glow_pipeline = create_pipeline(&device, &render_pipeline_layout, &shader, config.format, "fs_glow");
        let fill_pipeline = create_pipeline(&device, &render_pipeline_layout, &shader, config.format, "fs_fill");

        let overlay = DebugOverlay::new(&window, &device, config.format);

        // Slightly stretched so the two glow scale modes look different.
        let mut quad = GlowQuad::new(Some(GLOW_MATERIAL));
        quad.frame = LocalFrame::new(Vec3::new(1.5, 1.0, 1.0), Quat::IDENTITY, Vec3::ZERO);
        quad.settings.show_bottom = true;
        quad.distance_fade = Some(Box::new(FadeCurve::new(vec![(200.0, 1.0), (1500.0, 0.25)])));

        let mut sink = GpuMeshSink::new(device.clone(), queue.clone());
        quad.rebuild(&mut sink);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            glow_pipeline,
            fill_pipeline,
            uniform_buffer,
            uniform_bind_group,
            window,
            quad,
            sink,
            material_index: 0,
            debug_lines: DebugLines::default(),
            edge_draws: Vec::new(),
            camera: OrbitCamera::new(),
            input: InputState::new(),
            overlay,
            last_update: std::time::Instant::now(),
            frame_time_ms: 0.0,
            fps: 0,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn update(&mut self) {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;
        self.frame_time_ms = dt * 1000.0;

        self.input.begin_frame();
        self.handle_toggles();
        self.camera.update(&self.input, dt);
        self.input.end_frame();

        self.debug_lines.clear();
        self.quad.update(&self.camera, &mut self.sink, &mut self.debug_lines);
    }

    fn handle_toggles(&mut self) {
        if self.input.was_key_pressed(KeyCode::F3) {
            self.overlay.toggle();
        }
        if self.input.was_key_pressed(KeyCode::F2) {
            self.quad.settings.draw_debug_edges = !self.quad.settings.draw_debug_edges;
        }
        if self.input.was_key_pressed(KeyCode::KeyB) {
            self.quad.settings.show_bottom = !self.quad.settings.show_bottom;
        }
        if self.input.was_key_pressed(KeyCode::KeyG) {
            self.quad.settings.scale_mode = match self.quad.settings.scale_mode {
                ScaleMode::Local => ScaleMode::World,
                ScaleMode::World => ScaleMode::Local,
            };
        }
        if self.input.was_key_pressed(KeyCode::KeyM) {
            self.material_index = (self.material_index + 1) % MATERIAL_CYCLE.len();
            let (glow, fill) = MATERIAL_CYCLE[self.material_index];
            self.quad.set_materials(glow, fill, &mut self.sink);
            info!("materials: glow {glow:?}, fill {fill:?} -> {:?}", self.quad.layout());
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.size.width as f32 / self.size.height as f32;
        let view_proj = self.camera.view_projection(aspect);
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: self.quad.frame.to_mat4().to_cols_array_2d(),
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        self.project_debug_edges(view_proj);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glow Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Fill first so the glow blends over it.
            for index in [FILL_SECTION, GLOW_SECTION] {
                let Some(section) = self.sink.sections.get(index).and_then(Option::as_ref) else {
                    continue;
                };
                let pipeline = if section.material == FILL_MATERIAL {
                    &self.fill_pipeline
                } else {
                    &self.glow_pipeline
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, section.vertex_buffer.slice(..));
                render_pass.set_index_buffer(section.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..section.num_indices, 0, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let stats = self.glow_stats();
        let edges = self.quad.settings.draw_debug_edges.then_some(self.edge_draws.as_slice());
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            self.overlay.visible.then_some(&stats),
            edges,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Project this frame's world-space debug segments to egui points.
    fn project_debug_edges(&mut self, view_proj: Mat4) {
        self.edge_draws.clear();
        let scale = self.window.scale_factor() as f32;
        let (w, h) = (self.config.width as f32 / scale, self.config.height as f32 / scale);
        let to_screen = |p: Vec3| -> Option<egui::Pos2> {
            let clip = view_proj * Vec4::new(p.x, p.y, p.z, 1.0);
            if clip.w <= 0.0 {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            Some(egui::pos2((ndc.x * 0.5 + 0.5) * w, (0.5 - ndc.y * 0.5) * h))
        };
        for &(a, b, _) in &self.debug_lines.segments {
            if let (Some(from), Some(to)) = (to_screen(a), to_screen(b)) {
                self.edge_draws.push(EdgeDraw { from, to });
            }
        }
    }

    fn glow_stats(&self) -> GlowStats {
        let extruded = self.quad.extruded();
        GlowStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_time_ms,
            resolution: (self.size.width, self.size.height),
            camera_distance: self.camera.distance(),
            camera_yaw_deg: self.camera.yaw.to_degrees(),
            camera_pitch_deg: self.camera.pitch.to_degrees(),
            dot: extruded.dot,
            alpha: extruded.alpha,
            push_distance: extruded.push_distance,
            flipped: extruded.flipped,
            show_bottom: self.quad.settings.show_bottom,
            scale_mode: match self.quad.settings.scale_mode {
                ScaleMode::Local => "local units",
                ScaleMode::World => "world units",
            },
            layout: match self.quad.layout() {
                SectionLayout::Empty => "none",
                SectionLayout::Merged => "merged",
                SectionLayout::Split => "split",
                SectionLayout::GlowOnly => "glow only",
                SectionLayout::FillOnly => "fill only",
            },
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    fragment_entry: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GlowVertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            // Quad and flaps wind clockwise toward the side they face.
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().expect("failed to create event loop");

    let window_attributes = Window::default_attributes()
        .with_title("Glow Quad Viewer")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    #[allow(deprecated)]
    let window = Arc::new(event_loop.create_window(window_attributes).expect("failed to create window"));

    let mut state = pollster::block_on(State::new(window.clone()));
    let mut frame_count = 0;
    let mut last_fps_update = std::time::Instant::now();

    #[allow(deprecated)]
    let result = event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                if !state.overlay.handle_window_event(&window, event).consumed {
                    state.input.process_event(event);
                }
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => warn!("{:?}", e),
                        }

                        frame_count += 1;
                        let now = std::time::Instant::now();
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            state.fps = frame_count;
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    });

    if let Err(e) = result {
        error!("event loop error: {e}");
    }
}
