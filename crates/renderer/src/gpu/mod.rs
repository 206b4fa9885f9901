//! GPU orchestration for the carousel.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain on resize.
//! - `pipeline` builds the lens, stardust and panel render pipelines from
//!   the bundled WGSL and the two shared bind group layouts.
//! - `textures` materialises one texture per unique media id and rewrites
//!   it in place as its stream plays.
//! - `uniforms` mirrors the WGSL uniform blocks as Pod structs and writes
//!   changes straight through the queue each frame.
//! - `GpuState` glues everything together and exposes the per-frame API
//!   used by `window`.

mod context;
mod pipeline;
mod textures;
mod uniforms;

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use carousel::input::PointerState;
use glam::{Mat4, Vec2};
use media::MediaRegistry;
use showconfig::Tuning;
use winit::dpi::PhysicalSize;

use wgpu::util::DeviceExt;

use crate::scene::{self, PanelInstance};
use context::GpuContext;
use pipeline::Pipelines;
use textures::{placeholder_texture, MediaTexture};
use uniforms::{LensUniforms, PanelUniforms, StarUniforms};

// Matches the original backdrop density and point size.
const STAR_COUNT: usize = 10_000;
const STAR_POINT_SIZE: f32 = 0.05;

/// Everything the GPU needs for one frame, computed on the render thread.
pub(crate) struct FrameInputs<'a> {
    pub now: Instant,
    pub elapsed_secs: f32,
    pub camera_z: f32,
    pub view: Mat4,
    pub pointer: PointerState,
    pub tilt: Vec2,
    pub active: Option<usize>,
    pub panels: &'a [PanelInstance],
    pub tuning: &'a Tuning,
    pub registry: &'a MediaRegistry,
}

struct BoundMedia {
    texture: MediaTexture,
    bind_group: wgpu::BindGroup,
}

/// Owns the surface, pipelines and per-panel GPU resources. Lives on the
/// render thread for the whole session.
pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: Pipelines,
    lens_uniforms: LensUniforms,
    lens_buffer: wgpu::Buffer,
    lens_bind_group: wgpu::BindGroup,
    star_vertices: wgpu::Buffer,
    star_buffer: wgpu::Buffer,
    star_bind_group: wgpu::BindGroup,
    panel_buffers: Vec<wgpu::Buffer>,
    panel_bind_groups: Vec<wgpu::BindGroup>,
    media: HashMap<String, BoundMedia>,
    placeholder: BoundMedia,
}

impl GpuState {
    pub fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        panel_count: usize,
        tuning: &Tuning,
    ) -> Result<Self>
    where
        T: raw_window_handle::HasDisplayHandle + raw_window_handle::HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let pipelines = Pipelines::new(&context.device, context.surface_format)?;

        let lens_uniforms = LensUniforms::new(size.width, size.height, &tuning.lens);
        let lens_buffer = create_uniform_buffer(
            &context.device,
            "lens uniforms",
            std::mem::size_of::<LensUniforms>(),
        );
        let lens_bind_group = bind_uniform(
            &context.device,
            &pipelines.uniform_layout,
            "lens uniform bind group",
            &lens_buffer,
        );

        let stars = scene::scatter_stars(STAR_COUNT, tuning.spacing * panel_count as f32);
        let star_vertices = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("stardust positions"),
                contents: bytemuck::cast_slice(&stars),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let star_buffer = create_uniform_buffer(
            &context.device,
            "stardust uniforms",
            std::mem::size_of::<StarUniforms>(),
        );
        let star_bind_group = bind_uniform(
            &context.device,
            &pipelines.uniform_layout,
            "stardust uniform bind group",
            &star_buffer,
        );

        let mut panel_buffers = Vec::with_capacity(panel_count);
        let mut panel_bind_groups = Vec::with_capacity(panel_count);
        for index in 0..panel_count {
            let buffer = create_uniform_buffer(
                &context.device,
                &format!("panel #{index} uniforms"),
                std::mem::size_of::<PanelUniforms>(),
            );
            panel_bind_groups.push(bind_uniform(
                &context.device,
                &pipelines.uniform_layout,
                &format!("panel #{index} uniform bind group"),
                &buffer,
            ));
            panel_buffers.push(buffer);
        }

        let texture = placeholder_texture(&context.device, &context.queue);
        let bind_group =
            pipelines.bind_texture(&context.device, "placeholder bind group", &texture.view);
        let placeholder = BoundMedia {
            texture,
            bind_group,
        };

        Ok(Self {
            context,
            pipelines,
            lens_uniforms,
            lens_buffer,
            lens_bind_group,
            star_vertices,
            star_buffer,
            star_bind_group,
            panel_buffers,
            panel_bind_groups,
            media: HashMap::new(),
            placeholder,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
        self.lens_uniforms
            .set_resolution(self.context.size.width, self.context.size.height);
    }

    /// Pulls the current frame of every referenced stream into its texture,
    /// creating textures lazily when a stream first reports a frame. The
    /// upload is skipped when the frame index has not moved, so paused
    /// streams cost nothing.
    fn upload_media(&mut self, inputs: &FrameInputs<'_>) {
        for panel in inputs.panels {
            let Some(handle) = inputs.registry.handle(&panel.media) else {
                continue;
            };
            let Some(frame_index) = handle.current_frame_index(inputs.now) else {
                continue;
            };
            let bound = match self.media.entry(panel.media.clone()) {
                std::collections::hash_map::Entry::Occupied(occupied) => occupied.into_mut(),
                std::collections::hash_map::Entry::Vacant(vacant) => {
                    let Some((width, height)) =
                        handle.with_current_frame(inputs.now, |frame| (frame.width, frame.height))
                    else {
                        continue;
                    };
                    let texture = MediaTexture::new(
                        &self.context.device,
                        &format!("media texture '{}'", panel.media),
                        width,
                        height,
                    );
                    let bind_group = self.pipelines.bind_texture(
                        &self.context.device,
                        &format!("media bind group '{}'", panel.media),
                        &texture.view,
                    );
                    vacant.insert(BoundMedia {
                        texture,
                        bind_group,
                    })
                }
            };
            handle.with_current_frame(inputs.now, |frame| {
                bound
                    .texture
                    .upload(&self.context.queue, frame, frame_index as u64);
            });
        }
    }

    pub fn render(&mut self, inputs: FrameInputs<'_>) -> Result<(), wgpu::SurfaceError> {
        self.upload_media(&inputs);

        self.lens_uniforms.time = inputs.elapsed_secs;
        self.lens_uniforms
            .set_pointer(inputs.pointer.x, inputs.pointer.y);
        self.context.queue.write_buffer(
            &self.lens_buffer,
            0,
            bytemuck::bytes_of(&self.lens_uniforms),
        );

        let projection =
            scene::projection_matrix(self.context.size.width, self.context.size.height);
        let view_proj = projection * inputs.view;

        let star_uniforms = StarUniforms::new(
            inputs.view,
            projection,
            inputs.elapsed_secs,
            STAR_POINT_SIZE,
        );
        self.context
            .queue
            .write_buffer(&self.star_buffer, 0, bytemuck::bytes_of(&star_uniforms));

        for panel in inputs.panels {
            let tilt = if inputs.active == Some(panel.index) {
                inputs.tilt
            } else {
                Vec2::ZERO
            };
            let model = panel.model_matrix(inputs.tuning, tilt);
            let uniforms = PanelUniforms::new(view_proj, model, 1.0);
            if let Some(buffer) = self.panel_buffers.get(panel.index) {
                self.context
                    .queue
                    .write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
            }
        }

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("carousel encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("carousel pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.010,
                            g: 0.010,
                            b: 0.015,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Lens background first, distorting the active panel's stream.
            let backdrop = inputs
                .active
                .and_then(|index| inputs.panels.get(index))
                .and_then(|panel| self.media.get(&panel.media))
                .unwrap_or(&self.placeholder);
            pass.set_pipeline(&self.pipelines.lens);
            pass.set_bind_group(0, &self.lens_bind_group, &[]);
            pass.set_bind_group(1, &backdrop.bind_group, &[]);
            pass.draw(0..3, 0..1);

            // Stardust over the lens background, behind the panels.
            pass.set_pipeline(&self.pipelines.stars);
            pass.set_bind_group(0, &self.star_bind_group, &[]);
            pass.set_vertex_buffer(0, self.star_vertices.slice(..));
            pass.draw(0..6, 0..STAR_COUNT as u32);

            // Panels far-to-near; there is no depth buffer, the z sort is
            // the ordering.
            let mut order: Vec<&PanelInstance> = inputs.panels.iter().collect();
            order.sort_by(|a, b| {
                let da = (inputs.camera_z - a.z).abs();
                let db = (inputs.camera_z - b.z).abs();
                db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
            });
            pass.set_pipeline(&self.pipelines.panel);
            for panel in order {
                let Some(bind_group) = self.panel_bind_groups.get(panel.index) else {
                    continue;
                };
                let media = self.media.get(&panel.media).unwrap_or(&self.placeholder);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_bind_group(1, &media.bind_group, &[]);
                pass.draw(0..6, 0..1);
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn bind_uniform(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
