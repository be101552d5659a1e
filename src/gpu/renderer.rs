//! wgpu implementation of [`SceneRenderer`].
//!
//! One forward pass per frame: ground, grid, then the asset split into
//! back-face culled and double-sided draws. Asset geometry is baked on the
//! CPU and re-uploaded only when the frame's asset revision changes; the
//! stage is uploaded once.

use wgpu::util::DeviceExt;

use crate::camera::core::CameraUniform;
use crate::gpu::dynamic_buffer::TypedBuffer;
use crate::gpu::geometry::{MeshBatch, SceneGeometry, SceneVertex};
use crate::gpu::lighting::LightingUniform;
use crate::gpu::pipeline::{self, DepthTarget, ScenePipelines};
use crate::gpu::render_context::{RenderContext, RenderContextError};
use crate::session::rig::LineVertex;
use crate::viewport::{FrameView, RenderError, SceneRenderer};

/// Vertex and index buffers for one [`MeshBatch`].
struct GpuBatch {
    vertices: TypedBuffer<SceneVertex>,
    indices: TypedBuffer<u32>,
}

impl GpuBatch {
    fn new(device: &wgpu::Device, label: &str) -> Self {
        Self {
            vertices: TypedBuffer::with_capacity(
                device,
                &format!("{label} Vertices"),
                1024,
                wgpu::BufferUsages::VERTEX,
            ),
            indices: TypedBuffer::with_capacity(
                device,
                &format!("{label} Indices"),
                3072,
                wgpu::BufferUsages::INDEX,
            ),
        }
    }

    fn write(&mut self, context: &RenderContext, batch: &MeshBatch) {
        let _ = self.vertices.write(&context.device, &context.queue, &batch.vertices);
        let _ = self.indices.write(&context.device, &context.queue, &batch.indices);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        if self.indices.is_empty() {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, self.vertices.buffer().slice(..));
        pass.set_index_buffer(self.indices.buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.indices.count() as u32, 0, 0..1);
    }
}

/// GPU resources; dropped as a unit on release.
struct GpuState {
    context: RenderContext,
    pipelines: ScenePipelines,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    depth: DepthTarget,
    ground: GpuBatch,
    grid: TypedBuffer<LineVertex>,
    stage_uploaded: bool,
    single_sided: GpuBatch,
    double_sided: GpuBatch,
    asset_revision: Option<u64>,
}

impl GpuState {
    fn new(context: RenderContext) -> Self {
        let device = &context.device;
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[pipeline::uniform_entry(0), pipeline::uniform_entry(1)],
        });
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting Buffer"),
            size: size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        });

        let pipelines = ScenePipelines::new(device, context.format(), &frame_layout);
        let (width, height) = context.size();
        let depth = DepthTarget::new(device, width, height);
        let ground = GpuBatch::new(device, "Ground");
        let grid =
            TypedBuffer::with_capacity(device, "Grid Vertices", 256, wgpu::BufferUsages::VERTEX);
        let single_sided = GpuBatch::new(device, "Asset");
        let double_sided = GpuBatch::new(device, "Double-Sided Asset");

        Self {
            context,
            pipelines,
            camera_buffer,
            lighting_buffer,
            frame_bind_group,
            depth,
            ground,
            grid,
            stage_uploaded: false,
            single_sided,
            double_sided,
            asset_revision: None,
        }
    }

    fn upload(&mut self, frame: &FrameView<'_>) {
        let mut camera = CameraUniform::new();
        camera.update_view_proj(frame.camera);
        let queue = &self.context.queue;
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::cast_slice(&[LightingUniform::from_rig(frame.lights)]),
        );

        if !self.stage_uploaded {
            let stage = SceneGeometry::from_stage(frame.stage);
            self.ground.write(&self.context, &stage.single_sided);
            let lines = frame.stage.grid.map(|g| g.line_vertices()).unwrap_or_default();
            let _ = self.grid.write(&self.context.device, &self.context.queue, &lines);
            self.stage_uploaded = true;
        }

        if self.asset_revision != Some(frame.asset_revision) {
            let geometry = frame.asset.map(SceneGeometry::from_node).unwrap_or_default();
            log::debug!(
                "uploading asset revision {}: {} + {} triangles",
                frame.asset_revision,
                geometry.single_sided.indices.len() / 3,
                geometry.double_sided.indices.len() / 3,
            );
            self.single_sided.write(&self.context, &geometry.single_sided);
            self.double_sided.write(&self.context, &geometry.double_sided);
            self.asset_revision = Some(frame.asset_revision);
        }
    }

    fn draw(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        self.upload(frame);

        let (width, height) = self.context.size();
        if self.depth.size() != (width, height) {
            self.depth = DepthTarget::new(&self.context.device, width, height);
        }

        let output = self.context.get_next_frame().map_err(map_surface_error)?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = frame.stage.clear_color.map(f64::from);

        let mut encoder = self.context.create_encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            self.ground.draw(&mut pass, &self.pipelines.culled);
            if !self.grid.is_empty() {
                pass.set_pipeline(&self.pipelines.lines);
                pass.set_vertex_buffer(0, self.grid.buffer().slice(..));
                pass.draw(0..self.grid.count() as u32, 0..1);
            }
            self.single_sided.draw(&mut pass, &self.pipelines.culled);
            self.double_sided.draw(&mut pass, &self.pipelines.double_sided);
        }
        self.context.submit(encoder);
        output.present();
        Ok(())
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> RenderError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
        wgpu::SurfaceError::OutOfMemory => RenderError::Fatal("out of GPU memory".into()),
        other => {
            log::debug!("frame skipped: {other}");
            RenderError::Skipped
        }
    }
}

/// Forward renderer drawing into a wgpu surface.
pub struct WgpuSceneRenderer {
    state: Option<GpuState>,
}

impl WgpuSceneRenderer {
    /// Wrap an initialized render context.
    #[must_use]
    pub fn new(context: RenderContext) -> Self {
        Self {
            state: Some(GpuState::new(context)),
        }
    }

    /// Create a surface on `target` and build the renderer for it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if GPU initialization fails.
    pub async fn create(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let context = RenderContext::new(target, size).await?;
        Ok(Self::new(context))
    }

    /// Whether [`release`](SceneRenderer::release) has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }
}

impl SceneRenderer for WgpuSceneRenderer {
    fn surface_size(&self) -> (u32, u32) {
        self.state.as_ref().map_or((0, 0), |s| s.context.size())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(state) = self.state.as_mut() {
            state.context.resize(width, height);
        }
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        match self.state.as_mut() {
            Some(state) => state.draw(frame),
            None => Err(RenderError::Fatal("renderer released".into())),
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("renderer released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_errors_map_to_recovery_policy() {
        assert_eq!(map_surface_error(wgpu::SurfaceError::Lost), RenderError::SurfaceLost);
        assert_eq!(map_surface_error(wgpu::SurfaceError::Outdated), RenderError::SurfaceLost);
        assert_eq!(map_surface_error(wgpu::SurfaceError::Timeout), RenderError::Skipped);
        assert!(matches!(
            map_surface_error(wgpu::SurfaceError::OutOfMemory),
            RenderError::Fatal(_)
        ));
    }
}
