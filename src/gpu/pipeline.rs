//! Shared pipeline state for the viewer's render passes.

use crate::gpu::geometry::SceneVertex;
use crate::session::rig::LineVertex;

/// Depth attachment format used by every pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Standard depth-stencil state used by all render pipelines.
pub fn depth_stencil_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Uniform buffer binding visible to both shader stages.
pub fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Depth texture matching the surface size.
pub struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    /// Allocate a depth texture. Zero dimensions are clamped to 1.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// View bound as the depth attachment.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Render pipelines for lit meshes and grid lines.
pub struct ScenePipelines {
    /// Back-face culled meshes.
    pub culled: wgpu::RenderPipeline,
    /// Double-sided meshes.
    pub double_sided: wgpu::RenderPipeline,
    /// Grid lines.
    pub lines: wgpu::RenderPipeline,
}

impl ScenePipelines {
    /// Build all pipelines against the shared frame bind group layout.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mesh_shader =
            device.create_shader_module(wgpu::include_wgsl!("../../assets/shaders/mesh.wgsl"));
        let line_shader =
            device.create_shader_module(wgpu::include_wgsl!("../../assets/shaders/line.wgsl"));

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = |label: &str, cull_mode: Option<wgpu::Face>| {
            create_pipeline(
                device,
                &PipelineDef {
                    label,
                    layout: &layout,
                    shader: &mesh_shader,
                    vertex: SceneVertex::layout(),
                    format,
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        ..Default::default()
                    },
                },
            )
        };

        Self {
            culled: mesh_pipeline("Mesh", Some(wgpu::Face::Back)),
            double_sided: mesh_pipeline("Double-Sided Mesh", None),
            lines: create_pipeline(
                device,
                &PipelineDef {
                    label: "Grid",
                    layout: &layout,
                    shader: &line_shader,
                    vertex: line_vertex_layout(),
                    format,
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::LineList,
                        ..Default::default()
                    },
                },
            ),
        }
    }
}

struct PipelineDef<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    vertex: wgpu::VertexBufferLayout<'static>,
    format: wgpu::TextureFormat,
    primitive: wgpu::PrimitiveState,
}

fn create_pipeline(device: &wgpu::Device, def: &PipelineDef<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", def.label)),
        layout: Some(def.layout),
        vertex: wgpu::VertexState {
            module: def.shader,
            entry_point: Some("vs_main"),
            buffers: &[def.vertex.clone()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: def.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: def.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: def.primitive,
        depth_stencil: Some(depth_stencil_state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

fn line_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<LineVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &LINE_ATTRIBUTES,
    }
}
