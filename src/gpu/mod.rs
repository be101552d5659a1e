//! GPU backend: wgpu device setup, CPU-side geometry baking, and the
//! forward renderer implementing [`SceneRenderer`](crate::SceneRenderer).

/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// World-space vertex baking for asset and stage geometry.
pub mod geometry;
/// GPU lighting uniform.
pub mod lighting;
/// Depth target, shared pipeline state, and pipeline construction.
pub mod pipeline;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// The wgpu scene renderer.
pub mod renderer;

pub use renderer::WgpuSceneRenderer;
