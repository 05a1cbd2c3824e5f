/// Context trait - the execution-side graphics context
///
/// Every `CommandList` call records a closure that, when the buffer is
/// replayed on the execution thread, invokes exactly one method of this
/// trait. Implementations own the native command stream and the descriptor
/// set cache; they are only ever driven from the execution thread, but must
/// be `Send + Sync` because recorder threads hold `Arc<dyn Context>` clones.

use std::sync::Arc;
use bytes::Bytes;
use crate::rhi::{
    Buffer, Texture, Sampler, Framebuffer, RenderTarget,
    PipelineState, RenderPass, IndexType, PixelData, Rect2u, TextureCubemapFace,
};

pub trait Context: Send + Sync {
    // ===== Scene scope =====

    /// Begin a scene rendering into `target` (None = the default target)
    fn begin_scene(&self, target: Option<&Arc<dyn RenderTarget>>);

    fn end_scene(&self);

    /// Hint: the following work may be parallelized by the backend
    fn begin_parallel(&self);
    fn end_parallel(&self);

    /// Hint: the following work must stay in order
    fn begin_sequence(&self);
    fn end_sequence(&self);

    // ===== Data uploads (outside render passes) =====

    fn update_vertex_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes);
    fn update_index_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes);
    fn update_uniform_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes);

    fn update_texture_2d(&self, texture: &Arc<dyn Texture>, mip: u32, region: Rect2u, data: &PixelData);

    fn update_texture_2d_array(
        &self,
        texture: &Arc<dyn Texture>,
        array_index: u32,
        mip: u32,
        region: Rect2u,
        data: &PixelData,
    );

    fn update_texture_cube(
        &self,
        texture: &Arc<dyn Texture>,
        face: TextureCubemapFace,
        mip: u32,
        region: Rect2u,
        data: &PixelData,
    );

    fn generate_mip_maps(&self, texture: &Arc<dyn Texture>);

    // ===== Render pass =====

    /// Begin a render pass into `framebuffer` (None = the scene target)
    fn begin_render_pass(&self, pass: &RenderPass, framebuffer: Option<&Arc<dyn Framebuffer>>);

    fn end_render_pass(&self);

    // ===== Bindings (inside render passes) =====

    fn bind_pipeline_state(&self, state: &PipelineState);
    fn bind_vertex_buffers(&self, buffers: &[Arc<dyn Buffer>]);
    fn bind_index_buffer(&self, buffer: &Arc<dyn Buffer>, index_type: IndexType);
    fn bind_uniform_buffer(&self, buffer: &Arc<dyn Buffer>, index: u32, offset: u64, size: u64);
    fn bind_texture(&self, texture: &Arc<dyn Texture>, location: u32, array_index: u32);
    fn bind_sampler(&self, sampler: &Arc<dyn Sampler>, location: u32, array_index: u32);

    // ===== Draws =====

    fn draw(&self, vertex_count: u32, base_vertex: u32, instance_count: u32);
    fn draw_indexed(&self, index_count: u32, base_index: u32, instance_count: u32);
}
