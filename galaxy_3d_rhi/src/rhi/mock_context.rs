/// Mock execution context and resources for unit tests (no GPU required)
///
/// `MockContext` records every call it receives as a string, in order, and
/// drives a real `DescriptorSetCache` over `MockDescriptorBackend` for the
/// binding calls, the way a native context would.

use std::sync::{Arc, Mutex};
use bytes::Bytes;
use crate::config::Config;
use crate::descriptor::{DescriptorSetCache, SetHandle};
use crate::descriptor::mock_descriptor_backend::MockDescriptorBackend;
use crate::rhi::{
    Context, Buffer, BufferUsage, Texture, TextureInfo, TextureKind, ImageLayout, PixelFormat,
    Sampler, Framebuffer, RenderTarget, UsageTracker, PipelineState, RenderPass, IndexType,
    PixelData, Rect2u, TextureCubemapFace,
};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub handle: u64,
    pub size: u64,
    pub usage: BufferUsage,
}

impl MockBuffer {
    pub fn new(handle: u64, size: u64, usage: BufferUsage) -> Self {
        Self { handle, size, usage }
    }
}

impl Buffer for MockBuffer {
    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub view: u64,
}

impl MockTexture {
    pub fn new(view: u64, kind: TextureKind, width: u32, height: u32, array_layers: u32) -> Self {
        Self {
            info: TextureInfo {
                width,
                height,
                kind,
                array_layers,
                mip_levels: 4,
                format: PixelFormat::R8G8B8A8_UNORM,
            },
            view,
        }
    }

    pub fn new_2d(view: u64, width: u32, height: u32) -> Self {
        Self::new(view, TextureKind::Texture2D, width, height, 1)
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn native_view(&self) -> u64 {
        self.view
    }

    fn image_layout(&self) -> ImageLayout {
        ImageLayout::ShaderReadOnly
    }
}

// ============================================================================
// Mock Sampler
// ============================================================================

#[derive(Debug)]
pub struct MockSampler {
    pub handle: u64,
}

impl MockSampler {
    pub fn new(handle: u64) -> Self {
        Self { handle }
    }
}

impl Sampler for MockSampler {
    fn native_handle(&self) -> u64 {
        self.handle
    }
}

// ============================================================================
// Mock Framebuffer / RenderTarget
// ============================================================================

#[derive(Debug)]
pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
}

impl MockFramebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug)]
pub struct MockRenderTarget {
    pub width: u32,
    pub height: u32,
    pub usage: UsageTracker,
}

impl MockRenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, usage: UsageTracker::new() }
    }
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn usage(&self) -> &UsageTracker {
        &self.usage
    }
}

// ============================================================================
// Mock Context
// ============================================================================

pub struct MockContext {
    /// Every call received, in order
    pub calls: Mutex<Vec<String>>,
    pub descriptors: Mutex<DescriptorSetCache<MockDescriptorBackend>>,
    /// Set returned by the descriptor cache for each draw
    pub drawn_sets: Mutex<Vec<SetHandle>>,
    /// Target of the scene being executed
    scene_target: Mutex<Option<Arc<dyn RenderTarget>>>,
    /// Whether the scene target was still in use when its end_scene ran
    pub end_scene_target_in_use: Mutex<Vec<bool>>,
}

impl MockContext {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            descriptors: Mutex::new(
                DescriptorSetCache::new(MockDescriptorBackend::new(), config).expect("valid config"),
            ),
            drawn_sets: Mutex::new(Vec::new()),
            scene_target: Mutex::new(None),
            end_scene_target_in_use: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn record_draw(&self, call: String) {
        let set = self.descriptors.lock().unwrap().get_or_create_set();
        self.drawn_sets.lock().unwrap().push(set);
        self.record(call);
    }
}

impl Context for MockContext {
    fn begin_scene(&self, target: Option<&Arc<dyn RenderTarget>>) {
        *self.scene_target.lock().unwrap() = target.cloned();
        match target {
            Some(target) => self.record(format!("begin_scene({}x{})", target.width(), target.height())),
            None => self.record("begin_scene".to_string()),
        }
    }

    fn end_scene(&self) {
        if let Some(target) = self.scene_target.lock().unwrap().take() {
            self.end_scene_target_in_use.lock().unwrap().push(target.usage().is_in_use());
        }
        self.record("end_scene".to_string());
    }

    fn begin_parallel(&self) {
        self.record("begin_parallel".to_string());
    }

    fn end_parallel(&self) {
        self.record("end_parallel".to_string());
    }

    fn begin_sequence(&self) {
        self.record("begin_sequence".to_string());
    }

    fn end_sequence(&self) {
        self.record("end_sequence".to_string());
    }

    fn update_vertex_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes) {
        self.record(format!("update_vertex_buffer({},{},{},{:?})", buffer.native_handle(), offset, size, &data[..]));
    }

    fn update_index_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes) {
        self.record(format!("update_index_buffer({},{},{},{:?})", buffer.native_handle(), offset, size, &data[..]));
    }

    fn update_uniform_buffer(&self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: &Bytes) {
        self.record(format!("update_uniform_buffer({},{},{},{:?})", buffer.native_handle(), offset, size, &data[..]));
    }

    fn update_texture_2d(&self, texture: &Arc<dyn Texture>, mip: u32, region: Rect2u, data: &PixelData) {
        self.record(format!(
            "update_texture_2d({},{},{}x{},{})",
            texture.native_view(), mip, region.size.x, region.size.y, data.bytes().len()
        ));
    }

    fn update_texture_2d_array(
        &self,
        texture: &Arc<dyn Texture>,
        array_index: u32,
        mip: u32,
        region: Rect2u,
        data: &PixelData,
    ) {
        self.record(format!(
            "update_texture_2d_array({},{},{},{}x{},{})",
            texture.native_view(), array_index, mip, region.size.x, region.size.y, data.bytes().len()
        ));
    }

    fn update_texture_cube(
        &self,
        texture: &Arc<dyn Texture>,
        face: TextureCubemapFace,
        mip: u32,
        region: Rect2u,
        data: &PixelData,
    ) {
        self.record(format!(
            "update_texture_cube({},{:?},{},{}x{},{})",
            texture.native_view(), face, mip, region.size.x, region.size.y, data.bytes().len()
        ));
    }

    fn generate_mip_maps(&self, texture: &Arc<dyn Texture>) {
        self.record(format!("generate_mip_maps({})", texture.native_view()));
    }

    fn begin_render_pass(&self, pass: &RenderPass, framebuffer: Option<&Arc<dyn Framebuffer>>) {
        match framebuffer {
            Some(fb) => self.record(format!("begin_render_pass({}x{})", fb.width(), fb.height())),
            None => self.record(format!("begin_render_pass(clears={})", pass.clear_values.len())),
        }
    }

    fn end_render_pass(&self) {
        self.record("end_render_pass".to_string());
    }

    fn bind_pipeline_state(&self, state: &PipelineState) {
        self.descriptors.lock().unwrap().bind_layout(state.layout, &state.program);
        self.record(format!("bind_pipeline_state({})", state.program.name));
    }

    fn bind_vertex_buffers(&self, buffers: &[Arc<dyn Buffer>]) {
        let handles: Vec<u64> = buffers.iter().map(|b| b.native_handle()).collect();
        self.record(format!("bind_vertex_buffers({:?})", handles));
    }

    fn bind_index_buffer(&self, buffer: &Arc<dyn Buffer>, index_type: IndexType) {
        self.record(format!("bind_index_buffer({},{:?})", buffer.native_handle(), index_type));
    }

    fn bind_uniform_buffer(&self, buffer: &Arc<dyn Buffer>, index: u32, offset: u64, size: u64) {
        self.descriptors.lock().unwrap().bind_uniform_buffer(buffer.as_ref(), index, offset, size);
        self.record(format!("bind_uniform_buffer({},{},{})", index, offset, size));
    }

    fn bind_texture(&self, texture: &Arc<dyn Texture>, location: u32, array_index: u32) {
        self.descriptors.lock().unwrap().bind_texture(texture.as_ref(), location, array_index);
        self.record(format!("bind_texture({},{})", location, array_index));
    }

    fn bind_sampler(&self, sampler: &Arc<dyn Sampler>, location: u32, array_index: u32) {
        self.descriptors.lock().unwrap().bind_sampler(sampler.as_ref(), location, array_index);
        self.record(format!("bind_sampler({},{})", location, array_index));
    }

    fn draw(&self, vertex_count: u32, base_vertex: u32, instance_count: u32) {
        self.record_draw(format!("draw({},{},{})", vertex_count, base_vertex, instance_count));
    }

    fn draw_indexed(&self, index_count: u32, base_index: u32, instance_count: u32) {
        self.record_draw(format!("draw_indexed({},{},{})", index_count, base_index, instance_count));
    }
}
