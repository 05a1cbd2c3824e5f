/// CommandList - per-thread recorder of deferred rendering commands
///
/// Every method captures its arguments together with a clone of the
/// execution context into a closure appended to the current command buffer;
/// nothing touches the graphics API until the buffer is replayed on the
/// execution thread. Data passed to uploads is reference counted and
/// immutable (`Bytes`, `Arc<PixelData>`), so callers may drop their copy
/// right after recording.
///
/// Lifecycle of one session:
///
/// ```text
/// begin_scene
///     [update_* / generate_mip_maps]*
///     [begin_render_pass  [bind_* / draw*]*  end_render_pass]*
/// end_scene
/// flush
/// ```
///
/// Calls outside their legal state are protocol violations, caught by
/// `debug_assert!`.

use std::sync::Arc;
use bytes::Bytes;
use crate::command::{CommandBuffer, CommandListManager};
use crate::rhi::{
    Context, Buffer, BufferUsage, Texture, TextureKind, Sampler, Framebuffer, RenderTarget,
    PipelineState, RenderPass, IndexType, PixelData, Rect2u, TextureCubemapFace, UsageToken,
};
use crate::{engine_trace, engine_warn};

const LOG_SOURCE: &str = "galaxy3d::cmd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HintScope {
    Parallel,
    Sequence,
}

pub struct CommandList {
    manager: Arc<CommandListManager>,
    context: Arc<dyn Context>,
    buffer: CommandBuffer,
    /// Buffers filled during the current session, in recording order
    continuation: Vec<CommandBuffer>,
    recorded: usize,
    begin_called: bool,
    /// Usage of the open scene's target, handed to the end_scene command
    scene_token: Option<UsageToken>,
    in_render_pass: bool,
    hints: Vec<HintScope>,
}

impl CommandList {
    pub fn new(manager: Arc<CommandListManager>, context: Arc<dyn Context>) -> Self {
        let buffer = manager.allocate_cmd_buffer();
        Self {
            manager,
            context,
            buffer,
            continuation: Vec::new(),
            recorded: 0,
            begin_called: false,
            scene_token: None,
            in_render_pass: false,
            hints: Vec::new(),
        }
    }

    // ===== Scene scope =====

    /// Begin a scene rendering into `target` (None = the default target)
    ///
    /// The target is marked in use until the matching `end_scene` command
    /// has executed or has been discarded.
    pub fn begin_scene(&mut self, target: Option<&Arc<dyn RenderTarget>>) {
        debug_assert!(!self.begin_called, "begin_scene called twice without end_scene");
        self.begin_called = true;

        let context = Arc::clone(&self.context);
        let target = target.cloned();
        self.scene_token = target.as_ref().map(|t| t.usage().acquire());
        self.record(move || context.begin_scene(target.as_ref()));
    }

    pub fn end_scene(&mut self) {
        debug_assert!(self.begin_called, "end_scene called without begin_scene");
        debug_assert!(!self.in_render_pass, "end_scene called inside a render pass");
        debug_assert!(self.hints.is_empty(), "end_scene called with {} open hint scopes", self.hints.len());
        self.begin_called = false;

        let context = Arc::clone(&self.context);
        let token = self.scene_token.take();
        self.record(move || {
            context.end_scene();
            drop(token);
        });
    }

    pub fn begin_parallel(&mut self) {
        self.open_hint(HintScope::Parallel);
        let context = Arc::clone(&self.context);
        self.record(move || context.begin_parallel());
    }

    pub fn end_parallel(&mut self) {
        self.close_hint(HintScope::Parallel);
        let context = Arc::clone(&self.context);
        self.record(move || context.end_parallel());
    }

    pub fn begin_sequence(&mut self) {
        self.open_hint(HintScope::Sequence);
        let context = Arc::clone(&self.context);
        self.record(move || context.begin_sequence());
    }

    pub fn end_sequence(&mut self) {
        self.close_hint(HintScope::Sequence);
        let context = Arc::clone(&self.context);
        self.record(move || context.end_sequence());
    }

    // ===== Uploads =====

    pub fn update_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: Bytes) {
        self.check_upload(buffer, BufferUsage::Vertex, offset, size, &data);
        let context = Arc::clone(&self.context);
        let buffer = Arc::clone(buffer);
        self.record(move || context.update_vertex_buffer(&buffer, offset, size, &data));
    }

    pub fn update_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: Bytes) {
        self.check_upload(buffer, BufferUsage::Index, offset, size, &data);
        let context = Arc::clone(&self.context);
        let buffer = Arc::clone(buffer);
        self.record(move || context.update_index_buffer(&buffer, offset, size, &data));
    }

    pub fn update_uniform_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, size: u64, data: Bytes) {
        self.check_upload(buffer, BufferUsage::Uniform, offset, size, &data);
        let context = Arc::clone(&self.context);
        let buffer = Arc::clone(buffer);
        self.record(move || context.update_uniform_buffer(&buffer, offset, size, &data));
    }

    pub fn update_texture_2d(&mut self, texture: &Arc<dyn Texture>, mip: u32, region: Rect2u, data: Arc<PixelData>) {
        self.check_texture_upload(texture, TextureKind::Texture2D, mip, region, &data);
        let context = Arc::clone(&self.context);
        let texture = Arc::clone(texture);
        self.record(move || context.update_texture_2d(&texture, mip, region, &data));
    }

    pub fn update_texture_2d_array(
        &mut self,
        texture: &Arc<dyn Texture>,
        array_index: u32,
        mip: u32,
        region: Rect2u,
        data: Arc<PixelData>,
    ) {
        self.check_texture_upload(texture, TextureKind::Texture2DArray, mip, region, &data);
        debug_assert!(
            array_index < texture.info().array_layers,
            "update_texture_2d_array: layer {} out of range (array_layers = {})",
            array_index, texture.info().array_layers
        );
        let context = Arc::clone(&self.context);
        let texture = Arc::clone(texture);
        self.record(move || context.update_texture_2d_array(&texture, array_index, mip, region, &data));
    }

    pub fn update_texture_cube(
        &mut self,
        texture: &Arc<dyn Texture>,
        face: TextureCubemapFace,
        mip: u32,
        region: Rect2u,
        data: Arc<PixelData>,
    ) {
        self.check_texture_upload(texture, TextureKind::TextureCube, mip, region, &data);
        let context = Arc::clone(&self.context);
        let texture = Arc::clone(texture);
        self.record(move || context.update_texture_cube(&texture, face, mip, region, &data));
    }

    pub fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) {
        debug_assert!(self.begin_called, "generate_mip_maps called outside a scene");
        debug_assert!(!self.in_render_pass, "generate_mip_maps called inside a render pass");
        let context = Arc::clone(&self.context);
        let texture = Arc::clone(texture);
        self.record(move || context.generate_mip_maps(&texture));
    }

    // ===== Render pass =====

    /// Begin `pass` into `framebuffer` (None = the scene target)
    pub fn begin_render_pass(&mut self, pass: &RenderPass, framebuffer: Option<&Arc<dyn Framebuffer>>) {
        debug_assert!(self.begin_called, "begin_render_pass called outside a scene");
        debug_assert!(!self.in_render_pass, "begin_render_pass called inside a render pass");
        self.in_render_pass = true;

        let context = Arc::clone(&self.context);
        let pass = pass.clone();
        let framebuffer = framebuffer.cloned();
        self.record(move || context.begin_render_pass(&pass, framebuffer.as_ref()));
    }

    pub fn end_render_pass(&mut self) {
        debug_assert!(self.in_render_pass, "end_render_pass called without begin_render_pass");
        self.in_render_pass = false;

        let context = Arc::clone(&self.context);
        self.record(move || context.end_render_pass());
    }

    // ===== Bindings =====

    pub fn bind_pipeline_state(&mut self, state: &PipelineState) {
        self.check_in_pass("bind_pipeline_state");
        let context = Arc::clone(&self.context);
        let state = state.clone();
        self.record(move || context.bind_pipeline_state(&state));
    }

    pub fn bind_vertex_buffers(&mut self, buffers: &[Arc<dyn Buffer>]) {
        self.check_in_pass("bind_vertex_buffers");
        let context = Arc::clone(&self.context);
        let buffers = buffers.to_vec();
        self.record(move || context.bind_vertex_buffers(&buffers));
    }

    pub fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, index_type: IndexType) {
        self.check_in_pass("bind_index_buffer");
        let context = Arc::clone(&self.context);
        let buffer = Arc::clone(buffer);
        self.record(move || context.bind_index_buffer(&buffer, index_type));
    }

    /// Bind `size` bytes of `buffer` at `offset` to uniform block `index`
    pub fn bind_uniform_buffer(&mut self, buffer: &Arc<dyn Buffer>, index: u32, offset: u64, size: u64) {
        self.check_in_pass("bind_uniform_buffer");
        debug_assert!(
            offset + size <= buffer.size(),
            "bind_uniform_buffer: range {}..{} exceeds buffer size {}",
            offset, offset + size, buffer.size()
        );
        let context = Arc::clone(&self.context);
        let buffer = Arc::clone(buffer);
        self.record(move || context.bind_uniform_buffer(&buffer, index, offset, size));
    }

    pub fn bind_texture(&mut self, texture: &Arc<dyn Texture>, location: u32) {
        self.bind_texture_at(texture, location, 0);
    }

    /// Bind `texture` to element `array_index` of the sampler array at `location`
    pub fn bind_texture_at(&mut self, texture: &Arc<dyn Texture>, location: u32, array_index: u32) {
        self.check_in_pass("bind_texture");
        let context = Arc::clone(&self.context);
        let texture = Arc::clone(texture);
        self.record(move || context.bind_texture(&texture, location, array_index));
    }

    pub fn bind_sampler(&mut self, sampler: &Arc<dyn Sampler>, location: u32) {
        self.bind_sampler_at(sampler, location, 0);
    }

    pub fn bind_sampler_at(&mut self, sampler: &Arc<dyn Sampler>, location: u32, array_index: u32) {
        self.check_in_pass("bind_sampler");
        let context = Arc::clone(&self.context);
        let sampler = Arc::clone(sampler);
        self.record(move || context.bind_sampler(&sampler, location, array_index));
    }

    // ===== Draws =====

    pub fn draw(&mut self, vertex_count: u32, base_vertex: u32, instance_count: u32) {
        self.check_in_pass("draw");
        let context = Arc::clone(&self.context);
        self.record(move || context.draw(vertex_count, base_vertex, instance_count));
    }

    pub fn draw_indexed(&mut self, index_count: u32, base_index: u32, instance_count: u32) {
        self.check_in_pass("draw_indexed");
        let context = Arc::clone(&self.context);
        self.record(move || context.draw_indexed(index_count, base_index, instance_count));
    }

    // ===== Submission =====

    /// Commit everything recorded since the last flush to the manager
    ///
    /// All buffers of the session are committed as one contiguous batch.
    /// Flushing with nothing recorded is a no-op.
    pub fn flush(&mut self) {
        debug_assert!(!self.begin_called, "flush called inside a scene");
        if self.recorded == 0 {
            return;
        }

        let mut batch = std::mem::take(&mut self.continuation);
        batch.push(std::mem::replace(&mut self.buffer, CommandBuffer::new(0)));

        engine_trace!(LOG_SOURCE, "Flushing {} commands in {} buffers", self.recorded, batch.len());
        self.buffer = self.manager.submit_cmd_buffers(batch);
        self.recorded = 0;
    }

    /// Commands recorded since the last flush
    pub fn recorded_commands(&self) -> usize {
        self.recorded
    }

    /// Whether a scene is open
    pub fn is_recording(&self) -> bool {
        self.begin_called
    }

    pub fn is_in_render_pass(&self) -> bool {
        self.in_render_pass
    }

    pub fn context(&self) -> &Arc<dyn Context> {
        &self.context
    }

    // ===== Internals =====

    fn record<F: FnOnce() + Send + 'static>(&mut self, command: F) {
        let command = match self.buffer.push(command) {
            Ok(()) => {
                self.recorded += 1;
                return;
            }
            Err(command) => command,
        };

        // Current buffer is full: park it and continue in a fresh one
        let fresh = self.manager.allocate_cmd_buffer();
        let full = std::mem::replace(&mut self.buffer, fresh);
        engine_trace!(LOG_SOURCE, "Command buffer full after {} commands, continuing in a new one", full.len());
        self.continuation.push(full);

        let accepted = self.buffer.push(command).is_ok();
        debug_assert!(accepted, "empty command buffer rejected a command");
        self.recorded += 1;
    }

    fn open_hint(&mut self, scope: HintScope) {
        debug_assert!(self.begin_called, "{:?} hint opened outside a scene", scope);
        debug_assert!(!self.in_render_pass, "{:?} hint opened inside a render pass", scope);
        self.hints.push(scope);
    }

    fn close_hint(&mut self, scope: HintScope) {
        debug_assert!(!self.in_render_pass, "{:?} hint closed inside a render pass", scope);
        let open = self.hints.pop();
        debug_assert!(open == Some(scope), "{:?} hint closed but the innermost open scope is {:?}", scope, open);
    }

    fn check_in_pass(&self, op: &str) {
        debug_assert!(self.in_render_pass, "{} called outside a render pass", op);
    }

    fn check_upload(&self, buffer: &Arc<dyn Buffer>, usage: BufferUsage, offset: u64, size: u64, data: &Bytes) {
        debug_assert!(self.begin_called, "buffer upload outside a scene");
        debug_assert!(!self.in_render_pass, "buffer upload inside a render pass");
        debug_assert!(buffer.usage() == usage, "{:?} upload into a {:?} buffer", usage, buffer.usage());
        debug_assert!(data.len() as u64 >= size, "upload of {} bytes from {} bytes of data", size, data.len());
        debug_assert!(
            offset + size <= buffer.size(),
            "upload range {}..{} exceeds buffer size {}",
            offset, offset + size, buffer.size()
        );
    }

    fn check_texture_upload(&self, texture: &Arc<dyn Texture>, kind: TextureKind, mip: u32, region: Rect2u, data: &PixelData) {
        let info = texture.info();
        debug_assert!(self.begin_called, "texture upload outside a scene");
        debug_assert!(!self.in_render_pass, "texture upload inside a render pass");
        debug_assert!(info.kind == kind, "{:?} upload into a {:?} texture", kind, info.kind);
        debug_assert!(mip < info.mip_levels, "mip {} out of range (mip_levels = {})", mip, info.mip_levels);
        debug_assert!(
            region.size.x == data.width() && region.size.y == data.height(),
            "region {}x{} does not match pixel data {}x{}",
            region.size.x, region.size.y, data.width(), data.height()
        );
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        if self.recorded > 0 {
            engine_warn!(LOG_SOURCE, "CommandList dropped with {} unflushed commands, discarded", self.recorded);
        }
        for buffer in self.continuation.drain(..) {
            self.manager.release_cmd_buffer(buffer);
        }
        let buffer = std::mem::replace(&mut self.buffer, CommandBuffer::new(0));
        self.manager.release_cmd_buffer(buffer);
    }
}

#[cfg(test)]
#[path = "command_list_tests.rs"]
mod tests;
