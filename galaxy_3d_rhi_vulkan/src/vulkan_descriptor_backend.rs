/// VulkanDescriptorBackend - native descriptor pools and sets for the DescriptorSetCache
///
/// Each cache bucket maps to one `VkDescriptorPool` sized for exactly
/// `capacity` sets of its layout. The cache only ever resets or destroys
/// whole pools, so pools are created without `FREE_DESCRIPTOR_SET`.
///
/// Handles cross the backend boundary as raw `u64` (`vk::Handle::as_raw`).

use ash::vk;
use ash::vk::Handle;
use galaxy_3d_rhi::galaxy3d::{Result, Error};
use galaxy_3d_rhi::galaxy3d::descriptor::{
    BucketDesc, DescriptorBackend, DescriptorBufferInfo, DescriptorImageInfo, DescriptorType,
    DescriptorWrite, DescriptorWriteBatch, LayoutHandle, PoolHandle, SetHandle,
};
use galaxy_3d_rhi::galaxy3d::rhi::{ImageLayout, ProgramMeta};
use galaxy_3d_rhi::{engine_trace, engine_debug, engine_warn, engine_err, engine_bail};
use std::sync::Arc;
use crate::vulkan_context::GpuContext;

const LOG_SOURCE: &str = "galaxy3d::vulkan";

// ============================================================================
// Conversions
// ============================================================================

pub(crate) fn descriptor_type_to_vk(descriptor_type: DescriptorType) -> vk::DescriptorType {
    match descriptor_type {
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
    }
}

fn buffer_info_to_vk(info: &DescriptorBufferInfo) -> vk::DescriptorBufferInfo {
    vk::DescriptorBufferInfo::default()
        .buffer(vk::Buffer::from_raw(info.buffer))
        .offset(info.offset)
        // A zero range binds the rest of the buffer
        .range(if info.range == 0 { vk::WHOLE_SIZE } else { info.range })
}

fn image_info_to_vk(info: &DescriptorImageInfo) -> vk::DescriptorImageInfo {
    vk::DescriptorImageInfo::default()
        .sampler(vk::Sampler::from_raw(info.sampler))
        .image_view(vk::ImageView::from_raw(info.image_view))
        .image_layout(image_layout_to_vk(info.image_layout))
}

/// Pool sizes for a bucket: `capacity` x per-set counts, zero counts omitted
pub fn pool_sizes(desc: &BucketDesc) -> Vec<vk::DescriptorPoolSize> {
    let mut sizes = Vec::with_capacity(2);
    if desc.total_uniform_buffers() > 0 {
        sizes.push(vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: desc.total_uniform_buffers(),
        });
    }
    if desc.total_images() > 0 {
        sizes.push(vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: desc.total_images(),
        });
    }
    sizes
}

/// Whether `write` references a resource
///
/// Template slots the application never bound keep null handles and are
/// left out of the native update.
pub(crate) fn is_bound(write: &DescriptorWrite) -> bool {
    match write.descriptor_type {
        DescriptorType::UniformBuffer => write.buffer_info.buffer != 0,
        DescriptorType::CombinedImageSampler => {
            write.image_info.image_view != 0 && write.image_info.sampler != 0
        }
    }
}

/// Layout bindings for `program`: one per uniform block (binding = slot) and
/// one per sampler (binding = location, count = array size)
pub fn layout_bindings(program: &ProgramMeta, stages: vk::ShaderStageFlags) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    let uniform_blocks = program.uniform_blocks.iter().map(|block| {
        vk::DescriptorSetLayoutBinding::default()
            .binding(block.slot)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stages)
    });
    let samplers = program.samplers.iter().map(|sampler| {
        vk::DescriptorSetLayoutBinding::default()
            .binding(sampler.location)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(sampler.array_size)
            .stage_flags(stages)
    });
    uniform_blocks.chain(samplers).collect()
}

// ============================================================================
// Backend
// ============================================================================

pub struct VulkanDescriptorBackend {
    ctx: Arc<GpuContext>,
    live_pools: usize,
}

impl VulkanDescriptorBackend {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx, live_pools: 0 }
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Native pools created and not destroyed yet
    pub fn live_pools(&self) -> usize {
        self.live_pools
    }

    /// Create the `VkDescriptorSetLayout` matching `program`'s bindings
    ///
    /// The returned handle is the key the cache pools sets under. It must be
    /// destroyed with `destroy_layout` once no pipeline uses it anymore.
    pub fn create_layout(&self, program: &ProgramMeta) -> Result<LayoutHandle> {
        program.validate()?;

        let bindings = layout_bindings(program, vk::ShaderStageFlags::ALL_GRAPHICS);
        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&info, None) }
            .map_err(|e| engine_err!(LOG_SOURCE,
                "Failed to create descriptor set layout for program '{}': {:?}", program.name, e))?;

        engine_debug!(LOG_SOURCE, "Created descriptor set layout {:#x} for program '{}' ({} bindings)",
            layout.as_raw(), program.name, bindings.len());
        Ok(LayoutHandle(layout.as_raw()))
    }

    pub fn destroy_layout(&self, layout: LayoutHandle) {
        if layout.is_null() {
            return;
        }
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(vk::DescriptorSetLayout::from_raw(layout.0), None);
        }
    }
}

impl DescriptorBackend for VulkanDescriptorBackend {
    fn create_pool(&mut self, desc: &BucketDesc) -> Result<PoolHandle> {
        let sizes = pool_sizes(desc);
        if sizes.is_empty() || desc.capacity == 0 {
            engine_bail!(LOG_SOURCE, "create_pool: empty bucket requested ({:?})", desc);
        }

        let info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(desc.capacity)
            .pool_sizes(&sizes);

        let pool = unsafe { self.ctx.device.create_descriptor_pool(&info, None) }.map_err(|e| match e {
            vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => Error::OutOfMemory,
            e => engine_err!(LOG_SOURCE, "Failed to create descriptor pool of {} sets: {:?}", desc.capacity, e),
        })?;

        self.live_pools += 1;
        engine_trace!(LOG_SOURCE, "Created descriptor pool {:#x} ({} sets)", pool.as_raw(), desc.capacity);
        Ok(PoolHandle(pool.as_raw()))
    }

    fn reset_pool(&mut self, pool: PoolHandle) -> Result<()> {
        unsafe {
            self.ctx.device.reset_descriptor_pool(
                vk::DescriptorPool::from_raw(pool.0),
                vk::DescriptorPoolResetFlags::empty(),
            )
        }
        .map_err(|e| engine_err!(LOG_SOURCE, "Failed to reset descriptor pool {:#x}: {:?}", pool.0, e))
    }

    fn destroy_pool(&mut self, pool: PoolHandle) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(vk::DescriptorPool::from_raw(pool.0), None);
        }
        self.live_pools = self.live_pools.saturating_sub(1);
    }

    fn allocate_set(&mut self, pool: PoolHandle, layout: LayoutHandle) -> Result<SetHandle> {
        let layouts = [vk::DescriptorSetLayout::from_raw(layout.0)];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk::DescriptorPool::from_raw(pool.0))
            .set_layouts(&layouts);

        match unsafe { self.ctx.device.allocate_descriptor_sets(&info) } {
            Ok(sets) => sets
                .into_iter()
                .next()
                .map(|set| SetHandle(set.as_raw()))
                .ok_or_else(|| engine_err!(LOG_SOURCE, "vkAllocateDescriptorSets returned no set")),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                Err(Error::OutOfMemory)
            }
            Err(e) => Err(engine_err!(LOG_SOURCE,
                "Failed to allocate descriptor set of layout {:#x} from pool {:#x}: {:?}", layout.0, pool.0, e)),
        }
    }

    fn update_set(&mut self, batch: &DescriptorWriteBatch) {
        if batch.set.is_null() {
            engine_warn!(LOG_SOURCE, "update_set: null descriptor set, {} writes dropped", batch.writes.len());
            return;
        }

        let bound: Vec<&DescriptorWrite> = batch.writes.iter().filter(|write| is_bound(write)).collect();
        if bound.len() < batch.writes.len() {
            engine_trace!(LOG_SOURCE, "update_set: {} of {} bindings never bound, skipped",
                batch.writes.len() - bound.len(), batch.writes.len());
        }
        if bound.is_empty() {
            return;
        }

        // Info arrays are filled before any write points into them
        let buffer_infos: Vec<vk::DescriptorBufferInfo> =
            bound.iter().map(|write| buffer_info_to_vk(&write.buffer_info)).collect();
        let image_infos: Vec<vk::DescriptorImageInfo> =
            bound.iter().map(|write| image_info_to_vk(&write.image_info)).collect();

        let dst_set = vk::DescriptorSet::from_raw(batch.set.0);
        let writes: Vec<vk::WriteDescriptorSet> = bound
            .iter()
            .enumerate()
            .map(|(i, write)| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(dst_set)
                    .dst_binding(write.binding)
                    .dst_array_element(write.array_element)
                    .descriptor_type(descriptor_type_to_vk(write.descriptor_type));
                match write.descriptor_type {
                    DescriptorType::UniformBuffer => vk_write.buffer_info(std::slice::from_ref(&buffer_infos[i])),
                    DescriptorType::CombinedImageSampler => vk_write.image_info(std::slice::from_ref(&image_infos[i])),
                }
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }
    }
}

impl Drop for VulkanDescriptorBackend {
    fn drop(&mut self) {
        // The owning DescriptorSetCache destroys every pool before dropping the backend
        if self.live_pools > 0 {
            engine_warn!(LOG_SOURCE, "VulkanDescriptorBackend dropped with {} live descriptor pools", self.live_pools);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_backend_tests.rs"]
mod tests;
