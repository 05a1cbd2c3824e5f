/// DescriptorBackend trait and the plain data exchanged with it
///
/// The descriptor set cache is platform-agnostic: it decides *when* to
/// create, reset or destroy native pools, allocate sets and write them, and
/// delegates *how* to a backend (Vulkan in `galaxy_3d_rhi_vulkan`, a
/// counting mock in tests).

use crate::error::Result;
use crate::rhi::ImageLayout;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(0);

            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

native_handle!(
    /// Descriptor set layout identity (e.g. `VkDescriptorSetLayout` as raw u64)
    LayoutHandle
);
native_handle!(
    /// Native descriptor pool backing one bucket
    PoolHandle
);
native_handle!(
    /// Native descriptor set
    SetHandle
);

/// Kinds of descriptors a set can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    UniformBuffer,
    CombinedImageSampler,
}

/// Buffer range written into a uniform buffer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorBufferInfo {
    pub buffer: u64,
    pub offset: u64,
    pub range: u64,
}

/// Image view and sampler written into a combined image sampler descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorImageInfo {
    pub sampler: u64,
    pub image_view: u64,
    pub image_layout: ImageLayout,
}

/// One descriptor write (one binding, one array element)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub array_element: u32,
    pub descriptor_type: DescriptorType,
    /// Used when `descriptor_type` is `UniformBuffer`
    pub buffer_info: DescriptorBufferInfo,
    /// Used when `descriptor_type` is `CombinedImageSampler`
    pub image_info: DescriptorImageInfo,
}

impl DescriptorWrite {
    pub fn uniform_buffer(binding: u32) -> Self {
        Self {
            binding,
            array_element: 0,
            descriptor_type: DescriptorType::UniformBuffer,
            buffer_info: DescriptorBufferInfo::default(),
            image_info: DescriptorImageInfo::default(),
        }
    }

    pub fn combined_image_sampler(binding: u32, array_element: u32) -> Self {
        Self {
            binding,
            array_element,
            descriptor_type: DescriptorType::CombinedImageSampler,
            buffer_info: DescriptorBufferInfo::default(),
            image_info: DescriptorImageInfo::default(),
        }
    }
}

/// Every write of one set, applied by a single backend update call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorWriteBatch {
    pub set: SetHandle,
    pub writes: Vec<DescriptorWrite>,
}

/// Sizing of one native pool (bucket)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketDesc {
    /// Number of sets the pool can hold
    pub capacity: u32,
    pub uniform_buffers_per_set: u32,
    pub images_per_set: u32,
}

impl BucketDesc {
    pub fn total_uniform_buffers(&self) -> u32 {
        self.capacity * self.uniform_buffers_per_set
    }

    pub fn total_images(&self) -> u32 {
        self.capacity * self.images_per_set
    }
}

/// Native descriptor operations driven by `DescriptorSetCache`
///
/// Only called from the execution thread.
pub trait DescriptorBackend {
    /// Create a native pool able to hold `desc.capacity` sets
    fn create_pool(&mut self, desc: &BucketDesc) -> Result<PoolHandle>;

    /// Return every set of `pool` to it
    fn reset_pool(&mut self, pool: PoolHandle) -> Result<()>;

    fn destroy_pool(&mut self, pool: PoolHandle);

    /// Allocate one set of `layout` from `pool`
    fn allocate_set(&mut self, pool: PoolHandle, layout: LayoutHandle) -> Result<SetHandle>;

    /// Apply every write of `batch` to `batch.set`
    fn update_set(&mut self, batch: &DescriptorWriteBatch);
}
