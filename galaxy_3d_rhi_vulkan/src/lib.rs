/*!
# Galaxy 3D RHI - Vulkan Backend

Vulkan implementation of the Galaxy 3D RHI descriptor layer, using the Ash
library for Vulkan bindings and spirq for SPIR-V reflection.

This crate provides:
- `VulkanDescriptorBackend`: native descriptor pools and sets behind the
  platform-agnostic `DescriptorSetCache`
- descriptor set layouts built from `ProgramMeta`
- `reflect_program_meta`: `ProgramMeta` extracted from SPIR-V stage modules
- `GpuContext`: instance and device shared by backend objects (headless
  creation for tools and tests)

# Example

```no_run
use galaxy_3d_rhi::galaxy3d::Config;
use galaxy_3d_rhi::galaxy3d::descriptor::DescriptorSetCache;
use galaxy_3d_rhi_vulkan::galaxy3d::{GpuContext, VulkanDescriptorBackend, reflect_program_meta};
use std::sync::Arc;

# fn main() -> galaxy_3d_rhi::galaxy3d::Result<()> {
# let (vertex_spirv, fragment_spirv): (Vec<u32>, Vec<u32>) = (Vec::new(), Vec::new());
let ctx = Arc::new(GpuContext::new_headless("galaxy3d")?);
let backend = VulkanDescriptorBackend::new(ctx);

let program = Arc::new(reflect_program_meta("Lit", &[&vertex_spirv, &fragment_spirv])?);
let layout = backend.create_layout(&program)?;

let mut cache = DescriptorSetCache::new(backend, &Config::default())?;
cache.bind_layout(layout, &program);
# Ok(())
# }
```
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_debug;
mod vulkan_descriptor_backend;
mod vulkan_reflection;

// Main galaxy3d namespace module
pub mod galaxy3d {
    pub use crate::vulkan_context::GpuContext;
    pub use crate::vulkan_descriptor_backend::{VulkanDescriptorBackend, pool_sizes, layout_bindings};
    pub use crate::vulkan_reflection::reflect_program_meta;
}
