/// SPIR-V reflection producing the ProgramMeta consumed by the descriptor cache
///
/// Every stage module of a program is reflected with spirq. Descriptors are
/// merged by binding number across stages, then split into uniform blocks
/// (binding = slot) and combined image samplers (binding = location).
/// Only descriptor set 0 is supported, matching the single set the cache
/// manages per draw.

use galaxy_3d_rhi::galaxy3d::{Result, Error};
use galaxy_3d_rhi::galaxy3d::descriptor::DescriptorType;
use galaxy_3d_rhi::galaxy3d::rhi::{ProgramMeta, UniformBlockMeta, SamplerMeta};
use galaxy_3d_rhi::{engine_trace, engine_error, engine_err, engine_bail};
use rustc_hash::FxHashMap;

const LOG_SOURCE: &str = "galaxy3d::vulkan";

/// One descriptor as declared by a shader module
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReflectedDescriptor {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub kind: DescriptorType,
    /// Block size in bytes (uniform buffers only)
    pub size: u32,
    /// Array element count (0 for runtime-sized arrays)
    pub count: u32,
}

/// Reflect the stage modules of program `name` into a `ProgramMeta`
///
/// # Errors
///
/// `BackendError` when a module is not valid SPIR-V or declares a descriptor
/// kind the cache cannot bind, `InvalidResource` when stages disagree on a
/// binding or use a set other than 0.
pub fn reflect_program_meta(name: &str, modules: &[&[u32]]) -> Result<ProgramMeta> {
    let mut descriptors = Vec::new();
    for code in modules {
        descriptors.extend(reflect_module(code)?);
    }
    build_program_meta(name, descriptors)
}

fn reflect_module(code: &[u32]) -> Result<Vec<ReflectedDescriptor>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!(LOG_SOURCE, "SPIR-V reflection failed: {:?}", e))?;

    let mut descriptors = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, ty, nbind, .. } = var {
                descriptors.push(ReflectedDescriptor {
                    name: name.clone().unwrap_or_default(),
                    set: desc_bind.set(),
                    binding: desc_bind.bind(),
                    kind: descriptor_kind(desc_ty)?,
                    size: ty.nbyte().map(|s| s as u32).unwrap_or(0),
                    count: *nbind,
                });
            }
        }
    }
    Ok(descriptors)
}

/// Map a spirq descriptor type to the kinds the cache binds
fn descriptor_kind(desc_ty: &spirq::ty::DescriptorType) -> Result<DescriptorType> {
    use spirq::ty::DescriptorType as SpirqType;
    match desc_ty {
        SpirqType::UniformBuffer() => Ok(DescriptorType::UniformBuffer),
        SpirqType::CombinedImageSampler() => Ok(DescriptorType::CombinedImageSampler),
        other => {
            engine_bail!(LOG_SOURCE, "Unsupported SPIR-V descriptor type: {:?}", other);
        }
    }
}

pub(crate) fn build_program_meta(name: &str, descriptors: Vec<ReflectedDescriptor>) -> Result<ProgramMeta> {
    let mut by_binding: FxHashMap<u32, ReflectedDescriptor> = FxHashMap::default();

    for descriptor in descriptors {
        if descriptor.set != 0 {
            engine_error!(LOG_SOURCE, "Program '{}': '{}' uses descriptor set {}, only set 0 is supported",
                name, descriptor.name, descriptor.set);
            return Err(Error::InvalidResource(format!(
                "program '{}' uses descriptor set {}", name, descriptor.set)));
        }
        if descriptor.count == 0 {
            engine_error!(LOG_SOURCE, "Program '{}': runtime-sized array '{}' at binding {} is not supported",
                name, descriptor.name, descriptor.binding);
            return Err(Error::InvalidResource(format!(
                "program '{}' declares a runtime-sized array at binding {}", name, descriptor.binding)));
        }

        match by_binding.get_mut(&descriptor.binding) {
            // Same binding seen in another stage
            Some(existing) => {
                if existing.kind != descriptor.kind {
                    engine_error!(LOG_SOURCE, "Program '{}': binding {} is {:?} in one stage and {:?} in another",
                        name, descriptor.binding, existing.kind, descriptor.kind);
                    return Err(Error::InvalidResource(format!(
                        "program '{}' declares binding {} with two descriptor types", name, descriptor.binding)));
                }
                existing.size = existing.size.max(descriptor.size);
                existing.count = existing.count.max(descriptor.count);
                if existing.name.is_empty() {
                    existing.name = descriptor.name;
                }
            }
            None => {
                by_binding.insert(descriptor.binding, descriptor);
            }
        }
    }

    let mut merged: Vec<ReflectedDescriptor> = by_binding.into_values().collect();
    merged.sort_by_key(|descriptor| descriptor.binding);

    let mut program = ProgramMeta::new(name);
    for descriptor in merged {
        match descriptor.kind {
            DescriptorType::UniformBuffer => program.uniform_blocks.push(UniformBlockMeta {
                name: descriptor.name,
                slot: descriptor.binding,
                size: descriptor.size,
            }),
            DescriptorType::CombinedImageSampler => program.samplers.push(SamplerMeta {
                name: descriptor.name,
                location: descriptor.binding,
                array_size: descriptor.count,
            }),
        }
    }
    program.validate()?;

    engine_trace!(LOG_SOURCE, "Reflected program '{}': {} uniform blocks, {} samplers",
        name, program.uniform_blocks.len(), program.samplers.len());
    Ok(program)
}

#[cfg(test)]
#[path = "vulkan_reflection_tests.rs"]
mod tests;
