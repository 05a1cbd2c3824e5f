/// ProgramMeta - binding metadata of a shader program
///
/// Produced by shader reflection. The descriptor set cache sizes its pools
/// from it and builds one write entry per uniform block and one per sampler
/// array element.

use crate::error::{Error, Result};

/// Uniform block bound at a descriptor slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockMeta {
    pub name: String,
    pub slot: u32,
    /// Block size in bytes
    pub size: u32,
}

/// Combined image sampler (or array of them) bound at a descriptor location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerMeta {
    pub name: String,
    pub location: u32,
    /// Number of array elements (1 for non-array samplers)
    pub array_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramMeta {
    pub name: String,
    pub uniform_blocks: Vec<UniformBlockMeta>,
    pub samplers: Vec<SamplerMeta>,
}

impl ProgramMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_uniform_block(mut self, name: impl Into<String>, slot: u32, size: u32) -> Self {
        self.uniform_blocks.push(UniformBlockMeta { name: name.into(), slot, size });
        self
    }

    pub fn with_sampler(mut self, name: impl Into<String>, location: u32, array_size: u32) -> Self {
        self.samplers.push(SamplerMeta { name: name.into(), location, array_size });
        self
    }

    /// Uniform buffer descriptors needed by one set
    pub fn uniform_buffer_count(&self) -> u32 {
        self.uniform_blocks.len() as u32
    }

    /// Image/sampler descriptors needed by one set (array elements counted)
    pub fn image_count(&self) -> u32 {
        self.samplers.iter().map(|s| s.array_size).sum()
    }

    /// Number of write entries a set of this program needs
    pub fn binding_count(&self) -> u32 {
        self.uniform_buffer_count() + self.image_count()
    }

    pub fn has_bindings(&self) -> bool {
        self.binding_count() > 0
    }

    pub fn find_uniform_block(&self, slot: u32) -> Option<&UniformBlockMeta> {
        self.uniform_blocks.iter().find(|b| b.slot == slot)
    }

    pub fn find_sampler(&self, location: u32) -> Option<&SamplerMeta> {
        self.samplers.iter().find(|s| s.location == location)
    }

    /// Check that the metadata describes a valid descriptor set
    ///
    /// Uniform blocks and samplers share one binding namespace, so a slot
    /// may only be used once.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` on an empty sampler array or a
    /// binding slot declared twice.
    pub fn validate(&self) -> Result<()> {
        let mut used: Vec<u32> = Vec::with_capacity(self.uniform_blocks.len() + self.samplers.len());

        for block in &self.uniform_blocks {
            if used.contains(&block.slot) {
                return Err(Error::InvalidResource(format!(
                    "program '{}': binding {} declared twice (uniform block '{}')",
                    self.name, block.slot, block.name
                )));
            }
            used.push(block.slot);
        }

        for sampler in &self.samplers {
            if sampler.array_size == 0 {
                return Err(Error::InvalidResource(format!(
                    "program '{}': sampler '{}' has an empty array",
                    self.name, sampler.name
                )));
            }
            if used.contains(&sampler.location) {
                return Err(Error::InvalidResource(format!(
                    "program '{}': binding {} declared twice (sampler '{}')",
                    self.name, sampler.location, sampler.name
                )));
            }
            used.push(sampler.location);
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "program_meta_tests.rs"]
mod tests;
