/// Resource traits and immutable upload payloads
///
/// Resources are shared as `Arc<dyn Trait>`. Every recorded command clones
/// the `Arc`s it needs, so a resource stays alive until the command that
/// references it has executed, even if the application drops its own handle.

use bytes::Bytes;
use glam::UVec2;
use crate::error::{Error, Result};

// ============================================================================
// Buffers
// ============================================================================

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

/// GPU buffer resource
pub trait Buffer: Send + Sync {
    /// Native handle (e.g. `VkBuffer` as raw u64)
    fn native_handle(&self) -> u64;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage the buffer was created for
    fn usage(&self) -> BufferUsage;
}

// ============================================================================
// Textures and samplers
// ============================================================================

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Texture2D,
    Texture2DArray,
    TextureCube,
}

/// Layout an image is in when sampled by a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageLayout {
    #[default]
    Undefined,
    ShaderReadOnly,
    General,
    DepthStencilReadOnly,
}

/// Pixel formats accepted by texture uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8_UNORM,
    R8G8B8A8_UNORM,
    R32G32B32A32_SFLOAT,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::R8_UNORM => 1,
            PixelFormat::R8G8B8A8_UNORM => 4,
            PixelFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Immutable description of a texture
#[derive(Debug, Clone, Copy)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    /// Number of layers (6 for cube maps)
    pub array_layers: u32,
    pub mip_levels: u32,
    pub format: PixelFormat,
}

/// GPU texture resource
pub trait Texture: Send + Sync {
    fn info(&self) -> &TextureInfo;

    /// Native image view handle (e.g. `VkImageView` as raw u64)
    fn native_view(&self) -> u64;

    /// Layout the image is kept in while sampled
    fn image_layout(&self) -> ImageLayout;
}

/// GPU sampler resource
pub trait Sampler: Send + Sync {
    /// Native sampler handle (e.g. `VkSampler` as raw u64)
    fn native_handle(&self) -> u64;
}

/// Cube map faces, in layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureCubemapFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl TextureCubemapFace {
    /// Array layer backing this face
    pub fn layer(&self) -> u32 {
        *self as u32
    }
}

// ============================================================================
// Render targets
// ============================================================================

/// Offscreen framebuffer used by a render pass
pub trait Framebuffer: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Scene target (window surface or offscreen target)
///
/// The target must not be destroyed while a recorded scene still references
/// it; `begin_scene` holds a token from `usage()` until its command has run.
pub trait RenderTarget: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn usage(&self) -> &crate::rhi::UsageTracker;
}

// ============================================================================
// Upload payloads
// ============================================================================

/// Rectangular texture region in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2u {
    pub offset: UVec2,
    pub size: UVec2,
}

impl Rect2u {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            offset: UVec2::new(x, y),
            size: UVec2::new(width, height),
        }
    }

    /// Number of texels covered by the region
    pub fn area(&self) -> u64 {
        self.size.x as u64 * self.size.y as u64
    }
}

/// Immutable, reference-counted pixel payload for texture uploads
#[derive(Debug, Clone)]
pub struct PixelData {
    format: PixelFormat,
    width: u32,
    height: u32,
    data: Bytes,
}

impl PixelData {
    /// Wrap pixel bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if `data` does not hold exactly
    /// `width * height` pixels of `format`.
    pub fn new(format: PixelFormat, width: u32, height: u32, data: Bytes) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel() as usize;
        if data.len() != expected {
            return Err(Error::InvalidResource(format!(
                "pixel data for {}x{} {:?} needs {} bytes, got {}",
                width, height, format, expected, data.len()
            )));
        }
        Ok(Self { format, width, height, data })
    }

    /// Copy typed pixels into a new payload
    pub fn from_pod<T: bytemuck::Pod>(format: PixelFormat, width: u32, height: u32, pixels: &[T]) -> Result<Self> {
        Self::new(format, width, height, Bytes::copy_from_slice(bytemuck::cast_slice(pixels)))
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
