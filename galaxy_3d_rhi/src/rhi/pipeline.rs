/// Pipeline state, render pass description and draw parameter types

use std::sync::Arc;
use crate::descriptor::LayoutHandle;
use crate::rhi::ProgramMeta;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    /// Triangle list
    #[default]
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
    /// Point list
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Compiled pipeline state bound before draws
///
/// `layout` identifies the descriptor set layout the descriptor cache keys
/// its pools on; `program` carries the binding metadata used to size them.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Native pipeline handle (e.g. `VkPipeline` as raw u64)
    pub native_pipeline: u64,
    pub layout: LayoutHandle,
    pub program: Arc<ProgramMeta>,
    pub topology: PrimitiveTopology,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-size viewport with the standard [0, 1] depth range
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Render pass parameters captured by value when recorded
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub viewport: Viewport,
    pub clear_values: Vec<ClearValue>,
}

impl RenderPass {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            clear_values: Vec::new(),
        }
    }

    pub fn with_clear(mut self, value: ClearValue) -> Self {
        self.clear_values.push(value);
        self
    }
}
