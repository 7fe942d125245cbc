//! Per-item render state
//!
//! A renderer carries the depth/stencil policy and draw-command queues for
//! one drawable. Geometry, program and uniform binding are backend concerns
//! reached through the renderer id recorded with each draw.

use crate::backend::types::{
    CompareOp, DepthTestMode, DepthWriteMode, RenderMode, Rect, StencilOp,
};

/// Number of draw-command queue slots a renderer may target
pub const RENDER_QUEUE_COUNT: u32 = 2;

/// Manual stencil state used by the STENCIL / COLOR_STENCIL render modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilParameters {
    pub function: CompareOp,
    pub function_reference: u32,
    pub function_mask: u32,
    pub fail_operation: StencilOp,
    pub depth_fail_operation: StencilOp,
    pub pass_operation: StencilOp,
    /// Stencil write mask
    pub mask: u32,
}

impl Default for StencilParameters {
    fn default() -> Self {
        Self {
            function: CompareOp::Always,
            function_reference: 0,
            function_mask: 0xFF,
            fail_operation: StencilOp::Keep,
            depth_fail_operation: StencilOp::Keep,
            pass_operation: StencilOp::Keep,
            mask: 0xFF,
        }
    }
}

/// One attached draw command, bound to a queue slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub queue: u32,
}

/// Drawable state attached to a render item
#[derive(Debug, Clone)]
pub struct Renderer {
    pub id: u32,
    pub depth_write_mode: DepthWriteMode,
    pub depth_test_mode: DepthTestMode,
    pub depth_function: CompareOp,
    pub render_mode: RenderMode,
    pub stencil_parameters: StencilParameters,
    /// Multi-pass renderers attach one command per pass; empty means a
    /// single draw in queue zero
    pub draw_commands: Vec<DrawCommand>,
    /// Client-side clipping hook: receives the would-be clipping box when
    /// no GPU scissor applies to the item
    pub render_callback: Option<fn(&Rect)>,
}

impl Renderer {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            depth_write_mode: DepthWriteMode::default(),
            depth_test_mode: DepthTestMode::default(),
            depth_function: CompareOp::Less,
            render_mode: RenderMode::default(),
            stencil_parameters: StencilParameters::default(),
            draw_commands: Vec::new(),
            render_callback: None,
        }
    }
}
