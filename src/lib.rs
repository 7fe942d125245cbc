//! Scene Engine - the update/render core of a retained-mode scene-graph
//! rendering engine.
//!
//! The crate covers the render-instruction execution path and the math and
//! resource subsystems that feed it:
//! - Clipping state tracking (nested scissor rectangles + stencil bit-planes)
//! - Depth buffer state derivation with per-instruction first-use clears
//! - Render instruction execution into secondary/primary command buffers
//! - Scene-graph camera projection math and picking rays
//! - SPIR-V shader reflection into descriptor set layouts
//! - Texture resource management with pixel-format capability fallback
//!
//! # Architecture
//! A frame is driven by [`render::InstructionExecutor`]: it receives a
//! pre-sorted sequence of [`render::RenderInstruction`]s, resolves camera
//! matrices, and records per-list secondary command buffers that are composed
//! into one primary buffer submitted through the
//! [`backend::Controller`] once per frame.

pub mod backend;
pub mod render;
pub mod resources;
pub mod scene;
pub mod shader;

pub use backend::Controller;
pub use render::InstructionExecutor;

/// Transfer execution policy for texture uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Execute resource transfer requests as soon as they are scheduled.
    #[default]
    Immediate,
    /// Queue transfer requests and execute them at the end of the update.
    Deferred,
}

/// Configuration for constructing the graphics [`Controller`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Whether the render target carries a stencil buffer.
    pub stencil_buffer_available: bool,
    /// Whether the render target carries a depth buffer.
    pub depth_buffer_available: bool,
    /// When resource transfer requests are executed.
    pub update_mode: UpdateMode,
    /// Force-disable staging buffers for texture uploads, overriding the
    /// `SCENE_ENGINE_DISABLE_STAGING_BUFFERS` environment variable.
    pub disable_staging_buffers: Option<bool>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            stencil_buffer_available: true,
            depth_buffer_available: true,
            update_mode: UpdateMode::Immediate,
            disable_staging_buffers: None,
        }
    }
}
