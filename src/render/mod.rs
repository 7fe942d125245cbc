//! Render instruction execution: clipping state tracking, depth/stencil
//! derivation and command buffer generation.

pub(crate) mod clipping;
pub mod executor;
pub mod instruction;
pub mod renderer;

pub use executor::InstructionExecutor;
pub use instruction::{RenderInstruction, RenderItem, RenderList};
pub use renderer::{DrawCommand, Renderer, StencilParameters, RENDER_QUEUE_COUNT};
