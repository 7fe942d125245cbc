//! Graphics backend abstraction: common types, command buffer recording,
//! and the controller that owns frame submission and resource queues.

pub mod command;
pub mod controller;
pub mod types;

pub use command::{
    BeginFlags, CommandBuffer, CommandBufferLevel, CommandError, RenderCommand, SubmitFlags,
};
pub use controller::{Controller, DeviceCapabilities, NullCapabilities};
pub use types::*;
