//! Shader binary reflection
//!
//! Parses a SPIR-V word stream into descriptor bindings, uniform block
//! layouts and vertex input attributes, sufficient to build backend
//! descriptor set layouts without the caller touching the binary format.

pub mod opcode;
pub mod reflection;

pub use reflection::{
    DescriptorBinding, DescriptorSetLayout, DescriptorType, FragmentOutput, ShaderReflection,
    UniformBlock, UniformBlockMember, VertexInputAttribute,
};
