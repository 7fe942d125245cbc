//! Flat scene-graph node data
//!
//! Nodes are plain data consumed by the render loop; capabilities are
//! explicit fields rather than virtual dispatch. The clipping fields are
//! assigned by the update-phase scene-graph traversal (a pre-order walk
//! incrementing depth/id under each clipping ancestor) and are invariant
//! for the frame; the render core never writes them.

use glam::{Mat4, Vec3};

use crate::backend::types::Rect;

/// How a node clips its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClippingMode {
    #[default]
    Disabled,
    /// Children are clipped to the node's geometry via the stencil buffer
    ClipChildren,
    /// Children are clipped to the node's screen-space bounding box via
    /// scissoring
    ClipToBoundingBox,
}

/// One scene-graph node as seen by the render pipeline
#[derive(Debug, Clone)]
pub struct Node {
    pub clipping_mode: ClippingMode,
    /// Count of stencil-clipping nodes on the path from the root, including
    /// this node when it is one
    pub clipping_depth: u32,
    /// Pre-order rank among stencil-clipping nodes; 0 means no stencil clip
    /// applies
    pub clipping_id: u32,
    /// Count of bounding-box-clipping nodes on the path from the root,
    /// including this node when it is one; indexes the scissor stack
    pub scissor_depth: u32,
    pub world_matrix: Mat4,
    pub size: Vec3,
}

impl Node {
    pub fn new() -> Self {
        Self {
            clipping_mode: ClippingMode::Disabled,
            clipping_depth: 0,
            clipping_id: 0,
            scissor_depth: 0,
            world_matrix: Mat4::IDENTITY,
            size: Vec3::ZERO,
        }
    }

    /// Node carrying clipping state assigned by the update traversal
    pub fn with_clipping(
        clipping_mode: ClippingMode,
        clipping_depth: u32,
        clipping_id: u32,
        scissor_depth: u32,
    ) -> Self {
        Self {
            clipping_mode,
            clipping_depth,
            clipping_id,
            scissor_depth,
            ..Self::new()
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// Layer state a render list inherits from its source layer
#[derive(Debug, Clone, Default)]
pub struct Layer {
    /// Disables automatic depth testing for every item in the layer
    pub depth_test_disabled: bool,
    /// Optional layer-level scissor box
    pub clipping_box: Option<Rect>,
}
