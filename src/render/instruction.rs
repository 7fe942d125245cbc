//! Frame-scoped render description
//!
//! A [`RenderInstruction`] is produced once per frame per camera/layer
//! combination by the update phase and consumed by the executor in the same
//! frame. Lists and items arrive pre-sorted; the executor never reorders
//! them.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::backend::command::{CommandBuffer, CommandBufferLevel};
use crate::backend::types::Rect;
use crate::scene::camera::Camera;
use crate::scene::node::{Layer, Node};

use super::renderer::Renderer;

/// One drawable unit, immutable for the frame once produced
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Scene-graph-owned node; outlives the item
    pub node: Arc<Node>,
    pub renderer: Option<Arc<Renderer>>,
    pub model_matrix: Mat4,
    pub model_view_matrix: Mat4,
    pub size: Vec3,
    /// Partial-update area: xy offset from the node center, zw extent.
    /// `None` means the full item size.
    pub update_area: Option<Vec4>,
    pub is_opaque: bool,
}

impl RenderItem {
    pub fn new(node: Arc<Node>) -> Self {
        let size = node.size;
        Self {
            node,
            renderer: None,
            model_matrix: Mat4::IDENTITY,
            model_view_matrix: Mat4::IDENTITY,
            size,
            update_area: None,
            is_opaque: true,
        }
    }

    /// Screen-space axis-aligned bounding box of the item, in viewport
    /// coordinates with the origin at the top-left corner.
    ///
    /// Uses a 2D-only transform of the quad corners by the model-view
    /// matrix; the fourth corner follows from the other three.
    pub fn calculate_viewport_space_aabb(
        &self,
        viewport_width: i32,
        viewport_height: i32,
    ) -> Rect {
        let (offset, area) = match self.update_area {
            Some(update_area) => (
                Vec2::new(update_area.x, update_area.y),
                Vec2::new(update_area.z, update_area.w),
            ),
            None => (Vec2::ZERO, Vec2::new(self.size.x, self.size.y)),
        };
        let half = area * 0.5;
        let corner_a = transform_2d(&self.model_view_matrix, offset.x - half.x, offset.y - half.y);
        let corner_b = transform_2d(&self.model_view_matrix, offset.x + half.x, offset.y - half.y);
        let corner_c = transform_2d(&self.model_view_matrix, offset.x + half.x, offset.y + half.y);
        let corner_d = corner_a + (corner_c - corner_b);

        let min = corner_a.min(corner_b).min(corner_c).min(corner_d);
        let max = corner_a.max(corner_b).max(corner_c).max(corner_d);
        Rect {
            x: (min.x + viewport_width as f32 * 0.5).round() as i32,
            y: (min.y + viewport_height as f32 * 0.5).round() as i32,
            width: (max.x - min.x).round() as i32,
            height: (max.y - min.y).round() as i32,
        }
    }
}

/// Fast 2D-quad transform: only the rotation/scale/translation terms that
/// affect x and y
fn transform_2d(matrix: &Mat4, x: f32, y: f32) -> Vec2 {
    Vec2::new(
        matrix.x_axis.x * x + matrix.y_axis.x * y + matrix.w_axis.x,
        matrix.x_axis.y * x + matrix.y_axis.y * y + matrix.w_axis.y,
    )
}

/// Ordered items sharing a source layer
#[derive(Debug, Default)]
pub struct RenderList {
    pub items: Vec<RenderItem>,
    /// Layer-level scissor box applies to the whole list
    pub is_clipping: bool,
    pub clipping_box: Rect,
    pub has_color_items: bool,
    /// Automatic depth testing is disabled for the source layer
    pub depth_test_disabled: bool,
    /// Lazily created secondary command buffer, recycled frame to frame
    command_buffer: Option<CommandBuffer>,
}

impl RenderList {
    pub fn new(items: Vec<RenderItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// List inheriting its depth-test and scissor state from the source
    /// layer
    pub fn for_layer(layer: &Layer, items: Vec<RenderItem>) -> Self {
        let mut list = Self::new(items);
        list.depth_test_disabled = layer.depth_test_disabled;
        if let Some(clipping_box) = layer.clipping_box {
            list.set_clipping(clipping_box);
        }
        list
    }

    pub fn set_clipping(&mut self, clipping_box: Rect) {
        self.is_clipping = true;
        self.clipping_box = clipping_box;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the list's secondary buffer for recording, creating it on first
    /// use. Pair with [`RenderList::restore_command_buffer`].
    pub(crate) fn take_command_buffer(&mut self) -> CommandBuffer {
        self.command_buffer
            .take()
            .unwrap_or_else(|| CommandBuffer::new(CommandBufferLevel::Secondary))
    }

    pub(crate) fn restore_command_buffer(&mut self, command_buffer: CommandBuffer) {
        self.command_buffer = Some(command_buffer);
    }

    pub fn command_buffer(&self) -> Option<&CommandBuffer> {
        self.command_buffer.as_ref()
    }
}

/// Ordered render lists targeting one camera and viewport
#[derive(Debug)]
pub struct RenderInstruction {
    pub camera: Arc<Camera>,
    pub viewport: Rect,
    /// Height of an off-screen render target whose Y axis is inverted;
    /// viewport and scissor rectangles are flipped vertically against it
    pub offscreen_target_height: Option<i32>,
    pub render_lists: Vec<RenderList>,
    /// Camera view matrix resolved by the executor each frame, read by the
    /// backend when binding per-draw uniforms
    pub view_matrix: Mat4,
    /// Projection times view, with any backend clip-space correction
    /// already applied
    pub view_projection_matrix: Mat4,
}

impl RenderInstruction {
    pub fn new(camera: Arc<Camera>, viewport: Rect) -> Self {
        Self {
            camera,
            viewport,
            offscreen_target_height: None,
            render_lists: Vec::new(),
            view_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        }
    }
}
