//! Scissor and stencil clip tracking across a render list traversal
//!
//! Items arrive in scene-graph traversal order, so nested clip scopes open
//! and close like brackets. Bounding-box clips map onto a stack of scissor
//! rectangles; stencil clips map onto bit planes of the stencil buffer, one
//! plane per nesting level, with partial clears when the traversal moves to
//! a shallower or sibling clip scope.

use crate::backend::command::{CommandBuffer, RenderCommand};
use crate::backend::types::{CompareOp, Orientation, Rect, RenderMode, StencilOp};
use crate::scene::node::ClippingMode;

use super::instruction::RenderItem;

/// Viewport geometry plus the remap applied to every rectangle handed to
/// the backend
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfaceView {
    pub(crate) orientation: Orientation,
    pub(crate) viewport: Rect,
    /// Off-screen targets with an inverted Y axis flip rectangles
    /// vertically against the target height
    pub(crate) flip_target_height: Option<i32>,
}

impl SurfaceView {
    pub(crate) fn new(orientation: Orientation, viewport: Rect) -> Self {
        Self {
            orientation,
            viewport,
            flip_target_height: None,
        }
    }

    /// Rotate into the surface coordinate system, then flip vertically for
    /// inverted-Y targets
    pub(crate) fn remap(&self, rect: &Rect) -> Rect {
        let mut remapped = rect.rotate(self.orientation, &self.viewport);
        if let Some(target_height) = self.flip_target_height {
            remapped.y = target_height - (remapped.y + remapped.height);
        }
        remapped
    }
}

/// Mutable clip state scoped to one render list traversal
#[derive(Debug)]
pub(crate) struct ClippingState {
    /// Active scissor boxes, bottom entry is the viewport, root clipping
    /// rect or layer clipping box
    pub(crate) scissor_stack: Vec<Rect>,
    /// The bottom stack entry itself carries an active scissor, so
    /// unwinding to the root must keep scissoring enabled
    pub(crate) has_layer_scissor: bool,
    last_clipping_depth: u32,
    last_clipping_id: u32,
    used_stencil_buffer: bool,
}

impl ClippingState {
    pub(crate) fn new() -> Self {
        Self {
            scissor_stack: Vec::new(),
            has_layer_scissor: false,
            last_clipping_depth: 0,
            last_clipping_id: 0,
            used_stencil_buffer: false,
        }
    }

    /// Derive and record the scissor/stencil/color-mask state for one item.
    ///
    /// Runs for every item, including culled ones, because the stack and
    /// last-clip bookkeeping must track the traversal even when no draw is
    /// recorded.
    pub(crate) fn setup_clipping(
        &mut self,
        item: &RenderItem,
        command_buffer: &mut CommandBuffer,
        stencil_available: bool,
        surface: &SurfaceView,
    ) {
        let render_mode = match &item.renderer {
            Some(renderer) => renderer.render_mode,
            None => RenderMode::Auto,
        };
        match render_mode {
            RenderMode::Auto => {
                command_buffer.push(RenderCommand::SetColorMask(true));
                self.setup_scissor_clipping(item, command_buffer, surface);
                if stencil_available {
                    self.setup_stencil_clipping(item, command_buffer);
                }
            }
            RenderMode::None | RenderMode::Color => {
                // Manual color-only modes opt out of managed clipping
                if stencil_available {
                    command_buffer.push(RenderCommand::SetStencilTestEnable(false));
                }
                command_buffer.push(RenderCommand::SetColorMask(
                    render_mode == RenderMode::Color,
                ));
            }
            RenderMode::Stencil | RenderMode::ColorStencil => {
                command_buffer.push(RenderCommand::SetColorMask(
                    render_mode == RenderMode::ColorStencil,
                ));
                if stencil_available {
                    command_buffer.push(RenderCommand::SetStencilTestEnable(true));
                    if !self.used_stencil_buffer {
                        // First manual stencil use in this list owns the
                        // whole buffer
                        command_buffer.push(RenderCommand::SetStencilWriteMask(0xFF));
                        command_buffer.push(RenderCommand::ClearStencilBuffer);
                        self.used_stencil_buffer = true;
                    }
                    if let Some(renderer) = &item.renderer {
                        let parameters = renderer.stencil_parameters;
                        command_buffer.push(RenderCommand::SetStencilFunc {
                            compare_op: parameters.function,
                            reference: parameters.function_reference,
                            compare_mask: parameters.function_mask,
                        });
                        command_buffer
                            .push(RenderCommand::SetStencilWriteMask(parameters.mask));
                        command_buffer.push(RenderCommand::SetStencilOp {
                            fail_op: parameters.fail_operation,
                            depth_fail_op: parameters.depth_fail_operation,
                            pass_op: parameters.pass_operation,
                        });
                    }
                }
            }
        }
    }

    /// Maintain the scissor stack for one item and program the scissor
    /// rectangle when the active box changes.
    fn setup_scissor_clipping(
        &mut self,
        item: &RenderItem,
        command_buffer: &mut CommandBuffer,
        surface: &SurfaceView,
    ) {
        let node = &item.node;
        let clipping_node = node.clipping_mode == ClippingMode::ClipToBoundingBox;

        // Child entries exclude the root box pushed at list setup
        let mut child_stack_depth = self.scissor_stack.len().saturating_sub(1) as u32;
        let mut traversed_up_tree = false;
        if child_stack_depth > 0 {
            // Moved to a shallower part of the tree: close the scopes the
            // traversal has left
            while node.scissor_depth < child_stack_depth {
                self.scissor_stack.pop();
                child_stack_depth -= 1;
                traversed_up_tree = true;
            }
            // A sibling clip at the same depth replaces the previous
            // sibling's box
            if clipping_node && child_stack_depth == node.scissor_depth {
                self.scissor_stack.pop();
            }
        }

        if clipping_node || traversed_up_tree {
            if clipping_node {
                let mut clipping_box = item
                    .calculate_viewport_space_aabb(surface.viewport.width, surface.viewport.height);
                if let Some(parent_box) = self.scissor_stack.last() {
                    clipping_box = clipping_box.intersect(parent_box);
                }
                self.scissor_stack.push(clipping_box);
            }
            let scissor_enabled = self.scissor_stack.len() > 1 || self.has_layer_scissor;
            command_buffer.push(RenderCommand::SetScissorTestEnable(scissor_enabled));
            if scissor_enabled {
                if let Some(scissor_box) = self.scissor_stack.last() {
                    command_buffer.push(RenderCommand::SetScissor(surface.remap(scissor_box)));
                }
            }
        } else if let Some(callback) = item.renderer.as_ref().and_then(|r| r.render_callback) {
            // Client-side rendering gets the box it would have been clipped
            // to, without any GPU scissor state change
            let mut clipping_box = item
                .calculate_viewport_space_aabb(surface.viewport.width, surface.viewport.height);
            if let Some(parent_box) = self.scissor_stack.last() {
                clipping_box = clipping_box.intersect(parent_box);
            }
            callback(&clipping_box);
        }
    }

    /// Program the stencil registers for one item. Clip-writer nodes write
    /// their bit plane; everything else tests against the accumulated mask.
    fn setup_stencil_clipping(&mut self, item: &RenderItem, command_buffer: &mut CommandBuffer) {
        let node = &item.node;
        if node.clipping_id == 0 {
            // No stencil clip in scope
            command_buffer.push(RenderCommand::SetStencilTestEnable(false));
            return;
        }
        command_buffer.push(RenderCommand::SetStencilTestEnable(true));

        debug_assert!(node.clipping_depth > 0);
        // All bits up to and including the current nesting level
        let current_depth_mask = (1u32 << node.clipping_depth) - 1;

        if node.clipping_mode == ClippingMode::ClipChildren {
            if node.clipping_id == 1 {
                // First clip writer of the list clears the whole buffer
                command_buffer.push(RenderCommand::SetStencilWriteMask(0xFF));
                command_buffer.push(RenderCommand::ClearStencilBuffer);
            } else if node.clipping_depth < self.last_clipping_depth
                || (node.clipping_depth == self.last_clipping_depth
                    && node.clipping_id > self.last_clipping_id)
            {
                // Moved up or across the tree: clear the planes above the
                // shared ancestor before writing this node's plane
                command_buffer.push(RenderCommand::SetStencilWriteMask(
                    (current_depth_mask >> 1) ^ 0xFF,
                ));
                command_buffer.push(RenderCommand::ClearStencilBuffer);
            }
            self.last_clipping_depth = node.clipping_depth;
            self.last_clipping_id = node.clipping_id;

            // Write this node's plane where every ancestor plane passed
            command_buffer.push(RenderCommand::SetStencilFunc {
                compare_op: CompareOp::Equal,
                reference: current_depth_mask,
                compare_mask: current_depth_mask >> 1,
            });
            command_buffer.push(RenderCommand::SetStencilWriteMask(current_depth_mask));
            command_buffer.push(RenderCommand::SetStencilOp {
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Replace,
                pass_op: StencilOp::Replace,
            });
        } else {
            // Renderable under clip scopes: test, never write
            command_buffer.push(RenderCommand::SetStencilFunc {
                compare_op: CompareOp::Equal,
                reference: current_depth_mask,
                compare_mask: 0xFF,
            });
            command_buffer.push(RenderCommand::SetStencilOp {
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Keep,
                pass_op: StencilOp::Keep,
            });
        }
    }
}
