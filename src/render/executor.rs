//! Frame-level render instruction execution
//!
//! Each render list records into its own secondary command buffer; the
//! executor composes them into the controller's primary buffer and submits
//! once per frame. Depth-buffer clearing is driven by first use within an
//! instruction, so an instruction whose lists never test depth leaves the
//! depth buffer untouched.

use glam::Mat4;

use crate::backend::command::{
    BeginFlags, CommandBuffer, CommandError, RenderCommand, SubmitFlags,
};
use crate::backend::controller::Controller;
use crate::backend::types::{DepthTestMode, DepthWriteMode, Orientation, Rect};

use super::clipping::{ClippingState, SurfaceView};
use super::instruction::{RenderInstruction, RenderList};
use super::renderer::{Renderer, RENDER_QUEUE_COUNT};

/// Derive and record depth state for one item.
///
/// The first item in an instruction that enables depth also clears the
/// buffer, with writes forced on for the clear.
fn setup_depth_buffer(
    renderer: &Renderer,
    is_opaque: bool,
    command_buffer: &mut CommandBuffer,
    auto_depth_test: bool,
    first_depth_buffer_use: &mut bool,
) {
    let enable_depth_write = match renderer.depth_write_mode {
        DepthWriteMode::Auto => auto_depth_test && is_opaque,
        DepthWriteMode::On => true,
        DepthWriteMode::Off => false,
    };
    let enable_depth_test = match renderer.depth_test_mode {
        DepthTestMode::Auto => auto_depth_test,
        DepthTestMode::On => true,
        DepthTestMode::Off => false,
    };

    if enable_depth_write || enable_depth_test {
        command_buffer.push(RenderCommand::SetDepthTestEnable(true));
        command_buffer.push(RenderCommand::SetDepthCompareOp(renderer.depth_function));
        if *first_depth_buffer_use {
            *first_depth_buffer_use = false;
            // Writes must be on for the clear to land
            command_buffer.push(RenderCommand::SetDepthWriteEnable(true));
            command_buffer.push(RenderCommand::ClearDepthBuffer);
        }
        command_buffer.push(RenderCommand::SetDepthWriteEnable(enable_depth_write));
    } else {
        command_buffer.push(RenderCommand::SetDepthTestEnable(false));
    }
}

/// Turns render instructions into submitted command buffers
#[derive(Debug, Default)]
pub struct InstructionExecutor {
    orientation: Orientation,
    /// Partial-update optimization: items whose AABB misses this rect are
    /// state-tracked but not drawn
    root_clipping_rect: Option<Rect>,
    /// Backend clip-space correction pre-multiplied into the projection
    backend_clip_matrix: Option<Mat4>,
}

impl InstructionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn set_root_clipping_rect(&mut self, rect: Option<Rect>) {
        self.root_clipping_rect = rect.filter(|r| !r.is_empty());
    }

    pub fn set_backend_clip_matrix(&mut self, matrix: Option<Mat4>) {
        self.backend_clip_matrix = matrix;
    }

    /// Record and submit one frame's worth of instructions.
    pub fn render_frame(
        &self,
        controller: &mut Controller,
        instructions: &mut [RenderInstruction],
        buffer_index: usize,
    ) -> Result<(), CommandError> {
        controller.reset_command_buffer();
        for instruction in instructions.iter_mut() {
            self.process_render_instruction(controller, instruction, buffer_index)?;
        }
        controller.submit_command_buffer(SubmitFlags::FLUSH)
    }

    fn process_render_instruction(
        &self,
        controller: &mut Controller,
        instruction: &mut RenderInstruction,
        buffer_index: usize,
    ) -> Result<(), CommandError> {
        let view = *instruction.camera.view_matrix(buffer_index);
        let mut projection = *instruction.camera.projection_matrix(buffer_index);
        if let Some(clip_matrix) = self.backend_clip_matrix {
            projection = clip_matrix * projection;
        }
        instruction.view_matrix = view;
        instruction.view_projection_matrix = projection * view;

        let stencil_available = controller.stencil_buffer_available();
        let depth_available = controller.depth_buffer_available();
        let surface = SurfaceView {
            orientation: self.orientation,
            viewport: instruction.viewport,
            flip_target_height: instruction.offscreen_target_height,
        };

        // Scoped to the instruction: the first list that enables depth
        // clears the buffer for all that follow
        let mut first_depth_buffer_use = true;
        for render_list in &mut instruction.render_lists {
            if render_list.is_empty() {
                continue;
            }
            self.process_render_list(
                render_list,
                &view,
                &surface,
                stencil_available,
                depth_available,
                &mut first_depth_buffer_use,
            )?;
        }

        let secondaries: Vec<&CommandBuffer> = instruction
            .render_lists
            .iter()
            .filter(|list| !list.is_empty())
            .filter_map(|list| list.command_buffer())
            .collect();
        controller
            .primary_command_buffer_mut()
            .execute_command_buffers(&secondaries)
    }

    fn process_render_list(
        &self,
        render_list: &mut RenderList,
        view: &Mat4,
        surface: &SurfaceView,
        stencil_available: bool,
        depth_available: bool,
        first_depth_buffer_use: &mut bool,
    ) -> Result<(), CommandError> {
        let auto_depth_test =
            depth_available && !render_list.depth_test_disabled && render_list.has_color_items;
        let viewport = surface.viewport;

        let mut secondary = render_list.take_command_buffer();
        secondary.reset();
        secondary.begin(BeginFlags::RENDER_PASS_CONTINUE)?;

        secondary.push(RenderCommand::SetViewport(surface.remap(&viewport)));

        let mut clipping = ClippingState::new();
        if let Some(root_rect) = &self.root_clipping_rect {
            secondary.push(RenderCommand::SetScissorTestEnable(true));
            secondary.push(RenderCommand::SetScissor(surface.remap(root_rect)));
            clipping.scissor_stack.push(*root_rect);
            clipping.has_layer_scissor = true;
        } else if !render_list.is_clipping {
            secondary.push(RenderCommand::SetScissorTestEnable(false));
            clipping.scissor_stack.push(viewport);
        }
        if render_list.is_clipping {
            let layer_box = render_list.clipping_box;
            secondary.push(RenderCommand::SetScissorTestEnable(true));
            secondary.push(RenderCommand::SetScissor(surface.remap(&layer_box)));
            clipping.scissor_stack.push(layer_box);
            clipping.has_layer_scissor = true;
        }

        for item in &mut render_list.items {
            item.model_view_matrix = *view * item.model_matrix;

            // Culled items still go through clipping and depth setup so the
            // clip bookkeeping tracks the full traversal
            let mut skip_render = false;
            if let Some(root_rect) = &self.root_clipping_rect {
                let aabb =
                    item.calculate_viewport_space_aabb(viewport.width, viewport.height);
                skip_render = !aabb.intersects(root_rect);
            }

            clipping.setup_clipping(item, &mut secondary, stencil_available, surface);

            let Some(renderer) = item.renderer.clone() else {
                continue;
            };
            if depth_available {
                setup_depth_buffer(
                    &renderer,
                    item.is_opaque,
                    &mut secondary,
                    auto_depth_test,
                    first_depth_buffer_use,
                );
            }
            if skip_render {
                continue;
            }

            if renderer.draw_commands.is_empty() {
                secondary.push(RenderCommand::Draw {
                    renderer_id: renderer.id,
                    queue: 0,
                });
            } else {
                // Queue order beats item order for multi-pass renderers
                for queue in 0..RENDER_QUEUE_COUNT {
                    for draw_command in &renderer.draw_commands {
                        if draw_command.queue == queue {
                            secondary.push(RenderCommand::Draw {
                                renderer_id: renderer.id,
                                queue,
                            });
                        }
                    }
                }
            }
        }

        secondary.end()?;
        render_list.restore_command_buffer(secondary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Vec3, Vec4};

    use super::*;
    use crate::render::instruction::RenderItem;
    use crate::render::renderer::DrawCommand;
    use crate::scene::camera::Camera;
    use crate::scene::node::{ClippingMode, Node};
    use crate::CoreConfig;

    const VIEWPORT: Rect = Rect::new(0, 0, 480, 800);

    fn updated_camera() -> Arc<Camera> {
        let mut camera = Camera::new();
        camera.set_perspective_projection(480.0, 800.0);
        camera.update(0);
        camera.update(1);
        Arc::new(camera)
    }

    fn renderable_item(id: u32, size: f32) -> RenderItem {
        let mut node = Node::new();
        node.size = Vec3::new(size, size, 0.0);
        let mut item = RenderItem::new(Arc::new(node));
        item.renderer = Some(Arc::new(Renderer::new(id)));
        item
    }

    fn color_list(items: Vec<RenderItem>) -> RenderList {
        let mut list = RenderList::new(items);
        list.has_color_items = true;
        list
    }

    fn flattened_commands(controller: &Controller) -> Vec<RenderCommand> {
        let mut flat = Vec::new();
        for command in controller.primary_command_buffer().commands() {
            match command {
                RenderCommand::ExecuteCommands(secondary) => flat.extend(secondary.clone()),
                other => flat.push(other.clone()),
            }
        }
        flat
    }

    #[test]
    fn test_depth_buffer_cleared_once_per_instruction() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction.render_lists.push(color_list(vec![
            renderable_item(1, 10.0),
            renderable_item(2, 10.0),
        ]));
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(3, 10.0)]));

        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        let clears = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::ClearDepthBuffer))
            .count();
        assert_eq!(clears, 1);
        let draws = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Draw { .. }))
            .count();
        assert_eq!(draws, 3);
    }

    #[test]
    fn test_separate_instructions_each_clear_depth() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let camera = updated_camera();
        let mut instructions = vec![
            RenderInstruction::new(camera.clone(), VIEWPORT),
            RenderInstruction::new(camera, VIEWPORT),
        ];
        for instruction in &mut instructions {
            instruction
                .render_lists
                .push(color_list(vec![renderable_item(1, 10.0)]));
        }

        executor
            .render_frame(&mut controller, &mut instructions, 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        let clears = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::ClearDepthBuffer))
            .count();
        assert_eq!(clears, 2);
    }

    #[test]
    fn test_depth_unavailable_emits_no_depth_commands() {
        let config = CoreConfig {
            depth_buffer_available: false,
            ..CoreConfig::default()
        };
        let mut controller = Controller::new(config);
        let executor = InstructionExecutor::new();

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        assert!(!commands.iter().any(|c| matches!(
            c,
            RenderCommand::SetDepthTestEnable(_)
                | RenderCommand::SetDepthWriteEnable(_)
                | RenderCommand::ClearDepthBuffer
        )));
    }

    #[test]
    fn test_transparent_item_tests_but_does_not_write_depth() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut opaque = renderable_item(1, 10.0);
        opaque.is_opaque = true;
        let mut transparent = renderable_item(2, 10.0);
        transparent.is_opaque = false;

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![opaque, transparent]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        // After the first-use clear, the opaque item writes and the
        // transparent one does not
        let writes: Vec<bool> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::SetDepthWriteEnable(enabled) => Some(*enabled),
                _ => None,
            })
            .collect();
        assert_eq!(writes, vec![true, true, false]);
    }

    #[test]
    fn test_viewport_rotation_applied() {
        let mut controller = Controller::new(CoreConfig::default());
        let mut executor = InstructionExecutor::new();
        executor.set_orientation(Orientation::Degree90);

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        assert_eq!(
            commands[0],
            RenderCommand::SetViewport(Rect::new(0, 0, 800, 480))
        );
    }

    #[test]
    fn test_offscreen_target_flips_viewport_vertically() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut instruction =
            RenderInstruction::new(updated_camera(), Rect::new(0, 50, 480, 600));
        instruction.offscreen_target_height = Some(800);
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        assert_eq!(
            commands[0],
            RenderCommand::SetViewport(Rect::new(0, 150, 480, 600))
        );
    }

    #[test]
    fn test_root_clipping_rect_skips_draw_but_keeps_bookkeeping() {
        let mut controller = Controller::new(CoreConfig::default());
        let mut executor = InstructionExecutor::new();
        executor.set_root_clipping_rect(Some(Rect::new(200, 350, 100, 100)));

        // Visible item at the viewport center, culled item far outside the
        // root rect
        let visible = renderable_item(1, 50.0);
        let mut culled = renderable_item(2, 10.0);
        culled.update_area = Some(Vec4::new(10_000.0, 10_000.0, 10.0, 10.0));

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![visible, culled]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        let draws: Vec<u32> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Draw { renderer_id, .. } => Some(*renderer_id),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![1]);
        // The culled item still went through clipping and depth setup
        let color_masks = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetColorMask(_)))
            .count();
        assert_eq!(color_masks, 2);
    }

    #[test]
    fn test_layer_clipping_box_programs_scissor() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut list = color_list(vec![renderable_item(1, 10.0)]);
        list.set_clipping(Rect::new(10, 20, 100, 50));
        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction.render_lists.push(list);
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let commands = flattened_commands(&controller);
        assert_eq!(commands[1], RenderCommand::SetScissorTestEnable(true));
        assert_eq!(
            commands[2],
            RenderCommand::SetScissor(Rect::new(10, 20, 100, 50))
        );
    }

    #[test]
    fn test_draw_commands_grouped_by_queue() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut renderer = Renderer::new(9);
        renderer.draw_commands = vec![
            DrawCommand { queue: 1 },
            DrawCommand { queue: 0 },
            DrawCommand { queue: 1 },
        ];
        let mut item = renderable_item(9, 10.0);
        item.renderer = Some(Arc::new(renderer));

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction.render_lists.push(color_list(vec![item]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let queues: Vec<u32> = flattened_commands(&controller)
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Draw { queue, .. } => Some(*queue),
                _ => None,
            })
            .collect();
        assert_eq!(queues, vec![0, 1, 1]);
    }

    #[test]
    fn test_backend_clip_matrix_premultiplies_projection() {
        let mut controller = Controller::new(CoreConfig::default());
        let mut executor = InstructionExecutor::new();
        let clip = Mat4::from_scale(Vec3::new(1.0, -1.0, 0.5));
        executor.set_backend_clip_matrix(Some(clip));

        let camera = updated_camera();
        let mut instruction = RenderInstruction::new(camera.clone(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let expected =
            clip * *camera.projection_matrix(0) * *camera.view_matrix(0);
        assert_eq!(instruction.view_projection_matrix, expected);
    }

    #[test]
    fn test_model_view_resolved_from_camera() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut item = renderable_item(1, 10.0);
        item.model_matrix = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));

        let camera = updated_camera();
        let mut instruction = RenderInstruction::new(camera.clone(), VIEWPORT);
        instruction.render_lists.push(color_list(vec![item]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let expected = *camera.view_matrix(0)
            * Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(
            instruction.render_lists[0].items[0].model_view_matrix,
            expected
        );
    }

    #[test]
    fn test_empty_lists_are_skipped() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction.render_lists.push(RenderList::new(Vec::new()));
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();

        let executed = controller
            .primary_command_buffer()
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::ExecuteCommands(_)))
            .count();
        assert_eq!(executed, 1);
    }

    #[test]
    fn test_secondary_buffers_recycled_across_frames() {
        let mut controller = Controller::new(CoreConfig::default());
        let executor = InstructionExecutor::new();

        let mut instruction = RenderInstruction::new(updated_camera(), VIEWPORT);
        instruction
            .render_lists
            .push(color_list(vec![renderable_item(1, 10.0)]));

        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 0)
            .unwrap();
        let first_frame = flattened_commands(&controller);
        executor
            .render_frame(&mut controller, std::slice::from_mut(&mut instruction), 1)
            .unwrap();
        let second_frame = flattened_commands(&controller);
        // Reset and re-record, not appended
        assert_eq!(first_frame, second_frame);
    }
}
