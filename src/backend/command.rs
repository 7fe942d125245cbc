//! Command buffer recording
//!
//! The render core records GPU state changes and draw requests into
//! [`CommandBuffer`]s: one secondary buffer per render list, composed into a
//! single primary buffer submitted once per frame. Buffers record into plain
//! command vectors so a backend (or a test) can consume the stream after
//! submission.

use bitflags::bitflags;
use thiserror::Error;

use super::types::{CompareOp, Rect, StencilOp};

/// Errors from command buffer lifecycle misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command buffer is already recording")]
    AlreadyRecording,
    #[error("Command buffer is not recording")]
    NotRecording,
    #[error("Operation requires a primary command buffer")]
    NotPrimary,
    #[error("Executed buffer must be an ended secondary command buffer")]
    NotExecutableSecondary,
}

bitflags! {
    /// Flags for beginning command buffer recording
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BeginFlags: u32 {
        /// The buffer is recorded once and reset after submission
        const ONE_TIME_SUBMIT = 1 << 0;
        /// The secondary buffer continues a render pass begun by its primary
        const RENDER_PASS_CONTINUE = 1 << 1;
    }
}

bitflags! {
    /// Flags for submitting the primary command buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SubmitFlags: u32 {
        /// Wait for completion before returning; the per-frame
        /// serialization point
        const FLUSH = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferLevel {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingState {
    Initial,
    Recording,
    Executable,
}

/// One recorded GPU command
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SetViewport(Rect),
    SetScissorTestEnable(bool),
    SetScissor(Rect),
    SetStencilTestEnable(bool),
    SetStencilFunc {
        compare_op: CompareOp,
        reference: u32,
        compare_mask: u32,
    },
    SetStencilOp {
        fail_op: StencilOp,
        depth_fail_op: StencilOp,
        pass_op: StencilOp,
    },
    SetStencilWriteMask(u32),
    ClearStencilBuffer,
    SetDepthTestEnable(bool),
    SetDepthCompareOp(CompareOp),
    SetDepthWriteEnable(bool),
    ClearDepthBuffer,
    SetColorMask(bool),
    /// Draw request from a renderer's draw-command queue slot
    Draw {
        renderer_id: u32,
        queue: u32,
    },
    /// Inlined command stream of an executed secondary buffer
    ExecuteCommands(Vec<RenderCommand>),
}

/// A recording command buffer
///
/// Secondary buffers are recycled frame to frame via [`CommandBuffer::reset`]
/// rather than reallocated.
#[derive(Debug)]
pub struct CommandBuffer {
    level: CommandBufferLevel,
    state: RecordingState,
    begin_flags: BeginFlags,
    commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    pub fn new(level: CommandBufferLevel) -> Self {
        Self {
            level,
            state: RecordingState::Initial,
            begin_flags: BeginFlags::empty(),
            commands: Vec::new(),
        }
    }

    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    pub fn begin(&mut self, flags: BeginFlags) -> Result<(), CommandError> {
        if self.state == RecordingState::Recording {
            return Err(CommandError::AlreadyRecording);
        }
        self.state = RecordingState::Recording;
        self.begin_flags = flags;
        self.commands.clear();
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), CommandError> {
        if self.state != RecordingState::Recording {
            return Err(CommandError::NotRecording);
        }
        self.state = RecordingState::Executable;
        Ok(())
    }

    /// Return the buffer to its initial state, keeping its allocation
    pub fn reset(&mut self) {
        self.state = RecordingState::Initial;
        self.begin_flags = BeginFlags::empty();
        self.commands.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn is_executable(&self) -> bool {
        self.state == RecordingState::Executable
    }

    pub fn begin_flags(&self) -> BeginFlags {
        self.begin_flags
    }

    /// Record one command. Recording outside a begin/end scope is a
    /// programming error in the executor.
    pub fn push(&mut self, command: RenderCommand) {
        debug_assert!(self.state == RecordingState::Recording);
        self.commands.push(command);
    }

    /// Inline the command streams of ended secondary buffers, in order
    pub fn execute_command_buffers(
        &mut self,
        buffers: &[&CommandBuffer],
    ) -> Result<(), CommandError> {
        if self.level != CommandBufferLevel::Primary {
            return Err(CommandError::NotPrimary);
        }
        if self.state != RecordingState::Recording {
            return Err(CommandError::NotRecording);
        }
        for buffer in buffers {
            if buffer.level != CommandBufferLevel::Secondary || !buffer.is_executable() {
                return Err(CommandError::NotExecutableSecondary);
            }
            self.commands
                .push(RenderCommand::ExecuteCommands(buffer.commands.clone()));
        }
        Ok(())
    }

    /// Recorded command stream
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }
}
