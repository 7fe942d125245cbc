//! Graphics controller
//!
//! The controller is the explicit dependency-injection root for the render
//! core: device capabilities, the format conversion registry, the frame's
//! primary command buffer and the transfer/discard queues are all reached
//! through a controller reference handed into constructors, never through
//! ambient global state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::resources::discard::DiscardQueue;
use crate::resources::format::FormatConversionRegistry;
use crate::resources::transfer::ResourceTransferRequest;
use crate::{CoreConfig, UpdateMode};

use super::command::{BeginFlags, CommandBuffer, CommandBufferLevel, CommandError, SubmitFlags};
use super::types::{FormatFeatures, FormatTiling, PixelFormat};

/// Environment variable forcing texture uploads through direct-mapped
/// linear-tiled memory instead of staging buffers. Read once at controller
/// construction.
pub const DISABLE_STAGING_BUFFERS_ENV: &str = "SCENE_ENGINE_DISABLE_STAGING_BUFFERS";

/// Device capability queries consumed by format validation and image
/// memory binding
pub trait DeviceCapabilities: Send + Sync {
    /// Feature flags the device reports for a format under a tiling mode
    fn format_features(&self, format: PixelFormat, tiling: FormatTiling) -> FormatFeatures;

    /// Required row alignment in bytes for linear image memory
    fn row_pitch_alignment(&self) -> u32 {
        1
    }
}

/// Capabilities reporting full support for every format
#[derive(Debug, Default)]
pub struct NullCapabilities;

impl DeviceCapabilities for NullCapabilities {
    fn format_features(&self, _format: PixelFormat, _tiling: FormatTiling) -> FormatFeatures {
        FormatFeatures::all()
    }
}

/// Owns frame submission and the resource queues
pub struct Controller {
    capabilities: Arc<dyn DeviceCapabilities>,
    conversion_registry: FormatConversionRegistry,
    primary: CommandBuffer,
    transfer_queue: Mutex<Vec<ResourceTransferRequest>>,
    discard_queue: Arc<DiscardQueue>,
    update_mode: UpdateMode,
    staging_disabled: bool,
    stencil_available: bool,
    depth_available: bool,
    frame_count: u64,
}

impl Controller {
    pub fn new(config: CoreConfig) -> Self {
        Self::with_capabilities(config, Arc::new(NullCapabilities))
    }

    pub fn with_capabilities(config: CoreConfig, capabilities: Arc<dyn DeviceCapabilities>) -> Self {
        let staging_disabled = config.disable_staging_buffers.unwrap_or_else(|| {
            std::env::var(DISABLE_STAGING_BUFFERS_ENV)
                .map(|v| v != "0")
                .unwrap_or(false)
        });
        if staging_disabled {
            log::warn!("Staging buffers disabled, texture uploads use mapped linear memory");
        }
        log::info!(
            "Controller created (update mode {:?}, depth {}, stencil {})",
            config.update_mode,
            config.depth_buffer_available,
            config.stencil_buffer_available
        );
        Self {
            capabilities,
            conversion_registry: FormatConversionRegistry::new(),
            primary: CommandBuffer::new(CommandBufferLevel::Primary),
            transfer_queue: Mutex::new(Vec::new()),
            discard_queue: Arc::new(DiscardQueue::new()),
            update_mode: config.update_mode,
            staging_disabled,
            stencil_available: config.stencil_buffer_available,
            depth_available: config.depth_buffer_available,
            frame_count: 0,
        }
    }

    pub fn capabilities(&self) -> &dyn DeviceCapabilities {
        self.capabilities.as_ref()
    }

    pub fn conversion_registry(&self) -> &FormatConversionRegistry {
        &self.conversion_registry
    }

    pub fn conversion_registry_mut(&mut self) -> &mut FormatConversionRegistry {
        &mut self.conversion_registry
    }

    pub fn discard_queue(&self) -> Arc<DiscardQueue> {
        self.discard_queue.clone()
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn staging_buffers_disabled(&self) -> bool {
        self.staging_disabled
    }

    pub fn stencil_buffer_available(&self) -> bool {
        self.stencil_available
    }

    pub fn depth_buffer_available(&self) -> bool {
        self.depth_available
    }

    /// Schedule a resource transfer. Immediate mode executes it now;
    /// deferred mode queues it for [`Controller::process_transfer_requests`].
    pub fn schedule_transfer(&self, request: ResourceTransferRequest) {
        match self.update_mode {
            UpdateMode::Immediate => request.execute(),
            UpdateMode::Deferred => self.transfer_queue.lock().push(request),
        }
    }

    /// Drain and execute all queued transfer requests, in order
    pub fn process_transfer_requests(&self) {
        let requests: Vec<_> = self.transfer_queue.lock().drain(..).collect();
        for request in requests {
            request.execute();
        }
    }

    pub fn pending_transfer_count(&self) -> usize {
        self.transfer_queue.lock().len()
    }

    /// Begin a fresh primary command buffer for the frame
    pub fn reset_command_buffer(&mut self) {
        self.primary.reset();
        // begin on a freshly reset buffer cannot fail
        let _ = self.primary.begin(BeginFlags::ONE_TIME_SUBMIT);
    }

    /// End and submit the frame's primary command buffer. `FLUSH` is the
    /// frame-to-frame serialization point; it also drives the deferred
    /// discard queue forward.
    pub fn submit_command_buffer(&mut self, flags: SubmitFlags) -> Result<(), CommandError> {
        self.process_transfer_requests();
        self.primary.end()?;
        self.frame_count += 1;
        log::trace!(
            "Submitted frame {} ({} commands, flush: {})",
            self.frame_count,
            self.primary.commands().len(),
            flags.contains(SubmitFlags::FLUSH)
        );
        if flags.contains(SubmitFlags::FLUSH) {
            self.discard_queue.advance_frame();
        }
        Ok(())
    }

    pub fn primary_command_buffer(&self) -> &CommandBuffer {
        &self.primary
    }

    pub fn primary_command_buffer_mut(&mut self) -> &mut CommandBuffer {
        &mut self.primary
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("update_mode", &self.update_mode)
            .field("staging_disabled", &self.staging_disabled)
            .field("frame_count", &self.frame_count)
            .field("pending_transfers", &self.pending_transfer_count())
            .finish()
    }
}
