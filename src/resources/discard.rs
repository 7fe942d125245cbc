//! Deferred resource discard
//!
//! Command buffers referencing a texture may still be pending when its last
//! handle drops, so resources are not released immediately. Discarded
//! resources are held in per-frame queues and dropped only after enough
//! frames have passed for the GPU to be done with them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::texture::{Image, ImageView, Sampler};

/// Number of frames a discarded resource is held before release
pub const FRAMES_IN_FLIGHT: usize = 3;

/// A resource pending release
#[derive(Debug)]
pub enum DiscardResource {
    Image(Arc<Mutex<Image>>),
    ImageView(ImageView),
    Sampler(Sampler),
}

/// Frame-indexed queues of resources pending release
#[derive(Debug, Default)]
pub struct DiscardQueue {
    frame_queues: [Mutex<Vec<DiscardResource>>; FRAMES_IN_FLIGHT],
    current_frame: AtomicUsize,
}

impl DiscardQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a resource for release after `FRAMES_IN_FLIGHT` frames.
    /// Fire-and-forget from the caller's perspective.
    pub fn discard(&self, resource: DiscardResource) {
        let frame = self.current_frame.load(Ordering::Relaxed);
        self.frame_queues[frame % FRAMES_IN_FLIGHT].lock().push(resource);
    }

    /// Advance to the next frame, releasing resources from the oldest
    /// frame's queue. Called at the frame boundary after submission.
    pub fn advance_frame(&self) {
        let current = self.current_frame.fetch_add(1, Ordering::SeqCst);
        if current >= FRAMES_IN_FLIGHT {
            let oldest = (current + 1) % FRAMES_IN_FLIGHT;
            let released: Vec<_> = self.frame_queues[oldest].lock().drain(..).collect();
            if !released.is_empty() {
                log::trace!("Released {} deferred resources", released.len());
            }
        }
    }

    /// Release everything regardless of frame timing; shutdown only
    pub fn flush_all(&self) {
        for queue in &self.frame_queues {
            queue.lock().clear();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.frame_queues.iter().map(|q| q.lock().len()).sum()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame.load(Ordering::Relaxed)
    }
}
