//! Resource transfer requests
//!
//! Transfer requests describe pixel-data movement into or between images:
//!
//! - Staging buffer to image uploads
//! - Image to image copies
//! - Layout-transition-only requests (direct-mapped uploads)
//!
//! Requests are queued to the controller's transfer queue and drained later
//! in the same thread's frame loop; "deferred" is a logical queue, not an
//! asynchronous task.

use std::sync::Arc;

use parking_lot::Mutex;

use super::texture::Image;

/// Memory layout an image is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageLayout {
    #[default]
    Undefined,
    TransferDstOptimal,
    ShaderReadOnlyOptimal,
}

/// Two-dimensional extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Origin point within an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOrigin {
    pub x: u32,
    pub y: u32,
}

impl ImageOrigin {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Layout of pixel data within a staging buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferImageLayout {
    /// Offset in bytes from the start of the buffer
    pub offset: u64,
    /// Bytes per row of pixel data. `None` means tightly packed from the
    /// region width and the image format.
    pub bytes_per_row: Option<u32>,
}

impl BufferImageLayout {
    /// Layout starting at offset 0 with tightly packed rows
    pub fn packed() -> Self {
        Self::default()
    }
}

/// A host-visible staging buffer holding pixel data for upload
#[derive(Debug)]
pub struct StagingBuffer {
    data: Vec<u8>,
}

impl StagingBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Buffer to image copy region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopyRegion {
    pub buffer_layout: BufferImageLayout,
    pub image_origin: ImageOrigin,
    pub extent: Extent2d,
}

impl BufferImageCopyRegion {
    /// A region covering the whole image from a packed buffer
    pub fn whole(extent: Extent2d) -> Self {
        Self {
            buffer_layout: BufferImageLayout::packed(),
            image_origin: ImageOrigin::zero(),
            extent,
        }
    }
}

/// Image to image copy region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCopyRegion {
    pub src_origin: ImageOrigin,
    pub dst_origin: ImageOrigin,
    pub extent: Extent2d,
}

impl ImageCopyRegion {
    pub fn whole(extent: Extent2d) -> Self {
        Self {
            src_origin: ImageOrigin::zero(),
            dst_origin: ImageOrigin::zero(),
            extent,
        }
    }
}

/// A deferred or immediate instruction to move pixel data into an image
#[derive(Debug)]
pub enum ResourceTransferRequest {
    /// Upload from a staging buffer into an image subresource
    CopyBufferToImage {
        buffer: Arc<StagingBuffer>,
        image: Arc<Mutex<Image>>,
        region: BufferImageCopyRegion,
    },
    /// Copy between two images
    CopyImageToImage {
        src_image: Arc<Mutex<Image>>,
        dst_image: Arc<Mutex<Image>>,
        region: ImageCopyRegion,
    },
    /// Transition an image's layout without moving data; used after
    /// direct-mapped uploads to reach shader-read-optimal layout
    LayoutTransition {
        image: Arc<Mutex<Image>>,
        new_layout: ImageLayout,
    },
}

impl ResourceTransferRequest {
    /// Execute the request against host-modeled image memory
    pub fn execute(self) {
        match self {
            ResourceTransferRequest::CopyBufferToImage {
                buffer,
                image,
                region,
            } => {
                let mut image = image.lock();
                image.copy_from_buffer(buffer.data(), &region);
                image.set_layout(ImageLayout::ShaderReadOnlyOptimal);
            }
            ResourceTransferRequest::CopyImageToImage {
                src_image,
                dst_image,
                region,
            } => {
                // Source and destination are distinct images; a self-copy is
                // not part of the contract.
                let src = src_image.lock();
                let mut dst = dst_image.lock();
                dst.copy_from_image(&src, &region);
                dst.set_layout(ImageLayout::ShaderReadOnlyOptimal);
            }
            ResourceTransferRequest::LayoutTransition { image, new_layout } => {
                image.lock().set_layout(new_layout);
            }
        }
    }
}
