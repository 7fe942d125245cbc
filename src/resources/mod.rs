//! GPU resource management: pixel-format capability fallback, texture
//! lifecycle, deferred transfer requests and deferred discard.

pub mod discard;
pub mod format;
pub mod texture;
pub mod transfer;

pub use discard::{DiscardQueue, DiscardResource, FRAMES_IN_FLIGHT};
pub use format::{FormatConversion, FormatConversionRegistry, TextureError};
pub use texture::{Image, ImageView, Sampler, Texture, TextureDescriptor};
pub use transfer::{
    BufferImageCopyRegion, BufferImageLayout, Extent2d, ImageCopyRegion, ImageLayout, ImageOrigin,
    ResourceTransferRequest, StagingBuffer,
};
