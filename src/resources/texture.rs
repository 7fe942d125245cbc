//! Texture resource management
//!
//! A [`Texture`] owns a GPU image, an image view and a sampler. Creation is
//! two-phase: [`Texture::initialise`] reserves only the abstract image
//! object; memory, the default view and the default sampler are bound on the
//! first upload. Uploads go through a staging buffer and the controller's
//! transfer queue, or straight into mapped linear-tiled memory when staging
//! buffers are disabled.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::controller::Controller;
use crate::backend::types::{FormatTiling, PixelFormat};

use super::discard::{DiscardQueue, DiscardResource};
use super::format::{validate_format, TextureError};
use super::transfer::{
    BufferImageCopyRegion, Extent2d, ImageCopyRegion, ImageLayout, ResourceTransferRequest,
    StagingBuffer,
};

/// Sampler filter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Sampler addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Sampler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampler {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
}

/// GPU image: dimensions, device format, layout, and host-modeled memory
/// bound lazily on first upload
#[derive(Debug)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    row_pitch: u32,
    layout: ImageLayout,
    memory: Option<Vec<u8>>,
}

impl Image {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            row_pitch: 0,
            layout: ImageLayout::Undefined,
            memory: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: ImageLayout) {
        self.layout = layout;
    }

    /// Device-reported bytes per row; may exceed the tightly packed width
    pub fn row_pitch(&self) -> u32 {
        self.row_pitch
    }

    pub fn is_memory_bound(&self) -> bool {
        self.memory.is_some()
    }

    /// Allocate backing memory with the given row pitch
    pub fn bind_memory(&mut self, row_pitch: u32) {
        debug_assert!(row_pitch >= self.width * self.format.bytes_per_pixel());
        self.row_pitch = row_pitch;
        self.memory = Some(vec![0u8; (row_pitch * self.height) as usize]);
    }

    /// Mapped view of the image memory, row-pitch laid out
    pub fn mapped_memory(&self) -> Option<&[u8]> {
        self.memory.as_deref()
    }

    pub fn mapped_memory_mut(&mut self) -> Option<&mut [u8]> {
        self.memory.as_deref_mut()
    }

    /// Copy pixel rows from a staging buffer into this image's memory,
    /// respecting the buffer's row layout and the image's row pitch
    pub(crate) fn copy_from_buffer(&mut self, data: &[u8], region: &BufferImageCopyRegion) {
        let bpp = self.format.bytes_per_pixel() as usize;
        let tight = region.extent.width as usize * bpp;
        let src_stride = region
            .buffer_layout
            .bytes_per_row
            .map(|b| b as usize)
            .unwrap_or(tight);
        let src_offset = region.buffer_layout.offset as usize;
        let row_pitch = self.row_pitch as usize;
        let Some(memory) = self.memory.as_deref_mut() else {
            log::error!("Buffer copy into image with unbound memory");
            return;
        };
        for row in 0..region.extent.height as usize {
            let src_start = src_offset + row * src_stride;
            let dst_start =
                (region.image_origin.y as usize + row) * row_pitch
                    + region.image_origin.x as usize * bpp;
            memory[dst_start..dst_start + tight].copy_from_slice(&data[src_start..src_start + tight]);
        }
    }

    /// Copy pixel rows from another image's memory
    pub(crate) fn copy_from_image(&mut self, src: &Image, region: &ImageCopyRegion) {
        debug_assert_eq!(self.format.bytes_per_pixel(), src.format.bytes_per_pixel());
        let bpp = self.format.bytes_per_pixel() as usize;
        let tight = region.extent.width as usize * bpp;
        let src_pitch = src.row_pitch as usize;
        let dst_pitch = self.row_pitch as usize;
        let Some(src_memory) = src.memory.as_deref() else {
            log::error!("Image copy from image with unbound memory");
            return;
        };
        let Some(dst_memory) = self.memory.as_deref_mut() else {
            log::error!("Image copy into image with unbound memory");
            return;
        };
        for row in 0..region.extent.height as usize {
            let src_start = (region.src_origin.y as usize + row) * src_pitch
                + region.src_origin.x as usize * bpp;
            let dst_start = (region.dst_origin.y as usize + row) * dst_pitch
                + region.dst_origin.x as usize * bpp;
            dst_memory[dst_start..dst_start + tight]
                .copy_from_slice(&src_memory[src_start..src_start + tight]);
        }
    }
}

/// View over a texture's image
#[derive(Debug, Clone)]
pub struct ImageView {
    image: Arc<Mutex<Image>>,
}

impl ImageView {
    pub fn image(&self) -> &Arc<Mutex<Image>> {
        &self.image
    }
}

/// Parameters for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// A texture: image + view + sampler, with format fallback applied at
/// creation and conversion applied per upload
#[derive(Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    format: PixelFormat,
    convert_from_format: Option<PixelFormat>,
    image: Arc<Mutex<Image>>,
    view: Option<ImageView>,
    sampler: Option<Sampler>,
    discard_queue: Arc<DiscardQueue>,
}

impl Texture {
    /// Create the texture's image object. No memory is allocated until the
    /// first upload; fails when the requested format is unsupported and has
    /// no registered conversion.
    pub fn initialise(
        controller: &Controller,
        descriptor: &TextureDescriptor,
    ) -> Result<Self, TextureError> {
        let tiling = if controller.staging_buffers_disabled() {
            FormatTiling::Linear
        } else {
            FormatTiling::Optimal
        };
        let validated = validate_format(
            descriptor.format,
            tiling,
            controller.capabilities(),
            controller.conversion_registry(),
        )?;
        let image = Arc::new(Mutex::new(Image::new(
            descriptor.width,
            descriptor.height,
            validated.format,
        )));
        Ok(Self {
            width: descriptor.width,
            height: descriptor.height,
            format: validated.format,
            convert_from_format: validated.convert_from,
            image,
            view: None,
            sampler: None,
            discard_queue: controller.discard_queue(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Device format after any capability fallback
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The originally requested format when uploads require conversion
    pub fn convert_from_format(&self) -> Option<PixelFormat> {
        self.convert_from_format
    }

    pub fn image(&self) -> &Arc<Mutex<Image>> {
        &self.image
    }

    pub fn view(&self) -> Option<&ImageView> {
        self.view.as_ref()
    }

    pub fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }

    pub fn is_memory_initialised(&self) -> bool {
        self.image.lock().is_memory_bound()
    }

    /// Bind image memory and create the default view and sampler. Called
    /// from the first upload; textures that are never populated never pay
    /// for an allocation.
    fn initialise_memory(&mut self, controller: &Controller) {
        let mut image = self.image.lock();
        if image.is_memory_bound() {
            return;
        }
        let tight = self.width * self.format.bytes_per_pixel();
        let alignment = controller.capabilities().row_pitch_alignment().max(1);
        let row_pitch = tight.div_ceil(alignment) * alignment;
        image.bind_memory(row_pitch);
        drop(image);
        self.view = Some(ImageView {
            image: self.image.clone(),
        });
        self.sampler = Some(Sampler::default());
    }

    /// Upload tightly packed pixel data from host memory into a region of
    /// the texture
    pub fn copy_memory(
        &mut self,
        controller: &Controller,
        data: &[u8],
        origin: super::transfer::ImageOrigin,
        extent: Extent2d,
    ) -> Result<(), TextureError> {
        self.check_region(origin, extent)?;
        let src_format = self.convert_from_format.unwrap_or(self.format);
        let expected = (extent.width * extent.height * src_format.bytes_per_pixel()) as usize;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.initialise_memory(controller);

        if controller.staging_buffers_disabled() {
            // Direct-mapped path: write rows straight into linear-tiled
            // image memory, then request only a layout transition.
            let conversion = self
                .convert_from_format
                .and_then(|f| controller.conversion_registry().find(f).copied());
            let dst_bpp = self.format.bytes_per_pixel() as usize;
            let src_bpp = src_format.bytes_per_pixel() as usize;
            let src_row = extent.width as usize * src_bpp;
            let dst_row = extent.width as usize * dst_bpp;
            {
                let mut image = self.image.lock();
                let row_pitch = image.row_pitch() as usize;
                let memory = image
                    .mapped_memory_mut()
                    .ok_or(TextureError::NotInitialised)?;
                for row in 0..extent.height as usize {
                    let src = &data[row * src_row..row * src_row + src_row];
                    let dst_start =
                        (origin.y as usize + row) * row_pitch + origin.x as usize * dst_bpp;
                    let dst = &mut memory[dst_start..dst_start + dst_row];
                    match &conversion {
                        Some(c) => (c.convert_in_place)(src, dst),
                        None => dst.copy_from_slice(src),
                    }
                }
            }
            controller.schedule_transfer(ResourceTransferRequest::LayoutTransition {
                image: self.image.clone(),
                new_layout: ImageLayout::ShaderReadOnlyOptimal,
            });
        } else {
            let pixels = match self
                .convert_from_format
                .and_then(|f| controller.conversion_registry().find(f))
            {
                Some(conversion) => (conversion.convert_buffer)(data),
                None => data.to_vec(),
            };
            let buffer = Arc::new(StagingBuffer::new(pixels));
            controller.schedule_transfer(ResourceTransferRequest::CopyBufferToImage {
                buffer,
                image: self.image.clone(),
                region: BufferImageCopyRegion {
                    buffer_layout: Default::default(),
                    image_origin: origin,
                    extent,
                },
            });
        }
        Ok(())
    }

    /// Upload from an existing staging buffer. Conversion, when required,
    /// rewrites the data into a fresh staging buffer before scheduling.
    pub fn copy_buffer(
        &mut self,
        controller: &Controller,
        buffer: Arc<StagingBuffer>,
        region: BufferImageCopyRegion,
    ) -> Result<(), TextureError> {
        self.check_region(region.image_origin, region.extent)?;
        // The buffer must cover every row the copy will read, in the
        // source format and with the buffer's own row stride.
        let src_format = self.convert_from_format.unwrap_or(self.format);
        let tight_row = region.extent.width as u64 * src_format.bytes_per_pixel() as u64;
        let stride = region
            .buffer_layout
            .bytes_per_row
            .map(u64::from)
            .unwrap_or(tight_row);
        let rows = region.extent.height as u64;
        let required = region.buffer_layout.offset
            + if rows == 0 { 0 } else { (rows - 1) * stride + tight_row };
        if buffer.size() < required {
            return Err(TextureError::SizeMismatch {
                expected: required as usize,
                actual: buffer.data().len(),
            });
        }
        self.initialise_memory(controller);
        let (buffer, region) = match self
            .convert_from_format
            .and_then(|f| controller.conversion_registry().find(f))
        {
            Some(conversion) => {
                let converted = (conversion.convert_buffer)(buffer.data());
                // Converted data is tightly packed in the device format
                let mut region = region;
                region.buffer_layout = Default::default();
                (Arc::new(StagingBuffer::new(converted)), region)
            }
            None => (buffer, region),
        };
        controller.schedule_transfer(ResourceTransferRequest::CopyBufferToImage {
            buffer,
            image: self.image.clone(),
            region,
        });
        Ok(())
    }

    /// Schedule a copy from another texture's image into this one
    pub fn copy_texture(
        &mut self,
        controller: &Controller,
        source: &Texture,
        region: ImageCopyRegion,
    ) -> Result<(), TextureError> {
        self.check_region(region.dst_origin, region.extent)?;
        if !source.is_memory_initialised() {
            return Err(TextureError::NotInitialised);
        }
        self.initialise_memory(controller);
        controller.schedule_transfer(ResourceTransferRequest::CopyImageToImage {
            src_image: source.image.clone(),
            dst_image: self.image.clone(),
            region,
        });
        Ok(())
    }

    fn check_region(
        &self,
        origin: super::transfer::ImageOrigin,
        extent: Extent2d,
    ) -> Result<(), TextureError> {
        // Widened so hostile origins cannot wrap the comparison
        if origin.x as u64 + extent.width as u64 > self.width as u64
            || origin.y as u64 + extent.height as u64 > self.height as u64
        {
            return Err(TextureError::RegionOutOfBounds);
        }
        Ok(())
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        // In-flight command buffers may still reference these; release is
        // deferred through the discard queue.
        if let Some(sampler) = self.sampler.take() {
            self.discard_queue.discard(DiscardResource::Sampler(sampler));
        }
        if let Some(view) = self.view.take() {
            self.discard_queue.discard(DiscardResource::ImageView(view));
        }
        self.discard_queue
            .discard(DiscardResource::Image(self.image.clone()));
    }
}
