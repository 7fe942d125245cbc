//! Common types shared between the render core and backends

use bitflags::bitflags;

/// Pixel format enumeration for images and staging data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Undefined,
    R8Unorm,
    R8G8Unorm,
    R8G8B8Unorm,
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
    R5G6B5UnormPack16,
    R16G16B16A16Sfloat,
    R32G32B32A32Sfloat,
    D32Sfloat,
    D24UnormS8Uint,
}

impl PixelFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, PixelFormat::D32Sfloat | PixelFormat::D24UnormS8Uint)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Undefined => 0,
            PixelFormat::R8Unorm => 1,
            PixelFormat::R8G8Unorm | PixelFormat::R5G6B5UnormPack16 => 2,
            PixelFormat::R8G8B8Unorm => 3,
            PixelFormat::R8G8B8A8Unorm
            | PixelFormat::B8G8R8A8Unorm
            | PixelFormat::D32Sfloat
            | PixelFormat::D24UnormS8Uint => 4,
            PixelFormat::R16G16B16A16Sfloat => 8,
            PixelFormat::R32G32B32A32Sfloat => 16,
        }
    }
}

bitflags! {
    /// Per-format capability flags reported by the device for a tiling mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FormatFeatures: u32 {
        const SAMPLED_IMAGE    = 1 << 0;
        const STORAGE_IMAGE    = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const TRANSFER_SRC     = 1 << 3;
        const TRANSFER_DST     = 1 << 4;
        const BLIT_SRC         = 1 << 5;
        const BLIT_DST         = 1 << 6;
    }
}

/// Image tiling mode a format query is made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTiling {
    /// Row-major, host-mappable layout
    Linear,
    /// Device-chosen layout, requires staged uploads
    Optimal,
}

/// Axis-aligned integer rectangle in framebuffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection of two rectangles. Extents are clamped to zero so a
    /// disjoint pair yields an empty rectangle rather than negative sizes.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let width = ((self.x + self.width).min(other.x + other.width) - x).max(0);
        let height = ((self.y + self.height).min(other.y + other.height) - y).max(0);
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Remap this rectangle from the unrotated coordinate system into the
    /// surface-rotated one. `surface` is the unrotated surface rectangle;
    /// application-level geometry is always expressed unrotated, so every
    /// viewport, scissor box and root clipping rect goes through this remap
    /// before reaching the backend.
    pub fn rotate(&self, orientation: Orientation, surface: &Rect) -> Rect {
        match orientation {
            Orientation::Degree0 => *self,
            Orientation::Degree90 => Rect {
                x: surface.height - (self.y + self.height),
                y: self.x,
                width: self.height,
                height: self.width,
            },
            Orientation::Degree180 => Rect {
                x: surface.width - (self.x + self.width),
                y: surface.height - (self.y + self.height),
                width: self.width,
                height: self.height,
            },
            Orientation::Degree270 => Rect {
                x: self.y,
                y: surface.width - (self.x + self.width),
                width: self.height,
                height: self.width,
            },
        }
    }
}

/// Surface rotation applied by the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Degree0,
    Degree90,
    Degree180,
    Degree270,
}

impl Orientation {
    /// Whether this rotation swaps the surface's width and height
    pub fn transposes(&self) -> bool {
        matches!(self, Orientation::Degree90 | Orientation::Degree270)
    }
}

/// Compare function for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareOp {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Depth write policy carried by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthWriteMode {
    Off,
    /// Write when the owning layer has depth testing enabled and the item
    /// is opaque
    #[default]
    Auto,
    On,
}

/// Depth test policy carried by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthTestMode {
    Off,
    /// Test when the owning layer has depth testing enabled
    #[default]
    Auto,
    On,
}

/// How a renderer drives the color and stencil buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Managed stencil clipping from node clipping state, color writes on
    #[default]
    Auto,
    /// No color writes, no stencil
    None,
    /// Color writes only
    Color,
    /// Manual stencil parameters, no color writes
    Stencil,
    /// Manual stencil parameters with color writes
    ColorStencil,
}
