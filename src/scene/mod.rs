//! Scene-graph data consumed by the render pipeline: flat node/layer state,
//! the double-buffered camera, and the cross-thread property channel.

pub mod camera;
pub mod messages;
pub mod node;

pub use camera::{Camera, CameraType, ProjectionDirection, ProjectionMode, Ray};
pub use messages::{
    camera_property_channel, CameraMessage, CameraPropertyReceiver, CameraPropertySender,
};
pub use node::{ClippingMode, Layer, Node};
