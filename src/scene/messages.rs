//! Cross-thread camera property channel
//!
//! Property writes from the application thread travel as typed messages and
//! are applied once per frame boundary, at the update/render synchronization
//! point. The camera's double-buffer flags then carry the change into both
//! matrix slots over the following two updates, so the render side keeps
//! reading a stable snapshot while new values land.

use std::sync::mpsc;

use glam::Vec3;

use super::camera::{Camera, ProjectionDirection, ProjectionMode};

/// A typed "set camera property" command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMessage {
    SetFieldOfView(f32),
    SetOrthographicSize(f32),
    SetAspectRatio(f32),
    SetNearClippingPlane(f32),
    SetFarClippingPlane(f32),
    SetProjectionMode(ProjectionMode),
    SetProjectionDirection(ProjectionDirection),
    SetTargetPosition(Vec3),
    SetPosition(Vec3),
    SetInvertYAxis(bool),
}

/// Application-side sender half
#[derive(Debug, Clone)]
pub struct CameraPropertySender {
    sender: mpsc::Sender<CameraMessage>,
}

impl CameraPropertySender {
    /// Queue a property change for the next frame boundary. A send only
    /// fails when the scene side has shut down, in which case the change is
    /// irrelevant.
    pub fn send(&self, message: CameraMessage) {
        let _ = self.sender.send(message);
    }
}

/// Scene-side receiver half, drained once per frame
#[derive(Debug)]
pub struct CameraPropertyReceiver {
    receiver: mpsc::Receiver<CameraMessage>,
}

impl CameraPropertyReceiver {
    /// Apply every pending message to the camera. Returns the number of
    /// messages consumed.
    pub fn apply(&self, camera: &mut Camera) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                CameraMessage::SetFieldOfView(v) => camera.set_field_of_view(v),
                CameraMessage::SetOrthographicSize(v) => camera.set_orthographic_size(v),
                CameraMessage::SetAspectRatio(v) => camera.set_aspect_ratio(v),
                CameraMessage::SetNearClippingPlane(v) => camera.set_near_clipping_plane(v),
                CameraMessage::SetFarClippingPlane(v) => camera.set_far_clipping_plane(v),
                CameraMessage::SetProjectionMode(v) => camera.set_projection_mode(v),
                CameraMessage::SetProjectionDirection(v) => camera.set_projection_direction(v),
                CameraMessage::SetTargetPosition(v) => camera.set_target_position(v),
                CameraMessage::SetPosition(v) => camera.set_position(v),
                CameraMessage::SetInvertYAxis(v) => camera.set_invert_y_axis(v),
            }
            applied += 1;
        }
        applied
    }
}

/// Create the channel pair connecting an application thread to a camera
pub fn camera_property_channel() -> (CameraPropertySender, CameraPropertyReceiver) {
    let (sender, receiver) = mpsc::channel();
    (
        CameraPropertySender { sender },
        CameraPropertyReceiver { receiver },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_apply_at_frame_boundary() {
        let (sender, receiver) = camera_property_channel();
        let mut camera = Camera::new();
        camera.update(0);
        camera.update(1);

        sender.send(CameraMessage::SetFieldOfView(1.2));
        sender.send(CameraMessage::SetAspectRatio(2.0));
        // Nothing applies until the frame boundary drains the channel
        assert_ne!(camera.field_of_view(), 1.2);

        assert_eq!(receiver.apply(&mut camera), 2);
        assert_eq!(camera.field_of_view(), 1.2);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_render_slot_stays_stable_until_updated() {
        let (sender, receiver) = camera_property_channel();
        let mut camera = Camera::new();
        camera.update(0);
        camera.update(1);
        let snapshot = *camera.projection_matrix(0);

        sender.send(CameraMessage::SetFieldOfView(0.3));
        receiver.apply(&mut camera);
        // The read slot holds its snapshot until its own update runs
        assert_eq!(*camera.projection_matrix(0), snapshot);
        camera.update(1);
        assert_eq!(*camera.projection_matrix(0), snapshot);
        assert_ne!(camera.projection_matrix(1), &snapshot);

        camera.update(0);
        assert_eq!(camera.projection_matrix(0), camera.projection_matrix(1));
    }

    #[test]
    fn test_sender_works_from_another_thread() {
        let (sender, receiver) = camera_property_channel();
        let handle = std::thread::spawn(move || {
            sender.send(CameraMessage::SetPosition(Vec3::new(1.0, 2.0, 3.0)));
        });
        handle.join().unwrap();

        let mut camera = Camera::new();
        assert_eq!(receiver.apply(&mut camera), 1);
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
