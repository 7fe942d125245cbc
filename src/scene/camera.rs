//! Scene-graph camera
//!
//! Maintains camera parameters and derives view/projection matrices, picking
//! rays and orthographic plane distances on demand. Matrices are
//! double-buffered: a property change marks both slots dirty
//! ([`UPDATE_COUNT`]), the first [`Camera::update`] recalculates and the
//! second copies the already-recalculated matrix into the other slot, so the
//! render side always reads a stable snapshot.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::backend::types::Rect;

/// Number of buffered frames a property change must propagate through
pub const UPDATE_COUNT: u32 = 2;

/// Flag value meaning "copy the other buffer's already-updated matrix"
pub const COPY_PREVIOUS_MATRIX: u32 = 1;

pub const DEFAULT_FIELD_OF_VIEW: f32 = 45.0 * std::f32::consts::PI / 180.0;
pub const DEFAULT_ASPECT_RATIO: f32 = 4.0 / 3.0;
pub const DEFAULT_NEAR_CLIPPING_PLANE: f32 = 800.0;
pub const DEFAULT_FAR_CLIPPING_PLANE: f32 = DEFAULT_NEAR_CLIPPING_PLANE * 3.0;

/// Depth range reserved behind the near plane when deriving the far plane
/// from a canvas size: enough for a 16-bit depth buffer at 4 bits per unit
const DEFAULT_DEPTH_RANGE: f32 = (0xFFFF >> 4) as f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

/// Which canvas axis the field of view / orthographic size applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionDirection {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraType {
    #[default]
    FreeLook,
    LookAtTarget,
}

/// A world-space picking ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Camera matrices packed for a uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub position: Vec4,
    /// x = near, y = far, zw unused
    pub near_far: Vec4,
}

/// Double-buffered scene-graph camera
#[derive(Debug, Clone)]
pub struct Camera {
    pub camera_type: CameraType,
    pub projection_mode: ProjectionMode,
    pub projection_direction: ProjectionDirection,
    field_of_view: f32,
    orthographic_size: f32,
    aspect_ratio: f32,
    near_clipping_plane: f32,
    far_clipping_plane: f32,
    invert_y_axis: bool,
    position: Vec3,
    target_position: Vec3,

    view_matrix: [Mat4; 2],
    projection_matrix: [Mat4; 2],
    inverse_view_projection: [Mat4; 2],
    update_view_flag: u32,
    update_projection_flag: u32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            camera_type: CameraType::FreeLook,
            projection_mode: ProjectionMode::Perspective,
            projection_direction: ProjectionDirection::Vertical,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            orthographic_size: 400.0,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            near_clipping_plane: DEFAULT_NEAR_CLIPPING_PLANE,
            far_clipping_plane: DEFAULT_FAR_CLIPPING_PLANE,
            invert_y_axis: false,
            position: Vec3::ZERO,
            target_position: Vec3::ZERO,
            view_matrix: [Mat4::IDENTITY; 2],
            projection_matrix: [Mat4::IDENTITY; 2],
            inverse_view_projection: [Mat4::IDENTITY; 2],
            update_view_flag: UPDATE_COUNT,
            update_projection_flag: UPDATE_COUNT,
        }
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn set_field_of_view(&mut self, field_of_view: f32) {
        self.field_of_view = field_of_view;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    pub fn set_orthographic_size(&mut self, orthographic_size: f32) {
        self.orthographic_size = orthographic_size;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn near_clipping_plane(&self) -> f32 {
        self.near_clipping_plane
    }

    pub fn set_near_clipping_plane(&mut self, near: f32) {
        self.near_clipping_plane = near;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn far_clipping_plane(&self) -> f32 {
        self.far_clipping_plane
    }

    pub fn set_far_clipping_plane(&mut self, far: f32) {
        self.far_clipping_plane = far;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn invert_y_axis(&self) -> bool {
        self.invert_y_axis
    }

    pub fn set_invert_y_axis(&mut self, invert: bool) {
        self.invert_y_axis = invert;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.projection_mode = mode;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn set_projection_direction(&mut self, direction: ProjectionDirection) {
        self.projection_direction = direction;
        self.update_projection_flag = UPDATE_COUNT;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_view_flag = UPDATE_COUNT;
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    pub fn set_target_position(&mut self, target: Vec3) {
        self.target_position = target;
        self.camera_type = CameraType::LookAtTarget;
        self.update_view_flag = UPDATE_COUNT;
    }

    /// Configure a perspective projection framing a canvas of the given size
    pub fn set_perspective_projection(&mut self, width: f32, height: f32) {
        self.apply_default_projection(width, height);
        self.projection_mode = ProjectionMode::Perspective;
        self.update_projection_flag = UPDATE_COUNT;
    }

    /// Configure an orthographic projection framing a canvas of the given
    /// size, visually consistent with the perspective framing
    pub fn set_orthographic_projection(&mut self, width: f32, height: f32) {
        self.apply_default_projection(width, height);
        self.projection_mode = ProjectionMode::Orthographic;
        self.update_projection_flag = UPDATE_COUNT;
    }

    /// Derive near/far planes, camera distance, field of view and aspect
    /// ratio from a canvas size
    fn apply_default_projection(&mut self, width: f32, height: f32) {
        let near = width.max(height);
        let mut far = near + DEFAULT_DEPTH_RANGE;
        let camera_z = 2.0 * near;
        let orthographic_size = match self.projection_direction {
            ProjectionDirection::Vertical => height,
            ProjectionDirection::Horizontal => width,
        } * 0.5;
        // Keeps perspective and orthographic framing consistent for the
        // same canvas size
        let field_of_view = 2.0 * (orthographic_size / camera_z).atan();
        if far < 2.0 * near {
            far = 2.0 * near;
        }
        self.near_clipping_plane = near;
        self.far_clipping_plane = far;
        self.orthographic_size = orthographic_size;
        self.field_of_view = field_of_view;
        self.aspect_ratio = width / height;
        self.position = Vec3::new(0.0, 0.0, camera_z);
        self.update_view_flag = UPDATE_COUNT;
    }

    /// Horizontal positive half-extent of the orthographic view volume
    pub fn right_plane_distance(&self) -> f32 {
        match self.projection_direction {
            ProjectionDirection::Vertical => self.orthographic_size * self.aspect_ratio,
            ProjectionDirection::Horizontal => self.orthographic_size,
        }
    }

    pub fn left_plane_distance(&self) -> f32 {
        -self.right_plane_distance()
    }

    /// Vertical positive half-extent of the orthographic view volume
    pub fn top_plane_distance(&self) -> f32 {
        match self.projection_direction {
            ProjectionDirection::Vertical => self.orthographic_size,
            ProjectionDirection::Horizontal => self.orthographic_size / self.aspect_ratio,
        }
    }

    pub fn bottom_plane_distance(&self) -> f32 {
        -self.top_plane_distance()
    }

    pub fn view_matrix(&self, buffer_index: usize) -> &Mat4 {
        &self.view_matrix[buffer_index]
    }

    pub fn projection_matrix(&self, buffer_index: usize) -> &Mat4 {
        &self.projection_matrix[buffer_index]
    }

    pub fn inverse_view_projection_matrix(&self, buffer_index: usize) -> &Mat4 {
        &self.inverse_view_projection[buffer_index]
    }

    /// Recalculate matrices for one double-buffer slot. Returns true when
    /// either matrix changed for this slot.
    pub fn update(&mut self, buffer_index: usize) -> bool {
        let view_count = self.update_view(buffer_index);
        let projection_count = self.update_projection(buffer_index);
        if view_count > COPY_PREVIOUS_MATRIX || projection_count > COPY_PREVIOUS_MATRIX {
            let view_projection =
                self.projection_matrix[buffer_index] * self.view_matrix[buffer_index];
            // A singular view-projection leaves the previous inverse in
            // place; unprojection asserts on it separately.
            if view_projection.determinant().abs() > f32::EPSILON {
                self.inverse_view_projection[buffer_index] = view_projection.inverse();
            }
        } else if view_count == COPY_PREVIOUS_MATRIX || projection_count == COPY_PREVIOUS_MATRIX {
            self.inverse_view_projection[buffer_index] =
                self.inverse_view_projection[1 - buffer_index];
        }
        view_count != 0 || projection_count != 0
    }

    fn update_view(&mut self, buffer_index: usize) -> u32 {
        let count = self.update_view_flag;
        if count == 0 {
            return 0;
        }
        if count == COPY_PREVIOUS_MATRIX {
            self.view_matrix[buffer_index] = self.view_matrix[1 - buffer_index];
        } else {
            self.view_matrix[buffer_index] = match self.camera_type {
                CameraType::LookAtTarget => {
                    Mat4::look_at_rh(self.position, self.target_position, Vec3::Y)
                }
                CameraType::FreeLook => Mat4::from_translation(-self.position),
            };
        }
        self.update_view_flag -= 1;
        count
    }

    fn update_projection(&mut self, buffer_index: usize) -> u32 {
        let count = self.update_projection_flag;
        if count == 0 {
            return 0;
        }
        if count == COPY_PREVIOUS_MATRIX {
            self.projection_matrix[buffer_index] = self.projection_matrix[1 - buffer_index];
        } else {
            self.projection_matrix[buffer_index] = match self.projection_mode {
                ProjectionMode::Perspective => {
                    let (half_width, half_height) = match self.projection_direction {
                        ProjectionDirection::Vertical => {
                            let h = (self.field_of_view * 0.5).tan() * self.near_clipping_plane;
                            (h * self.aspect_ratio, h)
                        }
                        ProjectionDirection::Horizontal => {
                            let w = (self.field_of_view * 0.5).tan() * self.near_clipping_plane;
                            (w, w / self.aspect_ratio)
                        }
                    };
                    frustum(
                        -half_width,
                        half_width,
                        -half_height,
                        half_height,
                        self.near_clipping_plane,
                        self.far_clipping_plane,
                        self.invert_y_axis,
                    )
                }
                ProjectionMode::Orthographic => orthographic(
                    self.left_plane_distance(),
                    self.right_plane_distance(),
                    self.bottom_plane_distance(),
                    self.top_plane_distance(),
                    self.near_clipping_plane,
                    self.far_clipping_plane,
                    self.invert_y_axis,
                ),
            };
        }
        self.update_projection_flag -= 1;
        count
    }

    /// Build a world-space picking ray through a screen point.
    ///
    /// Perspective rays originate at the camera and pass through the
    /// unprojected near-plane point. Orthographic rays share the camera's
    /// facing axis: the unprojected origin is translated back along it by
    /// the near plane distance.
    pub fn build_picking_ray(&self, buffer_index: usize, screen: Vec2, viewport: Rect) -> Ray {
        let viewport_width = viewport.width as f32;
        let viewport_height = viewport.height as f32;
        let near_window = Vec3::new(
            screen.x - viewport.x as f32,
            viewport_height - (screen.y - viewport.y as f32),
            0.0,
        );
        let inverse_view_projection = &self.inverse_view_projection[buffer_index];
        match self.projection_mode {
            ProjectionMode::Perspective => {
                let origin = self.position;
                let Some(near_point) = unproject(
                    near_window,
                    inverse_view_projection,
                    viewport_width,
                    viewport_height,
                ) else {
                    debug_assert!(false, "singular view-projection matrix in picking ray");
                    return Ray {
                        origin,
                        direction: Vec3::ZERO,
                    };
                };
                let mut direction = (near_point - origin).normalize_or_zero();
                if self.invert_y_axis {
                    // Off-screen target with inverted Y flips the direction
                    // only; the origin is unaffected
                    direction.y = -direction.y;
                }
                Ray { origin, direction }
            }
            ProjectionMode::Orthographic => {
                let Some(mut origin) = unproject(
                    near_window,
                    inverse_view_projection,
                    viewport_width,
                    viewport_height,
                ) else {
                    debug_assert!(false, "singular view-projection matrix in picking ray");
                    return Ray {
                        origin: self.position,
                        direction: Vec3::ZERO,
                    };
                };
                let inverse_view = self.view_matrix[buffer_index].inverse();
                let camera_origin = inverse_view.transform_point3(Vec3::ZERO);
                let near_plane_origin =
                    inverse_view.transform_point3(Vec3::new(0.0, 0.0, -self.near_clipping_plane));
                let backward = camera_origin - near_plane_origin;
                origin -= backward;
                Ray {
                    origin,
                    direction: backward.normalize_or_zero(),
                }
            }
        }
    }

    /// Matrices for one buffer slot packed for upload
    pub fn uniform_data(&self, buffer_index: usize) -> CameraUniform {
        let view = self.view_matrix[buffer_index];
        let projection = self.projection_matrix[buffer_index];
        CameraUniform {
            view,
            projection,
            view_projection: projection * view,
            position: self.position.extend(1.0),
            near_far: Vec4::new(self.near_clipping_plane, self.far_clipping_plane, 0.0, 0.0),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a window-space point (origin bottom-left, z in [0,1]) back to world
/// space through an inverse view-projection. `None` when the matrix is
/// singular.
fn unproject(window: Vec3, inverse_view_projection: &Mat4, width: f32, height: f32) -> Option<Vec3> {
    let ndc = Vec4::new(
        window.x / width * 2.0 - 1.0,
        window.y / height * 2.0 - 1.0,
        2.0 * window.z - 1.0,
        1.0,
    );
    let world = *inverse_view_projection * ndc;
    if world.w.abs() <= f32::EPSILON {
        return None;
    }
    Some(world.truncate() / world.w)
}

/// Off-axis perspective frustum, optionally flipping the Y axis for
/// render targets addressed top-down
fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32, invert_y: bool) -> Mat4 {
    let delta_x = right - left;
    let delta_y = if invert_y { bottom - top } else { top - bottom };
    let delta_z = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / delta_x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / delta_y, 0.0, 0.0),
        Vec4::new(
            (right + left) / delta_x,
            (top + bottom) / delta_y,
            -(far + near) / delta_z,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * near * far / delta_z, 0.0),
    )
}

/// Orthographic projection with the same Y-flip convention as [`frustum`]
fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
    invert_y: bool,
) -> Mat4 {
    let delta_x = right - left;
    let delta_y = if invert_y { bottom - top } else { top - bottom };
    let delta_z = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 / delta_x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 / delta_y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, -2.0 / delta_z, 0.0),
        Vec4::new(
            -(right + left) / delta_x,
            -(top + bottom) / delta_y,
            -(far + near) / delta_z,
            1.0,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPSILON: f32 = 1e-4;

    fn canvas_camera() -> Camera {
        let mut camera = Camera::new();
        camera.set_target_position(Vec3::ZERO);
        camera.set_perspective_projection(800.0, 480.0);
        camera.update(0);
        camera.update(1);
        camera
    }

    #[test]
    fn test_perspective_projection_derivation() {
        let camera = canvas_camera();
        assert_eq!(camera.near_clipping_plane(), 800.0);
        assert_eq!(camera.far_clipping_plane(), 800.0 + (0xFFFF >> 4) as f32);
        assert!((camera.aspect_ratio() - 800.0 / 480.0).abs() < EPSILON);
        // fov = 2*atan(orthoSize / cameraZ), orthoSize = height/2
        let expected_fov = 2.0 * (240.0f32 / 1600.0).atan();
        assert!((camera.field_of_view() - expected_fov).abs() < EPSILON);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 1600.0));
    }

    #[test]
    fn test_far_plane_raised_to_twice_near() {
        let mut camera = Camera::new();
        // Large canvas: near + depth range < 2 * near
        camera.set_perspective_projection(8192.0, 4096.0);
        assert_eq!(camera.near_clipping_plane(), 8192.0);
        assert_eq!(camera.far_clipping_plane(), 2.0 * 8192.0);
    }

    #[rstest]
    #[case(ProjectionDirection::Vertical)]
    #[case(ProjectionDirection::Horizontal)]
    fn test_plane_distance_symmetry(#[case] direction: ProjectionDirection) {
        let mut camera = Camera::new();
        camera.set_projection_direction(direction);
        camera.set_orthographic_size(240.0);
        camera.set_aspect_ratio(800.0 / 480.0);
        assert_eq!(camera.left_plane_distance(), -camera.right_plane_distance());
        assert_eq!(camera.bottom_plane_distance(), -camera.top_plane_distance());
    }

    #[test]
    fn test_plane_distances_swap_roles_with_direction() {
        let mut camera = Camera::new();
        camera.set_orthographic_size(240.0);
        camera.set_aspect_ratio(2.0);

        camera.set_projection_direction(ProjectionDirection::Vertical);
        assert_eq!(camera.right_plane_distance(), 480.0);
        assert_eq!(camera.top_plane_distance(), 240.0);

        camera.set_projection_direction(ProjectionDirection::Horizontal);
        assert_eq!(camera.right_plane_distance(), 240.0);
        assert_eq!(camera.top_plane_distance(), 120.0);
    }

    #[test]
    fn test_double_buffer_update_flags() {
        let mut camera = canvas_camera();
        // Settled: no further recalculation
        assert!(!camera.update(0));
        assert!(!camera.update(1));

        camera.set_field_of_view(1.0);
        // First update recalculates, second copies into the other slot
        assert!(camera.update(0));
        assert!(camera.update(1));
        assert_eq!(camera.projection_matrix(0), camera.projection_matrix(1));
        assert!(!camera.update(0));
    }

    #[test]
    fn test_uniform_data_packs_buffered_matrices() {
        let camera = canvas_camera();
        let uniform = camera.uniform_data(0);
        assert_eq!(uniform.view, *camera.view_matrix(0));
        assert_eq!(uniform.projection, *camera.projection_matrix(0));
        assert_eq!(
            uniform.view_projection,
            *camera.projection_matrix(0) * *camera.view_matrix(0)
        );
        assert_eq!(uniform.position, camera.position().extend(1.0));
        assert_eq!(
            uniform.near_far,
            Vec4::new(800.0, 800.0 + (0xFFFF >> 4) as f32, 0.0, 0.0)
        );

        // Both slots hold the same settled snapshot
        assert_eq!(camera.uniform_data(1), uniform);

        // Plain-old-data layout survives the trip through raw bytes
        let bytes = bytemuck::bytes_of(&uniform);
        assert_eq!(bytes.len(), std::mem::size_of::<CameraUniform>());
        assert_eq!(*bytemuck::from_bytes::<CameraUniform>(bytes), uniform);
    }

    #[test]
    fn test_center_picking_ray_points_down_camera_axis() {
        let camera = canvas_camera();
        let ray = camera.build_picking_ray(
            0,
            Vec2::new(400.0, 240.0),
            Rect::new(0, 0, 800, 480),
        );
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 1600.0));
        assert!((ray.direction - Vec3::new(0.0, 0.0, -1.0)).length() < EPSILON);
    }

    #[test]
    fn test_off_center_perspective_ray_converges_at_camera() {
        let camera = canvas_camera();
        let ray = camera.build_picking_ray(0, Vec2::new(0.0, 0.0), Rect::new(0, 0, 800, 480));
        assert_eq!(ray.origin, camera.position());
        // Screen top-left deviates left and up in world space
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn test_orthographic_ray_shares_camera_axis() {
        let mut camera = Camera::new();
        camera.set_target_position(Vec3::ZERO);
        camera.set_orthographic_projection(800.0, 480.0);
        camera.update(0);
        camera.update(1);

        let center = camera.build_picking_ray(
            0,
            Vec2::new(400.0, 240.0),
            Rect::new(0, 0, 800, 480),
        );
        let corner = camera.build_picking_ray(0, Vec2::new(0.0, 0.0), Rect::new(0, 0, 800, 480));
        // All orthographic rays share one direction
        assert!((center.direction - corner.direction).length() < EPSILON);
        // Origins differ across the viewport
        assert!((center.origin - corner.origin).length() > 1.0);
    }

    #[test]
    fn test_inverted_y_flips_ray_direction_only() {
        let mut camera = canvas_camera();
        let upright = camera.build_picking_ray(0, Vec2::new(0.0, 0.0), Rect::new(0, 0, 800, 480));
        // Flip only the flag; the matrices still hold the upright snapshot,
        // so the flip is observable on the direction alone.
        camera.set_invert_y_axis(true);
        let inverted = camera.build_picking_ray(0, Vec2::new(0.0, 0.0), Rect::new(0, 0, 800, 480));
        assert_eq!(inverted.origin, upright.origin);
        assert!((inverted.direction.x - upright.direction.x).abs() < EPSILON);
        assert!((inverted.direction.y + upright.direction.y).abs() < EPSILON);
    }
}
