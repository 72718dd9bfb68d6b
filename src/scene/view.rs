//! Render views

use glam::{Mat4, Vec2, Vec3};

/// One camera's view of the frame.
///
/// View space is right-handed with the camera looking down `-Z`; the
/// projection is expected to be a perspective projection such as
/// [`Mat4::perspective_rh`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub view: Mat4,
    pub projection: Mat4,
    /// Viewport size in pixels
    pub viewport_size: Vec2,
    pub near_clip_plane: f32,
    pub far_clip_plane: f32,
}

impl RenderView {
    pub fn new(
        view: Mat4,
        projection: Mat4,
        viewport_size: Vec2,
        near_clip_plane: f32,
        far_clip_plane: f32,
    ) -> Self {
        Self {
            view,
            projection,
            viewport_size,
            near_clip_plane,
            far_clip_plane,
        }
    }

    /// Perspective view looking from `eye` at `target`
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        viewport_size: Vec2,
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = if viewport_size.y > 0.0 {
            viewport_size.x / viewport_size.y
        } else {
            1.0
        };
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh(fov_y, aspect, near, far),
            viewport_size,
            near,
            far,
        )
    }

    /// Transform a world-space position into view space
    pub fn to_view_space(&self, world_position: Vec3) -> Vec3 {
        self.view.transform_point3(world_position)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// True when the viewport has no pixels or a non-finite size and the view
    /// must be skipped
    pub fn is_degenerate(&self) -> bool {
        !(self.viewport_size.is_finite()
            && self.viewport_size.x >= 1.0
            && self.viewport_size.y >= 1.0)
    }
}
