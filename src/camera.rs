use glam::{Mat4, Vec2, Vec3};

/// A look-at camera for 3D scenes, perspective or orthographic.
///
/// The main view uses a perspective camera; the shadow pass uses an
/// orthographic one placed by [`light_camera`](crate::shadow::light_camera).
/// Projections produce wgpu's `[0, 1]` clip depth range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees (perspective only).
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub orthographic: bool,
    /// Full height of the orthographic view volume in world units.
    pub ortho_height: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            orthographic: false,
            ortho_height: 6.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, target_x: f32, target_y: f32, target_z: f32) -> Self {
        self.target = Vec3::new(target_x, target_y, target_z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Switch to an orthographic projection of the given view height.
    pub fn orthographic(mut self, height: f32) -> Self {
        self.orthographic = true;
        self.ortho_height = height;
        self
    }

    /// Normalized view direction. Zero if position and target coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Up vector that is never parallel to the view direction.
    fn stable_up(&self) -> Vec3 {
        let up = self.up.normalize_or(Vec3::Y);
        if self.forward().cross(up).length_squared() < 1e-6 {
            // looking along the up axis: any perpendicular axis will do
            if up.z.abs() < 0.9 { Vec3::Z } else { Vec3::X }
        } else {
            up
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.stable_up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        if self.orthographic {
            let half_h = self.ortho_height * 0.5;
            let half_w = half_h * self.aspect;
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
        } else {
            Mat4::perspective_rh(
                self.fov_degrees.to_radians(),
                self.aspect,
                self.near,
                self.far,
            )
        }
    }

    /// `projection * view`, the matrix bound as `_ViewProjection`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world position to normalized device coordinates
    /// (x, y in `[-1, 1]`, z in `[0, 1]` inside the frustum).
    pub fn world_to_ndc(&self, world: Vec3) -> Vec3 {
        self.view_projection().project_point3(world)
    }

    /// Inverse of [`world_to_ndc`](Self::world_to_ndc).
    pub fn ndc_to_world(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// Projects a world position into pixel coordinates of a `width`x`height`
    /// target, origin top-left, matching how full-screen passes address
    /// their inputs.
    pub fn world_to_pixel(&self, world: Vec3, width: u32, height: u32) -> Vec2 {
        let ndc = self.world_to_ndc(world);
        ndc_to_uv(ndc.truncate()) * Vec2::new(width as f32, height as f32)
    }
}

/// Maps NDC x/y to texture coordinates (v grows downward).
pub fn ndc_to_uv(ndc: Vec2) -> Vec2 {
    Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
}

/// Inverse of [`ndc_to_uv`].
pub fn uv_to_ndc(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_round_trip() {
        let camera = Camera::new().at(1.0, 2.0, 6.0).with_aspect(1.5);
        let world = Vec3::new(0.3, -0.4, -1.0);

        let ndc = camera.world_to_ndc(world);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        let back = camera.ndc_to_world(ndc);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::new().at(0.0, 3.0, 8.0).looking_at(0.0, 0.0, 0.0);
        let pixel = camera.world_to_pixel(Vec3::ZERO, 800, 600);
        assert!((pixel - Vec2::new(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn looking_straight_down_is_well_defined() {
        let camera = Camera::new()
            .at(0.0, 10.0, 0.0)
            .looking_at(0.0, 0.0, 0.0)
            .orthographic(15.0);
        let view = camera.view_matrix();
        assert!(view.is_finite());

        // Point below the camera lands at the center, depth inside the clip range.
        let ndc = camera.world_to_ndc(Vec3::new(0.0, -2.0, 0.0));
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn uv_mapping_is_invertible() {
        let ndc = Vec2::new(-0.25, 0.75);
        assert!((uv_to_ndc(ndc_to_uv(ndc)) - ndc).length() < 1e-6);
        assert_eq!(ndc_to_uv(Vec2::new(-1.0, 1.0)), Vec2::ZERO);
    }
}
