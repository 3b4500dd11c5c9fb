//! Perspective camera and its GPU uniform.

use glam::{Mat4, Vec3};

/// Perspective camera defined by eye position, target, and projection
/// parameters.
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        let proj = Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        );
        proj * view
    }
}

/// GPU uniform buffer holding the view-projection matrix and eye position.
/// Layout matches `CameraUniform` in `instanced_mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Padding for GPU alignment.
    pub(crate) _pad: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Identity view-projection at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            _pad: 0.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_matrix().to_cols_array_2d();
        self.position = camera.eye.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_is_80_bytes() {
        assert_eq!(size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_uniform_tracks_camera_eye() {
        let camera = Camera {
            eye: Vec3::new(0.0, 60.0, 160.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.6,
            fovy: 45.0,
            znear: 0.1,
            zfar: 10_000.0,
        };
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);
        assert_eq!(uniform.position, [0.0, 60.0, 160.0]);
        assert_ne!(uniform.view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }
}
