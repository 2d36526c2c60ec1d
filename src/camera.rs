//! Procedural camera paths for viewing the water tiles.

use glam::{Mat4, Vec3};

use crate::params::{CameraPreset, FixedCamera, FlyoverCamera, OrbitCamera, RenderConfig};

/// Camera system with a preset path
pub struct CameraSystem {
    preset: CameraPreset,
    /// Point the orbit circles and the flyover starts from
    center: Vec3,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset, center: Vec3) -> Self {
        Self { preset, center }
    }

    /// Compute camera position and look-at target for given time
    ///
    /// # Arguments
    /// * `time_s` - Current time in seconds
    ///
    /// # Returns
    /// Tuple of (eye_position, target_position)
    pub fn compute_position_and_target(&self, time_s: f32) -> (Vec3, Vec3) {
        match &self.preset {
            CameraPreset::Orbit(params) => self.compute_orbit_path(params, time_s),
            CameraPreset::Flyover(params) => self.compute_flyover_path(params, time_s),
            CameraPreset::Fixed(params) => Self::compute_fixed_path(params),
        }
    }

    /// Stationary view
    fn compute_fixed_path(p: &FixedCamera) -> (Vec3, Vec3) {
        (Vec3::from_array(p.position), Vec3::from_array(p.target))
    }

    /// Constant-altitude circle around the centre, always looking at it
    fn compute_orbit_path(&self, p: &OrbitCamera, time_s: f32) -> (Vec3, Vec3) {
        let angle = time_s * p.angular_speed_rad_per_s;
        let eye = self.center
            + Vec3::new(angle.cos() * p.radius_m, p.altitude_m, angle.sin() * p.radius_m);
        (eye, self.center)
    }

    /// Straight line along +Z, looking ahead and down
    fn compute_flyover_path(&self, p: &FlyoverCamera, time_s: f32) -> (Vec3, Vec3) {
        let eye = self.center + Vec3::new(0.0, p.altitude_m, time_s * p.forward_speed_m_per_s);

        // Target is ahead and below eye level
        let target = Vec3::new(eye.x, eye.y * 0.6, eye.z + p.look_ahead_m);
        (eye, target)
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn create_view_proj_matrix(
        &self,
        time_s: f32,
        render_config: &RenderConfig,
    ) -> (Mat4, Vec3) {
        let (eye, target) = self.compute_position_and_target(time_s);

        // Always keep Y as up vector (camera never rolls)
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane_m,
            render_config.far_plane_m,
        );

        (proj * view, eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_keeps_radius_and_altitude() {
        let params = OrbitCamera::default();
        let center = Vec3::new(10.0, 0.0, -5.0);
        let camera = CameraSystem::new(CameraPreset::Orbit(params.clone()), center);

        for t in 0..50 {
            let (eye, target) = camera.compute_position_and_target(t as f32 * 0.7);
            assert_eq!(target, center);
            assert!((eye.y - params.altitude_m).abs() < 1e-4);
            let horizontal = Vec3::new(eye.x - center.x, 0.0, eye.z - center.z).length();
            assert!((horizontal - params.radius_m).abs() < 1e-2);
        }
    }

    #[test]
    fn test_flyover_straight_line() {
        let params = FlyoverCamera::default();
        let camera = CameraSystem::new(CameraPreset::Flyover(params.clone()), Vec3::ZERO);

        let (eye0, target0) = camera.compute_position_and_target(0.0);
        let (eye1, target1) = camera.compute_position_and_target(1.0);
        assert_eq!(eye0, Vec3::new(0.0, params.altitude_m, 0.0));
        assert_eq!(eye1.z, params.forward_speed_m_per_s);
        assert_eq!(target0.z, eye0.z + params.look_ahead_m);
        assert_eq!(target1.z, eye1.z + params.look_ahead_m);
        assert!(target1.y < eye1.y);
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = CameraSystem::new(CameraPreset::default(), Vec3::ZERO);
        let (view_proj, eye_pos) = camera.create_view_proj_matrix(0.0, &RenderConfig::default());

        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(eye_pos.is_finite());
    }
}
