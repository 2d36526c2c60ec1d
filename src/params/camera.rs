//! Camera path configuration and presets for the demo host.

/// Circling camera around the centre of the tile set
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Orbit radius around the look-at point (meters)
    pub radius_m: f32,

    /// Constant altitude (meters)
    pub altitude_m: f32,

    /// Angular speed (radians per second)
    pub angular_speed_rad_per_s: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius_m: 900.0,
            altitude_m: 250.0,
            angular_speed_rad_per_s: 0.08,
        }
    }
}

/// Straight-line flight across the tiles at constant altitude
#[derive(Debug, Clone)]
pub struct FlyoverCamera {
    /// Constant altitude (meters)
    pub altitude_m: f32,

    /// Forward movement speed (meters per second)
    pub forward_speed_m_per_s: f32,

    /// Look-ahead distance (meters)
    pub look_ahead_m: f32,
}

impl Default for FlyoverCamera {
    fn default() -> Self {
        Self {
            altitude_m: 60.0,
            forward_speed_m_per_s: 40.0,
            look_ahead_m: 200.0,
        }
    }
}

/// Fixed camera position (for debugging seams)
#[derive(Debug, Clone)]
pub struct FixedCamera {
    /// Camera position (meters)
    pub position: [f32; 3],

    /// Look-at target (meters)
    pub target: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 400.0, -1200.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Orbit around the tile set centre
    Orbit(OrbitCamera),

    /// Straight-line flight, looking forward and down
    Flyover(FlyoverCamera),

    /// Stationary camera
    Fixed(FixedCamera),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Orbit(OrbitCamera::default())
    }
}
