//! Procedural wave field: pure functions of world position and time.
//!
//! The field is a sum of travelling sinusoids (octaves). Component `i` is
//!
//! ```text
//! h_i = a_i * sin(k_i * dot(d_i, (x, z)) - w_i * t)
//! k_i = 2π * m_i / length,  w_i = k_i * speed
//! ```
//!
//! with harmonic numbers `m_i` from [`OCTAVE_HARMONICS`]. The amplitudes `a_i`
//! sum to `params.height()`, so `|h| <= height` up to [`HEIGHT_TOLERANCE`] of
//! rounding, and every octave's period divides `length / speed`.
//!
//! Nothing here holds state; all functions are safe to call from many threads.
//!
//! [`OCTAVE_HARMONICS`]: crate::params::OCTAVE_HARMONICS

use glam::{Vec2, Vec3};

use crate::params::{WaveModel, WaveParameters};

/// Relative tolerance on the amplitude bound (f32 rounding of the octave sum)
pub const HEIGHT_TOLERANCE: f32 = 1e-4;

/// One precomputed travelling-wave octave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveComponent {
    /// Unit travel direction on the XZ plane
    pub direction: Vec2,
    /// Spatial angular frequency (radians per meter)
    pub wavenumber: f32,
    /// Temporal angular frequency (radians per simulation time unit)
    pub angular_rate: f32,
    /// Peak amplitude of this octave (meters)
    pub amplitude: f32,
}

impl WaveComponent {
    #[inline]
    fn phase(&self, pos: Vec2, t: f32) -> f32 {
        self.wavenumber * self.direction.dot(pos) - self.angular_rate * t
    }

    /// Gerstner crest factor `Q_i * k_i * a_i`.
    ///
    /// Each octave gets at most `steepness / octaves`, and an octave's
    /// horizontal sway never exceeds its amplitude, so the factors sum to at
    /// most `steepness <= 1` and the surface never loops over itself.
    #[inline]
    fn crest_factor(&self, steepness: f32, octaves: f32) -> f32 {
        steepness / octaves * (self.wavenumber * self.amplitude).min(1.0)
    }
}

/// Stateless evaluator for the water height field.
pub struct WaveField;

impl WaveField {
    /// Surface height at world `(x, z)` and simulation time `t`.
    pub fn height(x: f32, z: f32, t: f32, params: &WaveParameters) -> f32 {
        let pos = Vec2::new(x, z);
        params
            .components()
            .iter()
            .map(|c| c.amplitude * c.phase(pos, t).sin())
            .sum()
    }

    /// Partial derivatives `(dh/dx, dh/dz)` of [`WaveField::height`].
    pub fn normal_hint(x: f32, z: f32, t: f32, params: &WaveParameters) -> (f32, f32) {
        let pos = Vec2::new(x, z);
        let gradient = params
            .components()
            .iter()
            .fold(Vec2::ZERO, |acc, c| {
                acc + c.direction * (c.amplitude * c.wavenumber * c.phase(pos, t).cos())
            });
        (gradient.x, gradient.y)
    }

    /// Full displacement of the rest point `(x, 0, z)`.
    ///
    /// For [`WaveModel::Sine`] only `y` is non-zero. For Gerstner waves the
    /// point also sways by `Q_i * a_i * d_i * cos(phase)` per octave, with
    /// `Q_i * k_i * a_i = steepness / octaves * min(1, k_i * a_i)`.
    pub fn displacement(x: f32, z: f32, t: f32, params: &WaveParameters) -> Vec3 {
        let pos = Vec2::new(x, z);
        let steepness = match params.model() {
            WaveModel::Sine => 0.0,
            WaveModel::Gerstner { steepness } => steepness,
        };
        let octaves = params.octaves() as f32;

        params
            .components()
            .iter()
            .fold(Vec3::ZERO, |acc, c| {
                let (sin, cos) = c.phase(pos, t).sin_cos();
                let sway = c.crest_factor(steepness, octaves) / c.wavenumber;
                let horizontal = c.direction * (sway * cos);
                acc + Vec3::new(horizontal.x, c.amplitude * sin, horizontal.y)
            })
    }

    /// Analytic unit surface normal at the rest point `(x, z)`.
    ///
    /// Always in the upper hemisphere. At a full-steepness cusp, where the
    /// tangent frame collapses, the crest normal is `+Y`.
    pub fn normal(x: f32, z: f32, t: f32, params: &WaveParameters) -> Vec3 {
        match params.model() {
            WaveModel::Sine => {
                let (dx, dz) = Self::normal_hint(x, z, t, params);
                Vec3::new(-dx, 1.0, -dz).normalize()
            }
            WaveModel::Gerstner { steepness } => {
                let pos = Vec2::new(x, z);
                let octaves = params.octaves() as f32;
                let mut normal = Vec3::Y;
                for c in params.components() {
                    let (sin, cos) = c.phase(pos, t).sin_cos();
                    let wa = c.wavenumber * c.amplitude;
                    normal.x -= c.direction.x * wa * cos;
                    normal.z -= c.direction.y * wa * cos;
                    normal.y -= c.crest_factor(steepness, octaves) * sin;
                }
                if normal.y <= 0.0 {
                    return Vec3::Y;
                }
                normal.normalize_or(Vec3::Y)
            }
        }
    }
}
