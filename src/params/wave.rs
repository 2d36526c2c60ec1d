//! Wave model parameters.
//!
//! `WaveParameters` is validated once at construction and immutable afterwards.
//! Changing wave behaviour at runtime means building a new value and swapping
//! the `Arc` held by each surface instance.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};
use crate::wave::WaveComponent;

/// Maximum number of superposed harmonic components.
pub const MAX_OCTAVES: u32 = 4;

/// Harmonic number of each octave. Every entry is an integer so each octave's
/// temporal period divides `length / speed`.
pub const OCTAVE_HARMONICS: [u32; MAX_OCTAVES as usize] = [1, 2, 3, 5];

/// Direction rotation applied to each octave relative to the base direction (radians)
pub const OCTAVE_ANGLES_RAD: [f32; MAX_OCTAVES as usize] = [0.0, 0.61, -0.93, 1.72];

/// Relative weight falloff per octave (each octave has half of the previous)
pub const OCTAVE_FALLOFF: f32 = 0.5;

/// Vertical displacement model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum WaveModel {
    /// Height-only sinusoid
    #[default]
    Sine,

    /// Trochoidal wave: vertices also move horizontally toward crests.
    /// `steepness` is in [0, 1]; 0 degenerates to `Sine`.
    Gerstner { steepness: f32 },
}

/// Plain description of a wave set, as written in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Amplitude bound in meters; the summed field never exceeds it
    pub height_m: f32,

    /// Spatial period of the primary octave (meters)
    pub length_m: f32,

    /// Propagation rate, used as a time divisor
    pub speed: f32,

    /// Travel direction on the XZ plane (normalized on construction)
    pub direction: Vec2,

    /// Number of harmonic components (1..=4)
    pub octaves: u32,

    /// Displacement model (`Sine` unless a config asks for `Gerstner`)
    pub model: WaveModel,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            height_m: 2.0,
            length_m: 10.0,
            speed: 5.0,
            direction: Vec2::X,
            octaves: 1,
            model: WaveModel::Sine,
        }
    }
}

/// Validated, immutable per-surface wave configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WaveSettings", into = "WaveSettings")]
pub struct WaveParameters {
    height: f32,
    length: f32,
    speed: f32,
    direction: Vec2,
    model: WaveModel,
    components: Vec<WaveComponent>,
}

impl WaveParameters {
    /// Build a single-octave sine wave travelling along +X.
    pub fn new(height: f32, length: f32, speed: f32) -> Result<Self> {
        Self::from_settings(&WaveSettings {
            height_m: height,
            length_m: length,
            speed,
            ..WaveSettings::default()
        })
    }

    /// Validate settings and precompute the octave components.
    pub fn from_settings(settings: &WaveSettings) -> Result<Self> {
        let WaveSettings {
            height_m,
            length_m,
            speed,
            direction,
            octaves,
            model,
        } = *settings;

        if !height_m.is_finite() || height_m < 0.0 {
            return Err(WaterError::invalid(
                "height",
                format!("must be finite and >= 0, got {height_m}"),
            ));
        }
        if !length_m.is_finite() || length_m <= 0.0 {
            return Err(WaterError::invalid(
                "length",
                format!("must be finite and > 0, got {length_m}"),
            ));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(WaterError::invalid(
                "speed",
                format!("must be finite and > 0, got {speed}"),
            ));
        }
        let direction = direction.try_normalize().ok_or_else(|| {
            WaterError::invalid(
                "direction",
                format!("must be a finite non-zero vector, got {direction}"),
            )
        })?;
        if !(1..=MAX_OCTAVES).contains(&octaves) {
            return Err(WaterError::invalid(
                "octaves",
                format!("must be in 1..={MAX_OCTAVES}, got {octaves}"),
            ));
        }
        if let WaveModel::Gerstner { steepness } = model {
            if !(0.0..=1.0).contains(&steepness) {
                return Err(WaterError::invalid(
                    "steepness",
                    format!("must be in [0, 1], got {steepness}"),
                ));
            }
        }

        let components = Self::build_components(height_m, length_m, speed, direction, octaves);

        Ok(Self {
            height: height_m,
            length: length_m,
            speed,
            direction,
            model,
            components,
        })
    }

    fn build_components(
        height: f32,
        length: f32,
        speed: f32,
        direction: Vec2,
        octaves: u32,
    ) -> Vec<WaveComponent> {
        let count = octaves as usize;
        let weights: Vec<f32> = (0..count).map(|i| OCTAVE_FALLOFF.powi(i as i32)).collect();
        let total: f32 = weights.iter().sum();

        (0..count)
            .map(|i| {
                let harmonic = OCTAVE_HARMONICS[i] as f32;
                let wavenumber = std::f32::consts::TAU * harmonic / length;
                WaveComponent {
                    direction: Vec2::from_angle(OCTAVE_ANGLES_RAD[i]).rotate(direction),
                    wavenumber,
                    angular_rate: wavenumber * speed,
                    amplitude: height * weights[i] / total,
                }
            })
            .collect()
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Unit travel direction of the primary octave
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn model(&self) -> WaveModel {
        self.model
    }

    pub fn octaves(&self) -> u32 {
        self.components.len() as u32
    }

    /// Temporal period of the whole field in simulation time units
    pub fn period(&self) -> f32 {
        self.length / self.speed
    }

    /// Fold simulation time into `[0, period)`.
    ///
    /// Done in f64 so multi-hour sessions keep sub-millisecond phase accuracy.
    pub fn fold_time(&self, t: f64) -> f32 {
        t.rem_euclid(f64::from(self.length) / f64::from(self.speed)) as f32
    }

    pub(crate) fn components(&self) -> &[WaveComponent] {
        &self.components
    }

    /// The settings this value was built from.
    pub fn settings(&self) -> WaveSettings {
        WaveSettings {
            height_m: self.height,
            length_m: self.length,
            speed: self.speed,
            direction: self.direction,
            octaves: self.octaves(),
            model: self.model,
        }
    }
}

impl Default for WaveParameters {
    fn default() -> Self {
        let settings = WaveSettings::default();
        Self {
            height: settings.height_m,
            length: settings.length_m,
            speed: settings.speed,
            direction: settings.direction,
            model: settings.model,
            components: Self::build_components(
                settings.height_m,
                settings.length_m,
                settings.speed,
                settings.direction,
                settings.octaves,
            ),
        }
    }
}

impl TryFrom<WaveSettings> for WaveParameters {
    type Error = WaterError;

    fn try_from(settings: WaveSettings) -> Result<Self> {
        Self::from_settings(&settings)
    }
}

impl From<WaveParameters> for WaveSettings {
    fn from(params: WaveParameters) -> Self {
        params.settings()
    }
}
