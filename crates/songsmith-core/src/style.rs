//! Arrangement styles and the density controls shared by every generator

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Arrangement style chosen by the author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Pop,
    Rock,
    Edm,
    Jazz,
    Funk,
    Ballad,
    HipHop,
}

impl Style {
    pub const ALL: [Style; 7] = [
        Self::Pop,
        Self::Rock,
        Self::Edm,
        Self::Jazz,
        Self::Funk,
        Self::Ballad,
        Self::HipHop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pop => "Pop",
            Self::Rock => "Rock",
            Self::Edm => "EDM",
            Self::Jazz => "Jazz",
            Self::Funk => "Funk",
            Self::Ballad => "Ballad",
            Self::HipHop => "Hip-Hop",
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pop" => Ok(Self::Pop),
            "rock" => Ok(Self::Rock),
            "edm" | "electronic" => Ok(Self::Edm),
            "jazz" => Ok(Self::Jazz),
            "funk" => Ok(Self::Funk),
            "ballad" => Ok(Self::Ballad),
            "hiphop" => Ok(Self::HipHop),
            _ => Err(format!("unknown style: {s}")),
        }
    }
}

/// User-facing density controls for one generation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub style: Style,
    /// 0..1, scales velocity and note length
    pub intensity: f64,
    /// 0..1, scales hit count and harmonic extensions
    pub complexity: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            style: Style::Pop,
            intensity: 0.5,
            complexity: 0.5,
        }
    }
}

impl GenerationSettings {
    pub fn new(style: Style, intensity: f64, complexity: f64) -> Self {
        Self { style, intensity, complexity }.sanitized()
    }

    /// Clamp both controls into [0, 1]; NaN falls back to the midpoint.
    pub fn sanitized(self) -> Self {
        let unit = |v: f64| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Self {
            style: self.style,
            intensity: unit(self.intensity),
            complexity: unit(self.complexity),
        }
    }
}

/// Scale a base velocity by intensity: `base + (intensity - 0.5) * range`, kept in 30..=127.
pub fn scaled_velocity(base: i32, intensity: f64, range: i32) -> i32 {
    let v = base as f64 + (intensity - 0.5) * range as f64;
    (v.round() as i32).clamp(30, 127)
}
