//! Drum generation: meter-aware accent grids and preset recipes

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GenerationContext;
use crate::meter::Meter;
use crate::style::{Style, scaled_velocity};
use crate::track::StudioNote;

/// General MIDI drum notes
pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const CLAP: u8 = 39;
pub const CLOSED_HAT: u8 = 42;

const VELOCITY_RANGE: i32 = 40;
/// Velocity drop for snare ghost notes and unaccented hats
const GHOST_DROP: i32 = 35;
const HAT_DROP: i32 = 12;

// ============================================================================
// Presets
// ============================================================================

/// Named drum pattern. Several names share a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumPreset {
    #[default]
    Basic,
    Pop,
    Drive,
    Rock,
    HalfTime,
    Trap,
    Sparse,
    Ballad,
    FourOnFloor,
    House,
    Offbeat,
    Reggae,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recipe {
    Basic,
    Drive,
    HalfTime,
    Sparse,
    FourOnFloor,
    Offbeat,
}

impl DrumPreset {
    pub const ALL: [DrumPreset; 12] = [
        Self::Basic,
        Self::Pop,
        Self::Drive,
        Self::Rock,
        Self::HalfTime,
        Self::Trap,
        Self::Sparse,
        Self::Ballad,
        Self::FourOnFloor,
        Self::House,
        Self::Offbeat,
        Self::Reggae,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Pop => "Pop",
            Self::Drive => "Drive",
            Self::Rock => "Rock",
            Self::HalfTime => "Half Time",
            Self::Trap => "Trap",
            Self::Sparse => "Sparse",
            Self::Ballad => "Ballad",
            Self::FourOnFloor => "Four on the Floor",
            Self::House => "House",
            Self::Offbeat => "Offbeat",
            Self::Reggae => "Reggae",
        }
    }

    fn recipe(&self) -> Recipe {
        match self {
            Self::Basic | Self::Pop => Recipe::Basic,
            Self::Drive | Self::Rock => Recipe::Drive,
            Self::HalfTime | Self::Trap => Recipe::HalfTime,
            Self::Sparse | Self::Ballad => Recipe::Sparse,
            Self::FourOnFloor | Self::House => Recipe::FourOnFloor,
            Self::Offbeat | Self::Reggae => Recipe::Offbeat,
        }
    }
}

impl FromStr for DrumPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "basic" => Ok(Self::Basic),
            "pop" => Ok(Self::Pop),
            "drive" => Ok(Self::Drive),
            "rock" => Ok(Self::Rock),
            "halftime" => Ok(Self::HalfTime),
            "trap" => Ok(Self::Trap),
            "sparse" => Ok(Self::Sparse),
            "ballad" => Ok(Self::Ballad),
            "fouronthefloor" | "fouronfloor" => Ok(Self::FourOnFloor),
            "house" => Ok(Self::House),
            "offbeat" => Ok(Self::Offbeat),
            "reggae" => Ok(Self::Reggae),
            _ => Err(format!("unknown drum preset: {s}")),
        }
    }
}

// ============================================================================
// Meter Patterns
// ============================================================================

/// Where a meter's accents fall, in grid beats from the bar start
#[derive(Debug, Clone, PartialEq)]
pub struct MeterPattern {
    /// Every grid beat
    pub beats: Vec<f64>,
    /// Subdivisions between felt pulses
    pub offbeats: Vec<f64>,
    /// Felt pulses, the primary accent grid
    pub pulses: Vec<f64>,
    /// Snare positions
    pub backbeats: Vec<f64>,
}

impl MeterPattern {
    pub fn for_meter(meter: Meter) -> Self {
        let top = meter.top.max(1);
        let eighth_grid = meter.bottom == 8;

        let (pulses, backbeats): (Vec<i32>, Vec<i32>) = match (top, meter.bottom) {
            (4, 4) => (vec![0, 1, 2, 3], vec![1, 3]),
            (3, 4) => (vec![0, 1, 2], vec![1, 2]),
            (2, 4) => (vec![0, 1], vec![1]),
            (5, 4) => (vec![0, 1, 2, 3, 4], vec![1, 3]),
            (6, 8) => (vec![0, 3], vec![3]),
            (12, 8) => (vec![0, 3, 6, 9], vec![3, 9]),
            (7, 8) => (vec![0, 2, 4], vec![4]),
            // Dotted-quarter groups; snare on every second group
            (t, 8) if t % 3 == 0 => {
                let pulses: Vec<i32> = (0..t).step_by(3).collect();
                let backbeats = pulses.iter().copied().skip(1).step_by(2).collect();
                (pulses, backbeats)
            }
            // Groups of two, the last one absorbing an odd eighth
            (t, 8) => {
                let mut pulses: Vec<i32> = (0..t - 1).step_by(2).collect();
                if pulses.is_empty() {
                    pulses.push(0);
                }
                let backbeats = match pulses.as_slice() {
                    [_, .., last] => vec![*last],
                    _ => Vec::new(),
                };
                (pulses, backbeats)
            }
            (t, _) => ((0..t).collect(), (1..t).step_by(2).collect()),
        };

        let beats: Vec<f64> = (0..top).map(f64::from).collect();
        let pulses: Vec<f64> = pulses.into_iter().map(f64::from).collect();
        let backbeats: Vec<f64> = backbeats.into_iter().map(f64::from).collect();
        let offbeats: Vec<f64> = if eighth_grid {
            beats.iter().copied().filter(|b| !pulses.contains(b)).collect()
        } else {
            beats.iter().map(|b| b + 0.5).collect()
        };

        Self {
            beats,
            offbeats,
            pulses,
            backbeats,
        }
    }

    fn middle_pulse(&self) -> f64 {
        self.pulses.get(self.pulses.len() / 2).copied().unwrap_or(0.0)
    }

    /// Pulses the snare leaves free
    fn grounded_pulses(&self) -> Vec<f64> {
        self.pulses
            .iter()
            .copied()
            .filter(|p| !self.backbeats.contains(p))
            .collect()
    }
}

// ============================================================================
// Drum Patterns
// ============================================================================

/// One bar of drums as step indices on a fixed grid
#[derive(Debug, Clone, PartialEq)]
pub struct DrumPattern {
    /// Grid step length in beats (a sixteenth note)
    pub step_beats: f64,
    pub steps_per_bar: usize,
    pub kick: Vec<usize>,
    pub snare: Vec<usize>,
    pub hat: Vec<usize>,
    pub clap: Vec<usize>,
    /// Pulse steps; snare and hat hits off these play softer
    pub accents: Vec<usize>,
}

/// Build the per-bar drum pattern for a preset in a meter.
///
/// Low complexity keeps kick and hat on the pulses and the snare to its first
/// hit; high complexity fills in off-beat hats and finally a ghost snare.
pub fn drum_pattern(meter: Meter, preset: DrumPreset, complexity: f64) -> DrumPattern {
    let mp = MeterPattern::for_meter(meter);

    let (mut kick, mut snare, mut hat, clap) = match preset.recipe() {
        Recipe::Basic => (mp.grounded_pulses(), mp.backbeats.clone(), mp.beats.clone(), Vec::new()),
        Recipe::Drive => {
            let mut kick = mp.grounded_pulses();
            let pickup = mp.backbeats.last().and_then(|&last| {
                mp.offbeats.iter().copied().filter(|&o| o < last).last()
            });
            kick.extend(pickup);
            let hat: Vec<f64> = mp.beats.iter().chain(&mp.offbeats).copied().collect();
            (kick, mp.backbeats.clone(), hat, Vec::new())
        }
        Recipe::HalfTime => {
            let middle = mp.middle_pulse();
            (vec![0.0], vec![middle], mp.beats.clone(), vec![middle])
        }
        Recipe::Sparse => {
            let snare: Vec<f64> = mp.backbeats.last().copied().into_iter().collect();
            (vec![0.0], snare, mp.pulses.clone(), Vec::new())
        }
        Recipe::FourOnFloor => (mp.pulses.clone(), Vec::new(), mp.offbeats.clone(), mp.backbeats.clone()),
        Recipe::Offbeat => {
            let middle = mp.middle_pulse();
            (vec![middle], vec![middle], mp.offbeats.clone(), Vec::new())
        }
    };

    if complexity < 0.35 {
        kick.retain(|o| mp.pulses.contains(o));
        hat.retain(|o| mp.pulses.contains(o));
        snare.truncate(1);
    }
    if complexity > 0.75 {
        hat.extend(mp.offbeats.iter().copied());
    }
    if complexity > 0.9 {
        snare.extend(mp.offbeats.last().copied());
    }

    let step_beats = if meter.bottom == 8 { 0.5 } else { 0.25 };
    let steps_per_bar = (meter.beats_per_bar() / step_beats).round() as usize;
    let to_steps = |offsets: &[f64]| -> Vec<usize> {
        let mut steps: Vec<usize> = offsets
            .iter()
            .map(|o| (o / step_beats).round() as usize)
            .filter(|&s| s < steps_per_bar)
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    };

    DrumPattern {
        step_beats,
        steps_per_bar,
        kick: to_steps(&kick),
        snare: to_steps(&snare),
        hat: to_steps(&hat),
        clap: to_steps(&clap),
        accents: to_steps(&mp.pulses),
    }
}

/// Base velocities (kick, snare, hat, clap)
fn base_velocities(style: Style) -> [i32; 4] {
    match style {
        Style::Pop => [100, 95, 70, 90],
        Style::Rock => [110, 105, 80, 95],
        Style::Edm => [115, 100, 75, 105],
        Style::Jazz => [80, 75, 60, 70],
        Style::Funk => [105, 100, 78, 92],
        Style::Ballad => [85, 80, 55, 75],
        Style::HipHop => [110, 100, 70, 100],
    }
}

/// Replay one bar pattern across the whole arrangement.
///
/// An arrangement without sections gets no drums.
pub(super) fn generate(ctx: &GenerationContext<'_>, preset: DrumPreset) -> Vec<StudioNote> {
    let timeline = ctx.timeline;
    if timeline.section_count == 0 {
        return Vec::new();
    }

    let settings = ctx.settings;
    let pattern = drum_pattern(timeline.meter, preset, settings.complexity);
    let [kick_v, snare_v, hat_v, clap_v] = base_velocities(settings.style);
    let lanes = [
        (KICK, &pattern.kick, kick_v, 0),
        (SNARE, &pattern.snare, snare_v, GHOST_DROP),
        (CLOSED_HAT, &pattern.hat, hat_v, HAT_DROP),
        (CLAP, &pattern.clap, clap_v, 0),
    ];

    let beats_per_bar = timeline.beats_per_bar();
    let mut notes = Vec::new();
    for bar in 0..timeline.total_bars {
        let bar_start = bar as f64 * beats_per_bar;
        for (note, steps, base, off_accent_drop) in &lanes {
            for &step in steps.iter() {
                let base = if pattern.accents.contains(&step) { *base } else { base - off_accent_drop };
                notes.push(StudioNote::new(
                    bar_start + step as f64 * pattern.step_beats,
                    pattern.step_beats,
                    *note as i32,
                    scaled_velocity(base, settings.intensity, VELOCITY_RANGE),
                ));
            }
        }
    }
    notes
}
