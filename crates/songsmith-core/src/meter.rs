//! Time signatures and the beat arithmetic derived from them
//!
//! A "beat" everywhere in songsmith is one `1/bottom` note: a 4/4 bar is four
//! beats long, a 6/8 bar six. Tempo is counted in tempo beats, which differ
//! from grid beats in compound meters (6/8 and 12/8 are felt in dotted
//! quarters).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongsmithError};

/// A time signature. Every derived quantity is a pure function of `(top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meter {
    pub top: i32,
    pub bottom: i32,
}

impl Default for Meter {
    fn default() -> Self {
        Self { top: 4, bottom: 4 }
    }
}

impl Meter {
    pub const fn new(top: i32, bottom: i32) -> Self {
        Self { top, bottom }
    }

    /// Build a meter from user input, rejecting anything the editor doesn't offer.
    pub fn validated(top: i32, bottom: i32) -> Result<Self> {
        if top < 1 || !matches!(bottom, 4 | 8) {
            return Err(SongsmithError::InvalidMeter { top, bottom });
        }
        Ok(Self { top, bottom })
    }

    /// Malformed meters make structural remaps a no-op
    pub fn is_well_formed(&self) -> bool {
        self.top > 0 && self.bottom > 0
    }

    /// 6/8 and 12/8 group eighths in threes
    pub fn is_compound(&self) -> bool {
        self.bottom == 8 && matches!(self.top, 6 | 12)
    }

    /// Grid beats per bar (never less than one)
    pub fn beats_per_bar(&self) -> f64 {
        self.top.max(1) as f64
    }

    /// Length of one grid beat in whole notes
    pub fn beat_unit(&self) -> f64 {
        1.0 / self.bottom.max(1) as f64
    }

    /// Beats the conductor counts per bar
    pub fn tempo_beats_per_bar(&self) -> i32 {
        if self.is_compound() { self.top / 3 } else { self.top }
    }

    pub fn eighths_per_tempo_beat(&self) -> i32 {
        if self.is_compound() {
            3
        } else if self.bottom == 4 {
            2
        } else {
            1
        }
    }

    /// Quantization step for chordal hits, in grid beats
    pub fn grid_step(&self) -> f64 {
        if self.bottom == 8 { 1.0 } else { 0.5 }
    }

    /// Distance between felt pulses, in grid beats
    pub fn pulse_stride(&self) -> f64 {
        if self.is_compound() {
            3.0
        } else if self.bottom == 8 {
            2.0
        } else {
            1.0
        }
    }

    /// Convert a tempo-beat BPM into quarter notes per minute
    pub fn quarter_note_bpm(&self, bpm: f64) -> f64 {
        bpm * self.eighths_per_tempo_beat() as f64 / 2.0
    }

    /// Seconds per grid beat at the given tempo-beat BPM
    pub fn seconds_per_beat(&self, bpm: f64) -> f64 {
        if bpm <= 0.0 {
            return 0.0;
        }
        let eighths_per_grid_beat = 8.0 / self.bottom.max(1) as f64;
        60.0 / bpm * eighths_per_grid_beat / self.eighths_per_tempo_beat() as f64
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.top, self.bottom)
    }
}

impl FromStr for Meter {
    type Err = SongsmithError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SongsmithError::InvalidMeter { top: 0, bottom: 0 };
        let (top, bottom) = s.trim().split_once('/').ok_or_else(invalid)?;
        let top = top.trim().parse::<i32>().map_err(|_| invalid())?;
        let bottom = bottom.trim().parse::<i32>().map_err(|_| invalid())?;
        Self::validated(top, bottom)
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Time signatures offered in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterPreset {
    TwoFour,
    ThreeFour,
    FourFour,
    FiveFour,
    SixEight,
    SevenEight,
    TwelveEight,
}

impl MeterPreset {
    pub const ALL: [MeterPreset; 7] = [
        Self::TwoFour,
        Self::ThreeFour,
        Self::FourFour,
        Self::FiveFour,
        Self::SixEight,
        Self::SevenEight,
        Self::TwelveEight,
    ];

    pub fn meter(&self) -> Meter {
        match self {
            Self::TwoFour => Meter::new(2, 4),
            Self::ThreeFour => Meter::new(3, 4),
            Self::FourFour => Meter::new(4, 4),
            Self::FiveFour => Meter::new(5, 4),
            Self::SixEight => Meter::new(6, 8),
            Self::SevenEight => Meter::new(7, 8),
            Self::TwelveEight => Meter::new(12, 8),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwoFour => "2/4 March",
            Self::ThreeFour => "3/4 Waltz",
            Self::FourFour => "4/4 Common",
            Self::FiveFour => "5/4",
            Self::SixEight => "6/8 Compound",
            Self::SevenEight => "7/8",
            Self::TwelveEight => "12/8 Shuffle",
        }
    }

    pub fn from_meter(meter: Meter) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.meter() == meter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_meters() {
        let six_eight = Meter::new(6, 8);
        assert!(six_eight.is_compound());
        assert_eq!(six_eight.tempo_beats_per_bar(), 2);
        assert_eq!(six_eight.eighths_per_tempo_beat(), 3);

        let seven_eight = Meter::new(7, 8);
        assert!(!seven_eight.is_compound());
        assert_eq!(seven_eight.tempo_beats_per_bar(), 7);
        assert_eq!(seven_eight.eighths_per_tempo_beat(), 1);

        let four_four = Meter::default();
        assert_eq!(four_four.tempo_beats_per_bar(), 4);
        assert_eq!(four_four.eighths_per_tempo_beat(), 2);
    }

    #[test]
    fn test_seconds_per_beat() {
        assert!((Meter::new(4, 4).seconds_per_beat(120.0) - 0.5).abs() < 1e-9);
        // 6/8 at 60 dotted-quarter bpm: each eighth lasts a third of a second
        assert!((Meter::new(6, 8).seconds_per_beat(60.0) - 1.0 / 3.0).abs() < 1e-9);
        assert!((Meter::new(7, 8).seconds_per_beat(120.0) - 0.5).abs() < 1e-9);
        assert_eq!(Meter::new(4, 4).seconds_per_beat(0.0), 0.0);
    }

    #[test]
    fn test_quarter_note_bpm() {
        assert_eq!(Meter::new(4, 4).quarter_note_bpm(100.0), 100.0);
        assert_eq!(Meter::new(6, 8).quarter_note_bpm(60.0), 90.0);
        assert_eq!(Meter::new(7, 8).quarter_note_bpm(200.0), 100.0);
    }

    #[test]
    fn test_parse_meter() {
        assert_eq!("3/4".parse::<Meter>().unwrap(), Meter::new(3, 4));
        assert_eq!(" 12 / 8 ".parse::<Meter>().unwrap(), Meter::new(12, 8));
        assert!("3/5".parse::<Meter>().is_err());
        assert!("0/4".parse::<Meter>().is_err());
        assert!("waltz".parse::<Meter>().is_err());
    }

    #[test]
    fn test_presets_round_trip() {
        for preset in MeterPreset::ALL {
            assert_eq!(MeterPreset::from_meter(preset.meter()), Some(preset));
        }
        assert_eq!(MeterPreset::from_meter(Meter::new(9, 8)), None);
    }
}
