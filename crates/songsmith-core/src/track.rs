//! Studio tracks and the notes generated into them

use serde::{Deserialize, Serialize};

use crate::generate::DrumPreset;

/// Unique identifier for tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

/// Instrument a track is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Drums,
    Bass,
    Piano,
    Guitar,
    Synth,
}

impl Instrument {
    pub const ALL: [Instrument; 5] = [Self::Drums, Self::Bass, Self::Piano, Self::Guitar, Self::Synth];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Drums => "Drums",
            Self::Bass => "Bass",
            Self::Piano => "Piano",
            Self::Guitar => "Guitar",
            Self::Synth => "Synth",
        }
    }

    /// Piano, guitar and synth all play chord voicings
    pub fn is_chordal(&self) -> bool {
        matches!(self, Self::Piano | Self::Guitar | Self::Synth)
    }
}

/// A single generated note. Times are in beats from the arrangement start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudioNote {
    pub start_beat: f64,
    pub duration: f64,
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Velocity (1-127)
    pub velocity: u8,
}

impl StudioNote {
    /// Build a note, clamping pitch and velocity into MIDI range.
    pub fn new(start_beat: f64, duration: f64, pitch: i32, velocity: i32) -> Self {
        let start_beat = if start_beat.is_finite() { start_beat.max(0.0) } else { 0.0 };
        let duration = if duration.is_finite() && duration > 0.0 { duration } else { 0.01 };
        Self {
            start_beat,
            duration,
            pitch: pitch.clamp(0, 127) as u8,
            velocity: velocity.clamp(1, 127) as u8,
        }
    }

    /// End beat (start + duration)
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration
    }
}

/// A generated instrument part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioTrack {
    pub id: TrackId,
    pub name: String,
    pub instrument: Instrument,
    /// User register offset in octaves
    #[serde(default)]
    pub octave_shift: i32,
    /// Only read for drum tracks
    #[serde(default)]
    pub drum_preset: DrumPreset,
    /// Owned entirely by the generator; regeneration replaces the whole set
    #[serde(default)]
    pub notes: Vec<StudioNote>,
}

impl StudioTrack {
    pub fn new(id: TrackId, instrument: Instrument, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            instrument,
            octave_shift: 0,
            drum_preset: DrumPreset::default(),
            notes: Vec::new(),
        }
    }

    /// Swap in a freshly generated note set
    pub fn replace_notes(&mut self, notes: Vec<StudioNote>) {
        self.notes = notes;
    }

    /// Beat at which the last note ends
    pub fn end_beat(&self) -> f64 {
        self.notes.iter().map(StudioNote::end_beat).fold(0.0, f64::max)
    }
}
