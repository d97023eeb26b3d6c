//! Register allocation: instrument ranges and nearest-pitch voice leading

use serde::{Deserialize, Serialize};

use crate::style::Style;
use crate::track::Instrument;

const MIDI_MAX: i32 = 127;

/// Inclusive MIDI pitch range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchRange {
    pub lower: i32,
    pub upper: i32,
}

impl PitchRange {
    pub const fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, pitch: i32) -> bool {
        (self.lower..=self.upper).contains(&pitch)
    }

    pub fn midpoint(&self) -> i32 {
        (self.lower + self.upper) / 2
    }

    fn shifted(self, semitones: i32) -> Self {
        Self::new(self.lower + semitones, self.upper + semitones)
    }

    /// Slide (never squeeze) the range back inside 0..=127
    fn slid_into_midi(self) -> Self {
        if self.lower < 0 {
            self.shifted(-self.lower)
        } else if self.upper > MIDI_MAX {
            self.shifted(MIDI_MAX - self.upper)
        } else {
            self
        }
    }
}

/// Default register of each instrument
pub fn base_range(instrument: Instrument) -> PitchRange {
    match instrument {
        Instrument::Drums => PitchRange::new(35, 81),
        Instrument::Bass => PitchRange::new(28, 52),
        Instrument::Piano => PitchRange::new(48, 76),
        Instrument::Guitar => PitchRange::new(52, 76),
        Instrument::Synth => PitchRange::new(55, 84),
    }
}

/// Semitones a style moves an instrument's register
pub fn style_shift(style: Style, instrument: Instrument) -> i32 {
    use Instrument::*;
    match (style, instrument) {
        (Style::Edm, Synth) => 12,
        (Style::Jazz, Piano | Guitar) => -5,
        (Style::Rock, Guitar) => -7,
        (Style::Rock, Bass) => -5,
        (Style::Funk, Bass) => 5,
        (Style::Funk, Guitar) => 7,
        (Style::Ballad, Piano) => -7,
        (Style::Ballad, Synth) => -12,
        (Style::HipHop, Bass) => -5,
        _ => 0,
    }
}

/// Playable range for a track: base register, style shift, then the user's octave offset.
///
/// Drum kits are fixed note maps and ignore both shifts.
pub fn instrument_range(instrument: Instrument, style: Style, octave_shift: i32) -> PitchRange {
    let base = base_range(instrument);
    if instrument == Instrument::Drums {
        return base;
    }
    let user = octave_shift.clamp(-10, 10) * 12;
    base.shifted(style_shift(style, instrument) + user).slid_into_midi()
}

/// Pitch of class `pitch_class` inside `range` closest to `near`.
///
/// Candidates are scanned from the bottom up and only a strictly closer one
/// replaces the current pick, so ties go to the lower pitch. A range too narrow
/// to hold the class falls back to the first octave at or above its floor.
pub fn nearest_pitch(pitch_class: u8, range: PitchRange, near: i32) -> i32 {
    let pc = (pitch_class % 12) as i32;
    let first = range.lower + (pc - range.lower).rem_euclid(12);

    let mut best: Option<(i32, i32)> = None;
    for pitch in (first..=range.upper).step_by(12) {
        let distance = (pitch - near).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((pitch, distance));
        }
    }

    match best {
        Some((pitch, _)) => pitch,
        None if first > MIDI_MAX => first - 12,
        None => first,
    }
}

/// Move a whole voicing by octaves until it sits inside `range`.
///
/// Lifts while the bottom is too low, then drops while the top is too high and
/// there is room below. A voicing wider than the range keeps some notes outside;
/// emission clamps those.
pub fn fit_pitches(pitches: &mut [i32], range: PitchRange) {
    let (Some(&min), Some(&max)) = (pitches.iter().min(), pitches.iter().max()) else {
        return;
    };

    let mut shift = 0;
    while min + shift < range.lower {
        shift += 12;
    }
    while max + shift > range.upper && min + shift - 12 >= range.lower {
        shift -= 12;
    }

    for pitch in pitches.iter_mut() {
        *pitch += shift;
    }
}

/// Voice a chord: anchor the root next to `near`, stack the intervals, fit to range.
pub fn voice_chord(root_pitch_class: u8, intervals: &[u8], range: PitchRange, near: i32) -> Vec<i32> {
    let root = nearest_pitch(root_pitch_class, range, near);
    let mut pitches: Vec<i32> = intervals.iter().map(|&i| root + i as i32).collect();
    fit_pitches(&mut pitches, range);
    pitches
}
