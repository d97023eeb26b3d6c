//! Music theory kernel: pitch classes, scales, chord qualities and spelling

use serde::{Deserialize, Serialize};

// ============================================================================
// Pitch Classes
// ============================================================================

pub const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
pub const FLAT_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];
/// Chromatic names used in keys without a signature
pub const NEUTRAL_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

/// Parse a pitch-class name such as `"C"`, `"f#"`, `"Bb"` or `"E♭"`.
///
/// Returns `None` for anything that is not a letter followed only by accidentals.
pub fn parse_pitch_class(name: &str) -> Option<u8> {
    let mut chars = name.trim().chars();
    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut offset = 0i32;
    for c in chars {
        match c {
            '#' | '♯' => offset += 1,
            'b' | '♭' => offset -= 1,
            _ => return None,
        }
    }

    Some((base + offset).rem_euclid(12) as u8)
}

/// Lenient pitch-class lookup; unknown names resolve to C.
pub fn pitch_class(name: &str) -> u8 {
    parse_pitch_class(name).unwrap_or(0)
}

/// Name a pitch class with sharps or flats
pub fn spell(pitch_class: u8, prefer_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if prefer_flats { FLAT_NAMES[idx] } else { SHARP_NAMES[idx] }
}

/// Shortest signed distance from one pitch class to another, in `-5..=6`.
pub fn semitone_interval(from: u8, to: u8) -> i32 {
    let up = (to as i32 - from as i32).rem_euclid(12);
    if up > 6 { up - 12 } else { up }
}

/// True if the written name carries a flat accidental
pub fn is_flat_name(name: &str) -> bool {
    name.trim().chars().skip(1).any(|c| c == 'b' || c == '♭')
}

fn is_sharp_name(name: &str) -> bool {
    name.trim().chars().skip(1).any(|c| c == '#' || c == '♯')
}

// ============================================================================
// Key Spelling
// ============================================================================

/// Accidental preference of a key signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpelling {
    Sharps,
    Flats,
    /// C major / A minor: no accidentals either way
    Neutral,
}

/// Work out which accidentals a key is written with.
///
/// An accidental in the key name itself decides (`Gb` vs `F#`); otherwise the
/// relative major's position on the circle of fifths does.
pub fn key_spelling(root: &str, mode: ScaleMode) -> KeySpelling {
    if is_flat_name(root) {
        return KeySpelling::Flats;
    }
    if is_sharp_name(root) {
        return KeySpelling::Sharps;
    }

    let relative_major = match mode {
        ScaleMode::Major => pitch_class(root),
        ScaleMode::Minor => (pitch_class(root) + 3) % 12,
    };

    match relative_major {
        0 => KeySpelling::Neutral,
        // F, Bb, Eb, Ab, Db
        5 | 10 | 3 | 8 | 1 => KeySpelling::Flats,
        _ => KeySpelling::Sharps,
    }
}

/// Transpose a written pitch-class name, spelling the result for the target key.
pub fn transpose_name(name: &str, semitones: i32, spelling: KeySpelling) -> String {
    let pc = (pitch_class(name) as i32 + semitones).rem_euclid(12) as u8;
    match spelling {
        KeySpelling::Flats => spell(pc, true),
        KeySpelling::Sharps => spell(pc, false),
        KeySpelling::Neutral => NEUTRAL_NAMES[pc as usize],
    }
    .to_string()
}

// ============================================================================
// Scales
// ============================================================================

/// Scale/mode types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    #[default]
    Major,
    /// Natural minor
    Minor,
}

impl ScaleMode {
    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8; 7] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Triad quality built on each scale degree
    pub fn triad_qualities(&self) -> &'static [ChordQuality; 7] {
        use ChordQuality::*;
        match self {
            Self::Major => &[Major, Minor, Minor, Major, Major, Minor, Diminished],
            Self::Minor => &[Minor, Diminished, Major, Minor, Minor, Major, Major],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }
}

// ============================================================================
// Chord Qualities
// ============================================================================

/// Triad quality of a chord; sevenths and tensions live in extension tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    #[default]
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Get triad intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
        }
    }

    /// Interval of the chord's fifth
    pub fn fifth(&self) -> u8 {
        match self {
            Self::Diminished => 6,
            Self::Augmented => 8,
            _ => 7,
        }
    }

    /// Suffix used when writing the chord symbol
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Diminished => "Dim",
            Self::Augmented => "Aug",
            Self::Sus2 => "Sus2",
            Self::Sus4 => "Sus4",
        }
    }
}

/// Extension tokens understood by [`extension_interval`], longest first so a
/// greedy scan of a symbol suffix never splits `maj7` into `maj` + `7`.
pub const EXTENSION_TOKENS: [&str; 15] = [
    "add11", "dim7", "maj7", "add9", "#11", "b13", "b9", "#9", "b5", "#5", "11", "13", "6", "7", "9",
];

/// Semitones above the root for an extension token.
///
/// A plain `7` on a diminished triad gives the half-diminished seventh.
pub fn extension_interval(token: &str) -> Option<u8> {
    let interval = match token.trim() {
        "6" => 9,
        "7" => 10,
        "maj7" | "M7" | "Δ7" | "Δ" => 11,
        "dim7" | "°7" => 9,
        "9" | "add9" => 14,
        "b9" => 13,
        "#9" => 15,
        "11" | "add11" => 17,
        "#11" => 18,
        "13" => 21,
        "b13" => 20,
        "b5" => 6,
        "#5" => 8,
        _ => return None,
    };
    Some(interval)
}

/// Full interval stack for a quality plus authored extensions, sorted and deduplicated.
///
/// `b5`/`#5` replace the triad's fifth rather than stacking on top of it.
pub fn chord_intervals(quality: ChordQuality, extensions: &[String]) -> Vec<u8> {
    let mut intervals: Vec<u8> = quality.intervals().to_vec();

    for token in extensions {
        match extension_interval(token) {
            Some(interval @ (6 | 8)) => {
                intervals.retain(|&i| i != quality.fifth());
                intervals.push(interval);
            }
            Some(interval) => intervals.push(interval),
            None => tracing::warn!("Ignoring unknown chord extension {:?}", token),
        }
    }

    intervals.sort_unstable();
    intervals.dedup();
    intervals
}
