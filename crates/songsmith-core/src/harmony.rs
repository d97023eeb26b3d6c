//! Harmony resolver: diatonic lookup, quality inference, progression analysis
//! and next-chord suggestions

use serde::{Deserialize, Serialize};

use crate::chord::ChordEvent;
use crate::theory::{self, ChordQuality, KeySpelling, ScaleMode};

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// One of the seven chords native to a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicChord {
    /// Scale degree, 0-indexed (0 = tonic)
    pub degree: usize,
    /// Root spelled for the key
    pub root: String,
    pub pitch_class: u8,
    pub quality: ChordQuality,
}

impl DiatonicChord {
    pub fn numeral(&self) -> String {
        roman_numeral(self.degree, self.quality)
    }

    pub fn symbol(&self) -> String {
        format!("{}{}", self.root, self.quality.suffix())
    }
}

/// The diatonic chord set of a key, indexed by scale degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicMap {
    pub mode: ScaleMode,
    pub chords: Vec<DiatonicChord>,
}

impl DiatonicMap {
    pub fn new(key_root: &str, mode: ScaleMode) -> Self {
        Self {
            mode,
            chords: diatonic_chords(key_root, mode),
        }
    }

    pub fn chord(&self, degree: usize) -> Option<&DiatonicChord> {
        self.chords.get(degree)
    }

    /// Scale degree whose root is `pitch_class`, regardless of quality
    pub fn degree_of(&self, pitch_class: u8) -> Option<usize> {
        self.chords.iter().position(|c| c.pitch_class == pitch_class % 12)
    }

    /// Whether `(pitch_class, quality)` is exactly one of the diatonic chords
    pub fn contains(&self, pitch_class: u8, quality: ChordQuality) -> bool {
        self.chords
            .iter()
            .any(|c| c.pitch_class == pitch_class % 12 && c.quality == quality)
    }
}

/// Build the seven scale-degree triads of a key.
pub fn diatonic_chords(key_root: &str, mode: ScaleMode) -> Vec<DiatonicChord> {
    let tonic = theory::pitch_class(key_root);
    let prefer_flats = match theory::key_spelling(key_root, mode) {
        KeySpelling::Flats => true,
        KeySpelling::Sharps => false,
        KeySpelling::Neutral => theory::is_flat_name(key_root),
    };

    mode.intervals()
        .iter()
        .zip(mode.triad_qualities())
        .enumerate()
        .map(|(degree, (&interval, &quality))| {
            let pitch_class = (tonic + interval) % 12;
            DiatonicChord {
                degree,
                root: theory::spell(pitch_class, prefer_flats).to_string(),
                pitch_class,
                quality,
            }
        })
        .collect()
}

/// Quality a chord should sound with in this key.
///
/// Extensions or a non-major quality mean the author chose it; that stands. A
/// bare major triad on a degree whose diatonic quality is not major takes the
/// diatonic quality instead, so typing just "D" in C major gives D minor.
pub fn resolve_quality(chord: &ChordEvent, map: &DiatonicMap) -> ChordQuality {
    if !chord.extensions.is_empty() || chord.quality != ChordQuality::Major {
        return chord.quality;
    }
    map.degree_of(chord.root_pitch_class())
        .and_then(|degree| map.chord(degree))
        .map_or(ChordQuality::Major, |diatonic| diatonic.quality)
}

/// Roman numeral for a degree: uppercase for major-family chords, lowercase for
/// minor, `°` for diminished and `+` for augmented.
pub fn roman_numeral(degree: usize, quality: ChordQuality) -> String {
    let base = NUMERALS[degree % 7];
    match quality {
        ChordQuality::Major => base.to_string(),
        ChordQuality::Minor => base.to_lowercase(),
        ChordQuality::Diminished => format!("{}°", base.to_lowercase()),
        ChordQuality::Augmented => format!("{base}+"),
        ChordQuality::Sus2 | ChordQuality::Sus4 => format!("{base}{}", quality.suffix()),
    }
}

// ============================================================================
// Progression Analysis
// ============================================================================

/// How much of a progression sits inside the key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionAnalysis {
    /// Non-rest chords considered
    pub total_chords: usize,
    pub diatonic_chords: usize,
    /// 0..=100; zero when there are no chords
    pub diatonic_percentage: f64,
}

/// Count the chords whose authored root and quality exactly match a diatonic chord.
pub fn analyze_progression<'a, I>(chords: I, key_root: &str, mode: ScaleMode) -> ProgressionAnalysis
where
    I: IntoIterator<Item = &'a ChordEvent>,
{
    let map = DiatonicMap::new(key_root, mode);
    let (total_chords, diatonic_chords) = chords
        .into_iter()
        .filter(|c| !c.is_rest())
        .fold((0usize, 0usize), |(total, diatonic), chord| {
            let hit = map.contains(chord.root_pitch_class(), chord.quality);
            (total + 1, diatonic + hit as usize)
        });

    let diatonic_percentage = if total_chords == 0 {
        0.0
    } else {
        diatonic_chords as f64 / total_chords as f64 * 100.0
    };

    ProgressionAnalysis {
        total_chords,
        diatonic_chords,
        diatonic_percentage,
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// A suggested next chord with its function in the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSuggestion {
    pub chord: DiatonicChord,
    pub numeral: String,
}

impl ChordSuggestion {
    fn from_degree(map: &DiatonicMap, degree: usize) -> Option<Self> {
        let chord = map.chord(degree)?.clone();
        let numeral = chord.numeral();
        Some(Self { chord, numeral })
    }
}

/// Common continuations from each scale degree, most likely first
fn transitions(degree: usize) -> &'static [usize] {
    match degree {
        0 => &[3, 4, 5],
        1 => &[4, 0],
        2 => &[5, 3],
        3 => &[0, 4, 1],
        4 => &[0, 5],
        5 => &[3, 1, 4],
        _ => &[0],
    }
}

/// Suggest chords to follow `last`, in order of preference.
///
/// No previous chord (or a rest) opens with I, V, IV. A chord outside the key
/// steers back home with I, V.
pub fn suggest_next(last: Option<&ChordEvent>, key_root: &str, mode: ScaleMode) -> Vec<ChordSuggestion> {
    let map = DiatonicMap::new(key_root, mode);

    let degrees: &[usize] = match last.filter(|c| !c.is_rest()) {
        None => &[0, 4, 3],
        Some(chord) => {
            let pitch_class = chord.root_pitch_class();
            let quality = resolve_quality(chord, &map);
            match map.degree_of(pitch_class) {
                Some(degree) if map.contains(pitch_class, quality) => transitions(degree),
                _ => &[0, 4],
            }
        }
    };

    degrees
        .iter()
        .filter_map(|&degree| ChordSuggestion::from_degree(&map, degree))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numerals(suggestions: &[ChordSuggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.numeral.as_str()).collect()
    }

    #[test]
    fn test_c_major_diatonic_chords() {
        let chords = diatonic_chords("C", ScaleMode::Major);
        let symbols: Vec<String> = chords.iter().map(DiatonicChord::symbol).collect();
        assert_eq!(symbols, vec!["C", "Dm", "Em", "F", "G", "Am", "Bdim"]);
    }

    #[test]
    fn test_minor_and_flat_keys() {
        let symbols: Vec<String> = diatonic_chords("A", ScaleMode::Minor).iter().map(DiatonicChord::symbol).collect();
        assert_eq!(symbols, vec!["Am", "Bdim", "C", "Dm", "Em", "F", "G"]);

        let symbols: Vec<String> = diatonic_chords("F", ScaleMode::Major).iter().map(DiatonicChord::symbol).collect();
        assert_eq!(symbols, vec!["F", "Gm", "Am", "Bb", "C", "Dm", "Edim"]);

        let roots: Vec<String> = diatonic_chords("E", ScaleMode::Major).into_iter().map(|c| c.root).collect();
        assert_eq!(roots, vec!["E", "F#", "G#", "A", "B", "C#", "D#"]);
    }

    #[test]
    fn test_resolve_quality() {
        let map = DiatonicMap::new("C", ScaleMode::Major);

        // Bare major on ii takes the diatonic minor
        let d = ChordEvent::new(0, 0.0, "D", ChordQuality::Major, 4.0);
        assert_eq!(resolve_quality(&d, &map), ChordQuality::Minor);

        let b = ChordEvent::new(0, 0.0, "B", ChordQuality::Major, 4.0);
        assert_eq!(resolve_quality(&b, &map), ChordQuality::Diminished);

        // Extensions mean the author chose major
        let d7 = d.clone().with_extensions(["7"]);
        assert_eq!(resolve_quality(&d7, &map), ChordQuality::Major);

        let csus = ChordEvent::new(0, 0.0, "C", ChordQuality::Sus4, 4.0);
        assert_eq!(resolve_quality(&csus, &map), ChordQuality::Sus4);

        let bb = ChordEvent::new(0, 0.0, "Bb", ChordQuality::Major, 4.0);
        assert_eq!(resolve_quality(&bb, &map), ChordQuality::Major);
    }

    #[test]
    fn test_analyze_progression() {
        let chords = vec![
            ChordEvent::new(0, 0.0, "C", ChordQuality::Major, 4.0),
            ChordEvent::new(1, 0.0, "A", ChordQuality::Minor, 4.0),
            ChordEvent::rest(2, 0.0, 4.0),
        ];
        let analysis = analyze_progression(&chords, "C", ScaleMode::Major);
        assert_eq!(analysis.total_chords, 2);
        assert_eq!(analysis.diatonic_percentage, 100.0);

        let chords = vec![
            ChordEvent::new(0, 0.0, "C", ChordQuality::Major, 4.0),
            ChordEvent::new(1, 0.0, "Ab", ChordQuality::Major, 4.0),
            ChordEvent::new(2, 0.0, "D", ChordQuality::Major, 4.0),
            ChordEvent::new(3, 0.0, "G", ChordQuality::Major, 4.0),
        ];
        let analysis = analyze_progression(&chords, "C", ScaleMode::Major);
        assert_eq!(analysis.diatonic_chords, 2);
        assert_eq!(analysis.diatonic_percentage, 50.0);
    }

    #[test]
    fn test_analyze_empty_progression() {
        let analysis = analyze_progression(&Vec::<ChordEvent>::new(), "G", ScaleMode::Major);
        assert_eq!(analysis.total_chords, 0);
        assert_eq!(analysis.diatonic_percentage, 0.0);
    }

    #[test]
    fn test_suggest_without_previous_chord() {
        let suggestions = suggest_next(None, "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I", "V", "IV"]);

        let rest = ChordEvent::rest(0, 0.0, 4.0);
        let suggestions = suggest_next(Some(&rest), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I", "V", "IV"]);
    }

    #[test]
    fn test_suggest_follows_transition_table() {
        let g = ChordEvent::new(0, 0.0, "G", ChordQuality::Major, 4.0);
        let suggestions = suggest_next(Some(&g), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I", "vi"]);
        assert_eq!(suggestions[1].chord.symbol(), "Am");

        // Bare "D" resolves to ii before the lookup
        let d = ChordEvent::new(0, 0.0, "D", ChordQuality::Major, 4.0);
        let suggestions = suggest_next(Some(&d), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["V", "I"]);

        let bdim = ChordEvent::new(0, 0.0, "B", ChordQuality::Diminished, 4.0);
        let suggestions = suggest_next(Some(&bdim), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I"]);
    }

    #[test]
    fn test_suggest_outside_key_goes_home() {
        let bb = ChordEvent::new(0, 0.0, "Bb", ChordQuality::Major, 4.0);
        let suggestions = suggest_next(Some(&bb), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I", "V"]);

        // Right root, wrong quality
        let e = ChordEvent::new(0, 0.0, "E", ChordQuality::Major, 4.0).with_extensions(["7"]);
        let suggestions = suggest_next(Some(&e), "C", ScaleMode::Major);
        assert_eq!(numerals(&suggestions), vec!["I", "V"]);
    }

    #[test]
    fn test_minor_key_numerals() {
        let suggestions = suggest_next(None, "A", ScaleMode::Minor);
        assert_eq!(numerals(&suggestions), vec!["i", "v", "iv"]);
        assert_eq!(roman_numeral(1, ChordQuality::Diminished), "ii°");
        assert_eq!(roman_numeral(2, ChordQuality::Augmented), "III+");
    }
}
