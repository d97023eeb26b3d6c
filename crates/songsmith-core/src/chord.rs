//! Chord events and chord-symbol parsing

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongsmithError};
use crate::theory::{self, ChordQuality, EXTENSION_TOKENS};

/// Root marker that turns a chord event into a rest
pub const REST_MARKER: &str = "rest";

/// A chord placed inside a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Bar within the owning section (0-indexed)
    pub bar_index: u32,
    /// Offset from the start of the bar, in beats
    pub beat_offset: f64,
    /// Pitch-class name, empty or `"rest"` for a rest
    pub root: String,
    pub quality: ChordQuality,
    /// Extension tokens in authored order (`"7"`, `"9"`, `"#11"`, ...)
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub slash_root: Option<String>,
    /// Length in beats
    pub duration: f64,
}

impl ChordEvent {
    pub fn new(bar_index: u32, beat_offset: f64, root: impl Into<String>, quality: ChordQuality, duration: f64) -> Self {
        Self {
            bar_index,
            beat_offset,
            root: root.into(),
            quality,
            extensions: Vec::new(),
            slash_root: None,
            duration,
        }
    }

    pub fn rest(bar_index: u32, beat_offset: f64, duration: f64) -> Self {
        Self::new(bar_index, beat_offset, REST_MARKER, ChordQuality::Major, duration)
    }

    /// Place a parsed chord symbol at a position
    pub fn from_symbol(symbol: &str, bar_index: u32, beat_offset: f64, duration: f64) -> Result<Self> {
        let parsed = ChordSymbol::parse(symbol)?;
        Ok(Self {
            bar_index,
            beat_offset,
            root: parsed.root,
            quality: parsed.quality,
            extensions: parsed.extensions,
            slash_root: parsed.slash_root,
            duration,
        })
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_slash(mut self, slash_root: impl Into<String>) -> Self {
        self.slash_root = Some(slash_root.into());
        self
    }

    pub fn is_rest(&self) -> bool {
        let root = self.root.trim();
        root.is_empty() || root.eq_ignore_ascii_case(REST_MARKER)
    }

    pub fn root_pitch_class(&self) -> u8 {
        theory::pitch_class(&self.root)
    }

    /// Slash root if one is written, otherwise `None`
    pub fn slash_pitch_class(&self) -> Option<u8> {
        self.slash_root
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(theory::pitch_class)
    }

    /// Pitch class the bass should play
    pub fn bass_pitch_class(&self) -> u8 {
        self.slash_pitch_class().unwrap_or_else(|| self.root_pitch_class())
    }

    /// Duration floored to the shortest playable length
    pub fn playable_duration(&self) -> f64 {
        if self.duration.is_finite() { self.duration.max(0.25) } else { 0.25 }
    }

    /// Display symbol, computed from the stored fields
    pub fn symbol(&self) -> String {
        if self.is_rest() {
            return "N.C.".to_string();
        }
        let mut extensions = self.extensions.iter().map(String::as_str).peekable();
        let suffix = match (self.quality, extensions.peek()) {
            (ChordQuality::Diminished, Some(&"7")) => {
                extensions.next();
                "m7b5"
            }
            (ChordQuality::Diminished, Some(&"dim7")) => {
                extensions.next();
                "dim7"
            }
            (quality, _) => quality.suffix(),
        };
        let mut out = format!("{}{}", self.root.trim(), suffix);
        for ext in extensions {
            out.push_str(ext);
        }
        if let Some(slash) = self.slash_root.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push('/');
            out.push_str(slash.trim());
        }
        out
    }
}

// ============================================================================
// Chord Symbol Parsing
// ============================================================================

/// The harmonic content of a written chord symbol such as `"Am7/G"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSymbol {
    pub root: String,
    pub quality: ChordQuality,
    pub extensions: Vec<String>,
    pub slash_root: Option<String>,
}

impl ChordSymbol {
    /// Parse a chord symbol.
    ///
    /// # Supported qualities
    /// - **Major**: `C`, `Cmaj` (`Cmaj7` keeps `maj7` as an extension)
    /// - **Minor**: `Cm`, `Cmin`, `C-`
    /// - **Diminished**: `Cdim`, `C°`, `Co`; `Cdim7`, `Cm7b5`, `Cø`
    /// - **Augmented**: `Caug`, `C+`
    /// - **Suspended**: `Csus2`, `Csus4`, `Csus`
    ///
    /// Anything after the quality is scanned for extension tokens; a trailing
    /// `/X` names the slash root.
    pub fn parse(symbol: &str) -> Result<Self> {
        let invalid = || SongsmithError::InvalidChordSymbol(symbol.to_string());
        let symbol_trimmed = symbol.trim();

        let (body, slash) = match symbol_trimmed.split_once('/') {
            Some((body, slash)) => {
                theory::parse_pitch_class(slash).ok_or_else(invalid)?;
                (body, Some(slash.trim().to_string()))
            }
            None => (symbol_trimmed, None),
        };

        // Root: letter plus accidentals
        let root_len = body
            .char_indices()
            .skip(1)
            .find(|(_, c)| !matches!(c, '#' | '♯' | 'b' | '♭'))
            .map(|(i, _)| i)
            .unwrap_or(body.len());
        let root = &body[..root_len];
        theory::parse_pitch_class(root).ok_or_else(invalid)?;

        let mut rest = &body[root_len..];
        let mut extensions = Vec::new();

        let quality = if let Some(r) = strip_any(rest, &["m7b5", "ø7", "ø"]) {
            rest = r;
            extensions.push("7".to_string());
            ChordQuality::Diminished
        } else if let Some(r) = strip_any(rest, &["dim7", "°7", "o7"]) {
            rest = r;
            extensions.push("dim7".to_string());
            ChordQuality::Diminished
        } else if let Some(r) = strip_any(rest, &["dim", "°", "o"]) {
            rest = r;
            ChordQuality::Diminished
        } else if let Some(r) = strip_any(rest, &["aug", "+"]) {
            rest = r;
            ChordQuality::Augmented
        } else if let Some(r) = strip_any(rest, &["sus2"]) {
            rest = r;
            ChordQuality::Sus2
        } else if let Some(r) = strip_any(rest, &["sus4", "sus"]) {
            rest = r;
            ChordQuality::Sus4
        } else if rest.starts_with("maj") || rest.starts_with('M') || rest.starts_with('Δ') {
            // Major seventh family; leave the token for the extension scan
            if let Some(r) = strip_any(rest, &["maj"]).filter(|r| !r.starts_with('7') && !r.starts_with('9')) {
                rest = r;
            }
            ChordQuality::Major
        } else if let Some(r) = strip_any(rest, &["min", "m", "-"]) {
            rest = r;
            ChordQuality::Minor
        } else {
            ChordQuality::Major
        };

        while !rest.is_empty() {
            let rest_trimmed = rest.trim_start_matches(['(', ')', ',', ' ']);
            if rest_trimmed.is_empty() {
                break;
            }
            rest = rest_trimmed;

            // maj9 implies the major seventh under the ninth
            if let Some(r) = strip_any(rest, &["maj9", "M9"]) {
                extensions.push("maj7".to_string());
                extensions.push("9".to_string());
                rest = r;
                continue;
            }
            if let Some(r) = strip_any(rest, &["M7", "Δ7", "Δ"]) {
                extensions.push("maj7".to_string());
                rest = r;
                continue;
            }

            let Some(token) = EXTENSION_TOKENS.iter().find(|t| rest.starts_with(**t)) else {
                return Err(invalid());
            };
            extensions.push(token.to_string());
            rest = &rest[token.len()..];
        }

        Ok(Self {
            root: root.to_string(),
            quality,
            extensions,
            slash_root: slash,
        })
    }
}

fn strip_any<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| s.strip_prefix(p))
}
