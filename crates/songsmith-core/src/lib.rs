//! songsmith-core: Arrangement generation engine for songsmith

mod chord;
mod error;
pub mod generate;
pub mod harmony;
mod meter;
mod project;
pub mod register;
pub mod remap;
mod style;
pub mod theory;
pub mod timeline;
mod track;

pub use chord::{ChordEvent, ChordSymbol, REST_MARKER};
pub use error::{Result, SongsmithError};
pub use generate::{DrumPattern, DrumPreset, GenerationContext, MeterPattern, generate_notes, generate_track};
pub use harmony::{
    ChordSuggestion, DiatonicChord, DiatonicMap, ProgressionAnalysis, analyze_progression, diatonic_chords,
    resolve_quality, roman_numeral, suggest_next,
};
pub use meter::{Meter, MeterPreset};
pub use project::{ArrangementItem, Key, Project, Recording, Section, SectionId};
pub use register::{PitchRange, instrument_range};
pub use style::{GenerationSettings, Style, scaled_velocity};
pub use theory::{ChordQuality, KeySpelling, ScaleMode};
pub use timeline::{ChordSpan, Timeline, build_timeline};
pub use track::{Instrument, StudioNote, StudioTrack, TrackId};
