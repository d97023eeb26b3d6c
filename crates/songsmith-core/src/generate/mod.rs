//! Per-instrument note generators
//!
//! Every generator is a pure function of the chord timeline, the key's diatonic
//! map and the generation settings. The only state is the voice-leading anchor
//! threaded through one pass over the spans, which starts fresh on every call.

mod bass;
mod chords;
mod drums;

pub use drums::{CLAP, CLOSED_HAT, DrumPattern, DrumPreset, KICK, MeterPattern, SNARE, drum_pattern};

use crate::harmony::DiatonicMap;
use crate::project::Project;
use crate::register;
use crate::style::GenerationSettings;
use crate::timeline::{Timeline, build_timeline};
use crate::track::{Instrument, StudioNote, StudioTrack};

/// Everything a generator reads
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub timeline: &'a Timeline<'a>,
    pub diatonic: &'a DiatonicMap,
    pub settings: GenerationSettings,
}

impl<'a> GenerationContext<'a> {
    pub fn new(timeline: &'a Timeline<'a>, diatonic: &'a DiatonicMap, settings: GenerationSettings) -> Self {
        Self {
            timeline,
            diatonic,
            settings: settings.sanitized(),
        }
    }
}

/// Generate the full note set for one track of a project.
pub fn generate_track(project: &Project, track: &StudioTrack, settings: GenerationSettings) -> Vec<StudioNote> {
    let sections = project.ordered_sections();
    let timeline = build_timeline(&sections, project.meter);
    let diatonic = DiatonicMap::new(&project.key.root, project.key.mode);
    let ctx = GenerationContext::new(&timeline, &diatonic, settings);

    let notes = generate_notes(&ctx, track);
    tracing::debug!(
        track = %track.name,
        instrument = track.instrument.name(),
        style = ctx.settings.style.name(),
        notes = notes.len(),
        "generated track"
    );
    notes
}

/// Dispatch on instrument and return notes sorted by `(start_beat, pitch)`.
pub fn generate_notes(ctx: &GenerationContext<'_>, track: &StudioTrack) -> Vec<StudioNote> {
    let range = register::instrument_range(track.instrument, ctx.settings.style, track.octave_shift);

    let mut notes = match track.instrument {
        Instrument::Drums => drums::generate(ctx, track.drum_preset),
        Instrument::Bass => bass::generate(ctx, range),
        Instrument::Piano | Instrument::Guitar | Instrument::Synth => chords::generate(ctx, track.instrument, range),
    };

    notes.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat).then(a.pitch.cmp(&b.pitch)));
    notes
}

/// Quantize a beat offset to a grid step
fn quantize(offset: f64, step: f64) -> f64 {
    (offset / step).round() * step
}
