//! Bass line generation

use super::{GenerationContext, quantize};
use crate::harmony::resolve_quality;
use crate::register::{PitchRange, nearest_pitch};
use crate::style::{GenerationSettings, Style, scaled_velocity};
use crate::timeline::ChordSpan;
use crate::track::StudioNote;

const VELOCITY_RANGE: i32 = 40;
/// Hits between pulses sit slightly under the pulse
const OFF_PULSE_DROP: i32 = 8;

/// A planned note, relative to the start of its span
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    offset: f64,
    pitch: i32,
}

impl Hit {
    fn new(offset: f64, pitch: i32) -> Self {
        Self { offset, pitch }
    }
}

fn base_velocity(style: Style) -> i32 {
    match style {
        Style::Pop => 95,
        Style::Rock => 100,
        Style::Edm => 105,
        Style::Jazz => 85,
        Style::Funk => 100,
        Style::Ballad => 80,
        Style::HipHop => 105,
    }
}

/// Note length in pulses at medium intensity
fn base_length(style: Style) -> f64 {
    match style {
        Style::Edm => 0.5,
        Style::Rock => 0.45,
        Style::Funk => 0.3,
        Style::Jazz => 0.9,
        Style::Pop => 1.8,
        Style::Ballad => 3.6,
        Style::HipHop => 1.2,
    }
}

/// Offsets `0, step, 2*step, ...` strictly inside `duration`
fn grid(step: f64, duration: f64) -> impl Iterator<Item = f64> {
    (0u32..)
        .map(move |i| i as f64 * step)
        .take_while(move |&offset| offset < duration - 1e-9)
}

/// Pitches a bass line draws from for one chord
#[derive(Debug, Clone, Copy)]
struct Tones {
    root: i32,
    fifth: i32,
    octave: i32,
}

/// Plan the hits for one span: style recipe, complexity adjustments, then
/// sorted with duplicate offsets removed (the first planned hit wins).
fn plan_hits(style: Style, complexity: f64, duration: f64, stride: f64, eighth: f64, tones: Tones) -> Vec<Hit> {
    let Tones { root, fifth, octave } = tones;

    let mut hits: Vec<Hit> = match style {
        Style::Edm => grid(stride, duration).map(|o| Hit::new(o, root)).collect(),
        Style::Rock => grid(eighth, duration).map(|o| Hit::new(o, root)).collect(),
        Style::Funk => grid(eighth, duration)
            .enumerate()
            .map(|(i, o)| Hit::new(o, if i % 2 == 0 { root } else { octave }))
            .collect(),
        Style::Jazz => vec![Hit::new(0.0, root), Hit::new(2.0 * stride, fifth)],
        Style::Pop => vec![Hit::new(0.0, root), Hit::new(2.0 * stride, root)],
        Style::Ballad => vec![Hit::new(0.0, root)],
        Style::HipHop => vec![Hit::new(0.0, root), Hit::new(1.5 * stride, root)],
    };
    hits.retain(|h| h.offset < duration);

    if complexity < 0.35 {
        hits.truncate(1);
    } else {
        if complexity > 0.6 {
            let mid = quantize(duration / 2.0, eighth);
            let pitch = match style {
                Style::Edm | Style::Rock | Style::Funk | Style::HipHop => octave,
                _ => fifth,
            };
            if mid > 0.0 && mid < duration {
                hits.push(Hit::new(mid, pitch));
            }
        }
        // Approach tone leading into the next chord; EDM keeps its straight pulse
        if complexity > 0.85 && duration >= 1.5 && style != Style::Edm {
            hits.push(Hit::new(duration - stride / 2.0, root + 2));
        }
    }

    hits.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    hits.dedup_by(|later, earlier| (later.offset - earlier.offset).abs() < 1e-9);
    hits
}

fn emit(notes: &mut Vec<StudioNote>, span: &ChordSpan<'_>, hits: &[Hit], settings: GenerationSettings, stride: f64) {
    let length = base_length(settings.style) * stride * (0.75 + 0.5 * settings.intensity);
    let base = base_velocity(settings.style);

    for (i, hit) in hits.iter().enumerate() {
        let next = hits.get(i + 1).map_or(span.duration, |h| h.offset);
        let on_pulse = (hit.offset / stride).fract() == 0.0;
        let velocity = if on_pulse { base } else { base - OFF_PULSE_DROP };
        notes.push(StudioNote::new(
            span.start_beat + hit.offset,
            length.min(next - hit.offset),
            hit.pitch,
            scaled_velocity(velocity, settings.intensity, VELOCITY_RANGE),
        ));
    }
}

/// Walk the spans in order, anchoring each root next to the previous one.
pub(super) fn generate(ctx: &GenerationContext<'_>, range: PitchRange) -> Vec<StudioNote> {
    let meter = ctx.timeline.meter;
    let stride = meter.pulse_stride();
    let eighth = meter.grid_step();
    let settings = ctx.settings;

    let (notes, _) = ctx
        .timeline
        .spans
        .iter()
        .fold((Vec::new(), range.midpoint()), |(mut notes, anchor), span| {
            let chord = span.chord;
            let root = nearest_pitch(chord.bass_pitch_class(), range, anchor);

            // Fifth of the chord, taken upward from whatever the bass is playing
            let quality = resolve_quality(chord, ctx.diatonic);
            let fifth_class = (chord.root_pitch_class() as i32 + quality.fifth() as i32) % 12;
            let fifth = root + (fifth_class - root).rem_euclid(12);
            let tones = Tones {
                root,
                fifth,
                octave: root + 12,
            };

            let hits = plan_hits(settings.style, settings.complexity, span.duration, stride, eighth, tones);
            emit(&mut notes, span, &hits, settings, stride);
            (notes, root)
        });
    notes
}
