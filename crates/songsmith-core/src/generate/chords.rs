//! Chordal parts: piano, guitar and synth voicings

use super::{GenerationContext, quantize};
use crate::harmony::resolve_quality;
use crate::register::{PitchRange, voice_chord};
use crate::style::{Style, scaled_velocity};
use crate::theory::{ChordQuality, chord_intervals};
use crate::track::{Instrument, StudioNote};

const VELOCITY_RANGE: i32 = 50;
const DOMINANT_DEGREE: usize = 4;

/// Hit offsets (in pulses, repeating every bar) and hit length (in pulses)
struct HitRecipe {
    offsets: &'static [f64],
    length: f64,
}

const fn recipe(offsets: &'static [f64], length: f64) -> HitRecipe {
    HitRecipe { offsets, length }
}

const EIGHTHS: &[f64] = &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5];
const QUARTERS: &[f64] = &[0.0, 1.0, 2.0, 3.0];
const OFFBEATS: &[f64] = &[0.5, 1.5, 2.5, 3.5];

fn hit_recipe(style: Style, instrument: Instrument) -> HitRecipe {
    use Instrument::*;
    match (instrument, style) {
        (Piano, Style::Pop) => recipe(&[0.0, 2.0], 1.9),
        (Piano, Style::Rock) => recipe(QUARTERS, 0.9),
        (Piano, Style::Edm) => recipe(OFFBEATS, 0.4),
        (Piano, Style::Jazz) => recipe(&[0.0, 1.5, 2.5], 0.6),
        (Piano, Style::Funk) => recipe(&[0.0, 1.5, 2.0, 3.5], 0.25),
        (Piano, Style::Ballad) => recipe(&[0.0, 2.0], 2.0),
        (Piano, Style::HipHop) => recipe(&[0.0, 2.5], 1.0),

        (Guitar, Style::Pop) => recipe(QUARTERS, 0.9),
        (Guitar, Style::Rock) => recipe(EIGHTHS, 0.45),
        (Guitar, Style::Edm) => recipe(QUARTERS, 0.5),
        (Guitar, Style::Jazz) => recipe(QUARTERS, 0.8),
        (Guitar, Style::Funk) => recipe(EIGHTHS, 0.2),
        (Guitar, Style::Ballad) => recipe(&[0.0, 2.0], 1.8),
        (Guitar, Style::HipHop) => recipe(&[0.0], 2.0),

        (Synth, Style::Edm) => recipe(OFFBEATS, 0.45),
        (Synth, Style::Funk) => recipe(&[0.0, 2.5], 0.5),
        // Sustained pad
        _ => recipe(&[0.0], 4.0),
    }
}

fn base_velocity(style: Style, instrument: Instrument) -> i32 {
    let instrument_base = match instrument {
        Instrument::Guitar => 85,
        Instrument::Synth => 75,
        _ => 80,
    };
    let style_offset = match style {
        Style::Rock => 10,
        Style::Edm => 8,
        Style::Funk => 5,
        Style::Jazz => -8,
        Style::Ballad => -12,
        Style::Pop | Style::HipHop => 0,
    };
    instrument_base + style_offset
}

/// Seventh that suits the chord: major seventh except on a dominant or non-major chord
fn seventh(quality: ChordQuality, dominant: bool) -> u8 {
    match quality {
        ChordQuality::Major if !dominant => 11,
        _ => 10,
    }
}

/// Interval stack for one chord: resolved triad, authored extensions, then
/// style colour, power chords and root doubling.
fn chord_stack(quality: ChordQuality, extensions: &[String], dominant: bool, style: Style, instrument: Instrument, intensity: f64, complexity: f64) -> Vec<u8> {
    let mut intervals = chord_intervals(quality, extensions);

    match style {
        Style::Jazz => {
            if complexity > 0.45 {
                intervals.push(seventh(quality, dominant));
            }
            if complexity > 0.7 {
                intervals.push(14);
            }
        }
        Style::Pop | Style::Ballad if complexity > 0.8 => intervals.push(14),
        Style::Funk if complexity > 0.5 => intervals.push(10),
        Style::HipHop if complexity > 0.55 => intervals.push(seventh(quality, dominant)),
        _ => {}
    }

    if style == Style::Rock && instrument == Instrument::Guitar && complexity < 0.5 {
        intervals = vec![0, quality.fifth(), 12];
    }
    if intensity > 0.7 && instrument != Instrument::Guitar {
        intervals.push(12);
    }

    intervals.sort_unstable();
    intervals.dedup();
    intervals
}

/// Candidate hit offsets within a span, quantized and thinned by complexity.
fn hit_offsets(recipe: &HitRecipe, duration: f64, bar: f64, stride: f64, step: f64, complexity: f64) -> Vec<f64> {
    let mut offsets = Vec::new();
    let mut cycle = 0.0;
    while cycle < duration {
        for &pulse in recipe.offsets {
            let within_bar = pulse * stride;
            if within_bar >= bar {
                continue;
            }
            let offset = quantize(cycle + within_bar, step);
            if offset < duration - 1e-9 {
                offsets.push(offset);
            }
        }
        cycle += bar;
    }
    offsets.sort_by(f64::total_cmp);
    offsets.dedup();
    if offsets.is_empty() {
        offsets.push(0.0);
    }

    // Evenly spaced subset
    let n = offsets.len();
    let keep = ((n as f64 * complexity).round() as usize).clamp(1, n);
    (0..keep).map(|i| offsets[i * n / keep]).collect()
}

fn guitar_voices(complexity: f64) -> usize {
    if complexity < 0.35 {
        1
    } else if complexity < 0.7 {
        2
    } else {
        3
    }
}

pub(super) fn generate(ctx: &GenerationContext<'_>, instrument: Instrument, range: PitchRange) -> Vec<StudioNote> {
    let meter = ctx.timeline.meter;
    let bar = meter.beats_per_bar();
    let stride = meter.pulse_stride();
    let step = meter.grid_step();
    let settings = ctx.settings;
    let recipe = hit_recipe(settings.style, instrument);
    let velocity = scaled_velocity(base_velocity(settings.style, instrument), settings.intensity, VELOCITY_RANGE);

    let (notes, _) = ctx
        .timeline
        .spans
        .iter()
        .fold((Vec::new(), range.midpoint()), |(mut notes, anchor), span| {
            let chord = span.chord;
            let quality = resolve_quality(chord, ctx.diatonic);
            let dominant = ctx.diatonic.degree_of(chord.root_pitch_class()) == Some(DOMINANT_DEGREE);
            let intervals = chord_stack(
                quality,
                &chord.extensions,
                dominant,
                settings.style,
                instrument,
                settings.intensity,
                settings.complexity,
            );

            let mut voicing = voice_chord(chord.root_pitch_class(), &intervals, range, anchor);
            let next_anchor = voicing.first().copied().unwrap_or(anchor);

            if instrument == Instrument::Guitar {
                voicing.truncate(guitar_voices(settings.complexity));
            }
            if let (Instrument::Piano, Some(slash), Some(lowest)) =
                (instrument, chord.slash_pitch_class(), voicing.iter().min().copied())
            {
                let below = (lowest - slash as i32).rem_euclid(12);
                voicing.insert(0, lowest - if below == 0 { 12 } else { below });
            }

            let offsets = hit_offsets(&recipe, span.duration, bar, stride, step, settings.complexity);
            for (i, &offset) in offsets.iter().enumerate() {
                let next = offsets.get(i + 1).copied().unwrap_or(span.duration);
                let length = (recipe.length * stride).min(next - offset);
                for &pitch in &voicing {
                    notes.push(StudioNote::new(span.start_beat + offset, length, pitch, velocity));
                }
            }

            (notes, next_anchor)
        });
    notes
}
