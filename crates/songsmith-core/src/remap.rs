//! Structural remaps that keep chord data consistent after a meter or key edit
//!
//! Both operate in place on every section reachable from the project and
//! assume exclusive access for the duration of the call.

use crate::meter::Meter;
use crate::project::Project;
use crate::theory::{self, key_spelling};

/// Keeps a converted offset strictly inside its bar
const BAR_EPSILON: f64 = 1e-4;

/// Re-grid every chord under a new time signature, preserving absolute timing.
///
/// Positions are converted through whole-note time: a chord at 4/4 bar 1 beat 0
/// lands at 3/4 bar 1 beat 1. Durations are clipped to the room left in the new
/// bar, and section lengths grow to hold the content they had before.
/// No-op when the meters match or either one is malformed.
pub fn remap_meter(project: &mut Project, old: Meter, new: Meter) {
    if old == new || !old.is_well_formed() || !new.is_well_formed() {
        return;
    }

    let old_unit = old.beat_unit();
    let new_unit = new.beat_unit();
    let old_bpb = old.top as f64;
    let new_bpb = new.top as f64;
    let min_duration = 0.25f64.min(new_bpb);

    let mut chords_moved = 0usize;
    for id in project.reachable_section_ids() {
        let Some(section) = project.section_mut(id) else {
            continue;
        };

        let mut max_end = 0.0f64;
        for chord in &mut section.chords {
            let old_offset = if chord.beat_offset.is_finite() { chord.beat_offset.max(0.0) } else { 0.0 };
            let old_duration = if chord.duration.is_finite() { chord.duration.max(0.0) } else { 0.0 };

            let absolute_start = (chord.bar_index as f64 * old_bpb + old_offset) * old_unit;
            let absolute_end = absolute_start + old_duration * old_unit;
            max_end = max_end.max(absolute_end);

            let new_position = absolute_start / new_unit;
            let new_bar = (new_position / new_bpb).floor().max(0.0);
            let new_offset = (new_position - new_bar * new_bpb).clamp(0.0, new_bpb - BAR_EPSILON);

            let available = new_bpb - new_offset;
            let mut new_duration = (old_duration * old_unit / new_unit).min(available);
            if new_duration < min_duration {
                new_duration = if available >= min_duration { min_duration } else { available };
            }

            chord.bar_index = new_bar.min(u32::MAX as f64) as u32;
            chord.beat_offset = new_offset;
            chord.duration = new_duration;
            chords_moved += 1;
        }

        let old_section_length = section.bars.max(1) as f64 * old_bpb * old_unit;
        let content_length = old_section_length.max(max_end);
        // Tolerance keeps exact fits (e.g. 4.000000001 bars) from gaining a bar
        let bars_needed = (content_length / new_unit / new_bpb - 1e-9).ceil();
        section.bars = bars_needed.clamp(1.0, u32::MAX as f64) as u32;
    }

    for recording in &mut project.recordings {
        recording.meter = new;
    }

    tracing::debug!(%old, %new, chords = chords_moved, "remapped meter");
}

/// Transpose every chord root and slash root from one key root to another.
///
/// The interval is the shortest way round the circle (C to A is down three, not
/// up nine). Rests, qualities, extensions and timing are untouched. Spelling
/// follows the target key; C/Am use a fixed chromatic spelling.
pub fn remap_key(project: &mut Project, old_root: &str, new_root: &str) {
    let interval = theory::semitone_interval(theory::pitch_class(old_root), theory::pitch_class(new_root));
    if interval == 0 {
        return;
    }

    let spelling = key_spelling(new_root, project.key.mode);
    let mut transposed = 0usize;

    for id in project.reachable_section_ids() {
        let Some(section) = project.section_mut(id) else {
            continue;
        };
        for chord in section.chords.iter_mut().filter(|c| !c.is_rest()) {
            chord.root = theory::transpose_name(&chord.root, interval, spelling);
            if let Some(slash) = chord.slash_root.as_mut().filter(|s| !s.trim().is_empty()) {
                *slash = theory::transpose_name(slash, interval, spelling);
            }
            transposed += 1;
        }
    }

    tracing::debug!(old_root, new_root, interval, chords = transposed, "remapped key");
}
