//! Flattening of the arrangement into one chronological chord timeline

use crate::chord::ChordEvent;
use crate::meter::Meter;
use crate::project::Section;

/// Shortest span the builder will emit, in beats
pub const MIN_SPAN_BEATS: f64 = 0.25;

/// A chord's resolved position on the song timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordSpan<'a> {
    pub chord: &'a ChordEvent,
    /// Absolute beat from the start of the arrangement
    pub start_beat: f64,
    pub duration: f64,
}

impl ChordSpan<'_> {
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration
    }
}

/// Chord spans for a whole arrangement, sorted by start beat
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    pub spans: Vec<ChordSpan<'a>>,
    pub total_bars: u32,
    pub meter: Meter,
    /// Number of sections that went into the timeline
    pub section_count: usize,
}

impl Timeline<'_> {
    pub fn beats_per_bar(&self) -> f64 {
        self.meter.beats_per_bar()
    }

    pub fn length_beats(&self) -> f64 {
        self.total_bars as f64 * self.beats_per_bar()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Build the chord timeline for sections already in playback order.
///
/// Spans are sorted by start beat (ties keep encounter order). Each span is cut
/// short at the next span's start, or at the end of the arrangement for the
/// last one, but never below [`MIN_SPAN_BEATS`]; a chord squeezed closer than
/// that to its neighbour may overlap it slightly.
pub fn build_timeline<'a>(sections: &[&'a Section], meter: Meter) -> Timeline<'a> {
    let beats_per_bar = meter.beats_per_bar();
    let mut spans: Vec<ChordSpan<'a>> = Vec::new();
    let mut section_start_bar: u64 = 0;

    for section in sections {
        for chord in section.playable_chords() {
            let offset = if chord.beat_offset.is_finite() { chord.beat_offset.max(0.0) } else { 0.0 };
            let start_beat = (section_start_bar + chord.bar_index as u64) as f64 * beats_per_bar + offset;
            spans.push(ChordSpan {
                chord,
                start_beat,
                duration: chord.playable_duration(),
            });
        }
        section_start_bar += section.bars as u64;
    }

    let total_bars = section_start_bar.clamp(1, u32::MAX as u64) as u32;
    let timeline_end = total_bars as f64 * beats_per_bar;

    // sort_by is stable, so simultaneous chords keep their encounter order
    spans.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));

    for i in 0..spans.len() {
        let next_start = spans.get(i + 1).map_or(timeline_end, |next| next.start_beat);
        let max_duration = (next_start - spans[i].start_beat).max(MIN_SPAN_BEATS);
        spans[i].duration = spans[i].duration.min(max_duration);
    }

    tracing::debug!(
        spans = spans.len(),
        total_bars,
        sections = sections.len(),
        "built chord timeline"
    );

    Timeline {
        spans,
        total_bars,
        meter,
        section_count: sections.len(),
    }
}
