//! Project data: section library, arrangement, tracks and recordings
//!
//! Sections and tracks live in flat vectors and are referenced by id, so the
//! arrangement and the structural remaps never need back-pointers.

use serde::{Deserialize, Serialize};

use crate::chord::ChordEvent;
use crate::error::{Result, SongsmithError};
use crate::generate;
use crate::meter::Meter;
use crate::remap;
use crate::style::GenerationSettings;
use crate::theory::{self, ScaleMode};
use crate::track::{Instrument, StudioTrack, TrackId};

/// Unique identifier for sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(pub u64);

/// A reusable block of chords (verse, chorus, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    /// Length in bars (at least one)
    pub bars: u32,
    /// At most one chord per (bar_index, beat_offset)
    pub chords: Vec<ChordEvent>,
}

impl Section {
    pub fn new(id: SectionId, name: impl Into<String>, bars: u32) -> Self {
        Self {
            id,
            name: name.into(),
            bars: bars.max(1),
            chords: Vec::new(),
        }
    }

    pub fn add_chord(&mut self, chord: ChordEvent) {
        self.chords.push(chord);
    }

    /// Chords that sound (rests filtered out)
    pub fn playable_chords(&self) -> impl Iterator<Item = &ChordEvent> {
        self.chords.iter().filter(|c| !c.is_rest())
    }
}

/// Placement of a section in the song order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementItem {
    pub section: SectionId,
    pub order_index: i32,
}

/// A recorded take. Only its meter is touched by songsmith.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub name: String,
    pub meter: Meter,
    #[serde(default)]
    pub length_beats: f64,
}

/// Song key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub root: String,
    #[serde(default)]
    pub mode: ScaleMode,
}

impl Default for Key {
    fn default() -> Self {
        Self {
            root: "C".to_string(),
            mode: ScaleMode::Major,
        }
    }
}

impl Key {
    /// Build a key from user input, rejecting unknown root names
    pub fn validated(root: &str, mode: ScaleMode) -> Result<Self> {
        theory::parse_pitch_class(root).ok_or_else(|| SongsmithError::InvalidKey(root.to_string()))?;
        Ok(Self {
            root: root.trim().to_string(),
            mode,
        })
    }

    pub fn pitch_class(&self) -> u8 {
        theory::pitch_class(&self.root)
    }
}

/// A whole song
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub key: Key,
    #[serde(default)]
    pub meter: Meter,
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Section library
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub arrangement: Vec<ArrangementItem>,
    #[serde(default)]
    pub tracks: Vec<StudioTrack>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
    #[serde(default = "first_id")]
    next_section_id: u64,
    #[serde(default = "first_id")]
    next_track_id: u64,
}

fn default_bpm() -> f64 {
    120.0
}

fn first_id() -> u64 {
    1
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Key::default(),
            meter: Meter::default(),
            bpm: default_bpm(),
            sections: Vec::new(),
            arrangement: Vec::new(),
            tracks: Vec::new(),
            recordings: Vec::new(),
            next_section_id: 1,
            next_track_id: 1,
        }
    }

    // ------------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------------

    /// Add an empty section to the library
    pub fn add_section(&mut self, name: impl Into<String>, bars: u32) -> SectionId {
        // Documents edited by hand may carry ids past the stored counter
        let max_existing = self.sections.iter().map(|s| s.id.0).max().unwrap_or(0);
        let id = SectionId(self.next_section_id.max(max_existing + 1));
        self.next_section_id = id.0 + 1;
        self.sections.push(Section::new(id, name, bars));
        id
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Append a section after the current last arrangement slot
    pub fn append_to_arrangement(&mut self, id: SectionId) -> Result<()> {
        if self.section(id).is_none() {
            return Err(SongsmithError::SectionNotFound(id.0));
        }
        let order_index = self.arrangement.iter().map(|a| a.order_index + 1).max().unwrap_or(0);
        self.arrangement.push(ArrangementItem { section: id, order_index });
        Ok(())
    }

    /// Sections in playback order.
    ///
    /// Items are sorted by `order_index` (ties keep their stored order) and
    /// dangling ids are skipped. An empty arrangement plays the library in order.
    pub fn ordered_sections(&self) -> Vec<&Section> {
        if self.arrangement.is_empty() {
            return self.sections.iter().collect();
        }

        let mut items: Vec<&ArrangementItem> = self.arrangement.iter().collect();
        items.sort_by_key(|item| item.order_index);
        items.into_iter().filter_map(|item| self.section(item.section)).collect()
    }

    /// Every section reachable from the library or the arrangement, each once,
    /// in first-seen order.
    pub fn reachable_section_ids(&self) -> Vec<SectionId> {
        let mut ids: Vec<SectionId> = Vec::with_capacity(self.sections.len());
        let candidates = self
            .sections
            .iter()
            .map(|s| s.id)
            .chain(self.arrangement.iter().map(|a| a.section));
        for id in candidates {
            if !ids.contains(&id) && self.section(id).is_some() {
                ids.push(id);
            }
        }
        ids
    }

    // ------------------------------------------------------------------------
    // Tracks
    // ------------------------------------------------------------------------

    pub fn add_track(&mut self, instrument: Instrument, name: impl Into<String>) -> TrackId {
        let max_existing = self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0);
        let id = TrackId(self.next_track_id.max(max_existing + 1));
        self.next_track_id = id.0 + 1;
        self.tracks.push(StudioTrack::new(id, instrument, name));
        id
    }

    pub fn remove_track(&mut self, id: TrackId) -> Option<StudioTrack> {
        let pos = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(pos))
    }

    pub fn track(&self, id: TrackId) -> Option<&StudioTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut StudioTrack> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    /// Regenerate one track, replacing its whole note set. Returns the note count.
    pub fn regenerate_track(&mut self, id: TrackId, settings: GenerationSettings) -> Result<usize> {
        let track = self.track(id).ok_or(SongsmithError::TrackNotFound(id.0))?;
        let notes = generate::generate_track(self, track, settings);
        let count = notes.len();
        if let Some(track) = self.track_mut(id) {
            track.replace_notes(notes);
        }
        Ok(count)
    }

    /// Regenerate every track with the same settings. Returns the total note count.
    pub fn regenerate_all(&mut self, settings: GenerationSettings) -> usize {
        let generated: Vec<_> = self
            .tracks
            .iter()
            .map(|track| generate::generate_track(self, track, settings))
            .collect();

        let mut total = 0;
        for (track, notes) in self.tracks.iter_mut().zip(generated) {
            total += notes.len();
            track.replace_notes(notes);
        }
        total
    }

    // ------------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------------

    /// Switch the song to a new meter, remapping every chord to keep its timing.
    pub fn change_meter(&mut self, meter: Meter) {
        let old = self.meter;
        remap::remap_meter(self, old, meter);
        if meter.is_well_formed() {
            self.meter = meter;
        }
    }

    /// Move the song to a new key root, transposing every chord with it.
    pub fn change_key(&mut self, root: &str) -> Result<()> {
        let new_key = Key::validated(root, self.key.mode)?;
        let old_root = std::mem::replace(&mut self.key, new_key).root;
        remap::remap_key(self, &old_root, root.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ChordQuality;

    #[test]
    fn test_ordered_sections_sorts_stably() {
        let mut project = Project::new("Song");
        let verse = project.add_section("Verse", 4);
        let chorus = project.add_section("Chorus", 4);
        let bridge = project.add_section("Bridge", 2);

        project.arrangement = vec![
            ArrangementItem { section: chorus, order_index: 2 },
            ArrangementItem { section: verse, order_index: 0 },
            ArrangementItem { section: bridge, order_index: 2 },
            ArrangementItem { section: SectionId(99), order_index: 1 },
        ];

        let names: Vec<&str> = project.ordered_sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Verse", "Chorus", "Bridge"]);
    }

    #[test]
    fn test_empty_arrangement_plays_library() {
        let mut project = Project::new("Song");
        project.add_section("A", 2);
        project.add_section("B", 2);
        assert_eq!(project.ordered_sections().len(), 2);
    }

    #[test]
    fn test_reachable_section_ids_dedup() {
        let mut project = Project::new("Song");
        let a = project.add_section("A", 2);
        let b = project.add_section("B", 2);
        project.append_to_arrangement(b).unwrap();
        project.append_to_arrangement(a).unwrap();
        project.append_to_arrangement(b).unwrap();

        assert_eq!(project.reachable_section_ids(), vec![a, b]);
        assert_eq!(project.arrangement[2].order_index, 2);
    }

    #[test]
    fn test_append_unknown_section_fails() {
        let mut project = Project::new("Song");
        assert!(matches!(
            project.append_to_arrangement(SectionId(7)),
            Err(SongsmithError::SectionNotFound(7))
        ));
    }

    #[test]
    fn test_ids_skip_past_existing() {
        let mut project = Project::new("Song");
        project.sections.push(Section::new(SectionId(10), "Imported", 1));
        let id = project.add_section("New", 1);
        assert_eq!(id, SectionId(11));

        let t1 = project.add_track(Instrument::Bass, "Bass");
        let t2 = project.add_track(Instrument::Drums, "Drums");
        assert_ne!(t1, t2);
        assert!(project.remove_track(t1).is_some());
        assert!(project.track(t1).is_none());
    }

    #[test]
    fn test_change_key_transposes_chords() {
        let mut project = Project::new("Song");
        let id = project.add_section("Verse", 2);
        let section = project.section_mut(id).unwrap();
        section.add_chord(ChordEvent::new(0, 0.0, "C", ChordQuality::Major, 4.0));
        section.add_chord(ChordEvent::new(1, 0.0, "A", ChordQuality::Minor, 4.0));

        project.change_key("D").unwrap();
        assert_eq!(project.key.root, "D");
        let roots: Vec<&str> = project.sections[0].chords.iter().map(|c| c.root.as_str()).collect();
        assert_eq!(roots, vec!["D", "B"]);

        assert!(project.change_key("X").is_err());
        assert_eq!(project.key.root, "D");
    }

    #[test]
    fn test_change_meter_updates_project() {
        let mut project = Project::new("Song");
        project.change_meter(Meter::new(3, 4));
        assert_eq!(project.meter, Meter::new(3, 4));

        project.change_meter(Meter::new(0, 4));
        assert_eq!(project.meter, Meter::new(3, 4));
    }

    #[test]
    fn test_regenerate_unknown_track() {
        let mut project = Project::new("Song");
        let result = project.regenerate_track(TrackId(42), GenerationSettings::default());
        assert!(matches!(result, Err(SongsmithError::TrackNotFound(42))));
    }

    #[test]
    fn test_project_json_defaults() {
        let project: Project = serde_json::from_str(r#"{"name": "Sketch"}"#).unwrap();
        assert_eq!(project.meter, Meter::new(4, 4));
        assert_eq!(project.key.root, "C");
        assert_eq!(project.bpm, 120.0);
        assert!(project.sections.is_empty());
    }
}
