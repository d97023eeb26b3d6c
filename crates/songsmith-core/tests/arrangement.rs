//! Integration tests for the arrangement engine
//!
//! Exercises the full path from project data through remaps, the timeline and
//! the note generators.

use songsmith_core::{
    ChordEvent, ChordQuality, DrumPreset, GenerationSettings, Instrument, Meter, Project, ScaleMode, Style,
    analyze_progression, build_timeline, diatonic_chords, generate_track,
};

fn chord(bar: u32, offset: f64, root: &str, quality: ChordQuality, duration: f64) -> ChordEvent {
    ChordEvent::new(bar, offset, root, quality, duration)
}

/// Two sections with uneven chord placement, arranged verse-chorus-verse
fn demo_project() -> Project {
    let mut project = Project::new("Demo");

    let verse = project.add_section("Verse", 4);
    let section = project.section_mut(verse).unwrap();
    section.add_chord(chord(0, 0.0, "C", ChordQuality::Major, 4.0));
    section.add_chord(chord(1, 0.0, "A", ChordQuality::Minor, 2.0));
    section.add_chord(chord(1, 2.0, "F", ChordQuality::Major, 6.0).with_slash("A"));
    section.add_chord(chord(2, 3.5, "G", ChordQuality::Major, 0.0).with_extensions(["7"]));
    section.add_chord(chord(3, 1.0, "E", ChordQuality::Minor, 9.0));

    let chorus = project.add_section("Chorus", 2);
    let section = project.section_mut(chorus).unwrap();
    section.add_chord(chord(0, 0.0, "F", ChordQuality::Major, 4.0).with_extensions(["maj7"]));
    section.add_chord(ChordEvent::rest(1, 0.0, 1.0));
    section.add_chord(chord(1, 1.0, "G", ChordQuality::Sus4, 3.0));

    project.append_to_arrangement(verse).unwrap();
    project.append_to_arrangement(chorus).unwrap();
    project.append_to_arrangement(verse).unwrap();
    project
}

fn full_band(project: &mut Project) {
    for instrument in Instrument::ALL {
        project.add_track(instrument, instrument.name());
    }
}

#[test]
fn test_spans_do_not_overlap() {
    for meter in [Meter::new(4, 4), Meter::new(3, 4), Meter::new(6, 8), Meter::new(7, 8)] {
        let mut project = demo_project();
        project.change_meter(meter);

        let sections = project.ordered_sections();
        let timeline = build_timeline(&sections, project.meter);
        assert_eq!(timeline.section_count, 3);

        for pair in timeline.spans.windows(2) {
            assert!(pair[0].start_beat <= pair[1].start_beat);
            assert!(
                pair[0].end_beat() <= pair[1].start_beat + 1e-6,
                "span at {} overlaps the next in {meter}",
                pair[0].start_beat
            );
        }
        let last = timeline.spans.last().unwrap();
        assert!(last.end_beat() <= timeline.length_beats() + 1e-6);
    }
}

#[test]
fn test_meter_round_trip() {
    let pairs = [
        (Meter::new(4, 4), Meter::new(3, 4)),
        (Meter::new(4, 4), Meter::new(6, 8)),
        (Meter::new(4, 4), Meter::new(7, 8)),
        (Meter::new(3, 4), Meter::new(12, 8)),
    ];

    for (a, b) in pairs {
        let mut project = demo_project();
        project.change_meter(a);
        let before: Vec<ChordEvent> = project.sections.iter().flat_map(|s| s.chords.clone()).collect();

        project.change_meter(b);
        for chord in project.sections.iter().flat_map(|s| &s.chords) {
            assert!(chord.beat_offset >= 0.0);
            assert!(chord.beat_offset < b.beats_per_bar());
            assert!(chord.duration > 0.0);
        }

        project.change_meter(a);
        let after: Vec<&ChordEvent> = project.sections.iter().flat_map(|s| &s.chords).collect();
        for (original, restored) in before.iter().zip(after) {
            assert_eq!(original.bar_index, restored.bar_index, "{a} -> {b} -> {a}");
            assert!((original.beat_offset - restored.beat_offset).abs() <= a.grid_step());
            assert!(restored.duration > 0.0);
        }
    }
}

#[test]
fn test_meter_change_scenario() {
    let mut project = Project::new("Waltz");
    let id = project.add_section("Verse", 1);
    project.section_mut(id).unwrap().add_chord(chord(0, 0.0, "C", ChordQuality::Major, 4.0));
    project.append_to_arrangement(id).unwrap();

    project.change_meter(Meter::new(3, 4));

    let section = project.section(id).unwrap();
    let c = &section.chords[0];
    assert_eq!((c.bar_index, c.beat_offset, c.duration), (0, 0.0, 3.0));
    assert!(section.bars >= 2);
}

#[test]
fn test_zero_interval_key_change_is_noop() {
    let mut project = demo_project();
    let before = serde_json::to_value(&project).unwrap();
    project.change_key("C").unwrap();
    assert_eq!(serde_json::to_value(&project).unwrap(), before);
}

#[test]
fn test_transposition_round_trip() {
    for target in ["D", "Eb", "F#", "Ab", "B", "G"] {
        let mut project = demo_project();
        let bridge = project.add_section("Bridge", 2);
        let section = project.section_mut(bridge).unwrap();
        section.add_chord(chord(0, 0.0, "Bb", ChordQuality::Major, 2.0));
        section.add_chord(chord(0, 2.0, "Ab", ChordQuality::Major, 2.0));
        section.add_chord(chord(1, 0.0, "F", ChordQuality::Major, 2.0).with_slash("Eb"));
        section.add_chord(chord(1, 2.0, "F#", ChordQuality::Diminished, 2.0).with_slash("Db"));
        project.append_to_arrangement(bridge).unwrap();

        let before: Vec<(String, Option<String>)> = project
            .sections
            .iter()
            .flat_map(|s| &s.chords)
            .map(|c| (c.root.clone(), c.slash_root.clone()))
            .collect();

        project.change_key(target).unwrap();
        project.change_key("C").unwrap();

        let after: Vec<(String, Option<String>)> = project
            .sections
            .iter()
            .flat_map(|s| &s.chords)
            .map(|c| (c.root.clone(), c.slash_root.clone()))
            .collect();
        assert_eq!(before, after, "C -> {target} -> C");
    }
}

#[test]
fn test_diatonic_percentage_bounds() {
    let project = demo_project();
    let chords: Vec<&ChordEvent> = project.sections.iter().flat_map(|s| &s.chords).collect();
    for mode in [ScaleMode::Major, ScaleMode::Minor] {
        for key in ["C", "G", "Bb", "F#"] {
            let analysis = analyze_progression(chords.iter().copied(), key, mode);
            assert!((0.0..=100.0).contains(&analysis.diatonic_percentage));
            assert_eq!(analysis.total_chords, 7);
        }
    }

    for mode in [ScaleMode::Major, ScaleMode::Minor] {
        let diatonic: Vec<ChordEvent> = diatonic_chords("Eb", mode)
            .into_iter()
            .enumerate()
            .map(|(i, d)| chord(i as u32, 0.0, &d.root, d.quality, 4.0))
            .collect();
        let analysis = analyze_progression(&diatonic, "Eb", mode);
        assert_eq!(analysis.diatonic_percentage, 100.0);
    }
}

#[test]
fn test_c_major_progression_scenario() {
    let mut project = Project::new("Scenario");
    let id = project.add_section("Verse", 4);
    let section = project.section_mut(id).unwrap();
    section.add_chord(chord(0, 0.0, "C", ChordQuality::Major, 4.0));
    section.add_chord(chord(1, 0.0, "A", ChordQuality::Minor, 4.0));

    let analysis = analyze_progression(&project.section(id).unwrap().chords, "C", ScaleMode::Major);
    assert_eq!(analysis.total_chords, 2);
    assert_eq!(analysis.diatonic_percentage, 100.0);
}

#[test]
fn test_generated_notes_stay_in_midi_range() {
    let extremes = [(0.0, 0.0), (1.0, 1.0), (-5.0, 9.0), (f64::NAN, f64::INFINITY)];

    for style in Style::ALL {
        for (intensity, complexity) in extremes {
            for octave_shift in [-10, 0, 10] {
                let mut project = demo_project();
                full_band(&mut project);
                for track in &mut project.tracks {
                    track.octave_shift = octave_shift;
                    track.drum_preset = DrumPreset::Trap;
                }
                project.regenerate_all(GenerationSettings::new(style, intensity, complexity));

                for track in &project.tracks {
                    assert!(!track.notes.is_empty(), "{} is silent", track.name);
                    for note in &track.notes {
                        assert!(note.pitch <= 127, "{} pitch {} out of range", track.name, note.pitch);
                        assert!((1..=127).contains(&note.velocity));
                        assert!(note.start_beat >= 0.0);
                        assert!(note.duration > 0.0);
                    }
                }
            }
        }
    }
}

#[test]
fn test_generation_is_deterministic() {
    let mut project = demo_project();
    full_band(&mut project);
    let settings = GenerationSettings::new(Style::Jazz, 0.65, 0.8);

    for track in &project.tracks {
        let first = generate_track(&project, track, settings);
        let second = generate_track(&project, track, settings);
        assert_eq!(first, second, "{} differs between runs", track.name);
    }
}

#[test]
fn test_bass_edm_scenario() {
    let mut project = Project::new("Club");
    let id = project.add_section("Drop", 1);
    project.section_mut(id).unwrap().add_chord(chord(0, 0.0, "A", ChordQuality::Minor, 4.0));
    project.append_to_arrangement(id).unwrap();
    let bass = project.add_track(Instrument::Bass, "Bass");

    project.regenerate_track(bass, GenerationSettings::new(Style::Edm, 0.5, 0.6)).unwrap();
    let starts: Vec<f64> = project.track(bass).unwrap().notes.iter().map(|n| n.start_beat).collect();
    assert_eq!(starts, vec![0.0, 1.0, 2.0, 3.0]);

    project.regenerate_track(bass, GenerationSettings::new(Style::Edm, 0.5, 0.3)).unwrap();
    assert_eq!(project.track(bass).unwrap().notes.len(), 1);
}

#[test]
fn test_project_document_round_trip() {
    let mut project = demo_project();
    full_band(&mut project);
    project.regenerate_all(GenerationSettings::default());

    let json = serde_json::to_string(&project).unwrap();
    let restored: Project = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.tracks.len(), project.tracks.len());
    assert_eq!(restored.tracks[1].notes, project.tracks[1].notes);
    assert_eq!(restored.ordered_sections().len(), 3);
}
