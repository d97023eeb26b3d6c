//! songsmith: command-line front end for the arrangement engine

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use songsmith_core::{
    ChordEvent, ChordSymbol, DrumPreset, GenerationSettings, Instrument, Meter, Project, Style,
    analyze_progression, build_timeline, suggest_next, theory,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{CliConfig, load_config};

/// Songsmith - chord arrangements into band parts
#[derive(Parser)]
#[command(name = "songsmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project document (JSON)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Project(ProjectCommand),

    /// Parse a chord symbol and print its intervals
    Chord {
        symbol: String,
    },
}

/// Commands that read a project document
#[derive(Subcommand)]
enum ProjectCommand {
    /// Print the flattened chord timeline of the arrangement
    Timeline,

    /// Report how much of the progression is diatonic to the song key
    Analyze {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest chords to follow the last chord of the arrangement
    Suggest {
        /// Suggest after this chord instead, e.g. "Am7"
        #[arg(long)]
        after: Option<String>,
    },

    /// Move the song to a new key, transposing every chord
    Transpose {
        /// New key root, e.g. "Eb"
        #[arg(long)]
        to: String,

        /// Write the updated project here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Switch the song to a new time signature
    Meter {
        /// New meter, e.g. "6/8"
        #[arg(long)]
        to: Meter,

        /// Write the updated project here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Regenerate the notes of every track
    Generate {
        #[arg(long)]
        style: Option<Style>,

        /// 0..1, louder and longer notes
        #[arg(long)]
        intensity: Option<f64>,

        /// 0..1, busier parts and richer harmony
        #[arg(long)]
        complexity: Option<f64>,

        /// Pattern for drum tracks
        #[arg(long)]
        drum_preset: Option<DrumPreset>,

        /// Write the updated project here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let config = load_config();
    init_logging(&config);

    let cli = Cli::parse();

    match cli.command {
        Commands::Chord { symbol } => print_chord(&symbol),
        Commands::Project(command) => {
            let path = cli.project.context("no project given; pass --project <PATH>")?;
            let project = load_project(&path)?;
            run(command, project, &config)
        }
    }
}

fn init_logging(config: &CliConfig) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match config.log_filter.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("ignoring log_filter {:?}: {e}", config.log_filter),
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(command: ProjectCommand, mut project: Project, config: &CliConfig) -> anyhow::Result<()> {
    match command {
        ProjectCommand::Timeline => print_timeline(&project),

        ProjectCommand::Analyze { json } => {
            let chords = project.sections.iter().flat_map(|s| &s.chords);
            let analysis = analyze_progression(chords, &project.key.root, project.key.mode);
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!(
                    "{} of {} chords diatonic to {} {} ({:.1}%)",
                    analysis.diatonic_chords,
                    analysis.total_chords,
                    project.key.root,
                    project.key.mode.name(),
                    analysis.diatonic_percentage
                );
            }
        }

        ProjectCommand::Suggest { after } => {
            let last = match after {
                Some(symbol) => Some(
                    ChordEvent::from_symbol(&symbol, 0, 0.0, 1.0)
                        .with_context(|| format!("cannot use {symbol:?} as the previous chord"))?,
                ),
                None => last_chord(&project),
            };
            for suggestion in suggest_next(last.as_ref(), &project.key.root, project.key.mode) {
                println!("{:<6}{}", suggestion.numeral, suggestion.chord.symbol());
            }
        }

        ProjectCommand::Transpose { to, output } => {
            let from = project.key.root.clone();
            project
                .change_key(&to)
                .with_context(|| format!("cannot transpose to {to:?}"))?;
            tracing::info!("Transposed {from} -> {}", project.key.root);
            finish(&project, output.as_deref())?;
        }

        ProjectCommand::Meter { to, output } => {
            let from = project.meter;
            project.change_meter(to);
            tracing::info!("Changed meter {from} -> {to}");
            finish(&project, output.as_deref())?;
        }

        ProjectCommand::Generate {
            style,
            intensity,
            complexity,
            drum_preset,
            output,
        } => {
            let defaults = config.settings();
            let settings = GenerationSettings::new(
                style.unwrap_or(defaults.style),
                intensity.unwrap_or(defaults.intensity),
                complexity.unwrap_or(defaults.complexity),
            );

            if project.tracks.is_empty() {
                for instrument in Instrument::ALL {
                    project.add_track(instrument, instrument.name());
                }
                tracing::info!("Project had no tracks; added a full band");
            }
            let preset = drum_preset.unwrap_or(config.drum_preset);
            for track in project.tracks.iter_mut().filter(|t| t.instrument == Instrument::Drums) {
                if drum_preset.is_some() || track.notes.is_empty() {
                    track.drum_preset = preset;
                }
            }

            let total = project.regenerate_all(settings);
            tracing::info!(
                "Generated {total} notes ({}, intensity {:.2}, complexity {:.2})",
                settings.style.name(),
                settings.intensity,
                settings.complexity
            );
            for track in &project.tracks {
                println!("{:<8}{:>6} notes", track.name, track.notes.len());
            }
            finish(&project, output.as_deref())?;
        }
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_timeline(project: &Project) {
    let sections = project.ordered_sections();
    let timeline = build_timeline(&sections, project.meter);

    println!(
        "{} bars of {} across {} sections",
        timeline.total_bars, timeline.meter, timeline.section_count
    );
    let per_bar = timeline.beats_per_bar();
    for span in &timeline.spans {
        let bar = (span.start_beat / per_bar).floor();
        println!(
            "{:>4}.{:<6.2}{:<10}{:.2} beats",
            bar as u32 + 1,
            span.start_beat - bar * per_bar + 1.0,
            span.chord.symbol(),
            span.duration
        );
    }
}

fn print_chord(symbol: &str) -> anyhow::Result<()> {
    let chord = ChordSymbol::parse(symbol).with_context(|| format!("cannot parse {symbol:?}"))?;
    let intervals = theory::chord_intervals(chord.quality, &chord.extensions);

    println!("root       {}", chord.root);
    println!("quality    {}", chord.quality.name());
    if !chord.extensions.is_empty() {
        println!("extensions {}", chord.extensions.join(" "));
    }
    if let Some(slash) = &chord.slash_root {
        println!("bass       {slash}");
    }
    let listed: Vec<String> = intervals.iter().map(u8::to_string).collect();
    println!("intervals  {}", listed.join(" "));
    Ok(())
}

/// Last chord in playback order
fn last_chord(project: &Project) -> Option<ChordEvent> {
    let sections = project.ordered_sections();
    let timeline = build_timeline(&sections, project.meter);
    timeline.spans.last().map(|span| span.chord.clone())
}

// ============================================================================
// Project I/O
// ============================================================================

fn load_project(path: &Path) -> anyhow::Result<Project> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let project: Project =
        serde_json::from_str(&text).with_context(|| format!("parsing project {}", path.display()))?;
    if !project.meter.is_well_formed() {
        bail!("{} has an unusable meter {}", path.display(), project.meter);
    }
    tracing::info!("Loaded {:?} ({} sections, {} tracks)", project.name, project.sections.len(), project.tracks.len());
    Ok(project)
}

fn finish(project: &Project, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let text = serde_json::to_string_pretty(project)?;
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => tracing::info!("No --output given; project left unchanged on disk"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_needs_no_project() {
        let cli = Cli::try_parse_from(["songsmith", "chord", "Am7/G"]).unwrap();
        assert!(cli.project.is_none());
        assert!(matches!(cli.command, Commands::Chord { symbol } if symbol == "Am7/G"));
    }

    #[test]
    fn test_project_commands_parse_flat() {
        let cli = Cli::try_parse_from(["songsmith", "meter", "--to", "6/8", "--project", "song.json"]).unwrap();
        assert_eq!(cli.project.as_deref(), Some(Path::new("song.json")));
        match cli.command {
            Commands::Project(ProjectCommand::Meter { to, output }) => {
                assert_eq!(to, Meter::new(6, 8));
                assert!(output.is_none());
            }
            _ => panic!("meter did not parse as a project command"),
        }
    }

    #[test]
    fn test_generate_flags_parse() {
        let cli = Cli::try_parse_from(["songsmith", "generate", "--style", "jazz", "--complexity", "0.8"]).unwrap();
        match cli.command {
            Commands::Project(ProjectCommand::Generate { style, intensity, complexity, .. }) => {
                assert_eq!(style, Some(Style::Jazz));
                assert_eq!(intensity, None);
                assert_eq!(complexity, Some(0.8));
            }
            _ => panic!("generate did not parse as a project command"),
        }
    }

    #[test]
    fn test_bad_meter_is_rejected() {
        assert!(Cli::try_parse_from(["songsmith", "meter", "--to", "5/3"]).is_err());
    }
}
