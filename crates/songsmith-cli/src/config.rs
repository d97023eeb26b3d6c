use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use songsmith_core::{DrumPreset, GenerationSettings, Style};

/// User defaults read from `config.toml`; command-line flags win over these
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub style: Style,
    pub intensity: f64,
    pub complexity: f64,
    pub drum_preset: DrumPreset,
    /// Extra `EnvFilter` directive, e.g. `songsmith_core=debug`
    pub log_filter: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        let settings = GenerationSettings::default();
        Self {
            style: settings.style,
            intensity: settings.intensity,
            complexity: settings.complexity,
            drum_preset: DrumPreset::default(),
            log_filter: "songsmith=info".to_string(),
        }
    }
}

impl CliConfig {
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings::new(self.style, self.intensity, self.complexity)
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("songsmith")
        .join("config.toml")
}

pub(crate) fn load_config() -> CliConfig {
    std::fs::read_to_string(config_path())
        .ok()
        .and_then(|s| parse_config(&s))
        .unwrap_or_default()
}

fn parse_config(s: &str) -> Option<CliConfig> {
    toml::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("style = \"jazz\"\ncomplexity = 0.9\n").unwrap();
        assert_eq!(config.style, Style::Jazz);
        assert_eq!(config.complexity, 0.9);
        assert_eq!(config.intensity, 0.5);
        assert_eq!(config.drum_preset, DrumPreset::default());
        assert_eq!(config.log_filter, "songsmith=info");
    }

    #[test]
    fn test_malformed_config_is_rejected() {
        assert!(parse_config("style = [1, 2").is_none());
        assert!(parse_config("style = \"polka\"").is_none());
    }

    #[test]
    fn test_settings_are_sanitized() {
        let config = CliConfig {
            intensity: 4.0,
            complexity: f64::NAN,
            ..CliConfig::default()
        };
        let settings = config.settings();
        assert_eq!(settings.intensity, 1.0);
        assert_eq!(settings.complexity, 0.5);
    }

    #[test]
    fn test_config_lives_under_songsmith() {
        let path = config_path();
        assert!(path.ends_with("songsmith/config.toml"));
    }
}
