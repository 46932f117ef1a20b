use crate::deck::DeckPolicy;
use crate::error::ConfigError;
use serde::Deserialize;
use splitscreen_core::{DecisionSchema, Protocol, ScaleLabels};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a session is parameterized by. Loaded from an optional TOML
/// file; missing keys fall back to `Default`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub protocol: Protocol,
    pub repeat_count: usize,
    pub shuffle_per_replica: bool,
    pub shuffle_overall: bool,
    pub seed: Option<u64>,
    pub feedback_duration_ms: u64,
    pub unknown_label: String,
    pub five_point_labels: Vec<String>,
    pub degree_labels: Vec<String>,
    /// Exit code for a session closed before the deck ran out.
    pub abort_exit_code: i32,
    pub display: DisplayConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let labels = ScaleLabels::default();
        Self {
            protocol: Protocol::Binary,
            repeat_count: 1,
            shuffle_per_replica: false,
            shuffle_overall: false,
            seed: None,
            feedback_duration_ms: 3000,
            unknown_label: labels.unknown,
            five_point_labels: labels.five_point,
            degree_labels: labels.degrees,
            abort_exit_code: 0,
            display: DisplayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// TrueType/OpenType font for on-screen text. Without one, words are
    /// carried in the window titles only.
    pub font_path: Option<PathBuf>,
    pub stimulus_font_px: f32,
    pub control_font_px: f32,
    pub participant_monitor: usize,
    pub evaluator_monitor: usize,
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            stimulus_font_px: 100.0,
            control_font_px: 50.0,
            participant_monitor: 1,
            evaluator_monitor: 0,
            fullscreen: true,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.scale_labels().validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn scale_labels(&self) -> ScaleLabels {
        ScaleLabels {
            five_point: self.five_point_labels.clone(),
            degrees: self.degree_labels.clone(),
            unknown: self.unknown_label.clone(),
        }
    }

    pub fn schema(&self) -> DecisionSchema {
        DecisionSchema::for_protocol(self.protocol, &self.scale_labels())
    }

    pub fn deck_policy(&self) -> DeckPolicy {
        DeckPolicy {
            repeat_count: self.repeat_count,
            shuffle_per_replica: self.shuffle_per_replica,
            shuffle_overall: self.shuffle_overall,
            seed: self.seed,
        }
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }
}
