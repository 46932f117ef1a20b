use crate::judgment::BASE_HEADER;
use crate::record::TrialRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted names for the stimulus column, in lookup order.
pub const STIMULUS_COLUMNS: [&str; 2] = ["Word", "Stimulus"];

const SIDES: [&str; 2] = ["left", "right"];
const PAIR_COLUMNS: &[&str] = &["Alternative 1", "Alternative 2"];
const LENGTH_COLUMNS: &[&str] = &["Short", "Long"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown protocol `{0}` (try binary, five-point, word-then-degree or intelligibility)")]
    Unknown(String),

    #[error("{0} needs at least two labels")]
    TooFewLabels(&'static str),
}

/// Experimental protocol run by the evaluator display.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Forced choice between the row's two alternatives.
    #[default]
    Binary,
    /// One of five length judgments, from "too short" to "too long".
    FivePoint,
    /// Pick the short or long form, then how strongly.
    WordThenDegree,
    /// Which word was perceived; the participant is told afterwards.
    Intelligibility,
}

impl Protocol {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::FivePoint => "five-point",
            Self::WordThenDegree => "word-then-degree",
            Self::Intelligibility => "intelligibility",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "binary" => Ok(Self::Binary),
            "five-point" | "likert" => Ok(Self::FivePoint),
            "word-then-degree" | "two-stage" => Ok(Self::WordThenDegree),
            "intelligibility" => Ok(Self::Intelligibility),
            _ => Err(ProtocolError::Unknown(s.to_string())),
        }
    }
}

/// A human decision for the stage currently open.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// 0-based index into the labels shown for the stage.
    Option(usize),
    /// The evaluator opted out.
    Unknown,
}

/// Label sets that the configuration may override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleLabels {
    pub five_point: Vec<String>,
    pub degrees: Vec<String>,
    pub unknown: String,
}

impl Default for ScaleLabels {
    fn default() -> Self {
        Self {
            five_point: ["too short", "short", "neutral", "long", "too long"]
                .map(String::from)
                .to_vec(),
            degrees: ["slightly", "moderately", "strongly"]
                .map(String::from)
                .to_vec(),
            unknown: "unknown".to_string(),
        }
    }
}

impl ScaleLabels {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.five_point.len() < 2 {
            return Err(ProtocolError::TooFewLabels("five-point scale"));
        }
        if self.degrees.len() < 2 {
            return Err(ProtocolError::TooFewLabels("degree scale"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKind {
    /// The row's two alternatives, shown left and right.
    Sides,
    /// The row's alternatives, recorded by word.
    Alternatives,
    /// A fixed scale of labels.
    Scale(Vec<String>),
    /// The stimulus plus its alternatives in sorted order; records whether the
    /// stimulus was heard.
    Perceived,
}

/// One sub-decision of a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub prompt: String,
    pub kind: StageKind,
    fields: &'static [&'static str],
}

impl Stage {
    fn new(prompt: &str, kind: StageKind, fields: &'static [&'static str]) -> Self {
        Self {
            prompt: prompt.to_string(),
            kind,
            fields,
        }
    }

    /// Output columns produced by this stage.
    pub fn field_names(&self) -> &'static [&'static str] {
        self.fields
    }

    /// What the evaluator gets to pick from for this record.
    pub fn labels(&self, record: &TrialRecord) -> Vec<String> {
        match &self.kind {
            StageKind::Sides | StageKind::Alternatives => record.alternatives().to_vec(),
            StageKind::Scale(labels) => labels.clone(),
            StageKind::Perceived => {
                // Sorted, so the button position never gives the stimulus away.
                let mut labels: Vec<String> = std::iter::once(record.stimulus().to_string())
                    .chain(record.alternatives().iter().cloned())
                    .collect();
                labels.sort();
                labels
            }
        }
    }

    /// Judgment fields for `decision`, or `None` if it names no shown label.
    pub fn resolve(
        &self,
        record: &TrialRecord,
        decision: Decision,
        unknown: &str,
    ) -> Option<Vec<String>> {
        let index = match decision {
            Decision::Unknown => {
                return Some(vec![unknown.to_string(); self.field_names().len()]);
            }
            Decision::Option(index) => index,
        };
        let labels = self.labels(record);
        let label = labels.get(index)?.clone();

        Some(match &self.kind {
            StageKind::Sides => vec![SIDES.get(index)?.to_string(), label],
            StageKind::Alternatives | StageKind::Scale(_) => vec![label],
            StageKind::Perceived => {
                let correct = if label == record.stimulus() { "1" } else { "0" };
                vec![label, correct.to_string()]
            }
        })
    }
}

/// Everything protocol-specific the state machine needs: stages, columns,
/// header, and whether the participant gets feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSchema {
    protocol: Protocol,
    stages: Vec<Stage>,
    alternative_columns: &'static [&'static str],
    feedback: bool,
    unknown: String,
}

impl DecisionSchema {
    pub fn for_protocol(protocol: Protocol, labels: &ScaleLabels) -> Self {
        let (stages, alternative_columns, feedback) = match protocol {
            Protocol::Binary => (
                vec![Stage::new(
                    "Which word was said?",
                    StageKind::Sides,
                    &["side", "selected_word"],
                )],
                PAIR_COLUMNS,
                false,
            ),
            Protocol::FivePoint => (
                vec![Stage::new(
                    "How long did the word sound?",
                    StageKind::Scale(labels.five_point.clone()),
                    &["judgment"],
                )],
                &[][..],
                false,
            ),
            Protocol::WordThenDegree => (
                vec![
                    Stage::new(
                        "Which form was said?",
                        StageKind::Alternatives,
                        &["selected_word"],
                    ),
                    Stage::new(
                        "How clearly?",
                        StageKind::Scale(labels.degrees.clone()),
                        &["degree"],
                    ),
                ],
                LENGTH_COLUMNS,
                false,
            ),
            Protocol::Intelligibility => (
                vec![Stage::new(
                    "Which word did you hear?",
                    StageKind::Perceived,
                    &["perceived_word", "correct"],
                )],
                PAIR_COLUMNS,
                true,
            ),
        };

        Self {
            protocol,
            stages,
            alternative_columns,
            feedback,
            unknown: labels.unknown.clone(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Columns besides the stimulus that the input table must carry.
    pub fn alternative_columns(&self) -> &'static [&'static str] {
        self.alternative_columns
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown
    }

    pub fn header(&self) -> Vec<String> {
        BASE_HEADER
            .iter()
            .chain(self.stages.iter().flat_map(|s| s.field_names().iter()))
            .map(|s| s.to_string())
            .collect()
    }

    /// Text shown to the participant once a trial is judged.
    pub fn feedback_text(&self, judgments: &[String]) -> Option<String> {
        if !self.feedback {
            return None;
        }
        judgments.first().cloned()
    }
}
