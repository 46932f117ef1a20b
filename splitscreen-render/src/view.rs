/// What the participant display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParticipantView {
    #[default]
    Blank,
    Stimulus(String),
    Feedback(String),
    Finished,
}

impl ParticipantView {
    /// Single line used as window title when no font is available.
    pub fn caption(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Stimulus(word) => word.clone(),
            Self::Feedback(word) => format!("heard: {word}"),
            Self::Finished => "Thank you!".to_string(),
        }
    }
}

/// What the evaluator display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EvaluatorView {
    #[default]
    Hidden,
    Controls {
        prompt: String,
        labels: Vec<String>,
        unknown: String,
    },
}

impl EvaluatorView {
    pub fn option_count(&self) -> usize {
        match self {
            Self::Hidden => 0,
            Self::Controls { labels, .. } => labels.len(),
        }
    }

    pub fn caption(&self) -> String {
        match self {
            Self::Hidden => "waiting for participant".to_string(),
            Self::Controls { prompt, labels, unknown } => {
                let numbered: Vec<String> = labels
                    .iter()
                    .enumerate()
                    .map(|(i, l)| format!("{}: {l}", i + 1))
                    .collect();
                format!("{prompt} {} | 0: {unknown}", numbered.join(" | "))
            }
        }
    }
}
