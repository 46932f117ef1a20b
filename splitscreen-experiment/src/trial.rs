use chrono::NaiveDateTime;

/// The trial in flight: what has been decided so far and when.
#[derive(Debug, Clone)]
pub struct Trial {
    pub step_idx: usize,
    pub timestamps: TrialTimestamps,
    /// Fields from completed stages, in header order.
    pub judgments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps {
    pub presented: NaiveDateTime,
    /// Set once, when capture opens for the first stage.
    pub capture_open: Option<NaiveDateTime>,
}

impl Trial {
    pub fn new(step_idx: usize, presented: NaiveDateTime) -> Self {
        Self {
            step_idx,
            timestamps: TrialTimestamps {
                presented,
                capture_open: None,
            },
            judgments: Vec::new(),
        }
    }
}
