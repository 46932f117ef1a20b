use chrono::NaiveDateTime;

/// Timestamps are written the way a wall clock reads, with microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Leading columns shared by every protocol's result file.
pub const BASE_HEADER: [&str; 4] = [
    "step_idx",
    "start_scoring_timestamp",
    "received_score_timestamp",
    "dictated_word",
];

/// One emitted output row. Built when the last decision of a trial arrives,
/// handed to the sink and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentRecord {
    pub step_idx: usize,
    pub decision_start: NaiveDateTime,
    pub decision_received: NaiveDateTime,
    pub stimulus: String,
    pub judgments: Vec<String>,
}

impl JudgmentRecord {
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(BASE_HEADER.len() + self.judgments.len());
        fields.push(self.step_idx.to_string());
        fields.push(self.decision_start.format(TIMESTAMP_FORMAT).to_string());
        fields.push(self.decision_received.format(TIMESTAMP_FORMAT).to_string());
        fields.push(self.stimulus.clone());
        fields.extend(self.judgments.iter().cloned());
        fields
    }

    /// Time the evaluator needed, from controls shown to decision received.
    pub fn scoring_time(&self) -> chrono::TimeDelta {
        self.decision_received - self.decision_start
    }
}
