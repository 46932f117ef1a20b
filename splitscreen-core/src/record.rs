/// One row of the input word list, as handed out by the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRecord {
    stimulus: String,
    alternatives: Vec<String>,
    source_row: usize,
    replica: usize,
}

impl TrialRecord {
    pub fn new(
        stimulus: impl Into<String>,
        alternatives: Vec<String>,
        source_row: usize,
        replica: usize,
    ) -> Self {
        Self {
            stimulus: stimulus.into(),
            alternatives,
            source_row,
            replica,
        }
    }

    /// The word shown to the participant.
    pub fn stimulus(&self) -> &str {
        &self.stimulus
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// 0-based row in the source table.
    pub fn source_row(&self) -> usize {
        self.source_row
    }

    /// Which repetition of the base word list this record belongs to.
    pub fn replica(&self) -> usize {
        self.replica
    }
}
