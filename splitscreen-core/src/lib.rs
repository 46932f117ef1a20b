pub mod judgment;
pub mod protocol;
pub mod record;
pub mod state;

pub use judgment::{BASE_HEADER, JudgmentRecord, TIMESTAMP_FORMAT};
pub use protocol::{
    Decision, DecisionSchema, Protocol, ProtocolError, STIMULUS_COLUMNS, ScaleLabels, Stage,
    StageKind,
};
pub use record::TrialRecord;
pub use state::{SessionOutcome, SessionState};
