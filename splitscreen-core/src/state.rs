/// Where the session currently is. Exactly one is live per run.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Init,
    /// Stimulus is on the participant display; evaluator controls hidden.
    AwaitingStimulusAck,
    /// Capture open for the first (or only) stage.
    AwaitingJudgment,
    /// Capture open for the second stage of a two-stage protocol.
    AwaitingSecondStageJudgment,
    Finished,
}

impl SessionState {
    pub fn is_capturing(&self) -> bool {
        matches!(
            self,
            Self::AwaitingJudgment | Self::AwaitingSecondStageJudgment
        )
    }

    /// 0-based stage awaiting a decision, if capture is open.
    pub fn stage(&self) -> Option<usize> {
        match self {
            Self::AwaitingJudgment => Some(0),
            Self::AwaitingSecondStageJudgment => Some(1),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// How a session ended. The owning loop turns this into a process exit code.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every trial in the deck was judged.
    Completed { trials: usize },
    /// The session was closed before the deck ran out.
    Aborted { completed: usize, total: usize },
}

impl SessionOutcome {
    pub fn completed_trials(&self) -> usize {
        match *self {
            Self::Completed { trials } => trials,
            Self::Aborted { completed, .. } => completed,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    pub fn exit_code(&self, abort_code: i32) -> i32 {
        match self {
            Self::Completed { .. } => 0,
            Self::Aborted { .. } => abort_code,
        }
    }
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { trials } => write!(f, "completed {trials} trials"),
            Self::Aborted { completed, total } => {
                write!(f, "aborted after {completed} of {total} trials")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_only_while_capturing() {
        assert_eq!(SessionState::AwaitingJudgment.stage(), Some(0));
        assert_eq!(SessionState::AwaitingSecondStageJudgment.stage(), Some(1));
        assert_eq!(SessionState::AwaitingStimulusAck.stage(), None);
        assert!(!SessionState::Finished.is_capturing());
    }

    #[test]
    fn abort_exit_code_is_left_to_the_caller() {
        let aborted = SessionOutcome::Aborted {
            completed: 1,
            total: 5,
        };
        assert_eq!(aborted.exit_code(0), 0);
        assert_eq!(aborted.exit_code(3), 3);
        assert_eq!(SessionOutcome::Completed { trials: 5 }.exit_code(3), 0);
        assert_eq!(aborted.to_string(), "aborted after 1 of 5 trials");
    }
}
