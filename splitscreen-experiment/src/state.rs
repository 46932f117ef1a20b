use super::deck::{Advance, TrialDeck};
use super::display::{Capturable, DisplayCoordinator, Presentable, StagePrompt};
use super::error::{DeckError, SessionError};
use super::sink::JudgmentSink;
use super::trial::Trial;
use splitscreen_core::{Decision, DecisionSchema, JudgmentRecord, SessionOutcome, SessionState};
use splitscreen_timing::Timer;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The participant is done with the stimulus (read it, heard it).
    StimulusConsumed,
    /// The evaluator picked something for the open stage.
    Decision(Decision),
    /// The feedback display ran its course.
    FeedbackElapsed,
    /// A window was closed or the session was cancelled.
    CloseRequested,
}

/// What the owning loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not applicable in the current state; nothing changed.
    Ignored,
    Continue,
    /// The session is over; shut down at the top level.
    Terminate(SessionOutcome),
}

/// Drives one trial at a time for any protocol described by a
/// [`DecisionSchema`]: present, open capture, collect one decision per stage,
/// commit, advance.
pub struct TrialStateMachine<T, P, C, K>
where
    T: Timer,
    P: Presentable,
    C: Capturable,
    K: JudgmentSink,
{
    pub schema: DecisionSchema,
    pub deck: TrialDeck,
    pub sink: K,
    pub coordinator: DisplayCoordinator<P, C>,
    pub timer: T,
    state: SessionState,
    current: Option<Trial>,
    completed: usize,
    outcome: Option<SessionOutcome>,
}

impl<T, P, C, K> TrialStateMachine<T, P, C, K>
where
    T: Timer,
    P: Presentable,
    C: Capturable,
    K: JudgmentSink,
{
    pub fn new(
        schema: DecisionSchema,
        deck: TrialDeck,
        sink: K,
        coordinator: DisplayCoordinator<P, C>,
        timer: T,
    ) -> Self {
        Self {
            schema,
            deck,
            sink,
            coordinator,
            timer,
            state: SessionState::Init,
            current: None,
            completed: 0,
            outcome: None,
        }
    }

    /// Presents the first trial. Only valid once, from `Init`.
    pub fn start(&mut self) -> Result<Step, SessionError> {
        if self.state != SessionState::Init {
            return Ok(Step::Ignored);
        }
        info!(
            protocol = %self.schema.protocol(),
            trials = self.deck.len(),
            "session started"
        );
        self.advance(None)
    }

    pub fn handle(&mut self, event: SessionEvent) -> Result<Step, SessionError> {
        if self.state.is_finished() {
            debug!(?event, "session finished, event ignored");
            return Ok(Step::Ignored);
        }

        match (self.state, event) {
            (_, SessionEvent::CloseRequested) => self.abort().map(Step::Terminate),

            (_, SessionEvent::FeedbackElapsed) => Ok(if self.coordinator.feedback_elapsed() {
                debug!("feedback elapsed, stimulus restored");
                Step::Continue
            } else {
                Step::Ignored
            }),

            (SessionState::AwaitingStimulusAck, SessionEvent::StimulusConsumed)
                if self.coordinator.accepts_stimulus_ack() =>
            {
                self.open_capture()
            }

            (state, SessionEvent::Decision(decision)) if state.is_capturing() => {
                self.record_decision(decision)
            }

            (state, event) => {
                debug!(?state, ?event, "event ignored");
                Ok(Step::Ignored)
            }
        }
    }

    /// Ends the session early through the same close path as exhaustion.
    /// Later calls return the first outcome without touching the sink.
    pub fn abort(&mut self) -> Result<SessionOutcome, SessionError> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        let outcome = SessionOutcome::Aborted {
            completed: self.completed,
            total: self.deck.len(),
        };
        warn!(%outcome, "session aborted");
        self.finish(outcome)?;
        Ok(outcome)
    }

    fn open_capture(&mut self) -> Result<Step, SessionError> {
        let now = self.timer.now();
        let prompt = self.prompt(0)?;
        if let Some(trial) = self.current.as_mut() {
            if let Some(previous) = trial.timestamps.capture_open.replace(now) {
                warn!(%previous, "capture reopened for the same trial");
            }
            debug!(
                step = trial.step_idx,
                read_ms = (now - trial.timestamps.presented).num_milliseconds(),
                "capture open"
            );
        }
        self.coordinator.reveal(&prompt);
        self.state = SessionState::AwaitingJudgment;
        Ok(Step::Continue)
    }

    fn record_decision(&mut self, decision: Decision) -> Result<Step, SessionError> {
        let Some(stage) = self.state.stage() else {
            return Ok(Step::Ignored);
        };
        let fields = {
            let record = self.deck.current()?;
            self.schema
                .stage(stage)
                .and_then(|s| s.resolve(record, decision, self.schema.unknown_label()))
        };
        let Some(fields) = fields else {
            warn!(?decision, stage, "decision names no shown option, ignored");
            return Ok(Step::Ignored);
        };
        let Some(trial) = self.current.as_mut() else {
            return Err(DeckError::NotStarted.into());
        };
        trial.judgments.extend(fields);

        if stage + 1 < self.schema.stage_count() {
            let prompt = self.prompt(stage + 1)?;
            self.coordinator.reveal(&prompt);
            self.state = SessionState::AwaitingSecondStageJudgment;
            debug!(stage = stage + 1, "second stage open");
            return Ok(Step::Continue);
        }
        self.commit()
    }

    fn commit(&mut self) -> Result<Step, SessionError> {
        let received = self.timer.now();
        let Some(trial) = self.current.take() else {
            return Err(DeckError::NotStarted.into());
        };
        let record = JudgmentRecord {
            step_idx: trial.step_idx,
            decision_start: trial.timestamps.capture_open.unwrap_or(received),
            decision_received: received,
            stimulus: self.deck.current()?.stimulus().to_string(),
            judgments: trial.judgments,
        };

        if let Err(e) = self.sink.write(&record.fields()) {
            self.fail();
            return Err(e.into());
        }
        self.completed += 1;
        info!(
            step = record.step_idx,
            word = %record.stimulus,
            judgment = %record.judgments.join(", "),
            scoring_ms = record.scoring_time().num_milliseconds(),
            "trial committed"
        );

        let feedback = self.schema.feedback_text(&record.judgments);
        self.coordinator.hide();
        self.advance(feedback)
    }

    fn advance(&mut self, feedback: Option<String>) -> Result<Step, SessionError> {
        let next = match self.deck.advance() {
            Advance::Record(record) => Some(record.stimulus().to_string()),
            Advance::Exhausted => None,
        };
        let Some(stimulus) = next else {
            let outcome = SessionOutcome::Completed {
                trials: self.completed,
            };
            self.finish(outcome)?;
            info!(%outcome, "deck exhausted");
            return Ok(Step::Terminate(outcome));
        };

        let now = self.timer.now();
        let step_idx = self.deck.current_index().unwrap_or_default();
        self.current = Some(Trial::new(step_idx, now));
        match feedback {
            Some(text) => self.coordinator.present_after_feedback(&text, &stimulus, now),
            None => self.coordinator.present(&stimulus),
        }
        self.state = SessionState::AwaitingStimulusAck;
        debug!(step = step_idx, word = %stimulus, "stimulus presented");
        Ok(Step::Continue)
    }

    /// Closes the sink before the session is marked finished.
    fn finish(&mut self, outcome: SessionOutcome) -> Result<(), SessionError> {
        self.coordinator.finish();
        let closed = self.sink.close();
        self.state = SessionState::Finished;
        self.current = None;
        self.outcome = Some(outcome);
        closed.map_err(Into::into)
    }

    /// Fatal I/O: stop taking events and release the file as far as possible.
    fn fail(&mut self) {
        let outcome = SessionOutcome::Aborted {
            completed: self.completed,
            total: self.deck.len(),
        };
        if let Err(e) = self.finish(outcome) {
            warn!(error = %e, "result file could not be closed cleanly");
        }
    }

    fn prompt(&self, stage: usize) -> Result<StagePrompt, SessionError> {
        let record = self.deck.current()?;
        let stage_def = self.schema.stage(stage).ok_or(DeckError::NotStarted)?;
        Ok(StagePrompt {
            stage,
            prompt: stage_def.prompt.clone(),
            labels: stage_def.labels(record),
            unknown_label: self.schema.unknown_label().to_string(),
        })
    }

    /// Time left on the participant feedback, if any is showing.
    pub fn feedback_remaining(&self) -> Option<Duration> {
        if !self.coordinator.feedback_active() {
            return None;
        }
        self.coordinator.feedback_remaining(self.timer.now())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn completed_trials(&self) -> usize {
        self.completed
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.current.as_ref()
    }
}
