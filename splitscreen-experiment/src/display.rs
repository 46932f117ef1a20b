use chrono::NaiveDateTime;
use std::time::Duration;

/// What the evaluator is asked for in one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub stage: usize,
    pub prompt: String,
    pub labels: Vec<String>,
    pub unknown_label: String,
}

/// The participant-facing surface.
pub trait Presentable {
    fn show_stimulus(&mut self, text: &str);
    fn show_feedback(&mut self, text: &str);
    fn show_finished(&mut self);
}

/// The evaluator-facing surface.
pub trait Capturable {
    fn reveal_controls(&mut self, prompt: &StagePrompt);
    fn hide_controls(&mut self);
}

/// Routes show/hide calls between the two surfaces so neither needs to know
/// about the other.
///
/// Evaluator controls are only visible while capture is open. Feedback is
/// time-boxed: the stimulus it replaced comes back on `feedback_elapsed`.
#[derive(Debug)]
pub struct DisplayCoordinator<P: Presentable, C: Capturable> {
    participant: P,
    evaluator: C,
    feedback_duration: Duration,
    feedback_started: Option<NaiveDateTime>,
    pending_stimulus: Option<String>,
    controls_visible: bool,
}

impl<P: Presentable, C: Capturable> DisplayCoordinator<P, C> {
    pub fn new(participant: P, evaluator: C, feedback_duration: Duration) -> Self {
        Self {
            participant,
            evaluator,
            feedback_duration,
            feedback_started: None,
            pending_stimulus: None,
            controls_visible: false,
        }
    }

    pub fn present(&mut self, stimulus: &str) {
        self.hide();
        self.feedback_started = None;
        self.pending_stimulus = None;
        self.participant.show_stimulus(stimulus);
    }

    pub fn present_after_feedback(&mut self, feedback: &str, stimulus: &str, now: NaiveDateTime) {
        self.hide();
        self.feedback_started = Some(now);
        self.pending_stimulus = Some(stimulus.to_string());
        self.participant.show_feedback(feedback);
        tracing::debug!(feedback, ms = self.feedback_duration.as_millis() as u64, "feedback shown");
    }

    pub fn reveal(&mut self, prompt: &StagePrompt) {
        self.controls_visible = true;
        self.evaluator.reveal_controls(prompt);
    }

    pub fn hide(&mut self) {
        if self.controls_visible {
            self.controls_visible = false;
            self.evaluator.hide_controls();
        }
    }

    pub fn finish(&mut self) {
        self.hide();
        self.feedback_started = None;
        self.pending_stimulus = None;
        self.participant.show_finished();
    }

    pub fn feedback_active(&self) -> bool {
        self.feedback_started.is_some()
    }

    /// Time left on the feedback display, `Some(ZERO)` once it is due.
    pub fn feedback_remaining(&self, now: NaiveDateTime) -> Option<Duration> {
        let started = self.feedback_started?;
        let shown = (now - started).to_std().unwrap_or(Duration::ZERO);
        Some(self.feedback_duration.saturating_sub(shown))
    }

    /// Puts the pending stimulus back. Returns false when no feedback was up.
    pub fn feedback_elapsed(&mut self) -> bool {
        if self.feedback_started.take().is_none() {
            return false;
        }
        if let Some(stimulus) = self.pending_stimulus.take() {
            self.participant.show_stimulus(&stimulus);
        }
        true
    }

    pub fn accepts_stimulus_ack(&self) -> bool {
        !self.controls_visible && !self.feedback_active()
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn participant(&self) -> &P {
        &self.participant
    }

    pub fn evaluator(&self) -> &C {
        &self.evaluator
    }

    pub fn participant_mut(&mut self) -> &mut P {
        &mut self.participant
    }

    pub fn evaluator_mut(&mut self) -> &mut C {
        &mut self.evaluator
    }
}

/// Both surfaces at once, reported through `tracing`. Used by headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggedDisplay;

impl Presentable for LoggedDisplay {
    fn show_stimulus(&mut self, text: &str) {
        tracing::info!(target: "participant", "stimulus: {text}");
    }
    fn show_feedback(&mut self, text: &str) {
        tracing::info!(target: "participant", "feedback: {text}");
    }
    fn show_finished(&mut self) {
        tracing::info!(target: "participant", "finished");
    }
}

impl Capturable for LoggedDisplay {
    fn reveal_controls(&mut self, prompt: &StagePrompt) {
        tracing::info!(
            target: "evaluator",
            "{} [{}] or {}",
            prompt.prompt,
            prompt.labels.join(" | "),
            prompt.unknown_label
        );
    }
    fn hide_controls(&mut self) {
        tracing::debug!(target: "evaluator", "controls hidden");
    }
}
