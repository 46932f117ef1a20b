use splitscreen_core::Decision;
use splitscreen_experiment::{Capturable, Presentable, StagePrompt};
use splitscreen_render::{EvaluatorLayout, EvaluatorView, ParticipantView};

/// Participant window contents. The window repaints when `take_dirty` says so.
#[derive(Debug, Default)]
pub struct ParticipantScreen {
    view: ParticipantView,
    dirty: bool,
}

impl ParticipantScreen {
    pub fn view(&self) -> &ParticipantView {
        &self.view
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set(&mut self, view: ParticipantView) {
        self.view = view;
        self.dirty = true;
    }
}

impl Presentable for ParticipantScreen {
    fn show_stimulus(&mut self, text: &str) {
        self.set(ParticipantView::Stimulus(text.to_string()));
    }
    fn show_feedback(&mut self, text: &str) {
        self.set(ParticipantView::Feedback(text.to_string()));
    }
    fn show_finished(&mut self) {
        self.set(ParticipantView::Finished);
    }
}

#[derive(Debug, Default)]
pub struct EvaluatorScreen {
    view: EvaluatorView,
    dirty: bool,
}

impl EvaluatorScreen {
    pub fn view(&self) -> &EvaluatorView {
        &self.view
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Maps a click to a decision using the controls held right now, which
    /// may be newer than the last frame drawn.
    pub fn hit_test(&self, width: u32, height: u32, x: f32, y: f32) -> Option<Decision> {
        if self.view == EvaluatorView::Hidden {
            return None;
        }
        EvaluatorLayout::new(width, height, self.view.option_count()).hit_test(x, y)
    }
}

impl Capturable for EvaluatorScreen {
    fn reveal_controls(&mut self, prompt: &StagePrompt) {
        self.view = EvaluatorView::Controls {
            prompt: prompt.prompt.clone(),
            labels: prompt.labels.clone(),
            unknown: prompt.unknown_label.clone(),
        };
        self.dirty = true;
    }
    fn hide_controls(&mut self) {
        self.view = EvaluatorView::Hidden;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_changes_mark_dirty_once() {
        let mut screen = ParticipantScreen::default();
        assert!(!screen.take_dirty());

        screen.show_stimulus("tuli");
        assert_eq!(screen.view(), &ParticipantView::Stimulus("tuli".into()));
        assert!(screen.take_dirty());
        assert!(!screen.take_dirty());

        screen.show_feedback("tuuli");
        screen.show_finished();
        assert_eq!(screen.view(), &ParticipantView::Finished);
        assert!(screen.take_dirty());
    }

    #[test]
    fn evaluator_mirrors_the_stage_prompt() {
        let mut screen = EvaluatorScreen::default();
        screen.reveal_controls(&StagePrompt {
            stage: 1,
            prompt: "How strongly?".into(),
            labels: vec!["slightly".into(), "strongly".into()],
            unknown_label: "unknown".into(),
        });
        assert_eq!(screen.view().option_count(), 2);
        assert!(screen.take_dirty());

        screen.hide_controls();
        assert_eq!(screen.view(), &EvaluatorView::Hidden);
    }

    fn prompt(labels: &[&str]) -> StagePrompt {
        StagePrompt {
            stage: 0,
            prompt: "?".into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            unknown_label: "unknown".into(),
        }
    }

    #[test]
    fn click_after_stage_change_uses_new_columns() {
        let (w, h) = (1200, 800);
        let mut screen = EvaluatorScreen::default();
        screen.reveal_controls(&prompt(&["tuuli", "tulli"]));
        let two = EvaluatorLayout::new(w, h, 2);
        let right_half = two.options[1];
        let (x, y) = (right_half.right() - 2.0, right_half.top() + 2.0);
        assert_eq!(screen.hit_test(w, h, x, y), Some(Decision::Option(1)));

        // second stage revealed, no frame drawn in between
        screen.reveal_controls(&prompt(&["slightly", "moderately", "strongly"]));
        assert_eq!(screen.hit_test(w, h, x, y), Some(Decision::Option(2)));

        screen.hide_controls();
        assert_eq!(screen.hit_test(w, h, x, y), None);
        let unknown = two.unknown.unwrap();
        assert_eq!(screen.hit_test(w, h, unknown.left() + 1.0, unknown.top() + 1.0), None);
    }
}
