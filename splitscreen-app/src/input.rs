use splitscreen_core::Decision;
use splitscreen_experiment::SessionEvent;
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Participant,
    Evaluator,
}

/// Keyboard binding per window. The participant acknowledges with Space or
/// Enter; the evaluator picks option N with digit N and opts out with 0 or U.
/// Escape ends the session from either window.
pub fn key_event(role: Role, key: KeyCode) -> Option<SessionEvent> {
    if key == KeyCode::Escape {
        return Some(SessionEvent::CloseRequested);
    }
    match role {
        Role::Participant => matches!(key, KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter)
            .then_some(SessionEvent::StimulusConsumed),
        Role::Evaluator => {
            let decision = match key {
                KeyCode::Digit0 | KeyCode::Numpad0 | KeyCode::KeyU => Decision::Unknown,
                key => Decision::Option(digit(key)? - 1),
            };
            Some(SessionEvent::Decision(decision))
        }
    }
}

fn digit(key: KeyCode) -> Option<usize> {
    Some(match key {
        KeyCode::Digit1 | KeyCode::Numpad1 => 1,
        KeyCode::Digit2 | KeyCode::Numpad2 => 2,
        KeyCode::Digit3 | KeyCode::Numpad3 => 3,
        KeyCode::Digit4 | KeyCode::Numpad4 => 4,
        KeyCode::Digit5 | KeyCode::Numpad5 => 5,
        KeyCode::Digit6 | KeyCode::Numpad6 => 6,
        KeyCode::Digit7 | KeyCode::Numpad7 => 7,
        KeyCode::Digit8 | KeyCode::Numpad8 => 8,
        KeyCode::Digit9 | KeyCode::Numpad9 => 9,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyCode::Digit1, Some(SessionEvent::Decision(Decision::Option(0))))]
    #[case(KeyCode::Numpad5, Some(SessionEvent::Decision(Decision::Option(4))))]
    #[case(KeyCode::Digit0, Some(SessionEvent::Decision(Decision::Unknown)))]
    #[case(KeyCode::KeyU, Some(SessionEvent::Decision(Decision::Unknown)))]
    #[case(KeyCode::Space, None)]
    #[case(KeyCode::Escape, Some(SessionEvent::CloseRequested))]
    fn evaluator_keys(#[case] key: KeyCode, #[case] expected: Option<SessionEvent>) {
        assert_eq!(key_event(Role::Evaluator, key), expected);
    }

    #[test]
    fn participant_cannot_decide() {
        assert_eq!(
            key_event(Role::Participant, KeyCode::Space),
            Some(SessionEvent::StimulusConsumed)
        );
        assert_eq!(key_event(Role::Participant, KeyCode::Digit1), None);
    }
}
