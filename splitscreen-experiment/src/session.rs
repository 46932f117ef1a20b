use crate::display::{Capturable, Presentable};
use crate::error::{ScriptError, SessionError};
use crate::sink::JudgmentSink;
use crate::state::{SessionEvent, Step, TrialStateMachine};
use splitscreen_core::{Decision, SessionOutcome};
use splitscreen_timing::Timer;
use std::path::Path;

/// Parses a replay script: one event per line.
///
/// ```text
/// ack          # participant consumed the stimulus
/// choose 2     # evaluator picked the second option (1-based)
/// unknown      # evaluator opted out
/// close        # window closed
/// ```
pub fn parse_script(text: &str) -> Result<Vec<SessionEvent>, ScriptError> {
    let mut events = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let syntax = || ScriptError::Syntax {
            line: n + 1,
            text: raw.trim().to_string(),
        };

        let mut words = line.split_whitespace();
        let event = match (words.next(), words.next(), words.next()) {
            (Some("ack"), None, None) => SessionEvent::StimulusConsumed,
            (Some("unknown"), None, None) => SessionEvent::Decision(Decision::Unknown),
            (Some("close"), None, None) => SessionEvent::CloseRequested,
            (Some("choose"), Some(arg), None) => {
                let index: usize = arg.parse().map_err(|_| syntax())?;
                let index = index.checked_sub(1).ok_or_else(syntax)?;
                SessionEvent::Decision(Decision::Option(index))
            }
            _ => return Err(syntax()),
        };
        events.push(event);
    }
    Ok(events)
}

pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<SessionEvent>, ScriptError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text)
}

/// Runs a whole session from a list of events.
///
/// Feedback is waited out on the machine's timer before the next event is
/// delivered. When the events run out before the deck does, the session is
/// aborted through the normal close path.
pub fn replay<T, P, C, K, I>(
    machine: &mut TrialStateMachine<T, P, C, K>,
    events: I,
) -> Result<SessionOutcome, SessionError>
where
    T: Timer,
    P: Presentable,
    C: Capturable,
    K: JudgmentSink,
    I: IntoIterator<Item = SessionEvent>,
{
    if let Step::Terminate(outcome) = machine.start()? {
        return Ok(outcome);
    }

    for event in events {
        if let Some(remaining) = machine.feedback_remaining() {
            machine.timer.sleep(remaining);
            machine.handle(SessionEvent::FeedbackElapsed)?;
        }
        if let Step::Terminate(outcome) = machine.handle(event)? {
            // events after termination are ignored by the machine anyway
            return Ok(outcome);
        }
    }
    machine.abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_and_skips_comments() {
        let script = "ack\n\n# evaluator\nchoose 2  # second\nunknown\nclose\n";
        let events = parse_script(script).unwrap();
        assert_eq!(
            events,
            vec![
                SessionEvent::StimulusConsumed,
                SessionEvent::Decision(Decision::Option(1)),
                SessionEvent::Decision(Decision::Unknown),
                SessionEvent::CloseRequested,
            ]
        );
    }

    #[test]
    fn choose_is_one_based() {
        let err = parse_script("ack\nchoose 0\n").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 2, .. }));
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(matches!(
            parse_script("ack\npick 1\n"),
            Err(ScriptError::Syntax { line: 2, .. })
        ));
        assert!(parse_script("choose 1 2").is_err());
    }
}
