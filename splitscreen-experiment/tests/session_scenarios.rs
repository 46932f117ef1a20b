//! End-to-end sessions: table → deck → machine → result file on disk.

use chrono::NaiveDateTime;
use rstest::rstest;
use splitscreen_core::{Protocol, SessionOutcome, TIMESTAMP_FORMAT};
use splitscreen_experiment::{
    DeckPolicy, DisplayCoordinator, JudgmentSink, LoggedDisplay, ResultSink, SessionConfig,
    SessionEvent, SinkError, Step, Table, TrialDeck, TrialStateMachine, parse_script, replay,
};
use splitscreen_timing::ManualTimer;
use std::path::Path;
use std::time::Duration;

/// Delegates to a real result file and counts close calls.
struct CountingSink {
    inner: ResultSink,
    closes: usize,
}

impl JudgmentSink for CountingSink {
    fn write(&mut self, fields: &[String]) -> Result<(), SinkError> {
        self.inner.write(fields)
    }
    fn close(&mut self) -> Result<(), SinkError> {
        self.closes += 1;
        self.inner.close()
    }
    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

type Machine = TrialStateMachine<ManualTimer, LoggedDisplay, LoggedDisplay, CountingSink>;

const WORDS: &str = "Word\tAlternative 1\tAlternative 2\tShort\tLong
tuli\ttuuli\ttulli\ttuli\ttuuli
muta\tmuuta\tmutta\tmuta\tmuuta
kisa\tkiisa\tkissa\tkisa\tkiisa
sika\tsiika\tsikka\tsika\tsiika
lasi\tlaasi\tlassi\tlasi\tlaasi
";

fn table(rows: usize) -> Table {
    let text: String = WORDS.lines().take(rows + 1).map(|l| format!("{l}\n")).collect();
    Table::from_reader(text.as_bytes()).unwrap()
}

fn machine(path: &Path, protocol: Protocol, rows: usize, policy: DeckPolicy) -> Machine {
    let config = SessionConfig {
        protocol,
        ..SessionConfig::default()
    };
    let schema = config.schema();
    let deck = TrialDeck::load(&table(rows), &schema, &policy).unwrap();
    let sink = CountingSink {
        inner: ResultSink::open(path, &schema.header()).unwrap(),
        closes: 0,
    };
    let coordinator =
        DisplayCoordinator::new(LoggedDisplay, LoggedDisplay, config.feedback_duration());
    TrialStateMachine::new(schema, deck, sink, coordinator, ManualTimer::fixed())
}

fn lines(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.split('\t').map(String::from).collect())
        .collect()
}

fn timestamp(field: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT).unwrap()
}

#[test]
fn binary_three_rows_left_right_left() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::Binary, 3, DeckPolicy::default());

    let events = parse_script("ack\nchoose 1\nack\nchoose 2\nack\nchoose 1\n").unwrap();
    let outcome = replay(&mut m, events).unwrap();

    assert_eq!(outcome, SessionOutcome::Completed { trials: 3 });
    let rows = lines(&path);
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[0],
        [
            "step_idx",
            "start_scoring_timestamp",
            "received_score_timestamp",
            "dictated_word",
            "side",
            "selected_word",
        ]
    );
    let sides: Vec<&str> = rows[1..].iter().map(|r| r[4].as_str()).collect();
    assert_eq!(sides, ["left", "right", "left"]);
    assert_eq!(rows[2][5], "mutta");

    assert_eq!(m.deck.current_index(), Some(2));
    assert!(m.deck.is_exhausted());
    assert_eq!(m.sink.closes, 1);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn one_header_and_one_line_per_trial(#[case] rows: usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::FivePoint, rows, DeckPolicy::default());

    let script = "ack\nchoose 3\n".repeat(rows);
    replay(&mut m, parse_script(&script).unwrap()).unwrap();

    let rows_written = lines(&path);
    assert_eq!(rows_written.len(), rows + 1);
    assert_eq!(rows_written[0][0], "step_idx");
    assert!(rows_written[1..].iter().all(|r| r[0] != "step_idx"));
    assert!(rows_written[1..].iter().all(|r| r[4] == "neutral"));
}

#[test]
fn two_stage_single_trial_writes_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::WordThenDegree, 1, DeckPolicy::default());

    let outcome = replay(&mut m, parse_script("ack\nchoose 2\nchoose 1\n").unwrap()).unwrap();

    assert_eq!(outcome, SessionOutcome::Completed { trials: 1 });
    let rows = lines(&path);
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][3..], ["tuli", "tuuli", "slightly"]);
}

#[test]
fn early_close_keeps_completed_trials_and_closes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::Binary, 5, DeckPolicy::default());

    m.start().unwrap();
    m.handle(SessionEvent::StimulusConsumed).unwrap();
    m.handle(SessionEvent::Decision(splitscreen_core::Decision::Option(0)))
        .unwrap();
    m.handle(SessionEvent::StimulusConsumed).unwrap();

    // window close is intercepted, then the top level ends the session too
    let step = m.handle(SessionEvent::CloseRequested).unwrap();
    let outcome = m.abort().unwrap();

    assert_eq!(step, Step::Terminate(outcome));
    assert_eq!(
        outcome,
        SessionOutcome::Aborted {
            completed: 1,
            total: 5
        }
    );
    assert_eq!(outcome.exit_code(SessionConfig::default().abort_exit_code), 0);
    assert_eq!(m.sink.closes, 1);
    assert_eq!(lines(&path).len(), 2);
}

#[test]
fn script_ending_early_aborts_through_close_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::Binary, 5, DeckPolicy::default());

    let outcome = replay(&mut m, parse_script("ack\nchoose 1\nack\n").unwrap()).unwrap();

    assert!(outcome.is_aborted());
    assert_eq!(outcome.completed_trials(), 1);
    assert!(m.sink.is_closed());
    assert_eq!(lines(&path).len(), 2);
}

#[test]
fn decision_start_never_after_decision_received() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let mut m = machine(&path, Protocol::WordThenDegree, 5, DeckPolicy::default());

    let script = "ack\nchoose 1\nunknown\n".repeat(5);
    replay(&mut m, parse_script(&script).unwrap()).unwrap();

    for row in &lines(&path)[1..] {
        assert!(timestamp(&row[1]) <= timestamp(&row[2]));
    }
}

#[test]
fn intelligibility_waits_out_feedback_between_trials() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.tsv");
    let policy = DeckPolicy {
        repeat_count: 2,
        ..DeckPolicy::default()
    };
    let mut m = machine(&path, Protocol::Intelligibility, 2, policy);

    let script = "ack\nchoose 1\n".repeat(4);
    let outcome = replay(&mut m, parse_script(&script).unwrap()).unwrap();

    assert_eq!(outcome, SessionOutcome::Completed { trials: 4 });
    let rows = lines(&path);
    assert!(rows[1..].iter().all(|r| r[5] == "1"));

    // each later trial opened at least the feedback duration after the previous commit
    for pair in rows[1..].windows(2) {
        let gap = timestamp(&pair[1][1]) - timestamp(&pair[0][2]);
        assert!(gap.to_std().unwrap() >= Duration::from_millis(3000));
    }
}

#[test]
fn same_seed_and_script_give_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let policy = DeckPolicy {
        repeat_count: 2,
        shuffle_per_replica: true,
        shuffle_overall: true,
        seed: Some(2024),
    };
    let script = "ack\nchoose 2\n".repeat(10);

    let mut outputs = Vec::new();
    for run in 0..2 {
        let path = dir.path().join(format!("run{run}.tsv"));
        let mut m = machine(&path, Protocol::Binary, 5, policy.clone());
        replay(&mut m, parse_script(&script).unwrap()).unwrap();
        outputs.push(std::fs::read(&path).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);
}
