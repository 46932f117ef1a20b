use crate::error::DeckError;
use crate::table::Table;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use splitscreen_core::{DecisionSchema, STIMULUS_COLUMNS, TrialRecord};

/// How the base word list is turned into a deck. Applied once, at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckPolicy {
    pub repeat_count: usize,
    pub shuffle_per_replica: bool,
    pub shuffle_overall: bool,
    /// `None` draws the shuffle from the OS; set it to make runs replayable.
    pub seed: Option<u64>,
}

impl Default for DeckPolicy {
    fn default() -> Self {
        Self {
            repeat_count: 1,
            shuffle_per_replica: false,
            shuffle_overall: false,
            seed: None,
        }
    }
}

pub enum Advance<'a> {
    Record(&'a TrialRecord),
    Exhausted,
}

impl Advance<'_> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Advance::Exhausted)
    }
}

/// Ordered trials with an advance-only cursor.
///
/// `cursor` counts successful draws: 0 is "before first", `i + 1` means
/// record `i` is current, and `len + 1` is the exhausted state, which is
/// never left.
#[derive(Debug, Clone)]
pub struct TrialDeck {
    records: Vec<TrialRecord>,
    cursor: usize,
}

impl TrialDeck {
    pub fn load(
        table: &Table,
        schema: &DecisionSchema,
        policy: &DeckPolicy,
    ) -> Result<Self, DeckError> {
        let mut rng = match policy.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::load_with_rng(table, schema, policy, &mut rng)
    }

    pub fn load_with_rng<R: Rng + ?Sized>(
        table: &Table,
        schema: &DecisionSchema,
        policy: &DeckPolicy,
        rng: &mut R,
    ) -> Result<Self, DeckError> {
        let stimulus_column = STIMULUS_COLUMNS.iter().find_map(|c| table.column(c));
        let alternative_columns: Vec<Option<usize>> = schema
            .alternative_columns()
            .iter()
            .map(|c| table.column(c))
            .collect();

        let mut missing = Vec::new();
        if stimulus_column.is_none() {
            missing.push(STIMULUS_COLUMNS[0].to_string());
        }
        for (name, column) in schema.alternative_columns().iter().zip(&alternative_columns) {
            if column.is_none() {
                missing.push(name.to_string());
            }
        }
        let (Some(stimulus_column), true) = (stimulus_column, missing.is_empty()) else {
            return Err(DeckError::InvalidTable { missing });
        };
        let alternative_columns: Vec<usize> = alternative_columns.into_iter().flatten().collect();

        if table.is_empty() {
            return Err(DeckError::EmptyTable);
        }
        if policy.repeat_count == 0 {
            return Err(DeckError::InvalidPolicy(
                "repeat_count must be at least 1".to_string(),
            ));
        }

        let cell = |row: usize, column: usize| {
            table.cell(row, column).unwrap_or_default().to_string()
        };
        let mut records = Vec::with_capacity(table.len() * policy.repeat_count);
        for replica in 0..policy.repeat_count {
            let mut block: Vec<TrialRecord> = (0..table.len())
                .map(|row| {
                    let alternatives = alternative_columns.iter().map(|&c| cell(row, c)).collect();
                    TrialRecord::new(cell(row, stimulus_column), alternatives, row, replica)
                })
                .collect();
            if policy.shuffle_per_replica {
                block.shuffle(rng);
            }
            records.extend(block);
        }
        if policy.shuffle_overall {
            records.shuffle(rng);
        }

        tracing::info!(
            trials = records.len(),
            replicas = policy.repeat_count,
            protocol = %schema.protocol(),
            "deck loaded"
        );
        Ok(Self { records, cursor: 0 })
    }

    /// Moves to the next record. Once past the end, keeps answering
    /// `Exhausted` without moving.
    pub fn advance(&mut self) -> Advance<'_> {
        if self.cursor <= self.records.len() {
            self.cursor += 1;
        }
        match self.records.get(self.cursor.wrapping_sub(1)) {
            Some(record) => Advance::Record(record),
            None => Advance::Exhausted,
        }
    }

    pub fn current(&self) -> Result<&TrialRecord, DeckError> {
        match self.cursor {
            0 => Err(DeckError::NotStarted),
            c if c > self.records.len() => Err(DeckError::Exhausted),
            c => Ok(&self.records[c - 1]),
        }
    }

    /// Index of the last record handed out; it stays put after exhaustion.
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.min(self.records.len()).checked_sub(1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor > self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitscreen_core::{Protocol, ScaleLabels};

    fn table(words: &[&str]) -> Table {
        Table::new(
            vec!["Word".into(), "Alternative 1".into(), "Alternative 2".into()],
            words
                .iter()
                .map(|w| vec![w.to_string(), format!("{w}-a"), format!("{w}-b")])
                .collect(),
        )
    }

    fn schema(protocol: Protocol) -> DecisionSchema {
        DecisionSchema::for_protocol(protocol, &ScaleLabels::default())
    }

    fn stimuli(deck: &TrialDeck) -> Vec<&str> {
        deck.records().iter().map(|r| r.stimulus()).collect()
    }

    #[test]
    fn cursor_is_monotonic_and_sticks_at_exhaustion() {
        let words = table(&["a", "b", "c"]);
        let mut deck =
            TrialDeck::load(&words, &schema(Protocol::Binary), &DeckPolicy::default()).unwrap();

        assert_eq!(deck.current(), Err(DeckError::NotStarted));
        assert_eq!(deck.current_index(), None);

        let mut last = None;
        for expected in 0..3 {
            assert!(!deck.advance().is_exhausted());
            assert_eq!(deck.current_index(), Some(expected));
            assert!(deck.current_index() >= last);
            last = deck.current_index();
        }
        assert_eq!(deck.current().unwrap().stimulus(), "c");

        for _ in 0..3 {
            assert!(deck.advance().is_exhausted());
            assert_eq!(deck.current_index(), Some(2));
            assert!(deck.is_exhausted());
        }
        assert_eq!(deck.current(), Err(DeckError::Exhausted));
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let table = Table::new(vec!["Stimulus".into()], vec![vec!["a".into()]]);
        let err = TrialDeck::load(&table, &schema(Protocol::WordThenDegree), &DeckPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            DeckError::InvalidTable {
                missing: vec!["Short".into(), "Long".into()]
            }
        );
    }

    #[test]
    fn stimulus_column_may_be_named_stimulus() {
        let table = Table::new(vec!["Stimulus".into()], vec![vec!["a".into()]]);
        let deck =
            TrialDeck::load(&table, &schema(Protocol::FivePoint), &DeckPolicy::default()).unwrap();
        assert_eq!(stimuli(&deck), vec!["a"]);
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = TrialDeck::load(&table(&[]), &schema(Protocol::Binary), &DeckPolicy::default())
            .unwrap_err();
        assert_eq!(err, DeckError::EmptyTable);
    }

    #[test]
    fn zero_repeats_is_rejected() {
        let policy = DeckPolicy {
            repeat_count: 0,
            ..DeckPolicy::default()
        };
        assert!(matches!(
            TrialDeck::load(&table(&["a"]), &schema(Protocol::Binary), &policy),
            Err(DeckError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn replicas_keep_order_without_shuffle() {
        let policy = DeckPolicy {
            repeat_count: 2,
            ..DeckPolicy::default()
        };
        let deck =
            TrialDeck::load(&table(&["a", "b"]), &schema(Protocol::Binary), &policy).unwrap();

        assert_eq!(stimuli(&deck), vec!["a", "b", "a", "b"]);
        let replicas: Vec<usize> = deck.records().iter().map(|r| r.replica()).collect();
        assert_eq!(replicas, vec![0, 0, 1, 1]);
        assert_eq!(deck.records()[3].alternatives(), &["b-a", "b-b"]);
    }

    #[test]
    fn per_replica_shuffle_keeps_replicas_contiguous() {
        let words = ["a", "b", "c", "d", "e", "f"];
        let policy = DeckPolicy {
            repeat_count: 3,
            shuffle_per_replica: true,
            seed: Some(7),
            ..DeckPolicy::default()
        };
        let deck = TrialDeck::load(&table(&words), &schema(Protocol::Binary), &policy).unwrap();

        for (replica, block) in deck.records().chunks(words.len()).enumerate() {
            assert!(block.iter().all(|r| r.replica() == replica));
            let mut seen: Vec<&str> = block.iter().map(|r| r.stimulus()).collect();
            seen.sort_unstable();
            assert_eq!(seen, words);
        }
    }

    #[test]
    fn same_seed_same_deck() {
        let words = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let policy = DeckPolicy {
            repeat_count: 2,
            shuffle_per_replica: true,
            shuffle_overall: true,
            seed: Some(42),
        };
        let first = TrialDeck::load(&table(&words), &schema(Protocol::Binary), &policy).unwrap();
        let second = TrialDeck::load(&table(&words), &schema(Protocol::Binary), &policy).unwrap();

        assert_eq!(first.records(), second.records());
        assert_eq!(first.len(), 16);
    }
}
