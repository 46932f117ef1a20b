use splitscreen_core::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read word list {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed word list: {0}")]
    Malformed(#[from] csv::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("word list is missing required column(s): {}", missing.join(", "))]
    InvalidTable { missing: Vec<String> },

    #[error("word list has no rows")]
    EmptyTable,

    #[error("invalid deck policy: {0}")]
    InvalidPolicy(String),

    #[error("no trial has been drawn yet")]
    NotStarted,

    #[error("deck is exhausted")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create result file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("result file is already closed")]
    Closed,

    #[error("I/O error on result file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Labels(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script line {line}: cannot parse `{text}`")]
    Syntax { line: usize, text: String },
}
