use clap::{ArgAction, Parser};
use splitscreen_core::Protocol;
use splitscreen_experiment::SessionConfig;
use std::path::PathBuf;

/// Two-screen word judgment sessions: the participant reads each word, the
/// evaluator records what was heard.
#[derive(Debug, Parser)]
#[command(name = "splitscreen", version, about)]
pub struct Cli {
    /// Tab-separated word list with a header row
    pub input: PathBuf,

    /// Result file, overwritten if it exists
    pub output: PathBuf,

    /// binary, five-point, word-then-degree or intelligibility
    #[arg(short, long)]
    pub protocol: Option<Protocol>,

    /// TOML session configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Present the whole word list this many times
    #[arg(long, value_name = "N")]
    pub repeat: Option<usize>,

    /// Shuffle each replica of the list independently
    #[arg(long)]
    pub shuffle_replicas: bool,

    /// Shuffle the full deck after replication
    #[arg(long)]
    pub shuffle: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Replay events from a file instead of opening windows
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// -v info, -vv debug
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write the log to this file
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags given on the command line win over the configuration file.
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(repeat) = self.repeat {
            config.repeat_count = repeat;
        }
        config.shuffle_per_replica |= self.shuffle_replicas;
        config.shuffle_overall |= self.shuffle;
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
