mod app;
mod cli;
mod input;
mod screen;

use anyhow::{Context, Result};
use app::WindowedRunner;
use clap::Parser;
use cli::Cli;
use screen::{EvaluatorScreen, ParticipantScreen};
use splitscreen_core::SessionOutcome;
use splitscreen_experiment::{
    DisplayCoordinator, LoggedDisplay, ResultSink, SessionConfig, SessionEvent, Table, TrialDeck,
    TrialStateMachine, load_script, replay,
};
use splitscreen_timing::HighPrecisionTimer;
use std::fs::File;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("splitscreen: {e:#}");
        std::process::exit(2);
    }

    let code = match run(&cli) {
        Ok((outcome, abort_code)) => outcome.exit_code(abort_code),
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("installing log subscriber")
}

/// How the session is driven once everything is loaded.
enum Frontend {
    Script(Vec<SessionEvent>),
    Windows(WindowedRunner),
}

/// Sets up the session and runs it to the end, returning the outcome and the
/// exit code configured for aborted sessions.
///
/// Every input is loaded before the result file is opened: opening it
/// truncates whatever a previous session left there.
fn run(cli: &Cli) -> Result<(SessionOutcome, i32)> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => SessionConfig::default(),
    };
    cli.apply(&mut config);

    let table = Table::from_path(&cli.input)?;
    let schema = config.schema();
    let deck = TrialDeck::load(&table, &schema, &config.deck_policy())
        .with_context(|| format!("building trials from {}", cli.input.display()))?;
    let frontend = match &cli.script {
        Some(script) => Frontend::Script(load_script(script)?),
        None => Frontend::Windows(WindowedRunner::new(config.display.clone())?),
    };

    let sink = ResultSink::open(&cli.output, &schema.header())?;
    info!(
        protocol = %config.protocol,
        trials = deck.len(),
        output = %cli.output.display(),
        "session ready"
    );
    let timer = HighPrecisionTimer::new();

    let outcome = match frontend {
        Frontend::Script(events) => {
            let coordinator =
                DisplayCoordinator::new(LoggedDisplay, LoggedDisplay, config.feedback_duration());
            let mut machine = TrialStateMachine::new(schema, deck, sink, coordinator, timer);
            replay(&mut machine, events)?
        }
        Frontend::Windows(runner) => {
            let coordinator = DisplayCoordinator::new(
                ParticipantScreen::default(),
                EvaluatorScreen::default(),
                config.feedback_duration(),
            );
            let machine = TrialStateMachine::new(schema, deck, sink, coordinator, timer);
            runner.run(machine)?
        }
    };

    info!(%outcome, "session ended");
    Ok((outcome, config.abort_exit_code))
}
