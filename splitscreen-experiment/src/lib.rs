pub mod config;
pub mod deck;
pub mod display;
pub mod error;
pub mod session;
pub mod sink;
pub mod state;
pub mod table;
pub mod trial;

pub use config::{DisplayConfig, SessionConfig};
pub use deck::{Advance, DeckPolicy, TrialDeck};
pub use display::{Capturable, DisplayCoordinator, LoggedDisplay, Presentable, StagePrompt};
pub use error::{ConfigError, DeckError, ScriptError, SessionError, SinkError, TableError};
pub use session::{load_script, parse_script, replay};
pub use sink::{JudgmentSink, ResultSink};
pub use state::{SessionEvent, Step, TrialStateMachine};
pub use table::Table;
pub use trial::{Trial, TrialTimestamps};
