use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("The bot is already running")]
    AlreadyRunning,

    #[error("The bot is not running")]
    NotRunning,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Scoreboard error: {0}")]
    Scoreboard(String),

    #[error("Handler error: {0}")]
    Handler(String),

    /// The cancellation scope of the caller was cancelled; not a failure.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// True for [`BotError::Cancelled`], which background actions and handlers end with quietly.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BotError::Cancelled)
    }
}

/// Programmer errors detected while configuring a bot; reported by the builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No initial state was set")]
    MissingInitialState,

    #[error("The initial state has already been set")]
    InitialStateAlreadySet,

    #[error("The '{command}' command handler has already been set on {scope}")]
    DuplicateCommand { scope: String, command: String },

    #[error("The {hook} has already been set on state {state}")]
    DuplicateHook { state: String, hook: &'static str },

    #[error("The '{0}' command is built in and cannot be overridden")]
    ReservedCommand(String),

    #[error("Unknown state handle: {0}")]
    UnknownState(usize),

    #[error("Invalid content: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
