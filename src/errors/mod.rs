//! Error types for turn dispatch
//!
//! Registration problems are reported while handlers are being wired up;
//! everything else surfaces from `execute()` or an in-line `emit()`.

use thiserror::Error;

/// Failure while registering a handler set
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The handler set at `index` is not a plain event-name mapping
    #[error("handler set #{index} is not a valid mapping: {reason}")]
    InvalidHandlerSet { index: usize, reason: String },

    /// The value bound to `event` cannot be called
    #[error("event handler for '{event}' is not callable")]
    NotCallable { event: String },
}

/// Failure while dispatching a turn
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The inbound turn description is not a JSON object
    #[error("invalid turn request: {0}")]
    InvalidRequest(String),

    /// No listener is registered for the derived event name
    #[error("no handler function registered for event: {event}")]
    NoHandler { event: String },

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// An action event was emitted without the data it needs
    #[error("event '{event}' was emitted without its action payload")]
    MissingAction { event: String },

    /// Completion was signalled before any document was built
    #[error("no pending response to deliver")]
    NoPendingResponse,

    /// The completion callback has already consumed a document
    #[error("response for this turn was already delivered")]
    AlreadyDelivered,

    /// A call context outlived the dispatcher it was bound to
    #[error("dispatcher for event '{event}' has been released")]
    DispatcherReleased { event: String },

    /// Application handler failure
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Failure while loading dispatcher configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;
