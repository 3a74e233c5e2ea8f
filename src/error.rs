//! Error types shared by the core and its collaborators.

use thiserror::Error;

/// Failure of a recognition or synthesis primitive.
///
/// Synthesis failures after a successful `speak` arrive as
/// `SynthesisEvent::Failed` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine reports a session is already running. Overlapping start
    /// calls produce this; it is treated as a successful start.
    #[error("engine already started")]
    AlreadyStarted,

    #[error("recognition failed: {0:?}")]
    Recognition(RecognitionErrorKind),
}

/// Error codes surfaced by the speech-to-text engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NoSpeech,
    Aborted,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    AudioCapture,
    Other,
}

/// How the input controller reacts to a recognition error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Absorbed silently; auto-listen restarts after the debounce.
    Transient,
    /// Microphone or speech service denied. Auto-listen is disabled.
    Permission,
    /// No capture device. Handled like `Permission`.
    HardwareAbsent,
}

impl RecognitionErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            Self::NotAllowed | Self::ServiceNotAllowed => ErrorClass::Permission,
            Self::AudioCapture => ErrorClass::HardwareAbsent,
            Self::NoSpeech | Self::Aborted | Self::Network | Self::Other => ErrorClass::Transient,
        }
    }

    /// One-shot explanation spoken when the error disables auto-listening.
    pub fn explanation(self) -> &'static str {
        match self.class() {
            ErrorClass::Permission => {
                "Microphone access was denied. Please allow microphone access to use voice commands."
            }
            ErrorClass::HardwareAbsent => {
                "No microphone was found. Please connect a microphone to use voice commands."
            }
            ErrorClass::Transient => "",
        }
    }
}

/// Typed failure from the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no results found for {0}")]
    NotFound(String),

    #[error("statistics service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RemoteParseError {
    #[error("remote parser request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote parser returned status {0}")]
    Status(u16),

    #[error("remote parser returned an unusable intent: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}
