use uuid::Uuid;

use super::scheduler::TimerId;
use super::state::ResultEpoch;
use crate::error::{LookupError, RecognitionErrorKind};
use crate::intent::Intent;
use crate::services::lookup::{EntityKind, EntityRef, LookupPayload};

/// Identity of one utterance handed to the synthesis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub Uuid);

impl UtteranceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UtteranceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic id for async requests whose answers may arrive late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone)]
pub enum Event {
    /// First event after the driver comes up.
    Boot,
    Recognition(RecognitionEvent),
    Synthesis(SynthesisEvent),
    TimerFired(TimerId),
    LookupCompleted {
        epoch: ResultEpoch,
        outcome: Result<LookupPayload, LookupError>,
    },
    FavoriteResolved {
        request: RequestId,
        kind: EntityKind,
        outcome: Result<EntityRef, LookupError>,
    },
    /// `intent` is `None` when the remote parser failed or is unavailable.
    RemoteParsed {
        request: RequestId,
        utterance: String,
        intent: Option<Intent>,
    },
    Command(UserCommand),
    Shutdown,
}

/// Callbacks of the speech-to-text engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    /// The start primitive refused because a session is already running.
    AlreadyRunning,
    Result { transcript: String, is_final: bool },
    Error(RecognitionErrorKind),
    Ended,
}

/// Callbacks of the text-to-speech engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Failed { utterance: UtteranceId, reason: String },
}

/// Direct user actions coming from the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Click, key press or touch.
    Interaction,
    SetAutoListen(bool),
    ToggleMic,
    StopButton,
    /// Typed command, handled like a final transcript.
    Submit(String),
}
