use std::time::Duration;

use super::event::{RequestId, UtteranceId};
use super::speech::input::InputPhase;
use super::state::ResultEpoch;
use crate::services::lookup::{EntityKind, LookupRequest};
use crate::services::status::Severity;

/// Everything the kernel wants done outside itself. The driver executes these
/// in order; the kernel never touches an engine or a timer directly.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    StartRecognition,
    StopRecognition,
    Speak { utterance: UtteranceId, text: String },
    CancelSpeech,
    ScheduleTimer { timer: TimerId, delay: Duration },
    CancelTimer(TimerKind),
    Lookup { epoch: ResultEpoch, request: LookupRequest },
    ResolveFavorite { request: RequestId, kind: EntityKind, name: String },
    ParseRemote { request: RequestId, utterance: String },
    Announce { message: String, severity: Severity },
    InputStateChanged(InputPhase),
}

impl SideEffect {
    pub fn announce(message: impl Into<String>, severity: Severity) -> Self {
        Self::Announce {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Debounced recognition restart after a session ends.
    RestartListening,
    /// Delay between the end of speech output and re-opening the microphone.
    ResumeAfterSpeech,
    /// Gap between cancelling an utterance and starting its replacement.
    SpeechSettle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Single-occupancy timer bookkeeping. Scheduling replaces whatever was
/// pending, and only the most recent generation is accepted when it fires.
#[derive(Debug, Clone)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    pending: Option<u64>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            pending: None,
        }
    }

    pub fn schedule(&mut self, delay: Duration) -> SideEffect {
        self.generation += 1;
        self.pending = Some(self.generation);
        SideEffect::ScheduleTimer {
            timer: TimerId {
                kind: self.kind,
                generation: self.generation,
            },
            delay,
        }
    }

    pub fn cancel(&mut self) -> Option<SideEffect> {
        self.pending
            .take()
            .map(|_| SideEffect::CancelTimer(self.kind))
    }

    /// Consumes the pending timer if `timer` is the current one.
    pub fn accept(&mut self, timer: TimerId) -> bool {
        if timer.kind == self.kind && self.pending == Some(timer.generation) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
