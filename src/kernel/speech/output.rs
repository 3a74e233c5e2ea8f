use std::time::Duration;

use tracing::debug;

use crate::kernel::event::UtteranceId;
use crate::kernel::scheduler::{SideEffect, TimerId, TimerKind, TimerSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPhase {
    #[default]
    Idle,
    Speaking(UtteranceId),
}

/// Conditions re-checked immediately before an utterance starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechGate {
    pub muted: bool,
    pub user_interacted: bool,
}

impl SpeechGate {
    pub fn is_open(self) -> bool {
        !self.muted && self.user_interacted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SayOutcome {
    Started(UtteranceId),
    /// Waiting for the engine to release the cancelled utterance.
    Settling(UtteranceId),
    Dropped,
    Abandoned,
}

/// Owns the synthesis engine. At most one utterance is in flight.
#[derive(Debug)]
pub struct SpeechOutputController {
    phase: OutputPhase,
    pending: Option<(UtteranceId, String)>,
    settle: TimerSlot,
    settle_delay: Duration,
}

impl SpeechOutputController {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            phase: OutputPhase::Idle,
            pending: None,
            settle: TimerSlot::new(TimerKind::SpeechSettle),
            settle_delay,
        }
    }

    pub fn phase(&self) -> OutputPhase {
        self.phase
    }

    /// True while an utterance is playing or queued behind a cancellation.
    pub fn is_speaking(&self) -> bool {
        matches!(self.phase, OutputPhase::Speaking(_)) || self.pending.is_some()
    }

    pub fn say(
        &mut self,
        text: &str,
        interrupt: bool,
        gate: SpeechGate,
    ) -> (SayOutcome, Vec<SideEffect>) {
        let text = text.trim();
        if text.is_empty() {
            return (SayOutcome::Dropped, Vec::new());
        }

        if !self.is_speaking() {
            let utterance = UtteranceId::new();
            return self.begin(utterance, text.to_string(), gate);
        }

        if !interrupt {
            debug!("Output busy; dropping non-interrupting remark");
            return (SayOutcome::Dropped, Vec::new());
        }

        let mut effects = self.cancel();
        let utterance = UtteranceId::new();
        self.pending = Some((utterance, text.to_string()));
        effects.push(self.settle.schedule(self.settle_delay));
        (SayOutcome::Settling(utterance), effects)
    }

    pub fn on_settle_timer(&mut self, timer: TimerId, gate: SpeechGate) -> Vec<SideEffect> {
        if !self.settle.accept(timer) {
            return Vec::new();
        }
        match self.pending.take() {
            Some((utterance, text)) => self.begin(utterance, text, gate).1,
            None => Vec::new(),
        }
    }

    fn begin(
        &mut self,
        utterance: UtteranceId,
        text: String,
        gate: SpeechGate,
    ) -> (SayOutcome, Vec<SideEffect>) {
        if !gate.is_open() {
            debug!(?gate, "Speech gate closed; abandoning utterance");
            return (SayOutcome::Abandoned, Vec::new());
        }
        self.phase = OutputPhase::Speaking(utterance);
        (
            SayOutcome::Started(utterance),
            vec![SideEffect::Speak { utterance, text }],
        )
    }

    /// Engine confirmed playback. Returns false for callbacks of utterances
    /// that were already cancelled.
    pub fn on_started(&self, utterance: UtteranceId) -> bool {
        self.phase == OutputPhase::Speaking(utterance)
    }

    /// End or error of an utterance. Returns true when this moved us to Idle.
    pub fn on_finished(&mut self, utterance: UtteranceId) -> bool {
        if self.phase == OutputPhase::Speaking(utterance) {
            self.phase = OutputPhase::Idle;
            true
        } else {
            debug!(?utterance, "Ignoring finish of a stale utterance");
            false
        }
    }

    /// Cancels whatever is playing or pending and forces Idle. Muting on an
    /// explicit stop is the coordinator's call.
    pub fn cancel(&mut self) -> Vec<SideEffect> {
        let mut effects: Vec<SideEffect> = self.settle.cancel().into_iter().collect();
        self.pending = None;
        if let OutputPhase::Speaking(_) = self.phase {
            self.phase = OutputPhase::Idle;
            effects.push(SideEffect::CancelSpeech);
        }
        effects
    }
}
