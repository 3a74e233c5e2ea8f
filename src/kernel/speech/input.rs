use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ErrorClass, RecognitionErrorKind};
use crate::kernel::scheduler::{SideEffect, TimerId, TimerKind, TimerSlot};

/// Lifecycle of the speech-to-text session. A single tag, so "starting and
/// stopping at once" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputPhase {
    #[default]
    Idle,
    Starting,
    Listening,
    Stopping,
}

/// Signals that request a phase transition. These are REQUESTS; the table
/// below decides whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    StartRequested,
    EngineStarted,
    AlreadyRunning,
    StopRequested,
    EngineEnded,
    EngineFailed,
}

impl InputPhase {
    /// Pure function: (Current Phase, Signal) -> New Phase.
    /// Returns None if the signal is ignored in this phase.
    pub fn transition(self, signal: InputSignal) -> Option<InputPhase> {
        use InputPhase::*;
        use InputSignal::*;

        match (self, signal) {
            (Idle, StartRequested) => Some(Starting),

            (Starting, EngineStarted) => Some(Listening),
            // Two overlapping starts: the engine is running, so we are listening.
            (Starting, AlreadyRunning) => Some(Listening),

            (Starting | Listening, StopRequested) => Some(Stopping),

            // Every end or error lands in Idle, whatever we thought we were doing.
            (Starting | Listening | Stopping, EngineEnded | EngineFailed) => Some(Idle),

            // A late start callback after stop was requested does not reopen the mic.
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartRejected(pub InputPhase);

/// Owns the recognition engine's lifecycle and the auto-listen preference.
#[derive(Debug)]
pub struct SpeechInputController {
    phase: InputPhase,
    auto_listen: bool,
    restart: TimerSlot,
    restart_debounce: Duration,
}

impl SpeechInputController {
    pub fn new(restart_debounce: Duration, auto_listen: bool) -> Self {
        Self {
            phase: InputPhase::Idle,
            auto_listen,
            restart: TimerSlot::new(TimerKind::RestartListening),
            restart_debounce,
        }
    }

    pub fn phase(&self) -> InputPhase {
        self.phase
    }

    pub fn auto_listen(&self) -> bool {
        self.auto_listen
    }

    pub fn has_pending_restart(&self) -> bool {
        self.restart.is_pending()
    }

    pub fn set_auto_listen(&mut self, enabled: bool) -> Vec<SideEffect> {
        self.auto_listen = enabled;
        if enabled {
            Vec::new()
        } else {
            self.restart.cancel().into_iter().collect()
        }
    }

    /// Only accepted from Idle; anything else would make the engine throw a
    /// duplicate-start error.
    pub fn start(&mut self) -> Result<Vec<SideEffect>, StartRejected> {
        let mut effects = Vec::new();
        if !self.apply(InputSignal::StartRequested, &mut effects) {
            debug!(phase = ?self.phase, "Start rejected");
            return Err(StartRejected(self.phase));
        }
        effects.extend(self.restart.cancel());
        effects.push(SideEffect::StartRecognition);
        Ok(effects)
    }

    /// User-level stop: also turns auto-listen off so the end callback does
    /// not restart the session.
    pub fn stop(&mut self) -> Vec<SideEffect> {
        self.auto_listen = false;
        let mut effects: Vec<SideEffect> = self.restart.cancel().into_iter().collect();
        effects.extend(self.halt());
        effects
    }

    /// Stops the session for speech output while keeping auto-listen.
    pub fn pause(&mut self) -> Vec<SideEffect> {
        let mut effects: Vec<SideEffect> = self.restart.cancel().into_iter().collect();
        effects.extend(self.halt());
        effects
    }

    fn halt(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        if self.apply(InputSignal::StopRequested, &mut effects) {
            effects.push(SideEffect::StopRecognition);
        }
        effects
    }

    pub fn on_started(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        if !self.apply(InputSignal::EngineStarted, &mut effects) {
            debug!(phase = ?self.phase, "Ignoring late start callback");
        }
        effects
    }

    pub fn on_already_running(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        if self.apply(InputSignal::AlreadyRunning, &mut effects) {
            info!("Recognition was already running; treating start as successful");
        }
        effects
    }

    /// Only final results leave the controller; interim hypotheses are dropped here.
    pub fn on_result(&mut self, transcript: &str, is_final: bool) -> Option<String> {
        if !is_final {
            return None;
        }
        let transcript = transcript.trim();
        (!transcript.is_empty()).then(|| transcript.to_string())
    }

    /// Returns the error's class so the caller can surface fatal ones.
    pub fn on_error(
        &mut self,
        kind: RecognitionErrorKind,
        output_busy: bool,
    ) -> (ErrorClass, Vec<SideEffect>) {
        let mut effects = Vec::new();
        self.apply(InputSignal::EngineFailed, &mut effects);

        let class = kind.class();
        match class {
            ErrorClass::Transient => {
                debug!(?kind, "Transient recognition error");
                effects.extend(self.schedule_restart(output_busy));
            }
            ErrorClass::Permission | ErrorClass::HardwareAbsent => {
                warn!(?kind, "Recognition unavailable; disabling auto-listen");
                effects.extend(self.set_auto_listen(false));
            }
        }
        (class, effects)
    }

    pub fn on_end(&mut self, output_busy: bool) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        self.apply(InputSignal::EngineEnded, &mut effects);
        effects.extend(self.schedule_restart(output_busy));
        effects
    }

    pub fn on_restart_timer(&mut self, timer: TimerId, output_busy: bool) -> Vec<SideEffect> {
        if !self.restart.accept(timer) {
            debug!(?timer, "Discarding superseded restart timer");
            return Vec::new();
        }
        if !self.auto_listen || output_busy {
            return Vec::new();
        }
        self.start().unwrap_or_default()
    }

    fn schedule_restart(&mut self, output_busy: bool) -> Option<SideEffect> {
        if self.auto_listen && !output_busy && self.phase == InputPhase::Idle {
            debug!(delay_ms = self.restart_debounce.as_millis() as u64, "Scheduling recognition restart");
            Some(self.restart.schedule(self.restart_debounce))
        } else {
            None
        }
    }

    fn apply(&mut self, signal: InputSignal, effects: &mut Vec<SideEffect>) -> bool {
        match self.phase.transition(signal) {
            Some(next) => {
                if next != self.phase {
                    debug!(from = ?self.phase, to = ?next, "Input phase");
                    self.phase = next;
                    effects.push(SideEffect::InputStateChanged(next));
                }
                true
            }
            None => false,
        }
    }
}
