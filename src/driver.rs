//! Async shell around the kernel.
//!
//! The driver owns the engines, timers and collaborators. It feeds events into
//! the [`Coordinator`] one at a time and executes the returned side effects.
//! Slow work (lookups, remote parsing) runs in spawned tasks whose results
//! come back as events, so the coordinator is never blocked.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{RecognitionEngine, SynthesisEngine};
use crate::error::EngineError;
use crate::kernel::coordinator::Coordinator;
use crate::kernel::event::{Event, RecognitionEvent, SynthesisEvent};
use crate::kernel::scheduler::{SideEffect, TimerId, TimerKind};
use crate::kernel::telemetry::metrics::TelemetrySnapshot;
use crate::services::lookup::LookupHandler;
use crate::services::remote_parser::RemoteParser;
use crate::services::status::StatusSink;

/// Collaborators reached from side effects.
#[derive(Clone)]
pub struct Services {
    pub lookup: Arc<dyn LookupHandler>,
    pub remote: Option<Arc<dyn RemoteParser>>,
    pub status: Arc<dyn StatusSink>,
}

/// One cancellable sleep per timer kind. Scheduling a kind replaces the
/// previous one.
#[derive(Debug, Default)]
pub struct TimerWheel {
    slots: HashMap<TimerKind, CancellationToken>,
}

impl TimerWheel {
    pub fn schedule(&mut self, timer: TimerId, delay: Duration, tx: mpsc::Sender<Event>) {
        self.cancel(timer.kind);

        let token = CancellationToken::new();
        self.slots.insert(timer.kind, token.clone());
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(Event::TimerFired(timer)).await;
                }
            }
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(token) = self.slots.remove(&kind) {
            token.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, token) in self.slots.drain() {
            token.cancel();
        }
    }
}

pub struct Driver {
    rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    coordinator: Coordinator,
    recognizer: Box<dyn RecognitionEngine>,
    synthesizer: Box<dyn SynthesisEngine>,
    services: Services,
    timers: TimerWheel,
}

impl Driver {
    pub fn new(
        rx: mpsc::Receiver<Event>,
        tx: mpsc::Sender<Event>,
        coordinator: Coordinator,
        recognizer: Box<dyn RecognitionEngine>,
        synthesizer: Box<dyn SynthesisEngine>,
        services: Services,
    ) -> Self {
        Self {
            rx,
            tx,
            coordinator,
            recognizer,
            synthesizer,
            services,
            timers: TimerWheel::default(),
        }
    }

    /// Runs until a shutdown event or Ctrl+C, and returns the session's
    /// channel telemetry.
    pub async fn run(mut self) -> TelemetrySnapshot {
        info!("Voice channel active");
        self.pump(Event::Boot);

        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(Event::Shutdown) | None => break,
                    Some(event) => self.pump(event),
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.pump(Event::Shutdown);
        self.timers.cancel_all();
        let snapshot = self.coordinator.telemetry.snapshot();
        info!(?snapshot, "Voice channel stopped");
        snapshot
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Applies one event, including any follow-up events the effects produce
    /// synchronously.
    pub fn pump(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.coordinator.handle(event) {
                if let Some(follow_up) = self.execute(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&mut self, effect: SideEffect) -> Option<Event> {
        match effect {
            SideEffect::StartRecognition => match self.recognizer.start() {
                Ok(()) => None,
                Err(EngineError::AlreadyStarted) => {
                    Some(Event::Recognition(RecognitionEvent::AlreadyRunning))
                }
                Err(EngineError::Recognition(kind)) => {
                    warn!(?kind, "Recognition start failed");
                    Some(Event::Recognition(RecognitionEvent::Error(kind)))
                }
            },
            SideEffect::StopRecognition => {
                self.recognizer.stop();
                None
            }
            SideEffect::Speak { utterance, text } => {
                match self.synthesizer.speak(utterance, &text) {
                    Ok(()) => None,
                    Err(e) => Some(Event::Synthesis(SynthesisEvent::Failed {
                        utterance,
                        reason: e.to_string(),
                    })),
                }
            }
            SideEffect::CancelSpeech => {
                self.synthesizer.cancel();
                None
            }
            SideEffect::ScheduleTimer { timer, delay } => {
                self.timers.schedule(timer, delay, self.tx.clone());
                None
            }
            SideEffect::CancelTimer(kind) => {
                self.timers.cancel(kind);
                None
            }
            SideEffect::Lookup { epoch, request } => {
                let lookup = self.services.lookup.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = lookup.lookup(&request).await;
                    let _ = tx.send(Event::LookupCompleted { epoch, outcome }).await;
                });
                None
            }
            SideEffect::ResolveFavorite {
                request,
                kind,
                name,
            } => {
                let lookup = self.services.lookup.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = lookup.resolve(kind, &name).await;
                    let _ = tx
                        .send(Event::FavoriteResolved {
                            request,
                            kind,
                            outcome,
                        })
                        .await;
                });
                None
            }
            SideEffect::ParseRemote { request, utterance } => {
                let Some(remote) = self.services.remote.clone() else {
                    return Some(Event::RemoteParsed {
                        request,
                        utterance,
                        intent: None,
                    });
                };
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let intent = match remote.parse(&utterance).await {
                        Ok(intent) => Some(intent),
                        Err(e) => {
                            warn!("Remote parser failed: {}", e);
                            None
                        }
                    };
                    let _ = tx
                        .send(Event::RemoteParsed {
                            request,
                            utterance,
                            intent,
                        })
                        .await;
                });
                None
            }
            SideEffect::Announce { message, severity } => {
                self.services.status.announce(&message, severity);
                None
            }
            SideEffect::InputStateChanged(phase) => {
                debug!(?phase, "Listening state");
                None
            }
        }
    }
}
