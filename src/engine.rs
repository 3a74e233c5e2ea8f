//! Speech engine seams and their console implementations.
//!
//! Engine primitives are fire-and-forget: they return immediately and report
//! lifecycle changes later as [`Event`]s on the driver's channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::kernel::event::{Event, RecognitionEvent, SynthesisEvent, UserCommand, UtteranceId};

pub trait RecognitionEngine: Send {
    /// Begin a session. Fails with [`EngineError::AlreadyStarted`] if one is running.
    fn start(&mut self) -> Result<(), EngineError>;
    /// Ask the running session to end. The end arrives as an event.
    fn stop(&mut self);
}

pub trait SynthesisEngine: Send {
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<(), EngineError>;
    /// Abort whatever is playing. Idempotent.
    fn cancel(&mut self);
}

fn emit(tx: &mpsc::Sender<Event>, event: Event) {
    if let Err(e) = tx.try_send(event) {
        warn!("Dropping engine event: {}", e);
    }
}

/// Reads utterances from stdin, one per line.
///
/// A line typed while a session is open becomes a final transcript and ends
/// the session. Outside a session it is submitted as a typed command. Lines
/// starting with `:` are console controls.
pub struct StdinRecognizer {
    tx: mpsc::Sender<Event>,
    listening: Arc<AtomicBool>,
}

impl StdinRecognizer {
    pub fn spawn(tx: mpsc::Sender<Event>) -> Self {
        let listening = Arc::new(AtomicBool::new(false));
        let reader_tx = tx.clone();
        let reader_listening = listening.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("stdin read failed: {}", e);
                        break;
                    }
                };

                for event in console_events(line.trim(), &reader_listening) {
                    if reader_tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            let _ = reader_tx.send(Event::Shutdown).await;
        });

        Self { tx, listening }
    }
}

/// Maps one console line to the events it produces.
fn console_events(line: &str, listening: &AtomicBool) -> Vec<Event> {
    if line.is_empty() {
        return Vec::new();
    }

    if let Some(control) = line.strip_prefix(':') {
        let command = match control.trim() {
            "quit" | "q" => return vec![Event::Shutdown],
            "click" => UserCommand::Interaction,
            "mic" => UserCommand::ToggleMic,
            "stop" => UserCommand::StopButton,
            "auto on" => UserCommand::SetAutoListen(true),
            "auto off" => UserCommand::SetAutoListen(false),
            other => {
                println!("Unknown control ':{other}'. Try :click, :mic, :stop, :auto on|off, :quit");
                return Vec::new();
            }
        };
        return vec![Event::Command(command)];
    }

    if listening.swap(false, Ordering::SeqCst) {
        vec![
            Event::Recognition(RecognitionEvent::Result {
                transcript: line.to_string(),
                is_final: true,
            }),
            Event::Recognition(RecognitionEvent::Ended),
        ]
    } else {
        vec![Event::Command(UserCommand::Submit(line.to_string()))]
    }
}

impl RecognitionEngine for StdinRecognizer {
    fn start(&mut self) -> Result<(), EngineError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyStarted);
        }
        println!("[MIC] listening...");
        emit(&self.tx, Event::Recognition(RecognitionEvent::Started));
        Ok(())
    }

    fn stop(&mut self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            println!("[MIC] off");
            emit(&self.tx, Event::Recognition(RecognitionEvent::Ended));
        }
    }
}

/// Prints utterances and holds the channel for as long as reading them would
/// take, or hands them to an external program when one is configured.
pub struct ConsoleSynthesizer {
    tx: mpsc::Sender<Event>,
    words_per_minute: u32,
    command: Option<String>,
    current: Option<CancellationToken>,
}

impl ConsoleSynthesizer {
    pub fn new(tx: mpsc::Sender<Event>, words_per_minute: u32, command: Option<String>) -> Self {
        Self {
            tx,
            words_per_minute: words_per_minute.max(1),
            command,
            current: None,
        }
    }

    fn reading_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * 60_000 / u64::from(self.words_per_minute))
    }
}

impl SynthesisEngine for ConsoleSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<(), EngineError> {
        self.cancel();

        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let tx = self.tx.clone();
        let text = text.to_string();
        let duration = self.reading_time(&text);
        let command = self.command.clone();

        tokio::spawn(async move {
            let _ = tx.send(Event::Synthesis(SynthesisEvent::Started(utterance))).await;

            let finished = match command {
                Some(program) => {
                    match tokio::process::Command::new(&program)
                        .arg(&text)
                        .kill_on_drop(true)
                        .spawn()
                    {
                        Ok(mut child) => {
                            tokio::select! {
                                status = child.wait() => match status {
                                    Ok(_) => SynthesisEvent::Ended(utterance),
                                    Err(e) => SynthesisEvent::Failed { utterance, reason: e.to_string() },
                                },
                                _ = token.cancelled() => {
                                    let _ = child.kill().await;
                                    SynthesisEvent::Failed { utterance, reason: "interrupted".to_string() }
                                }
                            }
                        }
                        Err(e) => SynthesisEvent::Failed {
                            utterance,
                            reason: format!("failed to spawn '{program}': {e}"),
                        },
                    }
                }
                None => {
                    println!("[SPEAK] {text}");
                    tokio::select! {
                        _ = tokio::time::sleep(duration) => SynthesisEvent::Ended(utterance),
                        _ = token.cancelled() => {
                            println!("[SPEAK] (interrupted)");
                            SynthesisEvent::Failed { utterance, reason: "interrupted".to_string() }
                        }
                    }
                }
            };

            debug!(?finished, "Utterance finished");
            let _ = tx.send(Event::Synthesis(finished)).await;
        });

        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            info!("Cancelling speech");
            token.cancel();
        }
    }
}
