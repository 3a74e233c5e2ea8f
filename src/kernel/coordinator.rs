use tracing::{debug, info, warn};

use super::event::{Event, RecognitionEvent, RequestId, SynthesisEvent, UserCommand};
use super::scheduler::{SideEffect, TimerId, TimerKind, TimerSlot};
use super::speech::input::{InputPhase, SpeechInputController};
use super::speech::output::{SayOutcome, SpeechGate, SpeechOutputController};
use super::state::{ModeDelta, ModeRecord, ResultEpoch};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;
use crate::config::Timings;
use crate::error::{ErrorClass, LookupError};
use crate::intent::{self, Action, Intent, THIS_SENTINEL};
use crate::outputs::narration;
use crate::services::favorites::{FavoriteEntry, FavoritesStore};
use crate::services::lookup::{EntityKind, EntityRef, LookupPayload, LookupRequest, Section};
use crate::services::status::Severity;

const NOT_UNDERSTOOD: &str = "Sorry, I could not understand that command. Please try again.";

/// Serializes the speech input and output controllers and owns the mode flags.
///
/// **CHANNEL LAW**: the microphone is paused before anything is spoken and is
/// only reopened once output is back to Idle. Every method here runs to
/// completion without awaiting; the outside world is reached only through the
/// returned `SideEffect`s.
pub struct Coordinator {
    input: SpeechInputController,
    output: SpeechOutputController,
    mode: ModeRecord,
    favorites: Box<dyn FavoritesStore>,
    timings: Timings,
    resume: TimerSlot,
    remote_enabled: bool,
    next_request: u64,
    latest_transcript: Option<RequestId>,
    latest_resolve: Option<RequestId>,
    /// A fatal microphone error has been explained once already.
    fatal_explained: bool,
    pub telemetry: TelemetryRecorder,
}

impl Coordinator {
    pub fn new(
        timings: Timings,
        auto_listen: bool,
        favorites: Box<dyn FavoritesStore>,
        remote_enabled: bool,
    ) -> Self {
        Self {
            input: SpeechInputController::new(timings.restart_debounce, auto_listen),
            output: SpeechOutputController::new(timings.interrupt_settle),
            mode: ModeRecord::new(),
            favorites,
            timings,
            resume: TimerSlot::new(TimerKind::ResumeAfterSpeech),
            remote_enabled,
            next_request: 0,
            latest_transcript: None,
            latest_resolve: None,
            fatal_explained: false,
            telemetry: TelemetryRecorder::new(),
        }
    }

    pub fn input(&self) -> &SpeechInputController {
        &self.input
    }

    pub fn output(&self) -> &SpeechOutputController {
        &self.output
    }

    pub fn mode(&self) -> &ModeRecord {
        &self.mode
    }

    pub fn favorites(&self) -> &dyn FavoritesStore {
        self.favorites.as_ref()
    }

    /// Single entry point. Applies one event and returns the effects to run.
    pub fn handle(&mut self, event: Event) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        match event {
            Event::Boot => {
                if self.input.auto_listen() {
                    effects.extend(self.input.start().unwrap_or_default());
                }
            }
            Event::Recognition(recognition) => self.on_recognition(recognition, &mut effects),
            Event::Synthesis(synthesis) => self.on_synthesis(synthesis, &mut effects),
            Event::TimerFired(timer) => self.on_timer(timer, &mut effects),
            Event::LookupCompleted { epoch, outcome } => {
                self.on_lookup_completed(epoch, outcome, &mut effects)
            }
            Event::FavoriteResolved {
                request,
                kind,
                outcome,
            } => self.on_favorite_resolved(request, kind, outcome, &mut effects),
            Event::RemoteParsed {
                request,
                utterance,
                intent,
            } => self.on_remote_parsed(request, &utterance, intent, &mut effects),
            Event::Command(command) => self.on_command(command, &mut effects),
            Event::Shutdown => {
                effects.extend(self.output.cancel());
                effects.extend(self.input.stop());
                effects.extend(self.resume.cancel());
            }
        }

        self.observe();
        effects
    }

    /// New final utterance. Barge-in first, then parse and dispatch.
    pub fn on_transcript(&mut self, text: &str) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        if self.output.is_speaking() {
            info!("Barge-in: cancelling narration for new command");
            self.telemetry.record(TelemetryEvent::BargeIn);
            effects.extend(self.output.cancel());
            self.observe();
            self.after_output_idle(&mut effects);
        }

        let local = intent::parse(text);
        // Any newer utterance supersedes a remote parse still in flight.
        self.latest_transcript = None;
        if self.remote_enabled && !local.action.is_meta() {
            let request = self.next_request_id();
            self.latest_transcript = Some(request);
            debug!(?request, "Asking remote parser");
            effects.push(SideEffect::ParseRemote {
                request,
                utterance: text.to_string(),
            });
            return effects;
        }

        effects.extend(self.dispatch(local));
        effects
    }

    pub fn dispatch(&mut self, intent: Intent) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        info!(action = ?intent.action, "Dispatching intent");
        self.telemetry.record(TelemetryEvent::IntentDispatched(intent.action));

        match intent.action {
            Action::StopSpeaking => self.stop_speaking(&mut effects),
            Action::ResumeSpeaking => {
                self.mode.reduce(ModeDelta::Muted(false));
                match self.mode.current().map(|c| c.payload.clone()) {
                    Some(payload) => {
                        let text = narration::narrate_payload(&payload);
                        self.narrate(&text, true, &mut effects);
                    }
                    None => effects.push(SideEffect::announce("Speech resumed", Severity::Info)),
                }
            }
            Action::ReadInjuries => self.read_section(Section::Injuries, &mut effects),
            Action::ReadTransfers => self.read_section(Section::Transfers, &mut effects),
            Action::ReadAchievements => self.read_section(Section::Achievements, &mut effects),
            Action::ReadMarketValue => self.read_section(Section::MarketValue, &mut effects),
            Action::SearchPlayer | Action::ComparePlayers | Action::ClubAchievements => {
                match lookup_request(&intent) {
                    Some(request) => self.start_lookup(request, &mut effects),
                    None => self.not_understood(&mut effects),
                }
            }
            Action::ShowFavorites => {
                let entries = self.favorites.list();
                effects.push(SideEffect::announce(
                    format!("{} favorites", entries.len()),
                    Severity::Info,
                ));
                let text = narration::narrate_favorites(&entries);
                self.narrate(&text, true, &mut effects);
            }
            Action::AddPlayerFavorite => {
                let name = intent.player_name.as_deref().unwrap_or(THIS_SENTINEL);
                self.add_favorite(EntityKind::Player, name, &mut effects);
            }
            Action::AddClubFavorite => {
                let name = intent.club_name.as_deref().unwrap_or(THIS_SENTINEL);
                self.add_favorite(EntityKind::Club, name, &mut effects);
            }
            Action::AddCurrentPlayerFavorite => {
                self.add_favorite(EntityKind::Player, THIS_SENTINEL, &mut effects)
            }
            Action::AddCurrentClubFavorite => {
                self.add_favorite(EntityKind::Club, THIS_SENTINEL, &mut effects)
            }
            Action::RemovePlayerFavorite => {
                let name = intent.player_name.as_deref().unwrap_or(THIS_SENTINEL);
                self.remove_favorite(EntityKind::Player, name, &mut effects);
            }
            Action::RemoveClubFavorite => {
                let name = intent.club_name.as_deref().unwrap_or(THIS_SENTINEL);
                self.remove_favorite(EntityKind::Club, name, &mut effects);
            }
        }

        effects
    }

    fn on_recognition(&mut self, event: RecognitionEvent, effects: &mut Vec<SideEffect>) {
        let busy = self.output.is_speaking();
        match event {
            RecognitionEvent::Started => effects.extend(self.input.on_started()),
            RecognitionEvent::AlreadyRunning => effects.extend(self.input.on_already_running()),
            RecognitionEvent::Result {
                transcript,
                is_final,
            } => {
                if let Some(text) = self.input.on_result(&transcript, is_final) {
                    self.mode.reduce(ModeDelta::UserInteracted);
                    effects.extend(self.on_transcript(&text));
                }
            }
            RecognitionEvent::Error(kind) => {
                let (class, more) = self.input.on_error(kind, busy);
                self.note_restart(&more);
                effects.extend(more);
                if class != ErrorClass::Transient {
                    effects.push(SideEffect::announce(kind.explanation(), Severity::Error));
                    if !self.fatal_explained && self.narrate(kind.explanation(), false, effects) {
                        self.fatal_explained = true;
                    }
                }
            }
            RecognitionEvent::Ended => {
                let more = self.input.on_end(busy);
                self.note_restart(&more);
                effects.extend(more);
            }
        }
    }

    fn on_synthesis(&mut self, event: SynthesisEvent, effects: &mut Vec<SideEffect>) {
        match event {
            SynthesisEvent::Started(utterance) => {
                if self.output.on_started(utterance) {
                    debug!(?utterance, "Speech started");
                }
            }
            SynthesisEvent::Ended(utterance) => {
                if self.output.on_finished(utterance) {
                    self.observe();
                    self.after_output_idle(effects);
                }
            }
            SynthesisEvent::Failed { utterance, reason } => {
                if self.output.on_finished(utterance) {
                    warn!(%reason, "Speech synthesis failed");
                    self.observe();
                    self.after_output_idle(effects);
                }
            }
        }
    }

    fn on_timer(&mut self, timer: TimerId, effects: &mut Vec<SideEffect>) {
        match timer.kind {
            TimerKind::RestartListening => {
                let busy = self.output.is_speaking();
                effects.extend(self.input.on_restart_timer(timer, busy));
            }
            TimerKind::SpeechSettle => {
                let gate = self.gate();
                effects.extend(self.output.on_settle_timer(timer, gate));
                if self.output.is_speaking() {
                    // The mic may have been reopened by a stray callback while settling.
                    effects.extend(self.input.pause());
                }
            }
            TimerKind::ResumeAfterSpeech => {
                if !self.resume.accept(timer) {
                    return;
                }
                // Something else took over in the meantime.
                if !self.input.auto_listen()
                    || self.output.is_speaking()
                    || self.input.phase() != InputPhase::Idle
                {
                    return;
                }
                effects.extend(self.input.start().unwrap_or_default());
            }
        }
    }

    fn on_command(&mut self, command: UserCommand, effects: &mut Vec<SideEffect>) {
        match command {
            UserCommand::Interaction => self.mode.reduce(ModeDelta::UserInteracted),
            UserCommand::SetAutoListen(enabled) => {
                effects.extend(self.input.set_auto_listen(enabled));
                if enabled {
                    self.fatal_explained = false;
                    if !self.output.is_speaking() {
                        effects.extend(self.input.start().unwrap_or_default());
                    }
                }
            }
            UserCommand::ToggleMic => {
                self.mode.reduce(ModeDelta::UserInteracted);
                if self.input.phase() == InputPhase::Idle {
                    self.fatal_explained = false;
                    effects.extend(self.input.set_auto_listen(true));
                    if !self.output.is_speaking() {
                        effects.extend(self.input.start().unwrap_or_default());
                    }
                } else {
                    effects.extend(self.input.stop());
                }
            }
            UserCommand::StopButton => {
                self.mode.reduce(ModeDelta::UserInteracted);
                effects.extend(self.dispatch(Intent::bare(Action::StopSpeaking)));
            }
            UserCommand::Submit(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                self.mode.reduce(ModeDelta::UserInteracted);
                effects.extend(self.on_transcript(text));
            }
        }
    }

    fn on_remote_parsed(
        &mut self,
        request: RequestId,
        utterance: &str,
        remote: Option<Intent>,
        effects: &mut Vec<SideEffect>,
    ) {
        if self.latest_transcript != Some(request) {
            debug!(?request, "Discarding remote parse for a superseded utterance");
            self.telemetry.record(TelemetryEvent::StaleDiscarded);
            return;
        }
        self.latest_transcript = None;

        let local = intent::parse(utterance);
        let chosen = match remote {
            // Control actions are never reinterpreted.
            _ if local.action.is_meta() => local,
            Some(remote) if remote.is_actionable() => remote,
            _ => {
                debug!("Remote parser unavailable; using local parse");
                self.telemetry.record(TelemetryEvent::RemoteFallback);
                local
            }
        };
        effects.extend(self.dispatch(chosen));
    }

    fn on_lookup_completed(
        &mut self,
        epoch: ResultEpoch,
        outcome: Result<LookupPayload, LookupError>,
        effects: &mut Vec<SideEffect>,
    ) {
        if epoch != self.mode.epoch() {
            debug!(?epoch, current = ?self.mode.epoch(), "Discarding stale lookup result");
            self.telemetry.record(TelemetryEvent::StaleDiscarded);
            return;
        }

        match outcome {
            Ok(payload) => {
                // Duplicate completion for a result we already hold.
                if self.mode.current().is_some_and(|c| c.epoch == epoch) {
                    return;
                }
                effects.push(SideEffect::announce(
                    format!("Showing {}", payload.headline()),
                    Severity::Info,
                ));
                self.mode.reduce(ModeDelta::ResultArrived(payload));
                self.narrate_current(effects);
            }
            Err(error) => {
                warn!(%error, "Lookup failed");
                let message = error.to_string();
                effects.push(SideEffect::announce(message.clone(), Severity::Error));
                self.remark(&message, effects);
            }
        }
    }

    fn on_favorite_resolved(
        &mut self,
        request: RequestId,
        kind: EntityKind,
        outcome: Result<EntityRef, LookupError>,
        effects: &mut Vec<SideEffect>,
    ) {
        if self.latest_resolve != Some(request) {
            self.telemetry.record(TelemetryEvent::StaleDiscarded);
            return;
        }
        self.latest_resolve = None;

        match outcome {
            Ok(entity) if entity.kind == kind => self.store_favorite(&entity, effects),
            Ok(_) | Err(_) => {
                let message = format!("I could not find that {} to add.", kind.label());
                effects.push(SideEffect::announce(message.clone(), Severity::Warning));
                self.remark(&message, effects);
            }
        }
    }

    fn stop_speaking(&mut self, effects: &mut Vec<SideEffect>) {
        // An explicit stop is a durable preference, not a one-shot cancel.
        self.mode.reduce(ModeDelta::Muted(true));
        // A remote parse still in flight belongs to a command the user just overrode.
        self.latest_transcript = None;
        effects.extend(self.output.cancel());
        self.observe();
        effects.push(SideEffect::announce("Speech muted", Severity::Info));
        self.after_output_idle(effects);
    }

    fn read_section(&mut self, section: Section, effects: &mut Vec<SideEffect>) {
        let text = self
            .mode
            .current()
            .and_then(|c| narration::narrate_section(&c.payload, section));

        match text {
            Some(text) => {
                self.narrate(&text, true, effects);
            }
            None => {
                let message = format!("{} information is not available.", section.label());
                effects.push(SideEffect::announce(message.clone(), Severity::Warning));
                self.remark(&message, effects);
            }
        }
    }

    fn start_lookup(&mut self, request: LookupRequest, effects: &mut Vec<SideEffect>) {
        self.mode.reduce(ModeDelta::LookupStarted);
        let epoch = self.mode.epoch();
        info!(?epoch, "Starting lookup");
        effects.push(SideEffect::announce(
            format!("Searching for {}", request.describe()),
            Severity::Info,
        ));
        effects.push(SideEffect::Lookup { epoch, request });
    }

    fn not_understood(&mut self, effects: &mut Vec<SideEffect>) {
        effects.push(SideEffect::announce(NOT_UNDERSTOOD, Severity::Warning));
        self.remark(NOT_UNDERSTOOD, effects);
    }

    fn add_favorite(&mut self, kind: EntityKind, name: &str, effects: &mut Vec<SideEffect>) {
        let last = self.mode.last_entity(kind).cloned();

        if name == THIS_SENTINEL {
            match last {
                Some(entity) => self.store_favorite(&entity, effects),
                None => self.nothing_to_act_on(kind, effects),
            }
            return;
        }

        match last.filter(|entity| entity.matches_name(name)) {
            Some(entity) => self.store_favorite(&entity, effects),
            None => {
                let request = self.next_request_id();
                self.latest_resolve = Some(request);
                effects.push(SideEffect::announce(
                    format!("Looking up {name}"),
                    Severity::Info,
                ));
                effects.push(SideEffect::ResolveFavorite {
                    request,
                    kind,
                    name: name.to_string(),
                });
            }
        }
    }

    fn store_favorite(&mut self, entity: &EntityRef, effects: &mut Vec<SideEffect>) {
        let message = if self.favorites.add(FavoriteEntry::from(entity)) {
            format!("Added {} to your favorites.", entity.name)
        } else {
            format!("{} is already in your favorites.", entity.name)
        };
        effects.push(SideEffect::announce(message.clone(), Severity::Info));
        self.remark(&message, effects);
    }

    fn remove_favorite(&mut self, kind: EntityKind, name: &str, effects: &mut Vec<SideEffect>) {
        let target = if name == THIS_SENTINEL {
            match self.mode.last_entity(kind) {
                Some(entity) => Some((entity.id.clone(), entity.name.clone())),
                None => return self.nothing_to_act_on(kind, effects),
            }
        } else {
            let spoken = name.to_lowercase();
            self.favorites
                .list()
                .into_iter()
                .find(|e| e.kind == kind && e.name.to_lowercase().contains(&spoken))
                .map(|e| (e.id, e.name))
        };

        let message = match target {
            Some((id, label)) if self.favorites.remove(kind, &id) => {
                format!("Removed {label} from your favorites.")
            }
            Some((_, label)) => format!("{label} is not in your favorites."),
            None => format!("{name} is not in your favorites."),
        };
        effects.push(SideEffect::announce(message.clone(), Severity::Info));
        self.remark(&message, effects);
    }

    fn nothing_to_act_on(&mut self, kind: EntityKind, effects: &mut Vec<SideEffect>) {
        let message = format!("There is no {} on screen to act on.", kind.label());
        effects.push(SideEffect::announce(message.clone(), Severity::Warning));
        self.remark(&message, effects);
    }

    /// Narrates the current result once; later calls for the same result are
    /// ignored while it is being spoken.
    fn narrate_current(&mut self, effects: &mut Vec<SideEffect>) {
        let Some(current) = self.mode.current() else {
            return;
        };
        let epoch = current.epoch;
        if self.mode.was_narrated(epoch) && self.output.is_speaking() {
            debug!(?epoch, "Result already being narrated");
            return;
        }
        let text = narration::narrate_payload(&current.payload);
        if self.narrate(&text, true, effects) {
            self.mode.reduce(ModeDelta::Narrated(epoch));
        }
    }

    /// Status remarks never interrupt ongoing speech.
    fn remark(&mut self, text: &str, effects: &mut Vec<SideEffect>) {
        self.narrate(text, false, effects);
    }

    /// Pauses the microphone and hands `text` to the speaker. Never queues:
    /// while muted the request is simply dropped.
    fn narrate(&mut self, text: &str, interrupt: bool, effects: &mut Vec<SideEffect>) -> bool {
        if self.mode.is_muted() {
            debug!("Muted; narration suppressed");
            self.telemetry.record(TelemetryEvent::NarrationSuppressed);
            return false;
        }
        if !interrupt && self.output.is_speaking() {
            return false;
        }
        if !self.mode.user_interacted() {
            debug!("No user interaction yet; narration not allowed");
            return false;
        }

        effects.extend(self.resume.cancel());
        effects.extend(self.input.pause());
        self.observe();

        let gate = self.gate();
        let (outcome, more) = self.output.say(text, interrupt, gate);
        effects.extend(more);
        self.observe();

        matches!(outcome, SayOutcome::Started(_) | SayOutcome::Settling(_))
    }

    fn after_output_idle(&mut self, effects: &mut Vec<SideEffect>) {
        if self.input.auto_listen() {
            effects.push(self.resume.schedule(self.timings.resume_delay));
        }
    }

    fn gate(&self) -> SpeechGate {
        SpeechGate {
            muted: self.mode.is_muted(),
            user_interacted: self.mode.user_interacted(),
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn note_restart(&mut self, effects: &[SideEffect]) {
        let scheduled = effects.iter().any(|e| {
            matches!(e, SideEffect::ScheduleTimer { timer, .. } if timer.kind == TimerKind::RestartListening)
        });
        if scheduled {
            self.telemetry.record(TelemetryEvent::RestartScheduled);
        }
    }

    fn observe(&mut self) {
        self.telemetry.observe_channels(TelemetryEvent::Channels {
            input: self.input.phase(),
            output_speaking: self.output.is_speaking(),
        });
    }
}

fn lookup_request(intent: &Intent) -> Option<LookupRequest> {
    fn named(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    match intent.action {
        Action::SearchPlayer => Some(LookupRequest::Player {
            name: named(&intent.player_name)?,
            club: named(&intent.club_name),
        }),
        Action::ComparePlayers => Some(LookupRequest::Compare {
            first: named(&intent.player_name)?,
            second: named(&intent.player_name2)?,
        }),
        Action::ClubAchievements => Some(LookupRequest::Club {
            name: named(&intent.club_name)?,
        }),
        _ => None,
    }
}
