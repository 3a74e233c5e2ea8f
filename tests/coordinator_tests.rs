mod common;

use matchvoice::config::Timings;
use matchvoice::error::RecognitionErrorKind;
use matchvoice::intent::{Action, Intent};
use matchvoice::kernel::coordinator::Coordinator;
use matchvoice::kernel::event::{
    Event, RecognitionEvent, RequestId, SynthesisEvent, UserCommand, UtteranceId,
};
use matchvoice::kernel::scheduler::{SideEffect, TimerId, TimerKind};
use matchvoice::kernel::speech::input::InputPhase;
use matchvoice::kernel::state::ResultEpoch;
use matchvoice::services::favorites::InMemoryFavorites;
use matchvoice::services::lookup::{EntityKind, LookupPayload, LookupRequest};
use matchvoice::services::status::Severity;

fn coordinator(remote: bool) -> Coordinator {
    Coordinator::new(
        Timings::default(),
        true,
        Box::new(InMemoryFavorites::default()),
        remote,
    )
}

fn listening(remote: bool) -> Coordinator {
    let mut c = coordinator(remote);
    let effects = c.handle(Event::Boot);
    assert!(effects.contains(&SideEffect::StartRecognition));
    c.handle(Event::Recognition(RecognitionEvent::Started));
    assert_eq!(c.input().phase(), InputPhase::Listening);
    c
}

fn hear(c: &mut Coordinator, text: &str) -> Vec<SideEffect> {
    c.handle(Event::Recognition(RecognitionEvent::Result {
        transcript: text.to_string(),
        is_final: true,
    }))
}

fn type_in(c: &mut Coordinator, text: &str) -> Vec<SideEffect> {
    c.handle(Event::Command(UserCommand::Submit(text.to_string())))
}

fn lookup_of(effects: &[SideEffect]) -> Option<(ResultEpoch, LookupRequest)> {
    effects.iter().find_map(|e| match e {
        SideEffect::Lookup { epoch, request } => Some((*epoch, request.clone())),
        _ => None,
    })
}

fn spoken(effects: &[SideEffect]) -> Option<(UtteranceId, String)> {
    effects.iter().find_map(|e| match e {
        SideEffect::Speak { utterance, text } => Some((*utterance, text.clone())),
        _ => None,
    })
}

fn announced(effects: &[SideEffect], severity: Severity) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::Announce { message, severity: s } if *s == severity => {
                Some(message.clone())
            }
            _ => None,
        })
        .collect()
}

fn timer(effects: &[SideEffect], kind: TimerKind) -> Option<TimerId> {
    effects.iter().find_map(|e| match e {
        SideEffect::ScheduleTimer { timer, .. } if timer.kind == kind => Some(*timer),
        _ => None,
    })
}

fn position(effects: &[SideEffect], wanted: impl Fn(&SideEffect) -> bool) -> usize {
    effects
        .iter()
        .position(wanted)
        .unwrap_or_else(|| panic!("effect not found in {effects:?}"))
}

/// Searches for Haaland and delivers the result; returns the narration id.
fn narrating_haaland(c: &mut Coordinator) -> UtteranceId {
    let (epoch, _) = lookup_of(&hear(c, "show me Haaland")).expect("lookup issued");
    let effects = c.handle(Event::LookupCompleted {
        epoch,
        outcome: Ok(common::player_payload(common::haaland())),
    });
    let (id, _) = spoken(&effects).expect("result narrated");
    id
}

#[test]
fn test_full_cycle_keeps_channels_exclusive() {
    let mut c = listening(false);

    let effects = hear(&mut c, "show me Haaland");
    assert_eq!(
        lookup_of(&effects),
        Some((
            ResultEpoch(1),
            LookupRequest::Player {
                name: "haaland".to_string(),
                club: None
            }
        ))
    );
    assert_eq!(announced(&effects, Severity::Info), vec!["Searching for haaland"]);

    let effects = c.handle(Event::LookupCompleted {
        epoch: ResultEpoch(1),
        outcome: Ok(common::player_payload(common::haaland())),
    });
    // Microphone is released before anything is spoken.
    let stop = position(&effects, |e| *e == SideEffect::StopRecognition);
    let speak = position(&effects, |e| matches!(e, SideEffect::Speak { .. }));
    assert!(stop < speak);
    let (utterance, text) = spoken(&effects).unwrap();
    assert!(text.starts_with("Erling Haaland, Striker at Manchester City."));

    // The session end while speaking must not schedule a restart.
    let effects = c.handle(Event::Recognition(RecognitionEvent::Ended));
    assert_eq!(timer(&effects, TimerKind::RestartListening), None);
    assert_eq!(c.input().phase(), InputPhase::Idle);

    let effects = c.handle(Event::Synthesis(SynthesisEvent::Ended(utterance)));
    let resume = timer(&effects, TimerKind::ResumeAfterSpeech).expect("resume scheduled");

    let effects = c.handle(Event::TimerFired(resume));
    assert!(effects.contains(&SideEffect::StartRecognition));

    assert_eq!(c.telemetry.snapshot().overlaps, 0);
}

#[test]
fn test_result_is_narrated_once() {
    let mut c = listening(false);
    narrating_haaland(&mut c);

    let effects = c.handle(Event::LookupCompleted {
        epoch: ResultEpoch(1),
        outcome: Ok(common::player_payload(common::haaland())),
    });
    assert_eq!(spoken(&effects), None);
}

#[test]
fn test_stale_lookup_is_discarded() {
    let mut c = listening(false);
    hear(&mut c, "show me Haaland");
    let (epoch, _) = lookup_of(&hear(&mut c, "show Barcelona achievements")).unwrap();
    assert_eq!(epoch, ResultEpoch(2));

    let effects = c.handle(Event::LookupCompleted {
        epoch: ResultEpoch(1),
        outcome: Ok(common::player_payload(common::haaland())),
    });
    assert!(effects.is_empty());
    assert!(c.mode().current().is_none());
    assert_eq!(c.telemetry.snapshot().stale_discards, 1);

    let effects = c.handle(Event::LookupCompleted {
        epoch,
        outcome: Ok(LookupPayload::Club(common::barcelona())),
    });
    let (_, text) = spoken(&effects).unwrap();
    assert!(text.contains("5 times Champions League"));
}

#[test]
fn test_barge_in_cancels_before_dispatch() {
    let mut c = listening(false);
    narrating_haaland(&mut c);
    assert!(c.output().is_speaking());

    let effects = type_in(&mut c, "show Barcelona achievements");
    let cancel = position(&effects, |e| *e == SideEffect::CancelSpeech);
    let lookup = position(&effects, |e| matches!(e, SideEffect::Lookup { .. }));
    assert!(cancel < lookup);
    assert!(!c.output().is_speaking());

    let snapshot = c.telemetry.snapshot();
    assert_eq!(snapshot.barge_ins, 1);
    assert_eq!(snapshot.overlaps, 0);
}

#[test]
fn test_stale_synthesis_end_after_barge_in_is_ignored() {
    let mut c = listening(false);
    let old = narrating_haaland(&mut c);

    let effects = type_in(&mut c, "read his injuries");
    let (new, text) = spoken(&effects).expect("section read after barge-in");
    assert!(text.contains("Ankle sprain"));

    let effects = c.handle(Event::Synthesis(SynthesisEvent::Ended(old)));
    assert!(effects.is_empty());
    assert!(c.output().is_speaking());

    c.handle(Event::Synthesis(SynthesisEvent::Ended(new)));
    assert!(!c.output().is_speaking());
}

#[test]
fn test_result_arriving_mid_speech_waits_for_settle() {
    let mut c = listening(false);
    narrating_haaland(&mut c);

    // Dispatched without a transcript, so nothing barges in.
    let effects = c.dispatch(Intent::club(Action::ClubAchievements, "barcelona"));
    let (epoch, _) = lookup_of(&effects).unwrap();
    assert!(c.output().is_speaking());

    let effects = c.handle(Event::LookupCompleted {
        epoch,
        outcome: Ok(LookupPayload::Club(common::barcelona())),
    });
    assert!(effects.contains(&SideEffect::CancelSpeech));
    assert_eq!(spoken(&effects), None);
    let settle = timer(&effects, TimerKind::SpeechSettle).expect("settle scheduled");

    let effects = c.handle(Event::TimerFired(settle));
    let (_, text) = spoken(&effects).expect("replacement spoken");
    assert!(text.starts_with("FC Barcelona"));
    assert_ne!(c.input().phase(), InputPhase::Listening);
    assert_eq!(c.telemetry.snapshot().overlaps, 0);
}

#[test]
fn test_mute_persists_until_resume_or_new_search() {
    let mut c = listening(false);
    narrating_haaland(&mut c);

    let effects = type_in(&mut c, "stop talking");
    assert!(effects.contains(&SideEffect::CancelSpeech));
    assert!(c.mode().is_muted());

    let effects = type_in(&mut c, "tell me about his injuries");
    assert_eq!(spoken(&effects), None);
    assert_eq!(c.telemetry.snapshot().suppressed_narrations, 1);

    let effects = type_in(&mut c, "resume talking");
    assert!(!c.mode().is_muted());
    let (_, text) = spoken(&effects).expect("current result re-read");
    assert!(text.starts_with("Erling Haaland"));

    type_in(&mut c, "be quiet");
    assert!(c.mode().is_muted());
    type_in(&mut c, "show me Mbappe stats for PSG");
    assert!(!c.mode().is_muted(), "a new search lifts the mute");
}

#[test]
fn test_stop_button_mutes() {
    let mut c = listening(false);
    narrating_haaland(&mut c);
    let effects = c.handle(Event::Command(UserCommand::StopButton));
    assert!(effects.contains(&SideEffect::CancelSpeech));
    assert!(c.mode().is_muted());
    assert!(!c.output().is_speaking());
}

#[test]
fn test_missing_section_is_reported() {
    let mut c = listening(false);
    narrating_haaland(&mut c);

    let effects = type_in(&mut c, "read the transfers");
    assert_eq!(
        announced(&effects, Severity::Warning),
        vec!["Transfer information is not available."]
    );

    // Without any result every section is unavailable.
    let mut fresh = listening(false);
    let effects = type_in(&mut fresh, "read market value");
    assert_eq!(
        announced(&effects, Severity::Warning),
        vec!["Market value information is not available."]
    );
}

#[test]
fn test_empty_search_is_not_understood() {
    let mut c = listening(false);
    let effects = c.dispatch(Intent::player(Action::SearchPlayer, ""));
    assert_eq!(lookup_of(&effects), None);
    assert_eq!(announced(&effects, Severity::Warning).len(), 1);
}

#[test]
fn test_favorites_this_resolves_to_last_result() {
    let mut c = listening(false);

    let effects = type_in(&mut c, "add this club to favorites");
    assert_eq!(
        announced(&effects, Severity::Warning),
        vec!["There is no club on screen to act on."]
    );

    narrating_haaland(&mut c);
    let effects = type_in(&mut c, "add this player to favorites");
    assert_eq!(
        announced(&effects, Severity::Info),
        vec!["Added Erling Haaland to your favorites."]
    );
    let effects = type_in(&mut c, "favorite haaland");
    assert_eq!(
        announced(&effects, Severity::Info),
        vec!["Erling Haaland is already in your favorites."]
    );
    assert_eq!(c.favorites().list().len(), 1);

    let effects = type_in(&mut c, "remove this player from favorites");
    assert_eq!(
        announced(&effects, Severity::Info),
        vec!["Removed Erling Haaland from your favorites."]
    );
    assert!(c.favorites().list().is_empty());
}

#[test]
fn test_named_favorite_is_resolved() {
    let mut c = listening(false);
    let effects = type_in(&mut c, "add mbappe to my favorites");
    let request = effects
        .iter()
        .find_map(|e| match e {
            SideEffect::ResolveFavorite { request, kind, name } => {
                assert_eq!(*kind, EntityKind::Player);
                assert_eq!(name, "mbappe");
                Some(*request)
            }
            _ => None,
        })
        .expect("resolve requested");

    // An answer for some other request is dropped.
    c.handle(Event::FavoriteResolved {
        request: RequestId(request.0 + 10),
        kind: EntityKind::Player,
        outcome: Ok(common::mbappe().entity),
    });
    assert!(c.favorites().list().is_empty());

    c.handle(Event::FavoriteResolved {
        request,
        kind: EntityKind::Player,
        outcome: Ok(common::mbappe().entity),
    });
    assert_eq!(c.favorites().list()[0].name, "Kylian Mbappe");

    let effects = type_in(&mut c, "remove mbappe from my favorites");
    assert_eq!(
        announced(&effects, Severity::Info),
        vec!["Removed Kylian Mbappe from your favorites."]
    );
}

#[test]
fn test_show_favorites_reads_the_list() {
    let mut c = listening(false);
    let effects = type_in(&mut c, "show my favorites");
    let (_, text) = spoken(&effects).expect("list read aloud");
    assert_eq!(text, "You have no favorites yet.");
}

#[test]
fn test_remote_parse_preferred_for_lookups() {
    let mut c = listening(true);
    let effects = hear(&mut c, "who is the norwegian striker");
    let request = effects
        .iter()
        .find_map(|e| match e {
            SideEffect::ParseRemote { request, .. } => Some(*request),
            _ => None,
        })
        .expect("remote parse requested");
    assert_eq!(lookup_of(&effects), None);

    let effects = c.handle(Event::RemoteParsed {
        request,
        utterance: "who is the norwegian striker".to_string(),
        intent: Some(Intent::player(Action::SearchPlayer, "Erling Haaland")),
    });
    let (_, lookup) = lookup_of(&effects).unwrap();
    assert_eq!(
        lookup,
        LookupRequest::Player {
            name: "Erling Haaland".to_string(),
            club: None
        }
    );
}

#[test]
fn test_remote_failure_falls_back_to_local_parse() {
    let mut c = listening(true);
    hear(&mut c, "show me Haaland");
    let effects = c.handle(Event::RemoteParsed {
        request: RequestId(1),
        utterance: "show me Haaland".to_string(),
        intent: None,
    });
    let (_, lookup) = lookup_of(&effects).unwrap();
    assert_eq!(
        lookup,
        LookupRequest::Player {
            name: "haaland".to_string(),
            club: None
        }
    );
    assert_eq!(c.telemetry.snapshot().remote_fallbacks, 1);
}

#[test]
fn test_control_commands_skip_remote_parser() {
    let mut c = listening(true);
    narrating_haaland_remote(&mut c);
    let effects = type_in(&mut c, "stop");
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::ParseRemote { .. })));
    assert!(c.mode().is_muted());
}

fn narrating_haaland_remote(c: &mut Coordinator) {
    hear(c, "show me Haaland");
    let effects = c.handle(Event::RemoteParsed {
        request: RequestId(1),
        utterance: "show me Haaland".to_string(),
        intent: None,
    });
    let (epoch, _) = lookup_of(&effects).unwrap();
    c.handle(Event::LookupCompleted {
        epoch,
        outcome: Ok(common::player_payload(common::haaland())),
    });
    assert!(c.output().is_speaking());
}

#[test]
fn test_superseded_remote_answer_is_dropped() {
    let mut c = listening(true);
    hear(&mut c, "show me Haaland");
    hear(&mut c, "show me Mbappe");

    let effects = c.handle(Event::RemoteParsed {
        request: RequestId(1),
        utterance: "show me Haaland".to_string(),
        intent: None,
    });
    assert!(effects.is_empty());
    assert_eq!(c.telemetry.snapshot().stale_discards, 1);
}

#[test]
fn test_stop_discards_pending_remote_parse() {
    let mut c = listening(true);
    hear(&mut c, "show me Haaland");
    type_in(&mut c, "stop");
    assert!(c.mode().is_muted());

    let effects = c.handle(Event::RemoteParsed {
        request: RequestId(1),
        utterance: "show me Haaland".to_string(),
        intent: None,
    });
    assert_eq!(lookup_of(&effects), None);
    assert_eq!(spoken(&effects), None);
    assert!(c.mode().is_muted());
}

#[test]
fn test_permission_error_disables_auto_listen() {
    let mut c = listening(false);
    let effects = c.handle(Event::Recognition(RecognitionEvent::Error(
        RecognitionErrorKind::NotAllowed,
    )));
    assert_eq!(c.input().phase(), InputPhase::Idle);
    assert!(!c.input().auto_listen());
    assert_eq!(timer(&effects, TimerKind::RestartListening), None);
    assert_eq!(announced(&effects, Severity::Error).len(), 1);

    // Re-enabling from the microphone toggle starts a new session.
    let effects = c.handle(Event::Command(UserCommand::ToggleMic));
    assert!(effects.contains(&SideEffect::StartRecognition));
    assert!(c.input().auto_listen());
}

#[test]
fn test_fatal_explanation_waits_until_it_can_be_spoken() {
    let denied = || Event::Recognition(RecognitionEvent::Error(RecognitionErrorKind::NotAllowed));
    let mut c = listening(false);

    // No interaction yet, so nothing may be spoken.
    let effects = c.handle(denied());
    assert_eq!(spoken(&effects), None);

    c.handle(Event::Command(UserCommand::Interaction));
    let effects = c.handle(denied());
    let (utterance, text) = spoken(&effects).expect("explanation spoken once allowed");
    assert!(text.starts_with("Microphone access was denied"));
    c.handle(Event::Synthesis(SynthesisEvent::Ended(utterance)));

    // Explained already.
    let effects = c.handle(denied());
    assert_eq!(spoken(&effects), None);
    assert_eq!(announced(&effects, Severity::Error).len(), 1);
}

#[test]
fn test_transient_error_restarts_after_debounce() {
    let mut c = listening(false);
    let effects = c.handle(Event::Recognition(RecognitionEvent::Error(
        RecognitionErrorKind::NoSpeech,
    )));
    let restart = timer(&effects, TimerKind::RestartListening).expect("restart scheduled");
    assert!(announced(&effects, Severity::Error).is_empty());
    assert_eq!(c.telemetry.snapshot().restarts_scheduled, 1);

    let effects = c.handle(Event::TimerFired(restart));
    assert!(effects.contains(&SideEffect::StartRecognition));
}

#[test]
fn test_toggle_mic_stops_and_disables_auto_listen() {
    let mut c = listening(false);
    let effects = c.handle(Event::Command(UserCommand::ToggleMic));
    assert!(effects.contains(&SideEffect::StopRecognition));
    assert!(!c.input().auto_listen());

    let effects = c.handle(Event::Recognition(RecognitionEvent::Ended));
    assert_eq!(timer(&effects, TimerKind::RestartListening), None);
}

#[test]
fn test_no_speech_before_user_interaction() {
    let mut c = listening(false);
    let effects = c.dispatch(Intent::bare(Action::ShowFavorites));
    assert_eq!(spoken(&effects), None);
}
