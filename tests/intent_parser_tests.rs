use matchvoice::intent::{parse, Action, Intent, THIS_SENTINEL};

#[test]
fn test_comparison_extracts_both_players() {
    let intent = parse("compare Messi and Ronaldo");
    assert_eq!(intent.action, Action::ComparePlayers);
    assert_eq!(intent.player_name.as_deref(), Some("messi"));
    assert_eq!(intent.player_name2.as_deref(), Some("ronaldo"));

    let intent = parse("Haaland vs Kane stats");
    assert_eq!(intent.action, Action::ComparePlayers);
    assert_eq!(intent.player_name.as_deref(), Some("haaland"));
    assert_eq!(intent.player_name2.as_deref(), Some("kane"));
}

#[test]
fn test_player_stats_with_club_qualifier() {
    let intent = parse("show me Mbappe stats for PSG");
    assert_eq!(intent.action, Action::SearchPlayer);
    assert_eq!(intent.player_name.as_deref(), Some("mbappe"));
    // Club qualifier is upper-cased.
    assert_eq!(intent.club_name.as_deref(), Some("PSG"));
}

#[test]
fn test_club_lookup() {
    let intent = parse("show Barcelona achievements");
    assert_eq!(intent, Intent::club(Action::ClubAchievements, "barcelona"));
}

#[test]
fn test_club_indicator_loses_to_stats_keyword() {
    let intent = parse("Manchester City stats");
    assert_eq!(intent.action, Action::SearchPlayer);
    assert_eq!(intent.player_name.as_deref(), Some("manchester city"));
}

#[test]
fn test_empty_utterance_falls_back_to_empty_search() {
    let intent = parse("");
    assert_eq!(intent.action, Action::SearchPlayer);
    assert_eq!(intent.player_name.as_deref(), Some(""));
    assert!(!intent.is_actionable());
}

#[test]
fn test_fallback_strips_leading_verbs() {
    assert_eq!(parse("Show me Haaland"), Intent::player(Action::SearchPlayer, "haaland"));
    assert_eq!(parse("Getafe"), Intent::player(Action::SearchPlayer, "getafe"));
}

#[test]
fn test_stop_wins_over_everything() {
    for utterance in [
        "stop",
        "Stop talking",
        "please be quiet",
        "compare messi and ronaldo stop",
        "add messi to favorites, no wait, stop",
    ] {
        assert_eq!(parse(utterance).action, Action::StopSpeaking, "{utterance}");
    }
    // Not a whole word.
    assert_ne!(parse("stoppage time").action, Action::StopSpeaking);
}

#[test]
fn test_resume() {
    assert_eq!(parse("start talking again").action, Action::ResumeSpeaking);
    assert_eq!(parse("Resume talking").action, Action::ResumeSpeaking);
}

#[test]
fn test_section_reads_need_a_read_verb() {
    assert_eq!(parse("tell me about his injuries").action, Action::ReadInjuries);
    assert_eq!(parse("read the transfers").action, Action::ReadTransfers);
    assert_eq!(parse("show me achievements").action, Action::ReadAchievements);
    assert_eq!(parse("read market value").action, Action::ReadMarketValue);

    // Without a read verb a topic word is just part of a lookup.
    assert_ne!(parse("injuries").action, Action::ReadInjuries);
}

#[test]
fn test_favorites_navigation() {
    assert_eq!(parse("show my favorites").action, Action::ShowFavorites);
    assert_eq!(parse("go to favourites").action, Action::ShowFavorites);
}

#[test]
fn test_add_favorite_by_name() {
    assert_eq!(
        parse("add Messi to my favorites"),
        Intent::player(Action::AddPlayerFavorite, "messi")
    );
    assert_eq!(
        parse("add arsenal club to favorites"),
        Intent::club(Action::AddClubFavorite, "arsenal")
    );
    assert_eq!(
        parse("favorite messi"),
        Intent::player(Action::AddPlayerFavorite, "messi")
    );
}

#[test]
fn test_add_current_entity() {
    assert_eq!(
        parse("add this player to favorites"),
        Intent::bare(Action::AddCurrentPlayerFavorite)
    );
    assert_eq!(
        parse("add this team to my favourites"),
        Intent::bare(Action::AddCurrentClubFavorite)
    );
}

#[test]
fn test_remove_favorite_uses_sentinel_for_this() {
    assert_eq!(
        parse("remove this player from favorites"),
        Intent::player(Action::RemovePlayerFavorite, THIS_SENTINEL)
    );
    assert_eq!(
        parse("remove this club from favorites"),
        Intent::club(Action::RemoveClubFavorite, THIS_SENTINEL)
    );
    assert_eq!(
        parse("remove haaland from my favorites"),
        Intent::player(Action::RemovePlayerFavorite, "haaland")
    );
}

#[test]
fn test_parse_is_deterministic_and_case_insensitive() {
    let samples = [
        "Compare MESSI and ronaldo",
        "SHOW ME MBAPPE STATS FOR psg",
        "show   barcelona    achievements",
    ];
    for sample in samples {
        assert_eq!(parse(sample), parse(sample));
        assert_eq!(parse(sample), parse(&sample.to_lowercase()));
    }
}
