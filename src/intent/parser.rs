use super::types::{Action, Intent, THIS_SENTINEL};

/// Phrases that silence narration regardless of anything else in the utterance.
const STOP_PHRASES: &[&str] = &["stop talking", "stop reading", "be quiet", "shut up", "quiet"];
const RESUME_PHRASES: &[&str] = &["resume talking", "start talking", "start reading"];
const READ_VERBS: &[&str] = &["tell me", "read", "show me"];

const INJURY_WORDS: &[&str] = &["injuries", "injury"];
const TRANSFER_WORDS: &[&str] = &["transfers", "transfer"];
const ACHIEVEMENT_WORDS: &[&str] = &["achievements", "achievement", "honors", "honours"];
const MARKET_VALUE_WORDS: &[&str] = &["market value"];

const FAVORITE_WORDS: &[&str] = &["favorite", "favourite"];
const NAVIGATION_WORDS: &[&str] = &["show", "open", "go to"];

/// Closed list; matching any of these (without a stats keyword) means a club lookup.
const CLUB_INDICATORS: &[&str] = &[
    "club",
    "fc",
    "united",
    "city",
    "arsenal",
    "chelsea",
    "liverpool",
    "manchester",
    "barcelona",
    "real madrid",
    "psg",
    "bayern",
    "juventus",
];

const CLUB_STOPWORDS: &[&str] = &[
    " show ",
    " display ",
    " get ",
    " find ",
    " club ",
    " information ",
    " info ",
    " achievements ",
    " team ",
    " me ",
];

// Longest spellings first so "favorites" is not left behind as "s".
const FAVORITE_STOPWORDS: &[&str] = &[
    "favourites",
    "favorites",
    "favourite",
    "favorite",
    " add ",
    " remove ",
    " delete ",
    " from ",
    " to ",
    " my ",
    " the ",
    " player ",
    " club ",
    " team ",
    " please ",
];

const SEARCH_PREFIXES: &[&str] = &[
    "show me",
    "show",
    "find",
    "get",
    "search for",
    "stats for",
    "statistics for",
    "display",
];
const FALLBACK_PREFIXES: &[&str] = &["show me", "show", "find", "get", "search for", "display"];
const STATS_SUFFIXES: &[&str] = &[" statistics", " stats", " stat"];

type Rule = fn(&str) -> Option<Intent>;

/// Evaluated in order; the first rule that matches wins.
const RULES: &[Rule] = &[
    stop_rule,
    resume_rule,
    section_read_rule,
    favorites_navigation_rule,
    quick_favorite_rule,
    add_favorite_rule,
    remove_favorite_rule,
    comparison_rule,
    club_rule,
    player_stats_rule,
];

/// Total, deterministic, case-insensitive: every utterance maps to exactly one Intent.
pub fn parse(utterance: &str) -> Intent {
    let raw = utterance.trim();
    let lower = collapse_whitespace(&raw.to_lowercase());

    for rule in RULES {
        if let Some(intent) = rule(&lower) {
            return intent;
        }
    }

    fallback(raw, &lower)
}

fn stop_rule(text: &str) -> Option<Intent> {
    let matched = text == "stop"
        || text.starts_with("stop ")
        || contains_any(text, STOP_PHRASES)
        || has_word(text, "stop");
    matched.then(|| Intent::bare(Action::StopSpeaking))
}

fn resume_rule(text: &str) -> Option<Intent> {
    contains_any(text, RESUME_PHRASES).then(|| Intent::bare(Action::ResumeSpeaking))
}

fn section_read_rule(text: &str) -> Option<Intent> {
    if !contains_any(text, READ_VERBS) {
        return None;
    }

    let action = if contains_any(text, INJURY_WORDS) {
        Action::ReadInjuries
    } else if contains_any(text, TRANSFER_WORDS) {
        Action::ReadTransfers
    } else if contains_any(text, ACHIEVEMENT_WORDS) {
        Action::ReadAchievements
    } else if contains_any(text, MARKET_VALUE_WORDS) {
        Action::ReadMarketValue
    } else {
        return None;
    };

    Some(Intent::bare(action))
}

fn favorites_navigation_rule(text: &str) -> Option<Intent> {
    (contains_any(text, NAVIGATION_WORDS) && contains_any(text, FAVORITE_WORDS))
        .then(|| Intent::bare(Action::ShowFavorites))
}

/// "favorite messi", "favorite club arsenal"
fn quick_favorite_rule(text: &str) -> Option<Intent> {
    if !text.starts_with("favorite ") || text.contains("show favorite") {
        return None;
    }

    let name = or_sentinel(extract_name(text, FAVORITE_STOPWORDS));
    Some(if mentions_club(text) {
        Intent::club(Action::AddClubFavorite, name)
    } else {
        Intent::player(Action::AddPlayerFavorite, name)
    })
}

fn add_favorite_rule(text: &str) -> Option<Intent> {
    if !text.contains("add") || !contains_any(text, FAVORITE_WORDS) {
        return None;
    }

    if text.contains("this player") {
        return Some(Intent::bare(Action::AddCurrentPlayerFavorite));
    }
    if text.contains("this club") || text.contains("this team") {
        return Some(Intent::bare(Action::AddCurrentClubFavorite));
    }

    let name = or_sentinel(extract_name(text, FAVORITE_STOPWORDS));
    Some(if mentions_club(text) {
        Intent::club(Action::AddClubFavorite, name)
    } else {
        Intent::player(Action::AddPlayerFavorite, name)
    })
}

fn remove_favorite_rule(text: &str) -> Option<Intent> {
    if !text.contains("remove") || !contains_any(text, FAVORITE_WORDS) {
        return None;
    }

    if text.contains("this player") {
        return Some(Intent::player(Action::RemovePlayerFavorite, THIS_SENTINEL));
    }
    if text.contains("this club") || text.contains("this team") {
        return Some(Intent::club(Action::RemoveClubFavorite, THIS_SENTINEL));
    }

    let name = or_sentinel(extract_name(text, FAVORITE_STOPWORDS));
    Some(if mentions_club(text) {
        Intent::club(Action::RemoveClubFavorite, name)
    } else {
        Intent::player(Action::RemovePlayerFavorite, name)
    })
}

fn comparison_rule(text: &str) -> Option<Intent> {
    let padded = format!(" {text} ");
    if !text.contains("compare") && !padded.contains(" vs ") && !padded.contains(" versus ") {
        return None;
    }

    let normalized = padded
        .replace("compare", " ")
        .replace(" versus ", " and ")
        .replace(" vs ", " and ");

    let parts: Vec<String> = normalized
        .split(" and ")
        .map(strip_stats_words)
        .collect();

    match parts.as_slice() {
        [first, second] if !first.is_empty() && !second.is_empty() => Some(Intent {
            player_name: Some(first.clone()),
            player_name2: Some(second.clone()),
            ..Intent::bare(Action::ComparePlayers)
        }),
        // Fewer (or more) than two names: let later rules try.
        _ => None,
    }
}

fn club_rule(text: &str) -> Option<Intent> {
    if !contains_any(text, CLUB_INDICATORS) || text.contains("stats") || text.contains("statistics") {
        return None;
    }

    let mut name = extract_name(text, CLUB_STOPWORDS);
    for suffix in [" stats", " stat"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.trim().to_string();
        }
    }

    (!name.is_empty()).then(|| Intent::club(Action::ClubAchievements, name))
}

/// "show me mbappe stats for psg" -> player "mbappe", club "PSG"
fn player_stats_rule(text: &str) -> Option<Intent> {
    if !text.contains("stat") {
        return None;
    }

    let stripped = strip_prefixes(text, SEARCH_PREFIXES);
    let (player_part, club_part) = match stripped.split_once(" for ") {
        Some((player, club)) => (player.to_string(), Some(club.trim().to_uppercase())),
        None => (stripped, None),
    };

    let mut player = player_part.trim().to_string();
    for suffix in STATS_SUFFIXES {
        if let Some(rest) = player.strip_suffix(suffix) {
            player = rest.trim().to_string();
        }
    }
    if matches!(player.as_str(), "stats" | "stat" | "statistics") {
        player.clear();
    }

    if player.is_empty() {
        return None;
    }

    Some(Intent {
        player_name: Some(player),
        club_name: club_part.filter(|c| !c.is_empty()),
        ..Intent::bare(Action::SearchPlayer)
    })
}

fn fallback(raw: &str, lower: &str) -> Intent {
    let remainder = strip_prefixes(lower, FALLBACK_PREFIXES);
    if remainder.is_empty() {
        Intent::player(Action::SearchPlayer, raw)
    } else {
        Intent::player(Action::SearchPlayer, remainder)
    }
}

/// Removes every occurrence of each stopword by plain substring replacement,
/// then collapses whitespace. Permissive: a name containing a stopword as a
/// substring gets mangled.
pub fn extract_name(text: &str, stopwords: &[&str]) -> String {
    let mut working = format!(" {text} ");
    for word in stopwords {
        working = working.replace(word, " ");
    }
    collapse_whitespace(&working)
}

fn strip_prefixes(text: &str, prefixes: &[&str]) -> String {
    let mut rest = text.trim().to_string();
    for prefix in prefixes {
        if rest == *prefix {
            rest.clear();
        } else if let Some(tail) = rest.strip_prefix(&format!("{prefix} ")) {
            rest = tail.trim().to_string();
        }
    }
    rest
}

fn strip_stats_words(part: &str) -> String {
    let cleaned = part
        .replace("statistics", " ")
        .replace("stats", " ")
        .replace("stat", " ");
    collapse_whitespace(&cleaned)
}

fn mentions_club(text: &str) -> bool {
    text.contains("club") || text.contains("team")
}

fn or_sentinel(name: String) -> String {
    if name.is_empty() || name == THIS_SENTINEL {
        THIS_SENTINEL.to_string()
    } else {
        name
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
