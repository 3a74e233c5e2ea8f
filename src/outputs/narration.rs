use crate::services::favorites::FavoriteEntry;
use crate::services::lookup::{
    Achievement, ClubReport, LookupPayload, PlayerReport, Section, StatLine,
};

/// PURE FUNCTION: Converts a lookup result into the text read aloud.
pub fn narrate_payload(payload: &LookupPayload) -> String {
    match payload {
        LookupPayload::Player(player) => narrate_player(player),
        LookupPayload::Comparison(first, second) => format!(
            "Comparing {} and {}. {} {}",
            first.entity.name,
            second.entity.name,
            narrate_player(first),
            narrate_player(second)
        ),
        LookupPayload::Club(club) => narrate_club(club),
    }
}

/// Text for one section, or None when the result does not carry it.
pub fn narrate_section(payload: &LookupPayload, section: Section) -> Option<String> {
    if !payload.has_section(section) {
        return None;
    }

    if let (LookupPayload::Club(club), Section::Achievements) = (payload, section) {
        let achievements = club.achievements.as_deref().unwrap_or_default();
        return Some(format!(
            "{} achievements: {}.",
            club.entity.name,
            list_achievements(achievements)
        ));
    }

    let player = payload.primary_player()?;
    let name = &player.entity.name;
    let text = match section {
        Section::Injuries => {
            let injuries = player.injuries.as_deref().unwrap_or_default();
            let lines: Vec<String> = injuries
                .iter()
                .map(|i| {
                    let mut line = i.injury.clone();
                    if let Some(from) = &i.from {
                        line.push_str(&format!(" from {from}"));
                    }
                    if let Some(until) = &i.until {
                        line.push_str(&format!(" until {until}"));
                    }
                    if let Some(games) = i.games_missed {
                        line.push_str(&format!(", missing {games} games"));
                    }
                    line
                })
                .collect();
            format!("{name} injury history: {}.", lines.join("; "))
        }
        Section::Transfers => {
            let transfers = player.transfers.as_deref().unwrap_or_default();
            let lines: Vec<String> = transfers
                .iter()
                .map(|t| {
                    let mut line = format!("from {} to {}", t.from, t.to);
                    if let Some(date) = &t.date {
                        line = format!("{date}, {line}");
                    }
                    if let Some(fee) = &t.fee {
                        line.push_str(&format!(" for {fee}"));
                    }
                    line
                })
                .collect();
            format!("{name} transfer history: {}.", lines.join("; "))
        }
        Section::Achievements => {
            let achievements = player.achievements.as_deref().unwrap_or_default();
            format!("{name} achievements: {}.", list_achievements(achievements))
        }
        Section::MarketValue => {
            let history = player.market_value.as_deref().unwrap_or_default();
            let latest = history.last()?;
            let mut text = format!(
                "{name} current market value is {} as of {}.",
                latest.value, latest.date
            );
            if let Some(earliest) = history.first().filter(|_| history.len() > 1) {
                text.push_str(&format!(" Earliest recorded value was {} in {}.", earliest.value, earliest.date));
            }
            text
        }
    };
    Some(text)
}

pub fn narrate_favorites(entries: &[FavoriteEntry]) -> String {
    if entries.is_empty() {
        return "You have no favorites yet.".to_string();
    }
    let names: Vec<String> = entries
        .iter()
        .map(|e| format!("{}, {}", e.name, e.kind.label()))
        .collect();
    format!("Your favorites are: {}.", names.join("; "))
}

fn narrate_player(player: &PlayerReport) -> String {
    let mut text = player.entity.name.clone();
    match (&player.position, &player.entity.meta) {
        (Some(position), Some(club)) => text.push_str(&format!(", {position} at {club}.")),
        (Some(position), None) => text.push_str(&format!(", {position}.")),
        (None, Some(club)) => text.push_str(&format!(" of {club}.")),
        (None, None) => text.push('.'),
    }
    if !player.stats.is_empty() {
        text.push_str(&format!(" {}", list_stats(&player.stats)));
    }
    text
}

fn narrate_club(club: &ClubReport) -> String {
    let mut text = club.entity.name.clone();
    match &club.entity.meta {
        Some(country) => text.push_str(&format!(", from {country}.")),
        None => text.push('.'),
    }
    if !club.stats.is_empty() {
        text.push_str(&format!(" {}", list_stats(&club.stats)));
    }
    if let Some(achievements) = club.achievements.as_deref().filter(|a| !a.is_empty()) {
        text.push_str(&format!(" Achievements: {}.", list_achievements(achievements)));
    }
    text
}

fn list_stats(stats: &[StatLine]) -> String {
    let parts: Vec<String> = stats
        .iter()
        .map(|s| format!("{}: {}", s.label, s.value))
        .collect();
    format!("{}.", parts.join(", "))
}

fn list_achievements(achievements: &[Achievement]) -> String {
    achievements
        .iter()
        .map(|a| {
            if a.count > 1 {
                format!("{} times {}", a.count, a.title)
            } else {
                a.title.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
