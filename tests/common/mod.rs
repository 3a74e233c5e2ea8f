#![allow(dead_code)]

use matchvoice::services::lookup::{
    Achievement, CatalogLookup, ClubReport, EntityKind, EntityRef, Injury, LookupPayload,
    PlayerReport, StatLine,
};

fn entity(kind: EntityKind, id: &str, name: &str, meta: &str) -> EntityRef {
    EntityRef {
        kind,
        id: id.to_string(),
        name: name.to_string(),
        meta: Some(meta.to_string()),
    }
}

pub fn haaland() -> PlayerReport {
    PlayerReport {
        entity: entity(EntityKind::Player, "p-haaland", "Erling Haaland", "Manchester City"),
        position: Some("Striker".to_string()),
        stats: vec![StatLine {
            label: "Goals".to_string(),
            value: "27".to_string(),
        }],
        injuries: Some(vec![Injury {
            injury: "Ankle sprain".to_string(),
            from: Some("2024-10-01".to_string()),
            until: Some("2024-10-20".to_string()),
            games_missed: Some(3),
        }]),
        transfers: None,
        achievements: None,
        market_value: None,
    }
}

pub fn mbappe() -> PlayerReport {
    PlayerReport {
        entity: entity(EntityKind::Player, "p-mbappe", "Kylian Mbappe", "PSG"),
        position: Some("Forward".to_string()),
        stats: Vec::new(),
        injuries: None,
        transfers: None,
        achievements: Some(vec![Achievement {
            title: "World Cup".to_string(),
            count: 1,
        }]),
        market_value: None,
    }
}

pub fn barcelona() -> ClubReport {
    ClubReport {
        entity: entity(EntityKind::Club, "c-barcelona", "FC Barcelona", "Spain"),
        stats: Vec::new(),
        achievements: Some(vec![Achievement {
            title: "Champions League".to_string(),
            count: 5,
        }]),
    }
}

pub fn catalog() -> CatalogLookup {
    CatalogLookup::new(vec![haaland(), mbappe()], vec![barcelona()])
}

pub fn player_payload(report: PlayerReport) -> LookupPayload {
    LookupPayload::Player(report)
}
