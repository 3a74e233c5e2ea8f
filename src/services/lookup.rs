use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, LookupError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Club,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Club => "club",
        }
    }
}

/// A resolved player or club, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    /// Club for players, country for clubs.
    #[serde(default)]
    pub meta: Option<String>,
}

impl EntityRef {
    /// Loose, case-insensitive match used for spoken names.
    pub fn matches_name(&self, spoken: &str) -> bool {
        let spoken = spoken.trim().to_lowercase();
        !spoken.is_empty() && self.name.to_lowercase().contains(&spoken)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injury {
    pub injury: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub games_missed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(default)]
    pub date: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub fee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketValuePoint {
    pub date: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub entity: EntityRef,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub stats: Vec<StatLine>,
    #[serde(default)]
    pub injuries: Option<Vec<Injury>>,
    #[serde(default)]
    pub transfers: Option<Vec<Transfer>>,
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
    #[serde(default)]
    pub market_value: Option<Vec<MarketValuePoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubReport {
    pub entity: EntityRef,
    #[serde(default)]
    pub stats: Vec<StatLine>,
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
}

/// Sub-sections a user can ask to have read aloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Injuries,
    Transfers,
    Achievements,
    MarketValue,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Injuries => "Injury",
            Self::Transfers => "Transfer",
            Self::Achievements => "Achievement",
            Self::MarketValue => "Market value",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupRequest {
    Player { name: String, club: Option<String> },
    Compare { first: String, second: String },
    Club { name: String },
}

impl LookupRequest {
    pub fn describe(&self) -> String {
        match self {
            Self::Player { name, club: Some(club) } => format!("{name} ({club})"),
            Self::Player { name, club: None } => name.clone(),
            Self::Compare { first, second } => format!("{first} and {second}"),
            Self::Club { name } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupPayload {
    Player(PlayerReport),
    Comparison(PlayerReport, PlayerReport),
    Club(ClubReport),
}

impl LookupPayload {
    /// Section reads on a comparison use the first player.
    pub fn primary_player(&self) -> Option<&PlayerReport> {
        match self {
            Self::Player(report) | Self::Comparison(report, _) => Some(report),
            Self::Club(_) => None,
        }
    }

    pub fn has_section(&self, section: Section) -> bool {
        fn filled<T>(items: &Option<Vec<T>>) -> bool {
            items.as_ref().is_some_and(|v| !v.is_empty())
        }

        match (self, section) {
            (Self::Club(club), Section::Achievements) => filled(&club.achievements),
            (Self::Club(_), _) => false,
            (_, section) => self.primary_player().is_some_and(|p| match section {
                Section::Injuries => filled(&p.injuries),
                Section::Transfers => filled(&p.transfers),
                Section::Achievements => filled(&p.achievements),
                Section::MarketValue => filled(&p.market_value),
            }),
        }
    }

    pub fn headline(&self) -> String {
        match self {
            Self::Player(p) => p.entity.name.clone(),
            Self::Comparison(a, b) => format!("{} vs {}", a.entity.name, b.entity.name),
            Self::Club(c) => c.entity.name.clone(),
        }
    }
}

/// Executes the domain lookup behind an intent.
#[async_trait]
pub trait LookupHandler: Send + Sync {
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupPayload, LookupError>;

    /// Resolves a spoken name to an entity without fetching its report.
    async fn resolve(&self, kind: EntityKind, name: &str) -> Result<EntityRef, LookupError>;
}

/// Offline lookup over a JSON catalog of reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogLookup {
    #[serde(default)]
    players: Vec<PlayerReport>,
    #[serde(default)]
    clubs: Vec<ClubReport>,
}

impl CatalogLookup {
    pub fn new(players: Vec<PlayerReport>, clubs: Vec<ClubReport>) -> Self {
        Self { players, clubs }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&raw)?;
        debug!(
            players = catalog.players.len(),
            clubs = catalog.clubs.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    fn ensure_loaded(&self) -> Result<(), LookupError> {
        if self.players.is_empty() && self.clubs.is_empty() {
            return Err(LookupError::Unavailable("catalog is empty".to_string()));
        }
        Ok(())
    }

    fn find_player(&self, name: &str, club: Option<&str>) -> Result<&PlayerReport, LookupError> {
        if name.trim().is_empty() {
            return Err(LookupError::Invalid("empty player name".to_string()));
        }
        let club = club.map(str::to_lowercase);
        self.players
            .iter()
            .filter(|p| p.entity.matches_name(name))
            .find(|p| match (&club, &p.entity.meta) {
                (Some(wanted), Some(meta)) => meta.to_lowercase().contains(wanted.as_str()),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    fn find_club(&self, name: &str) -> Result<&ClubReport, LookupError> {
        if name.trim().is_empty() {
            return Err(LookupError::Invalid("empty club name".to_string()));
        }
        self.clubs
            .iter()
            .find(|c| c.entity.matches_name(name))
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl LookupHandler for CatalogLookup {
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupPayload, LookupError> {
        self.ensure_loaded()?;
        match request {
            LookupRequest::Player { name, club } => self
                .find_player(name, club.as_deref())
                .map(|p| LookupPayload::Player(p.clone())),
            LookupRequest::Compare { first, second } => {
                let a = self.find_player(first, None)?;
                let b = self.find_player(second, None)?;
                Ok(LookupPayload::Comparison(a.clone(), b.clone()))
            }
            LookupRequest::Club { name } => {
                self.find_club(name).map(|c| LookupPayload::Club(c.clone()))
            }
        }
    }

    async fn resolve(&self, kind: EntityKind, name: &str) -> Result<EntityRef, LookupError> {
        self.ensure_loaded()?;
        match kind {
            EntityKind::Player => self.find_player(name, None).map(|p| p.entity.clone()),
            EntityKind::Club => self.find_club(name).map(|c| c.entity.clone()),
        }
    }
}
