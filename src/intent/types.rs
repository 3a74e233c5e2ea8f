use serde::{Deserialize, Serialize};

/// Reserved name meaning "the most recently shown entity of this kind".
pub const THIS_SENTINEL: &str = "this";

/// Closed set of actions an utterance can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SearchPlayer,
    ComparePlayers,
    ClubAchievements,
    ShowFavorites,
    AddPlayerFavorite,
    AddClubFavorite,
    AddCurrentPlayerFavorite,
    AddCurrentClubFavorite,
    RemovePlayerFavorite,
    RemoveClubFavorite,
    ReadInjuries,
    ReadTransfers,
    ReadAchievements,
    ReadMarketValue,
    StopSpeaking,
    ResumeSpeaking,
}

impl Action {
    /// Control actions are always taken from the local parser, even when a
    /// remote parse is available.
    pub fn is_meta(self) -> bool {
        !matches!(
            self,
            Action::SearchPlayer | Action::ComparePlayers | Action::ClubAchievements
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub action: Action,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub player_name2: Option<String>,
    #[serde(default)]
    pub club_name: Option<String>,
}

impl Intent {
    pub fn bare(action: Action) -> Self {
        Self {
            action,
            player_name: None,
            player_name2: None,
            club_name: None,
        }
    }

    pub fn player(action: Action, name: impl Into<String>) -> Self {
        Self {
            player_name: Some(name.into()),
            ..Self::bare(action)
        }
    }

    pub fn club(action: Action, name: impl Into<String>) -> Self {
        Self {
            club_name: Some(name.into()),
            ..Self::bare(action)
        }
    }

    /// An empty player name on a search means "no actionable intent".
    pub fn is_actionable(&self) -> bool {
        match self.action {
            Action::SearchPlayer => self
                .player_name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty()),
            _ => true,
        }
    }
}
