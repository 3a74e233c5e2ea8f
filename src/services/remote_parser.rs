use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::RemoteParseError;
use crate::intent::{Action, Intent};

/// Optional best-effort parser living behind the network.
#[async_trait]
pub trait RemoteParser: Send + Sync {
    async fn parse(&self, command: &str) -> Result<Intent, RemoteParseError>;
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    command: &'a str,
}

#[derive(Clone)]
pub struct HttpRemoteParser {
    client: Client,
    url: String,
}

impl HttpRemoteParser {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteParseError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RemoteParser for HttpRemoteParser {
    async fn parse(&self, command: &str) -> Result<Intent, RemoteParseError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ParseRequest { command })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteParseError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        decode_intent(&body)
    }
}

/// Decodes a remote response, tolerating a markdown code fence around the JSON.
pub fn decode_intent(body: &str) -> Result<Intent, RemoteParseError> {
    let mut content = body.trim();
    if let Some(fenced) = content.strip_prefix("```") {
        content = fenced.strip_prefix("json").unwrap_or(fenced);
        content = content.trim_end().strip_suffix("```").unwrap_or(content);
    }

    let mut intent: Intent = serde_json::from_str(content.trim())
        .map_err(|e| RemoteParseError::Decode(e.to_string()))?;

    for field in [
        &mut intent.player_name,
        &mut intent.player_name2,
        &mut intent.club_name,
    ] {
        *field = field
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    let complete = match intent.action {
        Action::SearchPlayer => intent.player_name.is_some(),
        Action::ComparePlayers => intent.player_name.is_some() && intent.player_name2.is_some(),
        Action::ClubAchievements => intent.club_name.is_some(),
        _ => true,
    };
    if !complete {
        return Err(RemoteParseError::Decode(format!(
            "{:?} without the names it needs",
            intent.action
        )));
    }

    Ok(intent)
}
