//! Runtime configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Delays that keep the two speech channels from stepping on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait before restarting recognition after a session ends.
    pub restart_debounce: Duration,
    /// Wait after speech output ends before reopening the microphone.
    pub resume_delay: Duration,
    /// Wait between cancelling an utterance and starting its replacement.
    pub interrupt_settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            restart_debounce: Duration::from_millis(2000),
            resume_delay: Duration::from_millis(1000),
            interrupt_settle: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteParserConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub timings: Timings,
    /// Keep restarting recognition after each session.
    pub auto_listen: bool,
    /// Unset disables the remote parser entirely.
    pub remote_parser: Option<RemoteParserConfig>,
    /// JSON catalog backing the offline lookup.
    pub catalog: Option<PathBuf>,
    /// Speaking rate of the console synthesizer.
    pub speech_wpm: u32,
    /// External program that speaks its first argument, e.g. `say`.
    pub tts_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            auto_listen: true,
            remote_parser: None,
            catalog: None,
            speech_wpm: 180,
            tts_command: None,
        }
    }
}

impl Config {
    /// Load configuration from `MATCHVOICE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timings = Timings {
            restart_debounce: millis(&get, "MATCHVOICE_RESTART_DEBOUNCE_MS")?
                .unwrap_or(defaults.timings.restart_debounce),
            resume_delay: millis(&get, "MATCHVOICE_RESUME_DELAY_MS")?
                .unwrap_or(defaults.timings.resume_delay),
            interrupt_settle: millis(&get, "MATCHVOICE_INTERRUPT_SETTLE_MS")?
                .unwrap_or(defaults.timings.interrupt_settle),
        };

        let auto_listen = match get("MATCHVOICE_AUTO_LISTEN") {
            None => defaults.auto_listen,
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MATCHVOICE_AUTO_LISTEN",
                        value,
                    })
                }
            },
        };

        let remote_parser = match get("MATCHVOICE_REMOTE_PARSER_URL").filter(|u| !u.trim().is_empty()) {
            Some(url) => Some(RemoteParserConfig {
                url,
                timeout: millis(&get, "MATCHVOICE_REMOTE_PARSER_TIMEOUT_MS")?
                    .unwrap_or(Duration::from_secs(2)),
            }),
            None => None,
        };

        let speech_wpm = match get("MATCHVOICE_SPEECH_WPM") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|wpm| *wpm > 0)
                .ok_or(ConfigError::Invalid {
                    key: "MATCHVOICE_SPEECH_WPM",
                    value,
                })?,
            None => defaults.speech_wpm,
        };

        Ok(Self {
            timings,
            auto_listen,
            remote_parser,
            catalog: get("MATCHVOICE_CATALOG").map(PathBuf::from),
            speech_wpm,
            tts_command: get("MATCHVOICE_TTS_COMMAND").filter(|c| !c.trim().is_empty()),
        })
    }
}

fn millis(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
