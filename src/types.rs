use once_cell::sync::Lazy;
use std::{
    collections::{BTreeMap, HashSet},
    fmt::Display,
    fs,
    path::Path,
    str::FromStr,
};
use strsim::jaro_winkler;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportStatus {
    Pending,
    Reviewed,
    Sent,
    Failed,
}

impl Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Sent => "sent",
            Self::Failed => "failed",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for ImportStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(anyhow!("unknown import status `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for ClientStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(anyhow!("unknown client status `{other}`")),
        }
    }
}

/// How commands print their results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Text,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Prints `value` as pretty JSON, or runs the colorful `text` printer.
pub fn emit<T: Serialize, F: FnOnce()>(fmt: OutputFmt, value: &T, text: F) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("failed to serialize output: {e}"),
        },
        OutputFmt::Text => text(),
    }
}

//
// Config
//

pub const KEY_DB_PATH: &str = "db.path";
pub const KEY_DISPATCH_URL: &str = "dispatch.url";
pub const KEY_DISPATCH_TIMEOUT: &str = "dispatch.timeout_secs";
pub const KEY_TRAINER_ID: &str = "trainer.id";
pub const KEY_LOG_FORMAT: &str = "log.format";

pub const DEFAULT_DB_PATH: &str = "./spotter.db";
pub const DEFAULT_TRAINER_ID: &str = "local";
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;

pub static ALLOWED_CONFIG_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        KEY_DB_PATH,
        KEY_DISPATCH_URL,
        KEY_DISPATCH_TIMEOUT,
        KEY_TRAINER_ID,
        KEY_LOG_FORMAT,
    ])
});

/// Return the closest allowed config key for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
pub fn best_key_suggestion(input: &str) -> Option<&'static str> {
    let inp = input.to_ascii_lowercase();
    if inp.trim().is_empty() {
        return None;
    }

    let mut scores: Vec<(&'static str, f64)> = ALLOWED_CONFIG_KEYS
        .iter()
        .copied()
        .map(|k| (k, jaro_winkler(&inp, k)))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best_key, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best_key)
    } else {
        None
    }
}

/// Flat key/value settings persisted as TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let content = toml::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to save config to {}", path.display()))
    }

    /// Default location: `<config_dir>/spotter/config`.
    pub fn default_path() -> Result<std::path::PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("spotter").join("config"))
            .context("Could not determine config directory")
    }

    pub fn db_path(&self) -> String {
        std::env::var("SPOTTER_DB")
            .ok()
            .or_else(|| self.map.get(KEY_DB_PATH).cloned())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }

    pub fn dispatch_url(&self) -> Option<String> {
        std::env::var("SPOTTER_DISPATCH_URL")
            .ok()
            .or_else(|| self.map.get(KEY_DISPATCH_URL).cloned())
    }

    pub fn dispatch_timeout_secs(&self) -> Result<u64> {
        match self.map.get(KEY_DISPATCH_TIMEOUT) {
            Some(v) => v
                .parse()
                .with_context(|| format!("`{KEY_DISPATCH_TIMEOUT}` must be a whole number of seconds")),
            None => Ok(DEFAULT_DISPATCH_TIMEOUT_SECS),
        }
    }

    pub fn trainer_id(&self) -> String {
        self.map
            .get(KEY_TRAINER_ID)
            .cloned()
            .unwrap_or_else(|| DEFAULT_TRAINER_ID.to_string())
    }

    pub fn log_format(&self) -> Option<&str> {
        self.map.get(KEY_LOG_FORMAT).map(String::as_str)
    }
}
