use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChannelId, errors::Error, Result};

/// Typed configuration for one mirror run.
///
/// Everything comes from the environment (with optional `.env` support) and
/// is passed down explicitly; there is no process-wide config value.
#[derive(Clone, Debug)]
pub struct Config {
    /// Source channels, ingested in the order given.
    pub from: Vec<ChannelId>,
    /// Destination channel for the replay.
    pub to: ChannelId,
    /// Bot token; opaque beyond being required and non-empty.
    pub token: String,
    /// Store directory; created fresh and removed at teardown.
    pub store_path: PathBuf,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let from: Vec<ChannelId> = parse_csv(env_str("FROM")).into_iter().map(ChannelId).collect();
        if from.is_empty() {
            return Err(Error::Config(
                "FROM environment variable is required".to_string(),
            ));
        }

        let to = env_str("TO")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("TO environment variable is required".to_string()))?;

        let token = env_str("TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("TOKEN environment variable is required".to_string()))?;

        let store_path = PathBuf::from(env_str("STORE_PATH").unwrap_or("msgs.db".to_string()));
        let http_timeout = Duration::from_millis(env_u64("HTTP_TIMEOUT_MS").unwrap_or(30_000));

        Ok(Self {
            from,
            to: ChannelId(to),
            token,
            store_path,
            http_timeout,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
