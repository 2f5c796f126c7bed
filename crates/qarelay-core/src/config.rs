use std::{env, fs, path::Path, str::FromStr, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_ANSWER_SERVICE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ANSWER_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Which session connector the binary wires up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorKind {
    Telegram,
    Console,
}

impl FromStr for ConnectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "telegram" => Ok(Self::Telegram),
            "console" | "stdio" => Ok(Self::Console),
            other => Err(Error::Config(format!(
                "RELAY_CONNECTOR must be 'telegram' or 'console', got '{other}'"
            ))),
        }
    }
}

/// Typed configuration for the relay.
#[derive(Clone, Debug)]
pub struct Config {
    pub connector: ConnectorKind,
    pub telegram_bot_token: Option<String>,

    // Answer service
    pub answer_service_url: String,
    pub answer_timeout: Duration,

    // Runtime
    pub event_buffer: usize,
}

impl Config {
    /// Load from the process environment, after merging a `.env` file if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let connector = match lookup("RELAY_CONNECTOR").and_then(non_empty) {
            Some(v) => v.parse()?,
            None => ConnectorKind::Telegram,
        };

        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty);
        if connector == ConnectorKind::Telegram && telegram_bot_token.is_none() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let answer_service_url = normalize_base_url(
            &lookup("ANSWER_SERVICE_URL").unwrap_or_else(|| DEFAULT_ANSWER_SERVICE_URL.to_string()),
        )?;

        let answer_timeout = Duration::from_millis(
            parse_opt::<u64>(&lookup, "ANSWER_TIMEOUT_MS")?.unwrap_or(DEFAULT_ANSWER_TIMEOUT_MS),
        );
        if answer_timeout.is_zero() {
            return Err(Error::Config(
                "ANSWER_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let event_buffer = parse_opt::<usize>(&lookup, "EVENT_BUFFER")?
            .unwrap_or(DEFAULT_EVENT_BUFFER)
            .max(1);

        Ok(Self {
            connector,
            telegram_bot_token,
            answer_service_url,
            answer_timeout,
            event_buffer,
        })
    }

    /// Full URL of the `ask` endpoint.
    pub fn ask_url(&self) -> String {
        format!("{}/ask", self.answer_service_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(Error::Config("ANSWER_SERVICE_URL must not be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "ANSWER_SERVICE_URL must start with http:// or https://, got '{url}'"
        )));
    }
    Ok(url.to_string())
}

fn parse_opt<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} is not a valid number: '{raw}'")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
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

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
