use std::{collections::HashMap, fs, time::Duration};

use anyhow::{bail, Context, Result};
use url::Url;

const SETTINGS_FILE: &str = "console.toml";
const DEFAULT_SERVICE_BASE: &str = "http://127.0.0.1:3001";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub homework_api_base: Url,
    pub evaluation_api_base: Url,
    pub request_timeout: Duration,
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub homework_api: Option<String>,
    pub evaluation_api: Option<String>,
    pub timeout_ms: Option<u64>,
}

pub fn load_settings(overrides: &Overrides) -> Result<ConsoleSettings> {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from(file.as_deref(), |key| std::env::var(key).ok(), overrides)
}

pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> Result<ConsoleSettings> {
    let mut homework_api = DEFAULT_SERVICE_BASE.to_string();
    let mut evaluation_api = DEFAULT_SERVICE_BASE.to_string();
    let mut timeout_ms = DEFAULT_REQUEST_TIMEOUT_MS.to_string();

    if let Some(raw) = file {
        let file_cfg = toml::from_str::<HashMap<String, String>>(raw)
            .with_context(|| format!("failed to parse {SETTINGS_FILE}"))?;
        if let Some(v) = file_cfg.get("homework_api_base") {
            homework_api = v.clone();
        }
        if let Some(v) = file_cfg.get("evaluation_api_base") {
            evaluation_api = v.clone();
        }
        if let Some(v) = file_cfg.get("request_timeout_ms") {
            timeout_ms = v.clone();
        }
    }

    if let Some(v) = env("HOMEWORK_API_BASE") {
        homework_api = v;
    }
    if let Some(v) = env("APP__HOMEWORK_API_BASE") {
        homework_api = v;
    }
    if let Some(v) = env("EVALUATION_API_BASE") {
        evaluation_api = v;
    }
    if let Some(v) = env("APP__EVALUATION_API_BASE") {
        evaluation_api = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        timeout_ms = v;
    }

    if let Some(v) = &overrides.homework_api {
        homework_api = v.clone();
    }
    if let Some(v) = &overrides.evaluation_api {
        evaluation_api = v.clone();
    }
    if let Some(v) = overrides.timeout_ms {
        timeout_ms = v.to_string();
    }

    let timeout_ms: u64 = timeout_ms
        .trim()
        .parse()
        .with_context(|| format!("request timeout '{timeout_ms}' is not a number of milliseconds"))?;
    if timeout_ms == 0 {
        bail!("request timeout must be greater than zero");
    }

    Ok(ConsoleSettings {
        homework_api_base: parse_base_url("homework_api_base", &homework_api)?,
        evaluation_api_base: parse_base_url("evaluation_api_base", &evaluation_api)?,
        request_timeout: Duration::from_millis(timeout_ms),
    })
}

fn parse_base_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("{field} '{raw}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{field} must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
