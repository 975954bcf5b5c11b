//! Pipeline config loading: placeholder expansion, YAML decoding, and
//! the API credential loader.
//!
//! Config files may reference the environment as `${VAR}` or, with a
//! fallback, `${VAR:default}`. Secrets never live in the file itself;
//! the credential comes from [`API_KEY_VAR`] or a `.env` file.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};

use crate::config::types::PipelineConfig;

/// Environment variable holding the upstream API credential.
pub const API_KEY_VAR: &str = "RIOT_API_KEY";

/// `${NAME}` or `${NAME:default}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::(?P<default>[^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Expand environment placeholders in a config document.
///
/// A placeholder with a `:default` part falls back to the default when
/// the variable is unset; one without is required.
///
/// # Errors
///
/// Reports every required-but-unset variable name in one error.
pub fn expand_placeholders(input: &str) -> Result<String> {
    let mut unresolved: Vec<String> = Vec::new();

    let expanded = PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps["name"];
        if let Ok(value) = std::env::var(name) {
            return value;
        }
        if let Some(default) = caps.name("default") {
            return default.as_str().to_string();
        }
        unresolved.push(name.to_string());
        String::new()
    });

    if unresolved.is_empty() {
        Ok(expanded.into_owned())
    } else {
        Err(anyhow!(
            "config references unset environment variable(s): {}",
            unresolved.join(", ")
        ))
    }
}

/// Decode a pipeline config from YAML text, expanding placeholders
/// first.
///
/// # Errors
///
/// Fails on unresolved placeholders or invalid YAML.
pub fn parse_config_str(raw: &str) -> Result<PipelineConfig> {
    let expanded = expand_placeholders(raw)?;
    serde_yaml::from_str(&expanded).map_err(|e| anyhow!("not a valid pipeline config: {e}"))
}

/// Load and decode a pipeline config file.
///
/// # Errors
///
/// Fails when the file is unreadable, a placeholder is unresolved, or
/// the YAML is invalid.
pub fn parse_config(path: &Path) -> Result<PipelineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    parse_config_str(&raw).with_context(|| format!("in {}", path.display()))
}

/// Resolve the API credential: environment first, then a `.env` file in
/// `dir`.
///
/// # Errors
///
/// Returns an error naming [`API_KEY_VAR`] when neither source has it.
pub fn load_api_key(dir: &Path) -> Result<String> {
    if let Ok(value) = std::env::var(API_KEY_VAR) {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }

    let dotenv = dir.join(".env");
    if let Ok(content) = std::fs::read_to_string(&dotenv) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                if key.trim() == API_KEY_VAR {
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if !value.is_empty() {
                        return Ok(value.to_string());
                    }
                }
            }
        }
    }

    anyhow::bail!("{API_KEY_VAR} is not set; export it or add it to {}", dotenv.display())
}
