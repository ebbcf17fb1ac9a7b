use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use generation::OllamaConfig;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "flashcards.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    /// Base URL of an Ollama server. Without one, generation reports the
    /// model as unavailable.
    pub model_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Zero disables the limit.
    pub generation_timeout_seconds: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/flashcards.db".into(),
            model_url: None,
            model: "llama3.2".into(),
            temperature: 0.3,
            generation_timeout_seconds: 60,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn generation_timeout(&self) -> Option<Duration> {
        (self.generation_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.generation_timeout_seconds))
    }

    pub fn ollama_config(&self) -> Option<OllamaConfig> {
        let base_url = self.model_url.as_deref()?.trim();
        if base_url.is_empty() {
            return None;
        }
        Some(OllamaConfig {
            base_url: base_url.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            ..OllamaConfig::default()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    model_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    generation_timeout_seconds: Option<u64>,
    log_filter: Option<String>,
}

/// Defaults, then `path` if it exists, then the environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.model_url {
        settings.model_url = Some(v);
    }
    if let Some(v) = file_cfg.model {
        settings.model = v;
    }
    if let Some(v) = file_cfg.temperature {
        settings.temperature = v;
    }
    if let Some(v) = file_cfg.generation_timeout_seconds {
        settings.generation_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    let first = |keys: &[&str]| keys.iter().find_map(|key| var(*key));

    if let Some(v) = first(&["APP__DATABASE_URL", "FLASHCARDS_DATABASE_URL"]) {
        settings.database_url = v;
    }
    if let Some(v) = first(&["APP__MODEL_URL", "FLASHCARDS_MODEL_URL"]) {
        settings.model_url = Some(v);
    }
    if let Some(v) = first(&["APP__MODEL", "FLASHCARDS_MODEL"]) {
        settings.model = v;
    }
    if let Some(v) = first(&["APP__TEMPERATURE", "FLASHCARDS_TEMPERATURE"]) {
        if let Ok(parsed) = v.trim().parse::<f32>() {
            settings.temperature = parsed;
        }
    }
    if let Some(v) = first(&["APP__GENERATION_TIMEOUT_SECONDS", "FLASHCARDS_TIMEOUT_SECONDS"]) {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.generation_timeout_seconds = parsed;
        }
    }
    if let Some(v) = first(&["APP__LOG_FILTER", "FLASHCARDS_LOG"]) {
        settings.log_filter = v;
    }
}

/// Turns a plain file path into a `sqlite://` URL. URLs pass through.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
