use std::{path::Path, time::Duration};

use crate::{
    assets::fonts::FontSpec,
    compositor::layout::PageLayout,
    foundation::core::Label,
    foundation::error::{AlbumError, AlbumResult},
    generation::prompt::default_labels,
    generation::scheduler::Scheduler,
};

pub const ENV_ENDPOINT: &str = "ERAFRAME_ENDPOINT";
pub const ENV_CONCURRENCY: &str = "ERAFRAME_CONCURRENCY";
pub const ENV_API_KEY: &str = "ERAFRAME_API_KEY";

/// Top-level configuration, read from a JSON file. Every field has a default.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlbumConfig {
    pub generation: GenerationConfig,
    pub page: PageLayout,
    pub fonts: FontConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Labels generated by a round, in album order.
    pub decades: Vec<Label>,
    /// Maximum generation calls in flight.
    pub concurrency: usize,
    /// Image service URL. Required by the `generate` command.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            decades: default_labels(),
            concurrency: Scheduler::DEFAULT_CONCURRENCY,
            endpoint: None,
            api_key_env: ENV_API_KEY.to_string(),
            timeout_secs: 120,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn scheduler(&self) -> AlbumResult<Scheduler> {
        Scheduler::new(self.concurrency)
    }

    /// Bearer token from the configured variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    /// Page title face.
    pub display: FontSpec,
    /// Caption face.
    pub caption: FontSpec,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            display: FontSpec::family("serif"),
            caption: FontSpec::family("cursive"),
        }
    }
}

impl AlbumConfig {
    /// Read `path` (or start from defaults), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> AlbumResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> AlbumResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AlbumError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&text)
            .map_err(|e| AlbumError::config(format!("'{}': {e}", path.display())))
    }

    pub fn from_json_str(s: &str) -> AlbumResult<Self> {
        serde_json::from_str(s).map_err(|e| AlbumError::config(format!("parse config json: {e}")))
    }

    /// Apply `ERAFRAME_*` overrides looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AlbumResult<()> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.generation.endpoint = Some(endpoint);
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            self.generation.concurrency = raw.trim().parse().map_err(|e| {
                AlbumError::config(format!("{ENV_CONCURRENCY}='{raw}' is not a count: {e}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> AlbumResult<()> {
        let g = &self.generation;
        if g.decades.is_empty() {
            return Err(AlbumError::config("generation.decades must not be empty"));
        }
        for (i, label) in g.decades.iter().enumerate() {
            if g.decades[..i].contains(label) {
                return Err(AlbumError::config(format!(
                    "generation.decades lists '{label}' more than once"
                )));
            }
        }
        if g.concurrency == 0 {
            return Err(AlbumError::config("generation.concurrency must be >= 1"));
        }
        if g.timeout_secs == 0 {
            return Err(AlbumError::config("generation.timeout_secs must be >= 1"));
        }
        if let Some(endpoint) = &g.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(AlbumError::config(format!(
                "generation.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        for (name, spec) in [("display", &self.fonts.display), ("caption", &self.fonts.caption)] {
            if spec.family.trim().is_empty() {
                return Err(AlbumError::config(format!(
                    "fonts.{name}.family must be non-empty"
                )));
            }
        }
        self.page
            .validate()
            .map_err(|e| AlbumError::config(format!("page: {e}")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
