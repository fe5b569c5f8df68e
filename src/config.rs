use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENGINE_BIN: &str = "ollama";
const DEFAULT_RESOLVER_BIN: &str = "/usr/bin/which";
const DEFAULT_SEARCH_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/opt/homebrew/bin";
const FALLBACK_HOME_DIR: &str = "/tmp";

/// Values handed to every engine spawn. The subprocess environment is built
/// from these alone; nothing is inherited from the caller's environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEnv {
    pub path: String,
    pub home: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine_bin: String,
    pub resolver_bin: String,
    pub search_path: String,
    pub home_dir: String,
    pub model: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let engine_bin =
            std::env::var("PONDER_ENGINE_BIN").unwrap_or_else(|_| DEFAULT_ENGINE_BIN.to_string());
        let resolver_bin = std::env::var("PONDER_RESOLVER_BIN")
            .unwrap_or_else(|_| DEFAULT_RESOLVER_BIN.to_string());
        let search_path = std::env::var("PONDER_ENGINE_PATH")
            .unwrap_or_else(|_| DEFAULT_SEARCH_PATH.to_string());
        let home_dir = std::env::var("PONDER_HOME")
            .or_else(|_| std::env::var("HOME"))
            .unwrap_or_else(|_| FALLBACK_HOME_DIR.to_string());
        let model = std::env::var("PONDER_MODEL").ok().and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });

        Ok(Self {
            engine_bin,
            resolver_bin,
            search_path,
            home_dir,
            model,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine_bin.trim().is_empty() {
            bail!("PONDER_ENGINE_BIN must not be empty");
        }
        if self.search_path.trim().is_empty() {
            bail!("PONDER_ENGINE_PATH must not be empty");
        }
        if self.home_dir.trim().is_empty() {
            bail!("PONDER_HOME must not be empty");
        }
        Ok(())
    }

    pub fn spawn_env(&self) -> SpawnEnv {
        SpawnEnv {
            path: self.search_path.clone(),
            home: self.home_dir.clone(),
        }
    }
}

impl Config {
    /// Config pointed at an arbitrary executable, for tests and callers that
    /// substitute another engine binary for `ollama`.
    pub fn with_engine_bin(engine_bin: &str) -> Self {
        Self {
            engine_bin: engine_bin.to_string(),
            resolver_bin: DEFAULT_RESOLVER_BIN.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            home_dir: FALLBACK_HOME_DIR.to_string(),
            model: None,
        }
    }
}
