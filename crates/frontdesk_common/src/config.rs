//! Agent configuration, loaded from TOML with full defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plan::MAX_CORTEX_STEPS;

fn default_practice_name() -> String {
    "Riverside Medical Practice".to_string()
}

fn default_practice_phone() -> String {
    "0117 496 0000".to_string()
}

fn default_opening_hours() -> String {
    "Monday to Friday 08:00-18:30, Saturday 09:00-12:00".to_string()
}

fn default_address() -> String {
    "14 Riverside Way, Bristol BS1 4ND".to_string()
}

/// Practice-specific facts embedded in the system instruction and used by
/// the admin FAQ tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    #[serde(default = "default_practice_name")]
    pub name: String,
    #[serde(default = "default_practice_phone")]
    pub phone: String,
    #[serde(default = "default_opening_hours")]
    pub opening_hours: String,
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            name: default_practice_name(),
            phone: default_practice_phone(),
            opening_hours: default_opening_hours(),
            address: default_address(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_primary_model() -> String {
    "qwen3:8b".to_string()
}

fn default_fallback_model() -> String {
    "qwen3:4b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Model provider settings: primary then fallback, each with a timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_primary_model")]
    pub primary: String,
    #[serde(default = "default_fallback_model")]
    pub fallback: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            primary: default_primary_model(),
            fallback: default_fallback_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_step_cap() -> usize {
    MAX_CORTEX_STEPS
}

fn default_spool_dir() -> String {
    "/var/lib/frontdesk/sessions".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8741".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub practice: PracticeConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default = "default_step_cap")]
    pub step_cap: usize,
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl AgentConfig {
    /// Load from a TOML file; a missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::with_defaults());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn with_defaults() -> Self {
        Self {
            practice: PracticeConfig::default(),
            model: ModelConfig::default(),
            step_cap: default_step_cap(),
            spool_dir: default_spool_dir(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = AgentConfig::with_defaults();
        assert_eq!(c.step_cap, MAX_CORTEX_STEPS);
        assert!(!c.practice.name.is_empty());
        assert!(!c.model.primary.is_empty());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let c = AgentConfig::load("/nonexistent/frontdesk.toml").unwrap();
        assert_eq!(c.listen_addr, default_listen_addr());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "step_cap = 6\n[practice]\nname = \"Hillview Surgery\"\n"
        )
        .unwrap();
        let c = AgentConfig::load(f.path()).unwrap();
        assert_eq!(c.step_cap, 6);
        assert_eq!(c.practice.name, "Hillview Surgery");
        // Unset sections fall back to defaults.
        assert_eq!(c.model.endpoint, default_endpoint());
    }
}
