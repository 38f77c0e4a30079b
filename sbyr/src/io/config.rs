//! Runner configuration stored in an optional `sbyr.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Runner configuration (TOML).
///
/// Intended to be edited by humans; every field has a sensible default and
/// a missing file means "all defaults". Command-line flags override the
/// tool paths listed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    pub engine: EngineConfig,

    /// Default executable paths per tool name (`yosys`, `abc`, ...).
    pub tools: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable invoked once per task with the workdir as argument.
    pub command: String,

    /// Wall-clock limit for one engine invocation, in seconds.
    pub timeout_secs: u64,

    /// Truncate captured engine stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "sby-engine".to_string(),
            timeout_secs: 24 * 60 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tools: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.engine.command.trim().is_empty() {
            return Err(anyhow!("engine.command must not be empty"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(anyhow!("engine.timeout_secs must be > 0"));
        }
        if self.engine.output_limit_bytes == 0 {
            return Err(anyhow!("engine.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RunnerConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sbyr.toml");
        fs::write(
            &path,
            "[engine]\ncommand = \"mock-engine\"\n\n[tools]\nyosys = \"/opt/yosys\"\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.engine.command, "mock-engine");
        assert_eq!(
            cfg.engine.timeout_secs,
            EngineConfig::default().timeout_secs
        );
        assert_eq!(cfg.tools.get("yosys").map(String::as_str), Some("/opt/yosys"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sbyr.toml");
        fs::write(&path, "[engine]\ntimeout_secs = 0\n").expect("write");
        assert!(load_config(&path).is_err());
    }
}
