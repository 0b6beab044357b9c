//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grading::{GraderConfig, GradingMode};

/// Top-level recall configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Where grades come from.
    #[serde(default)]
    pub mode: GradingMode,
    /// Remote grader timeout in milliseconds.
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_ms: u64,
    /// Max cards graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Percent at or above which a card counts as recalled.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_remote_timeout() -> u64 {
    3000
}
fn default_parallelism() -> usize {
    4
}
fn default_pass_threshold() -> u8 {
    80
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./recall-results")
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            mode: GradingMode::default(),
            remote_timeout_ms: default_remote_timeout(),
            parallelism: default_parallelism(),
            pass_threshold: default_pass_threshold(),
            output_dir: default_output_dir(),
        }
    }
}

impl RecallConfig {
    pub fn grader_config(&self) -> GraderConfig {
        GraderConfig {
            mode: self.mode,
            remote_timeout: Duration::from_millis(self.remote_timeout_ms),
            parallelism: self.parallelism,
            pass_threshold: self.pass_threshold,
        }
    }

    /// Reject values the grader cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.parallelism >= 1, "parallelism must be at least 1");
        anyhow::ensure!(
            self.pass_threshold <= 100,
            "pass_threshold must be between 0 and 100"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = lookup(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Apply `RECALL_*` overrides and expand `${VAR}` references.
fn apply_env(config: &mut RecallConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(mode) = lookup("RECALL_MODE") {
        config.mode = mode
            .parse()
            .map_err(|e: String| anyhow::anyhow!("RECALL_MODE: {e}"))?;
    }

    if let Some(timeout) = lookup("RECALL_REMOTE_TIMEOUT_MS") {
        config.remote_timeout_ms = timeout
            .trim()
            .parse()
            .with_context(|| format!("RECALL_REMOTE_TIMEOUT_MS: invalid value '{timeout}'"))?;
    }

    let output_dir = config.output_dir.to_string_lossy().into_owned();
    config.output_dir = PathBuf::from(resolve_env_vars(&output_dir, &lookup));

    Ok(())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `recall.toml` in the current directory
/// 2. `~/.config/recall/config.toml`
///
/// Environment variable overrides: `RECALL_MODE`, `RECALL_REMOTE_TIMEOUT_MS`.
pub fn load_config() -> Result<RecallConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RecallConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("recall.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => RecallConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;
    config.validate()?;

    tracing::debug!(
        path = ?config_path,
        mode = %config.mode,
        "configuration loaded"
    );

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<RecallConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<RecallConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("recall"))
}
