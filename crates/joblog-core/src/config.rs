use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/joblog/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoblogConfig {
    /// External platform tool used for listing, watching and downloading.
    pub dx_program: String,
    /// Default owner filter (None = jobs of every owner).
    pub owner: Option<String>,
    /// Number of jobs fetched and shown at startup.
    pub initial_count: usize,
    /// Grow/shrink step.
    pub step: usize,
    /// Where outputs are downloaded (None = current directory).
    pub download_dir: Option<PathBuf>,
    /// Insert the attempt list between the job list and the log.
    pub attempts: bool,
    /// Upper bound on attempts probed per job.
    pub max_attempts: u32,
    /// Input poll interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for JoblogConfig {
    fn default() -> Self {
        Self {
            dx_program: "dx".to_string(),
            owner: None,
            initial_count: 100,
            step: 100,
            download_dir: None,
            attempts: false,
            max_attempts: 16,
            tick_ms: 50,
        }
    }
}

impl JoblogConfig {
    /// Reject values the dashboard cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            bail!("step must be at least 1");
        }
        if self.initial_count == 0 {
            bail!("initial count must be at least 1");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        if self.dx_program.trim().is_empty() {
            bail!("dx_program must not be empty");
        }
        Ok(())
    }

    /// Directory outputs are written to.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("joblog")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JoblogConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = JoblogConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: JoblogConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = JoblogConfig::default();
        assert_eq!(cfg.dx_program, "dx");
        assert_eq!(cfg.initial_count, 100);
        assert_eq!(cfg.step, 100);
        assert_eq!(cfg.max_attempts, 16);
        assert!(!cfg.attempts);
        assert!(cfg.owner.is_none());
        assert_eq!(cfg.download_dir(), PathBuf::from("."));
        cfg.validate().unwrap();
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = JoblogConfig {
            owner: Some("alice".to_string()),
            download_dir: Some(PathBuf::from("/tmp/outputs")),
            ..JoblogConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: JoblogConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let toml = r#"
            step = 25
            attempts = true
        "#;
        let cfg: JoblogConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.step, 25);
        assert!(cfg.attempts);
        assert_eq!(cfg.initial_count, 100);
        assert_eq!(cfg.dx_program, "dx");
    }

    #[test]
    fn zero_step_rejected() {
        let cfg = JoblogConfig {
            step: 0,
            ..JoblogConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("step"));
    }

    #[test]
    fn zero_initial_count_and_attempts_rejected() {
        let cfg = JoblogConfig {
            initial_count: 0,
            ..JoblogConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = JoblogConfig {
            max_attempts: 0,
            ..JoblogConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
