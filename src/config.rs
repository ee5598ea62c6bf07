use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};

/// Environment variable that overrides `[model].api_key`.
pub const API_KEY_ENV: &str = "SEECLAW_PILOT_API_KEY";

const CONFIG_FILE: &str = "config.toml";

/// Everything a single run needs. Built once before the loop starts and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Full chat-completions URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_target_width")]
    pub target_width: u32,
    #[serde(default = "default_target_height")]
    pub target_height: u32,
    #[serde(default = "default_true")]
    pub dump_screenshots: bool,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
    #[serde(default = "default_dump_prefix")]
    pub dump_prefix: String,
    #[serde(default = "default_dump_start")]
    pub dump_start: u32,
    /// How many screenshot turns survive pruning. 0 drops all of them.
    #[serde(default = "default_keep_last")]
    pub keep_last_screenshots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Pause after every pointer/keyboard action before the cursor is read back.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:1234/v1/chat/completions".into()
}

fn default_model() -> String {
    "qwen/qwen3-vl-2b-instruct".into()
}

fn default_timeout_secs() -> u64 {
    240
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_target_width() -> u32 {
    1344
}

fn default_target_height() -> u32 {
    756
}

fn default_true() -> bool {
    true
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from("dumps")
}

fn default_dump_prefix() -> String {
    "screen_".into()
}

fn default_dump_start() -> u32 {
    1
}

fn default_keep_last() -> usize {
    1
}

fn default_max_steps() -> u32 {
    50
}

fn default_step_delay_ms() -> u64 {
    400
}

fn default_settle_delay_ms() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            target_height: default_target_height(),
            dump_screenshots: default_true(),
            dump_dir: default_dump_dir(),
            dump_prefix: default_dump_prefix(),
            dump_start: default_dump_start(),
            keep_last_screenshots: default_keep_last(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            step_delay_ms: default_step_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AgentConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Command-line overrides applied on top of the loaded file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub keep_screens: Option<usize>,
    pub max_steps: Option<u32>,
    pub dump_dir: Option<PathBuf>,
    pub no_dump: bool,
}

impl RunConfig {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(keep) = overrides.keep_screens {
            self.capture.keep_last_screenshots = keep;
        }
        if let Some(steps) = overrides.max_steps {
            self.agent.max_steps = steps;
        }
        if let Some(dir) = &overrides.dump_dir {
            self.capture.dump_dir = dir.clone();
        }
        if overrides.no_dump {
            self.capture.dump_screenshots = false;
        }
    }

    /// Bearer token from the environment, falling back to the file value.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.model.api_key = Some(key);
            }
        }
    }
}

fn resolve_config_path() -> PilotResult<Option<PathBuf>> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(Some(candidate));
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(Some(candidate));
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("seeclaw-pilot").join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config directory");
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

pub fn parse_config(content: &str) -> PilotResult<RunConfig> {
    Ok(toml::from_str(content)?)
}

/// Load the run configuration.
///
/// An explicit path must exist. Without one, the usual locations are searched
/// and built-in defaults are used when nothing is found.
pub fn load_config(explicit: Option<&Path>) -> PilotResult<RunConfig> {
    let path = match explicit {
        Some(p) if !p.exists() => {
            return Err(PilotError::Config(format!(
                "config file {} does not exist",
                p.display()
            )));
        }
        Some(p) => Some(p.to_path_buf()),
        None => resolve_config_path()?,
    };

    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config = parse_config(&content)?;
            tracing::info!(path = %path.display(), model = %config.model.model, "config loaded");
            config
        }
        None => {
            tracing::info!("no config.toml found; using built-in defaults");
            RunConfig::default()
        }
    };
    config.apply_env();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.model.timeout_secs, 240);
        assert_eq!(cfg.capture.target_width, 1344);
        assert_eq!(cfg.capture.target_height, 756);
        assert_eq!(cfg.capture.keep_last_screenshots, 1);
        assert_eq!(cfg.agent.max_steps, 50);
        assert!(cfg.capture.dump_screenshots);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_config(
            r#"
            [model]
            model = "local/vl"
            temperature = 0.5

            [agent]
            max_steps = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.model.model, "local/vl");
        assert_eq!(cfg.model.temperature, 0.5);
        assert_eq!(cfg.model.max_tokens, 2048);
        assert_eq!(cfg.agent.max_steps, 7);
        assert_eq!(cfg.agent.step_delay_ms, 400);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = RunConfig::default();
        cfg.apply(&Overrides {
            keep_screens: Some(0),
            max_steps: Some(3),
            dump_dir: Some(PathBuf::from("out")),
            no_dump: true,
        });
        assert_eq!(cfg.capture.keep_last_screenshots, 0);
        assert_eq!(cfg.agent.max_steps, 3);
        assert_eq!(cfg.capture.dump_dir, PathBuf::from("out"));
        assert!(!cfg.capture.dump_screenshots);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, PilotError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[agent]\nmax_steps = \"many\"").is_err());
    }
}
