//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/flowtree/flowtree.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `FLOWTREE_*` prefix (`__` between nested keys)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, IoResultExt, DEFAULT_MAX_DEPTH};
use crate::domain::{LayoutMetrics, DEFAULT_ROOT_LABEL};

/// Unified configuration for flowtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Label of the root node of a new session
    pub root_label: String,
    /// Initial long-label elision mode
    pub truncate: bool,
    /// Deepest level a session lets `add` grow the tree to, root = 1
    pub max_depth: usize,
    /// Layout geometry
    pub metrics: LayoutMetrics,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            truncate: false,
            max_depth: DEFAULT_MAX_DEPTH,
            metrics: LayoutMetrics::default(),
        }
    }
}

/// Raw metrics for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMetrics {
    pub min_width: Option<f64>,
    pub char_width: Option<f64>,
    pub padding: Option<f64>,
    pub child_spacing: Option<f64>,
    pub spine_pad: Option<f64>,
    pub truncate_at: Option<usize>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_label: Option<String>,
    pub truncate: Option<bool>,
    pub max_depth: Option<usize>,
    pub metrics: RawMetrics,
}

impl RawMetrics {
    fn apply_to(&self, base: &LayoutMetrics) -> LayoutMetrics {
        LayoutMetrics {
            min_width: self.min_width.unwrap_or(base.min_width),
            char_width: self.char_width.unwrap_or(base.char_width),
            padding: self.padding.unwrap_or(base.padding),
            child_spacing: self.child_spacing.unwrap_or(base.child_spacing),
            spine_pad: self.spine_pad.unwrap_or(base.spine_pad),
            truncate_at: self.truncate_at.unwrap_or(base.truncate_at),
        }
    }
}

/// Get the XDG config directory for flowtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flowtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flowtree.toml"))
}

/// Environment source for `FLOWTREE_*` overrides.
pub fn env_source() -> Environment {
    Environment::with_prefix("FLOWTREE")
        .prefix_separator("_")
        .separator("__")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).with_path_context("read config", path)?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_label: overlay
                .root_label
                .clone()
                .unwrap_or_else(|| self.root_label.clone()),
            truncate: overlay.truncate.unwrap_or(self.truncate),
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            metrics: overlay.metrics.apply_to(&self.metrics),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file; unlike the global file it must exist
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|path| path.exists());
        Self::load_layers(global.as_deref(), local, env_source())
    }

    /// Load from explicit layers; `load` fills them from the environment.
    #[instrument(level = "debug", skip(env))]
    pub fn load_layers(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(path) = global {
            debug!(path = %path.display(), "applying global config");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 3. Local config
        if let Some(path) = local {
            debug!(path = %path.display(), "applying local config");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current, env)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply FLOWTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(&config, "root_label")? {
            settings.root_label = val;
        }
        if let Some(val) = env_value(&config, "truncate")? {
            settings.truncate = val;
        }
        if let Some(val) = env_value(&config, "max_depth")? {
            settings.max_depth = val;
        }
        let metrics = &mut settings.metrics;
        if let Some(val) = env_value(&config, "metrics.min_width")? {
            metrics.min_width = val;
        }
        if let Some(val) = env_value(&config, "metrics.char_width")? {
            metrics.char_width = val;
        }
        if let Some(val) = env_value(&config, "metrics.padding")? {
            metrics.padding = val;
        }
        if let Some(val) = env_value(&config, "metrics.child_spacing")? {
            metrics.child_spacing = val;
        }
        if let Some(val) = env_value(&config, "metrics.spine_pad")? {
            metrics.spine_pad = val;
        }
        if let Some(val) = env_value(&config, "metrics.truncate_at")? {
            metrics.truncate_at = val;
        }

        Ok(settings)
    }

    /// Reject values the tree model or layout cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let invalid = |message: &str| {
            Err(ApplicationError::Config {
                message: message.to_string(),
            })
        };
        let m = &self.metrics;
        if self.root_label.trim().is_empty() {
            return invalid("root_label must not be empty");
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1");
        }
        if m.truncate_at == 0 {
            return invalid("metrics.truncate_at must be at least 1");
        }
        let lengths = [m.min_width, m.char_width, m.padding, m.child_spacing, m.spine_pad];
        if lengths.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("metrics lengths must be finite and non-negative");
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# flowtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/flowtree/flowtree.toml
#   Local:  file passed with --config
#   Env:    FLOWTREE_* environment variables, e.g. FLOWTREE_METRICS__CHAR_WIDTH

# Label of the root node
# root_label = "Start"

# Start with long labels elided
# truncate = false

# Deepest level `add` may grow the tree to (root = 1)
# max_depth = 256

[metrics]
# min_width = 8.0
# char_width = 0.7
# padding = 4.0
# child_spacing = 14.0
# spine_pad = 6.0
# truncate_at = 20
"#
        .to_string()
    }
}

/// Typed lookup of one env override: absent is `None`, malformed is an error.
fn env_value<'de, T: Deserialize<'de>>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_inherit() {
        let base = Settings::default();
        let overlay = RawSettings {
            root_label: Some("Begin".into()),
            truncate: None,
            max_depth: None,
            metrics: RawMetrics {
                child_spacing: Some(20.0),
                ..RawMetrics::default()
            },
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.root_label, "Begin");
        assert!(!merged.truncate);
        assert_eq!(merged.metrics.child_spacing, 20.0);
        assert_eq!(merged.metrics.spine_pad, 6.0);
        assert_eq!(merged.metrics.truncate_at, 20);
    }

    #[test]
    fn given_blank_root_label_when_validating_then_errors() {
        let settings = Settings {
            root_label: "   ".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_negative_metric_when_validating_then_errors() {
        let mut settings = Settings::default();
        settings.metrics.padding = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert_eq!(Settings::default().merge_with(&raw), Settings::default());
    }
}
