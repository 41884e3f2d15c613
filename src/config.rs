//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
//! 3. Local config: `<dir>/.orgtree.toml` (working directory unless `-C` is given)
//! 4. Environment variables: `ORGTREE_*` prefix, `__` between nesting levels

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::{ApplicationError, FieldNames, InputFormat, OutputFormat};

/// Input document settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct InputSettings {
    /// Input format (auto, xml, json)
    pub format: InputFormat,
    /// Element and field names
    #[serde(flatten)]
    pub fields: FieldNames,
}

/// Raw input settings for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawInputSettings {
    pub format: Option<InputFormat>,
    pub record_tag: Option<String>,
    pub field_tag: Option<String>,
    pub identity_field: Option<String>,
    pub parent_field: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output_path: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub pretty: Option<bool>,
    pub input: RawInputSettings,
}

impl InputSettings {
    /// Merge overlay onto self: overlay wins where specified.
    pub fn merge(&self, overlay: &RawInputSettings) -> Self {
        let pick = |o: &Option<String>, base: &String| o.clone().unwrap_or_else(|| base.clone());
        Self {
            format: overlay.format.unwrap_or(self.format),
            fields: FieldNames {
                record_tag: pick(&overlay.record_tag, &self.fields.record_tag),
                field_tag: pick(&overlay.field_tag, &self.fields.field_tag),
                identity_field: pick(&overlay.identity_field, &self.fields.identity_field),
                parent_field: pick(&overlay.parent_field, &self.fields.parent_field),
            },
        }
    }
}

/// Unified configuration for orgtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Where `build` writes when no output is given (default: org_tree.json)
    pub output_path: PathBuf,
    /// Output format (json, tree)
    pub output_format: OutputFormat,
    /// Indent JSON output
    pub pretty: bool,
    /// Input document settings
    pub input: InputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("org_tree.json"),
            output_format: OutputFormat::Json,
            pretty: true,
            input: InputSettings::default(),
        }
    }
}

/// Get the XDG config directory for orgtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".orgtree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.output_path.to_string_lossy().as_ref());
        self.output_path = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base): overlay wins if Some.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            output_path: overlay
                .output_path
                .clone()
                .unwrap_or_else(|| self.output_path.clone()),
            output_format: overlay.output_format.unwrap_or(self.output_format),
            pretty: overlay.pretty.unwrap_or(self.pretty),
            input: self.input.merge(&overlay.input),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory to look for `.orgtree.toml` in
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
    /// 3. Local config: `<local_dir>/.orgtree.toml`
    /// 4. Environment variables: `ORGTREE_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env_source())?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply ORGTREE_* environment variables as explicit overrides.
    ///
    /// A value that does not parse is ignored with a warning; the file layers
    /// stay in effect.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("output_path") {
            settings.output_path = PathBuf::from(val);
        }
        override_enum(&config, "output_format", &mut settings.output_format);
        if config.get_string("pretty").is_ok() {
            match config.get_bool("pretty") {
                Ok(val) => settings.pretty = val,
                Err(e) => warn!("ignoring environment override: pretty: {e}"),
            }
        }
        override_enum(&config, "input.format", &mut settings.input.format);
        let fields = &mut settings.input.fields;
        for (key, slot) in [
            ("input.record_tag", &mut fields.record_tag),
            ("input.field_tag", &mut fields.field_tag),
            ("input.identity_field", &mut fields.identity_field),
            ("input.parent_field", &mut fields.parent_field),
        ] {
            if let Ok(val) = config.get_string(key) {
                *slot = val;
            }
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgtree/orgtree.toml
#   Local:  ./.orgtree.toml  (or <dir>/.orgtree.toml with -C <dir>)
#   Env:    ORGTREE_* environment variables, e.g. ORGTREE_INPUT__FORMAT=json

# Where `orgtree build` writes when no --output is given
# output_path = "org_tree.json"

# Output format: "json" or "tree"
# output_format = "json"

# Indent JSON output
# pretty = true

[input]
# Input format: "auto" (by extension), "xml" or "json"
# format = "auto"

# XML element wrapping one employee
# record_tag = "employee"

# XML element holding one field, named by its id attribute
# field_tag = "field"

# Field with the employee's identity (mandatory)
# identity_field = "email"

# Field with the manager's identity (empty or missing for the root)
# parent_field = "manager"
"#
        .to_string()
    }
}

fn parse_enum<T: ValueEnum>(key: &str, val: &str) -> Result<T, ApplicationError> {
    T::from_str(val, true).map_err(|e| ApplicationError::Config {
        message: format!("{key}: {e}"),
    })
}

/// Environment source for `ORGTREE_*` overrides.
fn env_source() -> Environment {
    Environment::with_prefix("ORGTREE")
        .prefix_separator("_")
        .separator("__")
}

/// Replace `slot` with the environment value for `key` if it names a variant.
fn override_enum<T: ValueEnum>(config: &Config, key: &str, slot: &mut T) {
    if let Ok(val) = config.get_string(key) {
        match parse_enum(key, &val) {
            Ok(parsed) => *slot = parsed,
            Err(e) => warn!("ignoring environment override: {e}"),
        }
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
