//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/kinlayout/kinlayout.toml`
//! 3. Local config: path given with `--config`
//! 4. Environment variables: `KINLAYOUT__<SECTION>__<KEY>`

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{DomainError, LayoutConfig, ViewportSettings};

/// Surfaces the CLI lays out and fits into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Width the root subtree is centered in
    pub viewport_width: f64,
    /// Render surface used by fit-to-bounds
    pub surface_width: f64,
    pub surface_height: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1200.0,
            surface_width: 1400.0,
            surface_height: 1000.0,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("viewport_width", self.viewport_width),
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::InvalidConfig(format!(
                    "render.{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Unified configuration for kinlayout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutConfig,
    pub viewport: ViewportSettings,
    pub render: RenderSettings,
}

/// Get the XDG config directory for kinlayout.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kinlayout").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("kinlayout.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

impl Settings {
    /// Load settings with layered precedence and validate the result.
    ///
    /// `local` is an explicit config file; it must exist when given.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(global_config_path().as_deref(), local)
    }

    /// Same as `load` with the global file location supplied by the caller.
    pub fn load_layers(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_env(global, local, Self::environment())
    }

    /// `KINLAYOUT__<SECTION>__<KEY>` variables of the process environment.
    pub fn environment() -> Environment {
        Environment::with_prefix("KINLAYOUT")
            .separator("__")
            .try_parsing(true)
    }

    /// Layered load with an explicit environment layer.
    pub fn load_with_env(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder().add_source(
            File::from_str(&Self::default().to_toml()?, FileFormat::Toml),
        );

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                builder = builder.add_source(File::from(global_path).format(FileFormat::Toml));
            }
        }

        if let Some(local_path) = local {
            let local_path = expand_path(&local_path.to_string_lossy());
            if !local_path.is_file() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", local_path.display()),
                });
            }
            debug!("local config: {}", local_path.display());
            builder = builder.add_source(File::from(local_path).format(FileFormat::Toml));
        }

        builder = builder.add_source(env);

        let settings: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject sizes and scales no layout or viewport can work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.layout.validate()?;
        self.viewport.validate()?;
        self.render.validate()?;
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
        r#"# kinlayout configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/kinlayout/kinlayout.toml
#   Local:  kinlayout --config <path>
#   Env:    KINLAYOUT__<SECTION>__<KEY>, e.g. KINLAYOUT__LAYOUT__NODE_WIDTH=160

[layout]
# Node card size in pixels
# node_width = 140.0
# node_height = 80.0
# Space between sibling subtrees
# horizontal_gap = 180.0
# Distance between generations
# vertical_gap = 180.0
# Space between a person and their spouse
# pair_gap = 20.0
# y of the root node
# top_margin = 100.0

[viewport]
# min_scale = 0.5
# max_scale = 1.5
# zoom_step = 0.1
# Padding on each side for fit-to-bounds
# fit_padding = 50.0

[render]
# Width the tree is centered in
# viewport_width = 1200.0
# Surface used by `kinlayout fit`
# surface_width = 1400.0
# surface_height = 1000.0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
