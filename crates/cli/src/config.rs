//! Optional TOML configuration, merged with command-line flags.
//!
//! ```toml
//! name = "PetStore"
//! type_only = false
//! output = "src/generated/client.ts"
//! ```

use std::path::{Path, PathBuf};

use openapi_gen_core::{DEFAULT_CLIENT_NAME, Flavor, GenerateOptions};
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub name: Option<String>,
    pub type_only: Option<bool>,
    pub output: Option<PathBuf>,
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            context: "read config",
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|err| CliError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

/// Effective settings: flag, then config file, then default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub options: GenerateOptions,
    /// `None` writes to stdout.
    pub output: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: GeneratorConfig) -> Self {
        let type_only = cli.type_only || config.type_only.unwrap_or(false);
        Self {
            options: GenerateOptions {
                name: cli
                    .name
                    .clone()
                    .or(config.name)
                    .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
                flavor: if type_only {
                    Flavor::TypeOnly
                } else {
                    Flavor::Schema
                },
            },
            output: cli.output.clone().or(config.output),
        }
    }
}
