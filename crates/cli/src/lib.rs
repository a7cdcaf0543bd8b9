//! `openapi-gen`: load an OpenAPI (or Swagger 2.0) spec and print a typed client.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod logging;

use std::path::Path;

use openapi_gen_core::generate;
use tracing::info;

pub use cli::Cli;
pub use config::{GeneratorConfig, Settings};
pub use error::CliError;
pub use loader::{SpecFormat, SpecSource, load};

/// Runs one generation: load, convert if needed, generate, write.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let settings = Settings::resolve(&cli, config);

    let source = SpecSource::parse(&cli.spec);
    let document = load(&source).await?;
    let document = convert::convert_if_v2(document)?;

    let code = generate(&document, &settings.options);
    match &settings.output {
        Some(path) => {
            write_output(path, &code)?;
            info!(path = %path.display(), name = %settings.options.name, "Wrote client.");
        }
        None => print!("{code}"),
    }
    Ok(())
}

fn write_output(path: &Path, code: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CliError::Io {
            context: "create directory",
            path: parent.display().to_string(),
            source,
        })?;
    }
    std::fs::write(path, code).map_err(|source| CliError::Io {
        context: "write",
        path: path.display().to_string(),
        source,
    })
}
