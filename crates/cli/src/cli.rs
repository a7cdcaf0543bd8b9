use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "openapi-gen",
    version,
    about = "Generate a typed Effect TypeScript client from an OpenAPI spec"
)]
pub struct Cli {
    /// Path or http(s) URL of the spec (.json, .yaml or .yml)
    #[arg(short, long, value_name = "PATH|URL")]
    pub spec: String,

    /// Name of the generated client interface
    #[arg(short, long)]
    pub name: Option<String>,

    /// Emit plain TypeScript types instead of Effect schemas
    #[arg(short, long)]
    pub type_only: bool,

    /// Write the client to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// TOML file with defaults for name, type_only and output
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
