//! Spec loading: where the document comes from and how its text is parsed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::CliError;
use crate::fetch::fetch_text;

/// Where the spec is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecSource {
    File(PathBuf),
    Url(Url),
}

impl SpecSource {
    /// `http://` and `https://` arguments are URLs, anything else is a file path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if (lower.starts_with("http://") || lower.starts_with("https://"))
            && let Ok(url) = Url::parse(input)
        {
            return SpecSource::Url(url);
        }
        SpecSource::File(PathBuf::from(input))
    }

    /// Extension of the file name, or of the last URL path segment.
    fn extension(&self) -> Option<String> {
        let name = match self {
            SpecSource::File(path) => path.file_name()?.to_str()?.to_string(),
            SpecSource::Url(url) => url.path_segments()?.next_back()?.to_string(),
        };
        Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
    }
}

impl fmt::Display for SpecSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecSource::File(path) => write!(f, "{}", path.display()),
            SpecSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Text format of a spec, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(SpecFormat::Json),
            "yaml" | "yml" => Some(SpecFormat::Yaml),
            _ => None,
        }
    }

    pub fn of(source: &SpecSource) -> Result<Self, CliError> {
        let extension = source.extension();
        extension
            .as_deref()
            .and_then(SpecFormat::from_extension)
            .ok_or_else(|| CliError::UnsupportedFormat {
                source_name: source.to_string(),
                extension,
            })
    }

    /// Parses spec text into a JSON value.
    pub fn parse(self, text: &str, source_name: &str) -> Result<Value, CliError> {
        let parsed = match self {
            SpecFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            SpecFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| CliError::MalformedDocument {
            source_name: source_name.to_string(),
            reason,
        })
    }
}

/// Reads or fetches the spec and parses it.
pub async fn load(source: &SpecSource) -> Result<Value, CliError> {
    let format = SpecFormat::of(source)?;
    let text = match source {
        SpecSource::File(path) => {
            std::fs::read_to_string(path).map_err(|source| CliError::Io {
                context: "read spec",
                path: path.display().to_string(),
                source,
            })?
        }
        SpecSource::Url(url) => fetch_text(url).await?,
    };
    debug!(source = %source, ?format, bytes = text.len(), "Loaded spec.");
    format.parse(&text, &source.to_string())
}
