use thiserror::Error;

use crate::convert::ConvertError;

/// Errors surfaced by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// The spec path does not end in `.json`, `.yaml` or `.yml`.
    #[error(
        "unsupported spec format for {source_name}: {ext} (expected json, yaml or yml)",
        ext = .extension.as_deref().unwrap_or("no extension")
    )]
    UnsupportedFormat {
        source_name: String,
        extension: Option<String>,
    },
    /// The spec text is not valid JSON/YAML.
    #[error("failed to parse {source_name}: {reason}")]
    MalformedDocument { source_name: String, reason: String },
    /// The spec URL could not be fetched.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to {context} {path}: {source}")]
    Io {
        context: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {reason}")]
    Config { path: String, reason: String },
    /// Swagger 2.0 to OpenAPI 3 conversion failed.
    #[error("conversion to OpenAPI 3 failed: {0}")]
    Conversion(#[from] ConvertError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Conversion(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let unsupported = CliError::UnsupportedFormat {
            source_name: "spec.txt".into(),
            extension: Some("txt".into()),
        };
        assert_eq!(unsupported.exit_code(), 1);
        assert_eq!(
            unsupported.to_string(),
            "unsupported spec format for spec.txt: txt (expected json, yaml or yml)"
        );

        let conversion = CliError::from(ConvertError::PathsNotObject);
        assert_eq!(conversion.exit_code(), 2);
    }
}
