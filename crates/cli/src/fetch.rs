use tracing::debug;
use url::Url;

use crate::error::CliError;

/// Fetches a remote spec as text. One attempt, no retry.
pub async fn fetch_text(url: &Url) -> Result<String, CliError> {
    let to_error = |source| CliError::Fetch {
        url: url.to_string(),
        source,
    };
    debug!(%url, "Fetching spec.");
    let response = reqwest::get(url.clone())
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(to_error)?;
    response.text().await.map_err(to_error)
}
