use reqwest::Client;
use tracing::debug;

use crate::error::ReportError;

/// Fetch the schedule page, following redirects. A non-success status is a
/// `FetchStatus` error carrying the code; transport failures map to `Fetch`.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, ReportError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ReportError::FetchStatus(status.as_u16()));
    }

    let body = response.text().await?;
    debug!("Fetched {} ({} bytes)", url, body.len());
    Ok(body)
}
