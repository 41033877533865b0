//! Minimal client for the repository's server info web script.

use errors::{FixtureError, FixtureResult};
use serde::Deserialize;

/// Path of the web script describing the running server.
pub const SERVER_INFO_PATH: &str = "/alfresco/service/api/server";

/// Subset of the `/api/server` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub edition: String,

    /// Full version string, e.g. `7.4.1 (r1234-b56 schema 19000)`
    pub version: String
}

impl ServerInfo {
    /// Leading version number, without build and schema details.
    pub fn version_number(&self) -> &str {
        self.version.split_whitespace().next().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ServerInfoResponse {
    data: ServerInfo
}

/// Fetches server info from a repository at `base_url` (`http://host:port`).
pub async fn fetch_server_info(base_url: &str) -> FixtureResult<ServerInfo> {
    let url = format!("{}{SERVER_INFO_PATH}", base_url.trim_end_matches('/'));
    let http_error = |reason: String| FixtureError::Http {
        url: url.clone(),
        reason
    };

    let response = reqwest::get(&url)
        .await
        .map_err(|e| http_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(http_error(format!("unexpected status {status}")));
    }

    let body: ServerInfoResponse = response
        .json()
        .await
        .map_err(|e| http_error(e.to_string()))?;
    tracing::debug!(url = %url, version = %body.data.version, "Fetched server info");
    Ok(body.data)
}

/// Version number reported by the repository at `base_url`.
pub async fn fetch_server_version(base_url: &str) -> FixtureResult<String> {
    let info = fetch_server_info(base_url).await?;
    Ok(info.version_number().to_string())
}
