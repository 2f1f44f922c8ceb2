//! Request plumbing shared by the HTTP collaborators.

use reqwest::{header, Client, RequestBuilder, Response};

use crate::{BackendConfig, Error, Result};

/// Build an HTTP client with the resilink user agent.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("resilink/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Attach the API key headers the backend expects on every call.
pub fn authorize(request: RequestBuilder, config: &BackendConfig) -> RequestBuilder {
    request.header("apikey", config.api_key()).header(
        header::AUTHORIZATION,
        format!("Bearer {}", config.api_key()),
    )
}

/// Read a response body, turning non-2xx into `Error::Backend`.
///
/// # Errors
/// - `Network` if the body cannot be read, whatever the status
/// - `Backend` with the extracted message for a non-2xx status
pub async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(Error::from_backend_body(status.as_u16(), &text));
    }
    Ok(text)
}
