//! HTTP collaborators for a hosted auth + REST backend.
//!
//! - `HttpIdentityBackend` talks to the auth endpoints (`/auth/v1/...`)
//! - `HttpProfileStore` upserts rows through the REST endpoint (`/rest/v1/...`)

pub mod auth;
pub mod profiles;

pub use auth::HttpIdentityBackend;
pub use profiles::HttpProfileStore;

use reqwest::Response;
use serde_json::Value;

use resilink_common::http::read_body;
use resilink_common::Result;

pub(crate) use resilink_common::http::{authorize, build_client};

/// Read a response body as JSON, turning non-2xx into `Error::Backend`.
///
/// An empty success body reads as `Value::Null`.
pub(crate) async fn read_json(response: Response) -> Result<Value> {
    let text = read_body(response).await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
