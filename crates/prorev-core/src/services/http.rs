//! Shared HTTP helpers.

use super::ServiceError;
use reqwest::Url;

/// Return the response unchanged on success, otherwise
/// [`ServiceError::Api`] with the status and body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    if !resp.status().is_success() {
        return Err(ServiceError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Append path segments to a base URL. Segments are percent-encoded, and a
/// trailing slash on the base is ignored.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url = Url::parse(base).map_err(|e| ServiceError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ServiceError::InvalidUrl(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
