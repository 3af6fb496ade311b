//! Clients for the remote extraction and feedback endpoints.

mod extraction;
mod feedback;
mod http;

pub use extraction::{Extraction, HttpExtractor, QuestionExtractor, parse_extraction};
pub use feedback::{HttpAnalyzer, WorkAnalyzer, request_feedback};
pub(crate) use http::{check_response, endpoint};

use crate::board::SnapshotError;
use thiserror::Error;

/// Errors talking to the remote services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not what we expected.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("No questions found in the document")]
    NoQuestions,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("could not encode the board: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
