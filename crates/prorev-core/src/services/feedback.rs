//! Asking the tutor service to check the student's work.

use super::{ServiceError, check_response, endpoint};
use crate::config::{DEFAULT_REQUEST_TIMEOUT, ServiceConfig};
use crate::feedback::Feedback;
use crate::storage::BoxFuture;
use crate::tutor::FeedbackRequest;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub trait WorkAnalyzer: Send + Sync {
    /// Judge a PNG of the board against the question text.
    fn analyze<'a>(
        &'a self,
        image_png: Vec<u8>,
        problem_context: &'a str,
    ) -> BoxFuture<'a, Result<Feedback, ServiceError>>;
}

#[cfg(target_arch = "wasm32")]
pub trait WorkAnalyzer {
    fn analyze<'a>(
        &'a self,
        image_png: Vec<u8>,
        problem_context: &'a str,
    ) -> BoxFuture<'a, Result<Feedback, ServiceError>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody<'a> {
    image: String,
    problem_context: &'a str,
}

/// Client for `POST {api}/api/analyze-work`.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpAnalyzer {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url, timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn from_config(client: reqwest::Client, config: &ServiceConfig) -> Result<Self, ServiceError> {
        let url = endpoint(&config.api_base, &["api", "analyze-work"])?;
        Ok(Self::new(client, url).with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send(&self, image_png: Vec<u8>, problem_context: &str) -> Result<Feedback, ServiceError> {
        let body = AnalyzeBody {
            image: STANDARD.encode(image_png),
            problem_context,
        };
        let resp = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        let text = check_response(resp).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| ServiceError::Parse(format!("feedback: {e}")))
    }
}

impl WorkAnalyzer for HttpAnalyzer {
    fn analyze<'a>(
        &'a self,
        image_png: Vec<u8>,
        problem_context: &'a str,
    ) -> BoxFuture<'a, Result<Feedback, ServiceError>> {
        Box::pin(self.send(image_png, problem_context))
    }
}

/// Encode the board of `request` and send it to `analyzer`.
pub async fn request_feedback<A: WorkAnalyzer + ?Sized>(
    analyzer: &A,
    request: &FeedbackRequest,
) -> Result<Feedback, ServiceError> {
    let png = request.snapshot.encode_png()?;
    log::debug!("Requesting feedback ({} byte snapshot)", png.len());
    analyzer.analyze(png, &request.problem_context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::serve;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    async fn analyze(Json(body): Json<Value>) -> Json<Value> {
        let context = body["problemContext"].as_str().unwrap_or_default().to_string();
        let image = STANDARD.decode(body["image"].as_str().unwrap_or_default()).unwrap();
        let is_png = image.starts_with(&[0x89, b'P', b'N', b'G']);
        Json(serde_json::json!({
            "isCorrect": is_png,
            "suggestion": format!("Checked: {context}"),
        }))
    }

    fn analyzer(base: &str) -> HttpAnalyzer {
        let config = ServiceConfig { api_base: base.to_string(), ..ServiceConfig::default() };
        HttpAnalyzer::from_config(reqwest::Client::new(), &config).unwrap()
    }

    fn png() -> Vec<u8> {
        crate::board::Bitmap::new(4, 4).snapshot().encode_png().unwrap()
    }

    #[tokio::test]
    async fn posts_base64_image_and_context() {
        let base = serve(Router::new().route("/api/analyze-work", post(analyze))).await;
        let feedback = analyzer(&base).analyze(png(), "Solve for x: x+5=12").await.unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.suggestion, "Checked: Solve for x: x+5=12");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let router = Router::new().route(
            "/api/analyze-work",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let base = serve(router).await;
        let err = analyzer(&base).analyze(png(), "q").await.unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let router = Router::new().route(
            "/api/analyze-work",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "{}"
            }),
        );
        let base = serve(router).await;
        let config = ServiceConfig {
            api_base: base,
            request_timeout_ms: 200,
            ..ServiceConfig::default()
        };
        let analyzer = HttpAnalyzer::from_config(reqwest::Client::new(), &config).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), analyzer.analyze(png(), "q"))
            .await
            .expect("the client gives up on its own");
        match result {
            Err(ServiceError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let router = Router::new().route("/api/analyze-work", post(|| async { "{\"ok\":true}" }));
        let base = serve(router).await;
        let err = analyzer(&base).analyze(png(), "q").await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }
}
