//! Turning an uploaded document into questions.

use super::{ServiceError, check_response, endpoint};
use crate::config::{DEFAULT_REQUEST_TIMEOUT, ServiceConfig};
use crate::intake::IntakeFile;
use crate::question::{Question, QuestionSet, Suggestion, default_suggestions};
use crate::storage::BoxFuture;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

/// Result of running a document through the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Raw OCR text, when the service returns it.
    pub extracted_text: Option<String>,
    pub questions: QuestionSet,
}

/// Something that reads homework questions out of a document.
#[cfg(not(target_arch = "wasm32"))]
pub trait QuestionExtractor: Send + Sync {
    fn extract<'a>(&'a self, file: &'a IntakeFile) -> BoxFuture<'a, Result<Extraction, ServiceError>>;
}

#[cfg(target_arch = "wasm32")]
pub trait QuestionExtractor {
    fn extract<'a>(&'a self, file: &'a IntakeFile) -> BoxFuture<'a, Result<Extraction, ServiceError>>;
}

/// Client for `POST {api}/upload`.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpExtractor {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url, timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn from_config(client: reqwest::Client, config: &ServiceConfig) -> Result<Self, ServiceError> {
        let url = endpoint(&config.api_base, &["upload"])?;
        Ok(Self::new(client, url).with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, file: &IntakeFile) -> Result<Extraction, ServiceError> {
        log::info!("Extracting questions from {} ({} bytes)", file.name, file.len());
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let resp = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;
        let body = check_response(resp).await?.text().await?;
        let extraction = parse_extraction(&body, Some(&file.name))?;
        log::info!("Extracted {} questions from {}", extraction.questions.len(), file.name);
        Ok(extraction)
    }
}

impl QuestionExtractor for HttpExtractor {
    fn extract<'a>(&'a self, file: &'a IntakeFile) -> BoxFuture<'a, Result<Extraction, ServiceError>> {
        Box::pin(self.send(file))
    }
}

/// Parse an extraction response body.
///
/// Questions may carry `title` or `text`; `id` may be a number, a numeric
/// string, or absent (then the 1-based position is used). Questions without
/// suggestions get the standard hints for their `type`.
pub fn parse_extraction(body: &str, source: Option<&str>) -> Result<Extraction, ServiceError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Parse(format!("invalid JSON: {e}")))?;
    let extracted_text = value
        .get("extractedText")
        .and_then(Value::as_str)
        .map(str::to_string);
    let items = value
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::Parse("`questions` is missing or not an array".to_string()))?;

    let questions = items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_question(i, item))
        .collect::<Result<Vec<_>, _>>()?;
    if questions.is_empty() {
        return Err(ServiceError::NoQuestions);
    }

    let mut set = QuestionSet::new(questions);
    if let Some(source) = source {
        set = set.with_source(source);
    }
    Ok(Extraction { extracted_text, questions: set })
}

fn parse_question(index: usize, item: &Value) -> Result<Question, ServiceError> {
    let obj = item
        .as_object()
        .ok_or_else(|| ServiceError::Parse(format!("question {} is not an object", index + 1)))?;

    let id = match obj.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(index as i64 + 1);

    let title = ["title", "text"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::Parse(format!("question {} has no text", index + 1)))?;

    let suggestions = match obj.get("suggestions") {
        Some(Value::Array(list)) if !list.is_empty() => {
            serde_json::from_value::<Vec<Suggestion>>(Value::Array(list.clone())).map_err(|e| {
                ServiceError::Parse(format!("question {} suggestions: {e}", index + 1))
            })?
        }
        _ => default_suggestions(obj.get("type").and_then(Value::as_str).unwrap_or_default()),
    };

    Ok(Question::new(id, title, suggestions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::SuggestionKind;
    use crate::services::test_support::serve;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    #[test]
    fn parses_text_and_type() {
        let body = r#"{
            "extractedText": "1. Solve x+5=12",
            "questions": [
                {"id": 1, "text": "Solve for x: x+5=12", "type": "algebra"},
                {"id": "2", "title": "Simplify $\\frac{6}{8}$", "suggestions": [
                    {"type": "logic", "title": "Divide", "content": "Divide by 2"}
                ]},
                {"text": "Third"}
            ]
        }"#;
        let extraction = parse_extraction(body, Some("hw.png")).unwrap();
        assert_eq!(extraction.extracted_text.as_deref(), Some("1. Solve x+5=12"));
        let set = extraction.questions;
        assert_eq!(set.source.as_deref(), Some("hw.png"));
        assert_eq!(set.len(), 3);

        let q1 = &set.questions[0];
        assert_eq!(q1.title, "Solve for x: x+5=12");
        assert_eq!(q1.suggestions.len(), 3);
        assert_eq!(q1.suggestions[0].content, "This is a algebra question.");

        let q2 = &set.questions[1];
        assert_eq!(q2.id, 2);
        assert_eq!(q2.suggestions.len(), 1);
        assert_eq!(q2.suggestions[0].kind, SuggestionKind::Logic);

        assert_eq!(set.questions[2].id, 3);
        assert_eq!(set.questions[2].suggestions[0].content, "This is a general question.");
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(parse_extraction("not json", None), Err(ServiceError::Parse(_))));
        assert!(matches!(
            parse_extraction(r#"{"questions": {"id": 1}}"#, None),
            Err(ServiceError::Parse(_))
        ));
        assert!(matches!(parse_extraction(r#"{"error": "x"}"#, None), Err(ServiceError::Parse(_))));
        assert!(matches!(
            parse_extraction(r#"{"questions": [{"id": 1}]}"#, None),
            Err(ServiceError::Parse(_))
        ));
    }

    #[test]
    fn empty_list_is_no_questions() {
        assert!(matches!(
            parse_extraction(r#"{"questions": []}"#, None),
            Err(ServiceError::NoQuestions)
        ));
    }

    async fn upload(mut multipart: Multipart) -> Json<Value> {
        let mut seen = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();
            seen.push(format!("{name}:{file_name}:{}", bytes.len()));
        }
        Json(serde_json::json!({
            "extractedText": seen.join(","),
            "questions": [{"id": 1, "text": "What is 2+2?", "type": "arithmetic"}]
        }))
    }

    fn file() -> IntakeFile {
        IntakeFile::accept("hw.png", Some("image/png"), vec![7; 16]).unwrap()
    }

    #[tokio::test]
    async fn sends_single_image_field() {
        let base = serve(Router::new().route("/upload", post(upload))).await;
        let extractor = HttpExtractor::new(reqwest::Client::new(), endpoint(&base, &["upload"]).unwrap());

        let extraction = extractor.extract(&file()).await.unwrap();
        assert_eq!(extraction.extracted_text.as_deref(), Some("image:hw.png:16"));
        assert_eq!(extraction.questions.questions[0].title, "What is 2+2?");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let router = Router::new().route(
            "/upload",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "OCR failed") }),
        );
        let base = serve(router).await;
        let extractor = HttpExtractor::new(reqwest::Client::new(), endpoint(&base, &["upload"]).unwrap());

        let err = extractor.extract(&file()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn unanswered_upload_times_out() {
        let router = Router::new().route(
            "/upload",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "{}"
            }),
        );
        let base = serve(router).await;
        let extractor = HttpExtractor::new(reqwest::Client::new(), endpoint(&base, &["upload"]).unwrap())
            .with_timeout(Duration::from_millis(200));

        let result = tokio::time::timeout(Duration::from_secs(10), extractor.extract(&file()))
            .await
            .expect("the client gives up on its own");
        match result {
            Err(ServiceError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
