//! Background work for the UI thread.
//!
//! Storage and service calls never block the render loop. Each call is
//! spawned (tokio on native, the browser's microtask queue on WASM) and its
//! result is posted to a channel that the app drains once per frame.

use crate::error::AppError;
use prorev_core::services::{
    request_feedback, Extraction, HttpAnalyzer, HttpExtractor, QuestionExtractor, WorkAnalyzer,
};
use prorev_core::storage::{create_default_store, PlatformStore};
use prorev_core::{
    Feedback, FeedbackRequest, FeedbackTicket, IntakeFile, ServiceConfig, ServiceError,
    StorageError, UploadedFile,
};
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// A finished background task.
#[derive(Debug)]
pub enum TaskResult {
    Listed(Result<Vec<UploadedFile>, StorageError>),
    /// `file` is kept so the document can be analyzed without a download.
    Uploaded {
        file: IntakeFile,
        result: Result<UploadedFile, StorageError>,
    },
    Removed {
        name: String,
        result: Result<(), StorageError>,
    },
    Extracted {
        name: String,
        result: Result<Extraction, ServiceError>,
    },
    Feedback {
        ticket: FeedbackTicket,
        result: Result<Feedback, ServiceError>,
    },
}

pub struct TaskRunner {
    store: PlatformStore,
    extractor: Arc<dyn QuestionExtractor>,
    analyzer: Arc<dyn WorkAnalyzer>,
    tx: Sender<TaskResult>,
    rx: Receiver<TaskResult>,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
}

impl TaskRunner {
    pub fn new(
        store: PlatformStore,
        extractor: Arc<dyn QuestionExtractor>,
        analyzer: Arc<dyn WorkAnalyzer>,
    ) -> Result<Self, AppError> {
        let (tx, rx) = channel();

        #[cfg(not(target_arch = "wasm32"))]
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("prorev-tasks")
            .enable_all()
            .build()?;

        Ok(Self {
            store,
            extractor,
            analyzer,
            tx,
            rx,
            #[cfg(not(target_arch = "wasm32"))]
            runtime,
        })
    }

    /// HTTP clients and the document store described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::new();
        let store = create_default_store(config, client.clone())?;
        let extractor = Arc::new(HttpExtractor::from_config(client.clone(), config)?);
        let analyzer = Arc::new(HttpAnalyzer::from_config(client, config)?);
        Self::new(store, extractor, analyzer)
    }

    pub fn list_uploads(&self) {
        let store = Arc::clone(&self.store);
        self.spawn(async move { TaskResult::Listed(store.list().await) });
    }

    pub fn upload(&self, file: IntakeFile) {
        log::info!("Uploading {} ({}, {} bytes)", file.name, file.mime, file.len());
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = store.upload(&file.name, file.bytes.clone(), &file.mime).await;
            TaskResult::Uploaded { file, result }
        });
    }

    pub fn remove(&self, name: String) {
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            let result = store.remove(&name).await;
            TaskResult::Removed { name, result }
        });
    }

    pub fn extract(&self, file: IntakeFile) {
        let extractor = Arc::clone(&self.extractor);
        self.spawn(async move {
            let result = extractor.extract(&file).await;
            TaskResult::Extracted { name: file.name, result }
        });
    }

    pub fn request_feedback(&self, request: FeedbackRequest) {
        let analyzer = Arc::clone(&self.analyzer);
        self.spawn(async move {
            let result = request_feedback(&*analyzer, &request).await;
            TaskResult::Feedback { ticket: request.ticket, result }
        });
    }

    /// Results that arrived since the last call.
    pub fn drain(&self) -> Vec<TaskResult> {
        self.rx.try_iter().collect()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            // The receiver only goes away with the app.
            let _ = tx.send(task.await);
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = TaskResult> + 'static,
    {
        let tx = self.tx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = tx.send(task.await);
        });
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use prorev_core::board::Bitmap;
    use prorev_core::storage::{BoxFuture, MemoryStore};
    use prorev_core::{FeedbackGate, Question, QuestionSet};
    use std::time::{Duration, Instant};

    struct FixedExtractor;

    impl QuestionExtractor for FixedExtractor {
        fn extract<'a>(
            &'a self,
            file: &'a IntakeFile,
        ) -> BoxFuture<'a, Result<Extraction, ServiceError>> {
            Box::pin(async move {
                if file.is_empty() {
                    return Err(ServiceError::NoQuestions);
                }
                Ok(Extraction {
                    extracted_text: Some("x+1=2".into()),
                    questions: QuestionSet::new(vec![Question::with_default_suggestions(
                        1,
                        "Solve $x+1=2$",
                        "algebra",
                    )])
                    .with_source(file.name.clone()),
                })
            })
        }
    }

    struct PngChecker;

    impl WorkAnalyzer for PngChecker {
        fn analyze<'a>(
            &'a self,
            image_png: Vec<u8>,
            problem_context: &'a str,
        ) -> BoxFuture<'a, Result<Feedback, ServiceError>> {
            Box::pin(async move {
                let is_png = image_png.starts_with(&[0x89, b'P', b'N', b'G']);
                Ok(Feedback::new(is_png, format!("Checked {problem_context}")))
            })
        }
    }

    fn runner() -> TaskRunner {
        TaskRunner::new(
            Arc::new(MemoryStore::new("PDFBucket")),
            Arc::new(FixedExtractor),
            Arc::new(PngChecker),
        )
        .unwrap()
    }

    fn wait_for(runner: &TaskRunner) -> TaskResult {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = runner.drain().into_iter().next() {
                return result;
            }
            assert!(Instant::now() < deadline, "task did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn homework() -> IntakeFile {
        IntakeFile::accept("hw.png", Some("image/png"), vec![1, 2, 3]).unwrap()
    }

    #[test]
    fn test_upload_then_list() {
        let runner = runner();
        runner.upload(homework());
        match wait_for(&runner) {
            TaskResult::Uploaded { file, result } => {
                assert_eq!(file.name, "hw.png");
                assert_eq!(result.unwrap().url, "memory://PDFBucket/hw.png");
            }
            other => panic!("unexpected {other:?}"),
        }

        runner.list_uploads();
        match wait_for(&runner) {
            TaskResult::Listed(Ok(files)) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].name, "hw.png");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_remove_reports_name() {
        let runner = runner();
        runner.remove("gone.pdf".into());
        match wait_for(&runner) {
            TaskResult::Removed { name, result } => {
                assert_eq!(name, "gone.pdf");
                assert!(result.is_ok());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_extract_success_and_failure() {
        let runner = runner();
        runner.extract(homework());
        match wait_for(&runner) {
            TaskResult::Extracted { name, result } => {
                assert_eq!(name, "hw.png");
                let extraction = result.unwrap();
                assert_eq!(extraction.questions.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }

        let empty = IntakeFile::accept("empty.pdf", None, Vec::new()).unwrap();
        runner.extract(empty);
        match wait_for(&runner) {
            TaskResult::Extracted { name, result } => {
                assert_eq!(name, "empty.pdf");
                assert!(matches!(result, Err(ServiceError::NoQuestions)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_feedback_carries_ticket() {
        let runner = runner();
        let mut gate = FeedbackGate::new();
        let ticket = gate.begin().unwrap();
        runner.request_feedback(FeedbackRequest {
            ticket,
            snapshot: Bitmap::new(4, 4).snapshot(),
            problem_context: "Solve for x".into(),
        });
        match wait_for(&runner) {
            TaskResult::Feedback { ticket: got, result } => {
                assert_eq!(got, ticket);
                let feedback = result.unwrap();
                assert!(feedback.is_correct);
                assert_eq!(feedback.suggestion, "Checked Solve for x");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_drain_is_empty_when_idle() {
        assert!(runner().drain().is_empty());
    }
}
