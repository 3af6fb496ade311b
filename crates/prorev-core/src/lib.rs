//! ProRev Core Library
//!
//! Platform-agnostic data structures and logic for the ProRev homework
//! whiteboard: questions and navigation, the drawing surface, math markup,
//! file intake, and clients for the storage, extraction and feedback services.

pub mod board;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod feedback;
pub mod input;
pub mod intake;
pub mod markup;
pub mod navigator;
pub mod question;
pub mod services;
pub mod storage;
pub mod tools;
pub mod tutor;
pub mod view;
pub mod whiteboard;

pub use board::{Bitmap, Snapshot, SnapshotError};
pub use capture::{CameraRequest, CameraSession, CameraState, CaptureError, Frame, MediaStream};
pub use config::{ConfigError, ServiceConfig};
pub use debounce::Debounce;
pub use feedback::{Feedback, FeedbackGate, FeedbackTicket};
pub use input::{PointerEvent, PointerSource};
pub use intake::{IntakeError, IntakeFile};
pub use navigator::{Progress, QuestionNavigator};
pub use question::{Question, QuestionSet, Suggestion, SuggestionKind};
pub use services::ServiceError;
pub use storage::{DocumentStore, SessionStore, StorageError, UploadList, UploadedFile};
pub use tools::{DrawingState, ToolKind};
pub use tutor::{FeedbackOutcome, FeedbackRequest, TutorSession};
pub use view::Zoom;
pub use whiteboard::Whiteboard;
