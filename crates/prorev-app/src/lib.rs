//! ProRev Application
//!
//! The application shell: windowing, the upload and whiteboard pages, and
//! the background tasks that talk to storage and the tutor services.

mod app;
mod camera;
mod error;
mod file_ops;
mod tasks;
mod ui;

pub use app::{App, AppConfig};
pub use error::AppError;
pub use tasks::{TaskResult, TaskRunner};
pub use ui::{render_ui, Page, UiAction, UiState};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
