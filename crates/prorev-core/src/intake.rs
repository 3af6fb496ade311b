//! Accepting homework files from the picker, drag and drop, or the camera.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME types the upload flow accepts.
pub const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

/// Value for the `accept` attribute of the browser file input.
pub const ACCEPT_ATTRIBUTE: &str = "image/jpeg,image/png,image/jpg,application/pdf";

/// Extensions offered by the native file dialog.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// Errors rejecting a selection before anything is uploaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("No file selected")]
    NoFile,
    #[error("Unsupported file type for {name}: please upload a JPEG, PNG or PDF")]
    UnsupportedType { name: String, mime: String },
}

/// A file accepted for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl IntakeFile {
    /// Validate a candidate file.
    ///
    /// `declared_mime` is what the browser or OS reported; when it is missing
    /// or empty the type is inferred from the file extension.
    pub fn accept(
        name: impl Into<String>,
        declared_mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, IntakeError> {
        let name = name.into();
        let mime = match declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => normalize_mime(m),
            None => mime_from_name(&name).unwrap_or_default().to_string(),
        };
        if !is_accepted(&mime) {
            return Err(IntakeError::UnsupportedType { name, mime });
        }
        Ok(Self { name, mime, bytes })
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == "application/pdf"
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Accept the first file of a selection. Only one document is processed per
/// drop or pick.
pub fn pick_first<I>(files: I) -> Result<IntakeFile, IntakeError>
where
    I: IntoIterator<Item = (String, Option<String>, Vec<u8>)>,
{
    let (name, mime, bytes) = files.into_iter().next().ok_or(IntakeError::NoFile)?;
    IntakeFile::accept(name, mime.as_deref(), bytes)
}

/// Browsers report `image/jpg` for some files.
pub fn normalize_mime(mime: &str) -> String {
    let lower = mime.to_ascii_lowercase();
    match lower.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => lower,
    }
}

pub fn is_accepted(mime: &str) -> bool {
    ACCEPTED_TYPES.contains(&mime)
}

/// Infer a MIME type from a file name's extension.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Name for a camera capture taken at `unix_millis`.
pub fn capture_file_name(unix_millis: u64) -> String {
    format!("capture-{}.jpg", unix_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_declared_types() {
        let file = IntakeFile::accept("hw.png", Some("image/png"), vec![1, 2]).unwrap();
        assert_eq!(file.mime, "image/png");
        assert!(!file.is_pdf());

        let file = IntakeFile::accept("scan.pdf", Some("application/pdf"), vec![]).unwrap();
        assert!(file.is_pdf());
    }

    #[test]
    fn test_jpg_alias_normalized() {
        let file = IntakeFile::accept("photo.jpg", Some("image/jpg"), vec![]).unwrap();
        assert_eq!(file.mime, "image/jpeg");
    }

    #[test]
    fn test_extension_fallback() {
        let file = IntakeFile::accept("Photo.JPEG", None, vec![]).unwrap();
        assert_eq!(file.mime, "image/jpeg");
        let file = IntakeFile::accept("notes.pdf", Some(""), vec![]).unwrap();
        assert_eq!(file.mime, "application/pdf");
    }

    #[test]
    fn test_rejects_other_types() {
        let err = IntakeFile::accept("essay.docx", None, vec![]).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedType { .. }));

        let err = IntakeFile::accept("anim.gif", Some("image/gif"), vec![]).unwrap_err();
        assert_eq!(
            err,
            IntakeError::UnsupportedType { name: "anim.gif".into(), mime: "image/gif".into() }
        );
    }

    #[test]
    fn test_pick_first() {
        assert_eq!(pick_first(Vec::new()), Err(IntakeError::NoFile));

        let files = vec![
            ("a.png".to_string(), None, vec![1]),
            ("b.png".to_string(), None, vec![2]),
        ];
        let file = pick_first(files).unwrap();
        assert_eq!(file.name, "a.png");
    }

    #[test]
    fn test_capture_name() {
        assert_eq!(capture_file_name(1700000000123), "capture-1700000000123.jpg");
        assert_eq!(mime_from_name(&capture_file_name(1)), Some("image/jpeg"));
    }
}
