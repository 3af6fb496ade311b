//! Camera capture session.
//!
//! The platform supplies a [`MediaStream`]; this module owns its lifetime so
//! that every way out of the camera view (capture, cancel, a permission grant
//! arriving after cancel, dropping the session) releases the device.

use crate::intake::{IntakeFile, capture_file_name};
use thiserror::Error;

/// Camera errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera is not open")]
    NotOpen,
    #[error("No camera available")]
    NoCamera,
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("Could not read a frame: {0}")]
    Frame(String),
    #[error("Could not encode the capture: {0}")]
    Encode(String),
}

/// One RGBA video frame at the stream's native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A live camera stream.
pub trait MediaStream {
    /// Number of tracks still delivering media.
    fn active_tracks(&self) -> usize;

    /// Stop every track. Must be idempotent.
    fn stop_all_tracks(&mut self);

    /// Copy the current frame.
    fn grab_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Where the camera view is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Closed,
    /// Waiting for the user/OS to grant access.
    Requesting,
    Open,
    Captured,
}

/// Token tying a permission answer to the request that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest(u64);

pub struct CameraSession<S: MediaStream> {
    state: CameraState,
    stream: Option<S>,
    generation: u64,
    error: Option<CaptureError>,
}

impl<S: MediaStream> Default for CameraSession<S> {
    fn default() -> Self {
        Self {
            state: CameraState::Closed,
            stream: None,
            generation: 0,
            error: None,
        }
    }
}

impl<S: MediaStream> CameraSession<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Message from the last failed request, if any.
    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn active_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, MediaStream::active_tracks)
    }

    /// Ask for the camera. Only valid from `Closed` or `Captured`.
    pub fn request(&mut self) -> Option<CameraRequest> {
        match self.state {
            CameraState::Closed | CameraState::Captured => {
                self.generation += 1;
                self.error = None;
                self.state = CameraState::Requesting;
                Some(CameraRequest(self.generation))
            }
            CameraState::Requesting | CameraState::Open => None,
        }
    }

    /// Access was granted. A stream for a request that is no longer current
    /// is stopped immediately.
    pub fn opened(&mut self, request: CameraRequest, mut stream: S) {
        if self.state == CameraState::Requesting && request.0 == self.generation {
            log::info!("Camera opened");
            self.stream = Some(stream);
            self.state = CameraState::Open;
        } else {
            log::debug!("Camera granted after the request was abandoned, stopping it");
            stream.stop_all_tracks();
        }
    }

    /// Access was refused or no device exists.
    pub fn failed(&mut self, request: CameraRequest, error: CaptureError) {
        if self.state == CameraState::Requesting && request.0 == self.generation {
            log::warn!("Camera unavailable: {}", error);
            self.error = Some(error);
            self.state = CameraState::Closed;
        }
    }

    /// Take a picture.
    ///
    /// `encode` turns the frame into JPEG bytes. On success the stream is
    /// released and the session moves to `Captured`; on failure the camera
    /// stays open so the user can try again.
    pub fn capture<F>(&mut self, encode: F, unix_millis: u64) -> Result<IntakeFile, CaptureError>
    where
        F: FnOnce(&Frame) -> Result<Vec<u8>, CaptureError>,
    {
        if self.state != CameraState::Open {
            return Err(CaptureError::NotOpen);
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NotOpen)?;
        let frame = stream.grab_frame()?;
        let bytes = encode(&frame)?;

        self.release();
        self.state = CameraState::Captured;
        log::info!("Captured {}x{} frame", frame.width, frame.height);
        Ok(IntakeFile {
            name: capture_file_name(unix_millis),
            mime: "image/jpeg".to_string(),
            bytes,
        })
    }

    /// Close the camera view from any state.
    pub fn cancel(&mut self) {
        // Invalidate a request still waiting on permission.
        self.generation += 1;
        self.release();
        self.state = CameraState::Closed;
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
        }
    }
}

impl<S: MediaStream> Drop for CameraSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeStream {
        live: Rc<Cell<usize>>,
        fail_frame: bool,
    }

    impl FakeStream {
        fn new(live: &Rc<Cell<usize>>) -> Self {
            live.set(live.get() + 2);
            Self { live: live.clone(), fail_frame: false }
        }
    }

    impl MediaStream for FakeStream {
        fn active_tracks(&self) -> usize {
            self.live.get()
        }

        fn stop_all_tracks(&mut self) {
            self.live.set(0);
        }

        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.fail_frame {
                return Err(CaptureError::Frame("not ready".into()));
            }
            Ok(Frame { width: 2, height: 1, rgba: vec![0; 8] })
        }
    }

    fn encode(frame: &Frame) -> Result<Vec<u8>, CaptureError> {
        Ok(vec![frame.width as u8, frame.height as u8])
    }

    #[test]
    fn test_capture_stops_tracks() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let request = session.request().unwrap();
        session.opened(request, FakeStream::new(&live));
        assert_eq!(session.state(), CameraState::Open);
        assert_eq!(live.get(), 2);

        let file = session.capture(encode, 42).unwrap();
        assert_eq!(file.name, "capture-42.jpg");
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.bytes, vec![2, 1]);
        assert_eq!(session.state(), CameraState::Captured);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_cancel_stops_tracks() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let request = session.request().unwrap();
        session.opened(request, FakeStream::new(&live));
        session.cancel();
        assert_eq!(session.state(), CameraState::Closed);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_late_grant_after_cancel_is_stopped() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let request = session.request().unwrap();
        session.cancel();
        session.opened(request, FakeStream::new(&live));
        assert_eq!(session.state(), CameraState::Closed);
        assert_eq!(live.get(), 0);
        assert_eq!(session.active_tracks(), 0);
    }

    #[test]
    fn test_stale_grant_does_not_open_newer_request() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let first = session.request().unwrap();
        session.cancel();
        let second = session.request().unwrap();
        session.opened(first, FakeStream::new(&live));
        assert_eq!(session.state(), CameraState::Requesting);
        assert_eq!(live.get(), 0);
        let other = Rc::new(Cell::new(0));
        session.opened(second, FakeStream::new(&other));
        assert_eq!(session.state(), CameraState::Open);
    }

    #[test]
    fn test_drop_stops_tracks() {
        let live = Rc::new(Cell::new(0));
        {
            let mut session = CameraSession::new();
            let request = session.request().unwrap();
            session.opened(request, FakeStream::new(&live));
            assert_eq!(live.get(), 2);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_permission_denied_returns_to_closed() {
        let mut session: CameraSession<FakeStream> = CameraSession::new();
        let request = session.request().unwrap();
        session.failed(request, CaptureError::PermissionDenied("NotAllowedError".into()));
        assert_eq!(session.state(), CameraState::Closed);
        assert!(matches!(session.error(), Some(CaptureError::PermissionDenied(_))));

        // Asking again clears the message.
        session.request().unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_capture_requires_open() {
        let mut session: CameraSession<FakeStream> = CameraSession::new();
        assert!(matches!(session.capture(encode, 1), Err(CaptureError::NotOpen)));
        session.request().unwrap();
        assert!(session.request().is_none());
        assert!(matches!(session.capture(encode, 1), Err(CaptureError::NotOpen)));
    }

    #[test]
    fn test_frame_error_keeps_camera_open() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let request = session.request().unwrap();
        let mut stream = FakeStream::new(&live);
        stream.fail_frame = true;
        session.opened(request, stream);
        assert!(matches!(session.capture(encode, 1), Err(CaptureError::Frame(_))));
        assert_eq!(session.state(), CameraState::Open);
        assert_eq!(live.get(), 2);
    }

    #[test]
    fn test_retake_after_capture() {
        let live = Rc::new(Cell::new(0));
        let mut session = CameraSession::new();
        let request = session.request().unwrap();
        session.opened(request, FakeStream::new(&live));
        session.capture(encode, 1).unwrap();
        assert!(session.request().is_some());
    }
}
