//! Platform camera streams.
//!
//! Opening a camera is asynchronous on every platform: [`request_stream`]
//! starts it and the answer is picked up with [`take_pending`] on a later
//! frame, then handed to the [`CameraSession`](prorev_core::CameraSession).

use prorev_core::{CameraRequest, CaptureError};
use std::cell::RefCell;

pub use platform::{request_stream, unix_millis, PlatformStream};

type PendingAnswer = (CameraRequest, Result<PlatformStream, CaptureError>);

thread_local! {
    static PENDING_CAMERA: RefCell<Vec<PendingAnswer>> = const { RefCell::new(Vec::new()) };
}

fn set_pending(request: CameraRequest, result: Result<PlatformStream, CaptureError>) {
    PENDING_CAMERA.with(|cell| cell.borrow_mut().push((request, result)));
}

/// Every answer that arrived since the last call, oldest first. Each one
/// must reach the session so a granted stream is either kept or stopped.
pub fn take_pending() -> Vec<PendingAnswer> {
    PENDING_CAMERA.with(|cell| std::mem::take(&mut *cell.borrow_mut()))
}

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use prorev_core::{CameraRequest, CaptureError, Frame, MediaStream};

    /// Desktop builds have no capture backend; every request is refused.
    pub enum PlatformStream {}

    impl MediaStream for PlatformStream {
        fn active_tracks(&self) -> usize {
            match *self {}
        }

        fn stop_all_tracks(&mut self) {
            match *self {}
        }

        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            match *self {}
        }
    }

    pub fn request_stream(request: CameraRequest) {
        super::set_pending(request, Err(CaptureError::NoCamera));
    }

    pub fn unix_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

#[cfg(target_arch = "wasm32")]
mod platform {
    use prorev_core::{CameraRequest, CaptureError, Frame, MediaStream};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, MediaStreamTrack,
        MediaStreamTrackState,
    };

    /// A `getUserMedia` stream and the preview element showing it.
    pub struct PlatformStream {
        stream: web_sys::MediaStream,
        video: HtmlVideoElement,
    }

    impl PlatformStream {
        fn tracks(&self) -> impl Iterator<Item = MediaStreamTrack> {
            self.stream
                .get_tracks()
                .iter()
                .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
                .collect::<Vec<_>>()
                .into_iter()
        }
    }

    impl MediaStream for PlatformStream {
        fn active_tracks(&self) -> usize {
            self.tracks()
                .filter(|t| t.ready_state() == MediaStreamTrackState::Live)
                .count()
        }

        fn stop_all_tracks(&mut self) {
            for track in self.tracks() {
                track.stop();
            }
            self.video.set_src_object(None);
            self.video.remove();
        }

        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            let width = self.video.video_width();
            let height = self.video.video_height();
            if width == 0 || height == 0 {
                return Err(CaptureError::Frame("video is not playing yet".into()));
            }

            let document = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| CaptureError::Frame("no document".into()))?;
            let canvas = document
                .create_element("canvas")
                .map_err(frame_error)?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| CaptureError::Frame("not a canvas".into()))?;
            canvas.set_width(width);
            canvas.set_height(height);

            let context = canvas
                .get_context("2d")
                .map_err(frame_error)?
                .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
                .ok_or_else(|| CaptureError::Frame("2d context unavailable".into()))?;
            context
                .draw_image_with_html_video_element(&self.video, 0.0, 0.0)
                .map_err(frame_error)?;
            let data = context
                .get_image_data(0.0, 0.0, width as f64, height as f64)
                .map_err(frame_error)?;

            Ok(Frame {
                width,
                height,
                rgba: data.data().0,
            })
        }
    }

    impl Drop for PlatformStream {
        fn drop(&mut self) {
            self.stop_all_tracks();
        }
    }

    fn frame_error(e: JsValue) -> CaptureError {
        CaptureError::Frame(format!("{:?}", e))
    }

    /// `NotFoundError` means there is no device; anything else is a refusal.
    fn open_error(e: JsValue) -> CaptureError {
        let name = js_sys::Reflect::get(&e, &JsValue::from_str("name"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        if name == "NotFoundError" || name == "OverconstrainedError" {
            CaptureError::NoCamera
        } else {
            let message = js_sys::Reflect::get(&e, &JsValue::from_str("message"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or(name);
            CaptureError::PermissionDenied(message)
        }
    }

    pub fn request_stream(request: CameraRequest) {
        wasm_bindgen_futures::spawn_local(async move {
            let result = open_stream().await;
            if let Err(e) = &result {
                log::warn!("getUserMedia failed: {}", e);
            }
            super::set_pending(request, result);
        });
    }

    async fn open_stream() -> Result<PlatformStream, CaptureError> {
        let window = web_sys::window().ok_or(CaptureError::NoCamera)?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| CaptureError::NoCamera)?;

        let constraints = web_sys::MediaStreamConstraints::new();
        constraints.set_video(&JsValue::TRUE);
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(open_error)?;
        let stream = JsFuture::from(promise)
            .await
            .map_err(open_error)?
            .dyn_into::<web_sys::MediaStream>()
            .map_err(|_| CaptureError::NoCamera)?;

        let video = match show_preview(&stream) {
            Ok(video) => video,
            Err(e) => {
                // Release the device if the preview cannot be shown.
                for track in stream.get_tracks().iter() {
                    if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                        track.stop();
                    }
                }
                return Err(frame_error(e));
            }
        };
        Ok(PlatformStream { stream, video })
    }

    /// Live preview overlaid on the app canvas.
    fn show_preview(stream: &web_sys::MediaStream) -> Result<HtmlVideoElement, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

        let video = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()?;
        video.set_id("prorev-camera");
        video.set_autoplay(true);
        video.set_muted(true);
        video.set_attribute("playsinline", "")?;
        video.set_src_object(Some(stream));

        let style = video.style();
        style.set_property("position", "fixed")?;
        style.set_property("top", "96px")?;
        style.set_property("left", "50%")?;
        style.set_property("transform", "translateX(-50%)")?;
        style.set_property("max-width", "90vw")?;
        style.set_property("max-height", "60vh")?;
        style.set_property("border-radius", "8px")?;
        style.set_property("z-index", "10")?;

        body.append_child(&video)?;
        let _ = video.play();
        Ok(video)
    }

    pub fn unix_millis() -> u64 {
        js_sys::Date::now() as u64
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use prorev_core::{CameraSession, CameraState};

    #[test]
    fn test_desktop_request_is_refused() {
        let mut session: CameraSession<PlatformStream> = CameraSession::new();
        let request = session.request().unwrap();
        request_stream(request);

        let mut answers = take_pending();
        assert_eq!(answers.len(), 1);
        let (answered, result) = answers.remove(0);
        assert_eq!(answered, request);
        match result {
            Ok(_) => panic!("desktop has no camera"),
            Err(e) => session.failed(answered, e),
        }
        assert_eq!(session.state(), CameraState::Closed);
        assert!(matches!(session.error(), Some(CaptureError::NoCamera)));
        assert!(take_pending().is_empty());
    }

    #[test]
    fn test_answers_arriving_together_are_all_kept() {
        let mut session: CameraSession<PlatformStream> = CameraSession::new();
        let first = session.request().unwrap();
        request_stream(first);
        session.cancel();
        let second = session.request().unwrap();
        request_stream(second);

        let answers = take_pending();
        assert_eq!(
            answers.iter().map(|(r, _)| *r).collect::<Vec<_>>(),
            vec![first, second]
        );
        for (request, result) in answers {
            match result {
                Ok(_) => panic!("desktop has no camera"),
                Err(e) => {
                    session.failed(request, e);
                    if request == first {
                        assert_eq!(session.state(), CameraState::Requesting);
                    }
                }
            }
        }
        assert_eq!(session.state(), CameraState::Closed);
        assert!(matches!(session.error(), Some(CaptureError::NoCamera)));
        assert!(take_pending().is_empty());
    }

    #[test]
    fn test_unix_millis_is_recent() {
        // 2020-01-01
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
