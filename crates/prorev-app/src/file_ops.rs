//! Platform file access: picking and dropping homework files, saving the
//! board.
//!
//! Picked and dropped files are queued and collected once per frame with
//! [`take_pending_selections`]. Each selection is one user gesture; only its
//! first file is processed.

use std::cell::RefCell;

/// Name, reported MIME type, contents.
pub type RawFile = (String, Option<String>, Vec<u8>);

/// Default name for a downloaded board.
pub const SNAPSHOT_FILE_NAME: &str = "whiteboard-solution.png";

thread_local! {
    static PENDING_SELECTIONS: RefCell<Vec<Vec<RawFile>>> = const { RefCell::new(Vec::new()) };
    /// Files of a drop still being delivered (native drops arrive one event per file).
    static PENDING_DROP: RefCell<Vec<RawFile>> = const { RefCell::new(Vec::new()) };
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn push_selection(files: Vec<RawFile>) {
    if !files.is_empty() {
        PENDING_SELECTIONS.with(|cell| cell.borrow_mut().push(files));
    }
}

#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
fn push_dropped(file: RawFile) {
    PENDING_DROP.with(|cell| cell.borrow_mut().push(file));
}

/// Selections made since the last call, oldest first.
pub fn take_pending_selections() -> Vec<Vec<RawFile>> {
    let mut selections = PENDING_SELECTIONS.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    let drop = PENDING_DROP.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    if !drop.is_empty() {
        selections.push(drop);
    }
    selections
}

#[cfg(feature = "native")]
pub use native::*;

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(feature = "native")]
mod native {
    use super::{push_dropped, push_selection, SNAPSHOT_FILE_NAME};
    use prorev_core::intake::ACCEPTED_EXTENSIONS;
    use std::path::Path;

    fn read(path: &Path) -> Option<super::RawFile> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        match std::fs::read(path) {
            Ok(bytes) => Some((name, None, bytes)),
            Err(e) => {
                log::error!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }

    /// Open the native file dialog.
    pub fn pick_file() {
        let dialog = rfd::FileDialog::new()
            .set_title("Upload Homework")
            .add_filter("Images and PDFs", ACCEPTED_EXTENSIONS);

        if let Some(path) = dialog.pick_file() {
            if let Some(file) = read(&path) {
                log::info!("Picked {:?}", path);
                push_selection(vec![file]);
            }
        }
    }

    /// A file dropped onto the window.
    pub fn drop_path(path: &Path) {
        if let Some(file) = read(path) {
            log::info!("Dropped {:?}", path);
            push_dropped(file);
        }
    }

    /// Save the board PNG using the native save dialog.
    pub fn save_snapshot(png_data: &[u8]) {
        let dialog = rfd::FileDialog::new()
            .set_title("Download Solution")
            .set_file_name(SNAPSHOT_FILE_NAME)
            .add_filter("PNG Image", &["png"]);

        if let Some(path) = dialog.save_file() {
            if let Err(e) = std::fs::write(&path, png_data) {
                log::error!("Failed to write PNG: {}", e);
            } else {
                log::info!("Saved board to: {:?}", path);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{push_selection, RawFile, SNAPSHOT_FILE_NAME};
    use prorev_core::intake::ACCEPT_ATTRIBUTE;
    use std::cell::Cell;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};

    thread_local! {
        static HOVERING: Cell<bool> = const { Cell::new(false) };
    }

    /// Whether files are being dragged over the canvas.
    pub fn is_hovering_files() -> bool {
        HOVERING.with(Cell::get)
    }

    async fn read_file(file: web_sys::File) -> Result<RawFile, JsValue> {
        let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer()).await?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        let mime = file.type_();
        Ok((file.name(), (!mime.is_empty()).then_some(mime), bytes))
    }

    /// Read the first file of a list and queue it.
    fn queue_first(files: Option<web_sys::FileList>) {
        let Some(file) = files.and_then(|f| f.get(0)) else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            match read_file(file).await {
                Ok(raw) => {
                    log::info!("Read {} ({} bytes)", raw.0, raw.2.len());
                    push_selection(vec![raw]);
                }
                Err(e) => log::error!("Failed to read file: {:?}", e),
            }
        });
    }

    /// Open the browser's file chooser.
    pub fn pick_file() {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(input) = document
            .create_element("input")
            .ok()
            .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            log::error!("Failed to create file input");
            return;
        };

        input.set_type("file");
        input.set_accept(ACCEPT_ATTRIBUTE);
        input.style().set_property("display", "none").ok();

        let input_clone = input.clone();
        let onchange = Closure::once(Box::new(move |_event: web_sys::Event| {
            queue_first(input_clone.files());
            input_clone.remove();
        }) as Box<dyn FnOnce(_)>);

        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        if let Some(body) = document.body() {
            body.append_child(&input).ok();
            input.click();
        }
    }

    /// Accept files dropped on the canvas. Call once after the canvas exists.
    pub fn setup_drag_drop_handlers() {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(canvas) = document.query_selector("canvas").ok().flatten() else {
            log::warn!("No canvas for drag and drop");
            return;
        };

        let ondragover = Closure::wrap(Box::new(move |event: web_sys::DragEvent| {
            event.prevent_default();
            HOVERING.with(|h| h.set(true));
        }) as Box<dyn Fn(_)>);
        canvas
            .add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())
            .ok();
        ondragover.forget();

        let ondragleave = Closure::wrap(Box::new(move |_event: web_sys::DragEvent| {
            HOVERING.with(|h| h.set(false));
        }) as Box<dyn Fn(_)>);
        canvas
            .add_event_listener_with_callback("dragleave", ondragleave.as_ref().unchecked_ref())
            .ok();
        ondragleave.forget();

        let ondrop = Closure::wrap(Box::new(move |event: web_sys::DragEvent| {
            event.prevent_default();
            HOVERING.with(|h| h.set(false));
            queue_first(event.data_transfer().and_then(|dt| dt.files()));
        }) as Box<dyn Fn(_)>);
        canvas
            .add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())
            .ok();
        ondrop.forget();
    }

    /// Download the board PNG.
    pub fn save_snapshot(png_data: &[u8]) {
        if let Err(e) = download_binary_file(SNAPSHOT_FILE_NAME, png_data, "image/png") {
            log::error!("Download failed: {:?}", e);
        }
    }

    fn download_binary_file(filename: &str, data: &[u8], mime_type: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let uint8_array = js_sys::Uint8Array::from(data);
        let blob_parts = js_sys::Array::new();
        blob_parts.push(&uint8_array);

        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let a = document
            .create_element("a")?
            .dyn_into::<web_sys::HtmlAnchorElement>()?;
        a.set_href(&url);
        a.set_download(filename);
        a.click();

        web_sys::Url::revoke_object_url(&url).ok();
        Ok(())
    }

    /// Open a stored document in a new tab.
    pub fn open_url(url: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.open_with_url_and_target(url, "_blank") {
                log::error!("Failed to open {}: {:?}", url, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawFile {
        (name.to_string(), None, vec![1])
    }

    #[test]
    fn test_drop_events_form_one_selection() {
        push_selection(vec![raw("picked.png")]);
        push_dropped(raw("a.png"));
        push_dropped(raw("b.pdf"));

        let selections = take_pending_selections();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0][0].0, "picked.png");
        let dropped: Vec<_> = selections[1].iter().map(|f| f.0.as_str()).collect();
        assert_eq!(dropped, ["a.png", "b.pdf"]);

        assert!(take_pending_selections().is_empty());
    }

    #[test]
    fn test_empty_selection_ignored() {
        push_selection(Vec::new());
        assert!(take_pending_selections().is_empty());
    }
}
