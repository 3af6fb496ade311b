//! Core application state and lifecycle.

use kurbo::{Point, Size};
use peniko::Color;
use prorev_core::intake::pick_first;
use prorev_core::storage::{create_default_session, PlatformSession};
use prorev_core::{
    CameraSession, CameraState, IntakeFile, MediaStream, PointerEvent, PointerSource,
    QuestionSet, ServiceConfig, SessionStore, TutorSession, Whiteboard,
};
use prorev_render::{
    encode_jpeg, BoardLayout, RenderContext, Renderer, VelloRenderer, DEFAULT_JPEG_QUALITY,
};
use prorev_widgets::NavAction;
use std::sync::Arc;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions, Scene};
use winit::application::ApplicationHandler;
#[cfg(not(target_arch = "wasm32"))]
use winit::dpi::LogicalSize;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use crate::camera::{self, PlatformStream};
use crate::error::AppError;
use crate::file_ops;
use crate::tasks::{TaskResult, TaskRunner};
use crate::ui::{render_ui, Page, UiAction, UiState};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Window color around the whiteboard.
    pub background_color: Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "ProRev".to_string(),
            width: 1280,
            height: 800,
            background_color: Color::from_rgba8(243, 244, 246, 255), // Gray-100
        }
    }
}

/// Switch pages. The camera only lives on the upload page, so leaving it
/// releases the device and invalidates a request still waiting on permission.
fn change_page<S: MediaStream>(ui_state: &mut UiState, camera: &mut CameraSession<S>, page: Page) {
    if page != Page::Upload && camera.state() != CameraState::Closed {
        log::info!("Leaving the upload page, closing the camera");
        camera.cancel();
    }
    ui_state.camera_state = camera.state();
    ui_state.page = page;
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    board_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion (needed for WebGPU/WASM)
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    ui_state: UiState,

    // State
    tutor: Option<TutorSession>,
    camera: CameraSession<PlatformStream>,
    /// Last pointer position in logical window coordinates.
    cursor: Option<Point>,
    config: AppConfig,
    services: ServiceConfig,

    // Background work
    tasks: TaskRunner,
    session: PlatformSession,
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    services: ServiceConfig,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// Window waiting for async surface creation (WASM only)
    pending_window: Option<Arc<Window>>,
    /// Flag to indicate async init is in progress
    #[cfg(target_arch = "wasm32")]
    init_in_progress: std::cell::Cell<bool>,
}

impl App {
    pub fn new(services: ServiceConfig) -> Self {
        Self::with_config(AppConfig::default(), services)
    }

    pub fn with_config(config: AppConfig, services: ServiceConfig) -> Self {
        Self {
            config,
            services,
            state: None,
            render_cx: None,
            pending_window: None,
            #[cfg(target_arch = "wasm32")]
            init_in_progress: std::cell::Cell::new(false),
        }
    }

    /// Run the application until the window closes.
    pub async fn run(services: ServiceConfig) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        let app = App::new(services);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut app = app;
            event_loop.run_app(&mut app)?;
        }

        Ok(())
    }

    /// Finish initialization after surface is created.
    fn finish_init(&mut self, window: Arc<Window>, surface: RenderSurface<'static>) -> Result<(), AppError> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| AppError::Renderer("render context not initialized".into()))?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| AppError::Renderer(format!("{:?}", e)))?;

        // Vello renders to Rgba8Unorm (compute shaders need storage binding)
        // while the WebGPU surface is usually Bgra8Unorm.
        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(egui::Visuals::light());
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        let tasks = TaskRunner::from_config(&self.services)?;
        let session = create_default_session()?;
        tasks.list_uploads();

        log::info!("ProRev initialized - {}x{}", surface.config.width, surface.config.height);

        self.state = Some(AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            board_renderer: VelloRenderer::new(),
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state: UiState::new(),
            tutor: None,
            camera: CameraSession::new(),
            cursor: None,
            config: self.config.clone(),
            services: self.services.clone(),
            tasks,
            session,
        });

        self.pending_window = None;

        #[cfg(target_arch = "wasm32")]
        file_ops::setup_drag_drop_handlers();

        window.request_redraw();
        Ok(())
    }
}

impl AppState {
    fn board_layout(&self) -> Option<BoardLayout> {
        self.ui_state.board_layout()
    }

    fn logical(&self, position: PhysicalPosition<f64>) -> Point {
        let logical = position.to_logical::<f64>(self.window.scale_factor());
        Point::new(logical.x, logical.y)
    }

    fn is_drawing(&self) -> bool {
        self.tutor.as_ref().is_some_and(|t| t.whiteboard().is_drawing())
    }

    /// Start a stroke if the press landed on the board.
    fn pointer_down(&mut self, position: Point, source: PointerSource, blocked: bool) {
        let Some(layout) = self.board_layout() else {
            return;
        };
        if blocked || !layout.contains(position) {
            return;
        }
        if let Some(tutor) = &mut self.tutor {
            let event = PointerEvent::Down { position: layout.to_local(position), source };
            tutor.handle_pointer(event, Instant::now());
        }
    }

    /// Extend the stroke; leaving the board ends it.
    fn pointer_moved(&mut self, position: Point) {
        if !self.is_drawing() {
            return;
        }
        let Some(layout) = self.board_layout() else {
            return;
        };
        let event = if layout.contains(position) {
            PointerEvent::Move { position: layout.to_local(position) }
        } else {
            PointerEvent::Leave
        };
        if let Some(tutor) = &mut self.tutor {
            tutor.handle_pointer(event, Instant::now());
        }
    }

    fn pointer_up(&mut self, position: Point) {
        if !self.is_drawing() {
            return;
        }
        let local = self
            .board_layout()
            .map_or(position, |layout| layout.to_local(position));
        if let Some(tutor) = &mut self.tutor {
            tutor.handle_pointer(PointerEvent::Up { position: local }, Instant::now());
        }
    }

    fn pointer_left(&mut self) {
        if !self.is_drawing() {
            return;
        }
        if let Some(tutor) = &mut self.tutor {
            tutor.handle_pointer(PointerEvent::Leave, Instant::now());
        }
    }

    /// Collect everything that finished since the last frame.
    fn process_background(&mut self, now: Instant) {
        for selection in file_ops::take_pending_selections() {
            match pick_first(selection) {
                Ok(file) => self.start_upload(file),
                Err(e) => {
                    log::warn!("Rejected file: {}", e);
                    self.ui_state.error = Some(e.to_string());
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            self.ui_state.hovering_files = file_ops::is_hovering_files();
        }

        for (request, result) in camera::take_pending() {
            match result {
                Ok(stream) => self.camera.opened(request, stream),
                Err(e) => self.camera.failed(request, e),
            }
        }
        self.ui_state.camera_state = self.camera.state();
        self.ui_state.camera_error = self.camera.error().map(ToString::to_string);

        for result in self.tasks.drain() {
            self.apply_task_result(result);
        }

        if let Some(tutor) = &mut self.tutor {
            if let Some(request) = tutor.poll(now) {
                log::debug!("Requesting feedback for \"{}\"", request.problem_context);
                self.tasks.request_feedback(request);
            }
        }
    }

    fn start_upload(&mut self, file: IntakeFile) {
        self.ui_state.uploading += 1;
        self.tasks.upload(file);
    }

    fn start_analysis(&mut self, file: IntakeFile) {
        self.ui_state.analyzing = Some(file.name.clone());
        self.tasks.extract(file);
    }

    fn apply_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Listed(Ok(files)) => {
                log::info!("{} documents in storage", files.len());
                for file in files {
                    self.ui_state.uploads.upsert(file);
                }
            }
            TaskResult::Listed(Err(e)) => {
                log::warn!("Could not list uploads: {}", e);
                self.ui_state.error = Some(format!("Could not list uploads: {}", e));
            }
            TaskResult::Uploaded { file, result } => {
                self.ui_state.uploading = self.ui_state.uploading.saturating_sub(1);
                match result {
                    Ok(uploaded) => {
                        log::info!("Uploaded {} to {}", uploaded.name, uploaded.url);
                        self.ui_state.uploads.upsert(uploaded);
                        self.ui_state.local_files.insert(file.name.clone(), file.clone());
                        self.start_analysis(file);
                    }
                    Err(e) => {
                        log::error!("Upload of {} failed: {}", file.name, e);
                        self.ui_state.error = Some(format!("Upload failed: {}", e));
                    }
                }
            }
            TaskResult::Removed { name, result } => match result {
                Ok(()) => {
                    self.ui_state.uploads.remove(&name);
                    self.ui_state.local_files.remove(&name);
                    self.ui_state.extracted.remove(&name);
                }
                Err(e) => {
                    log::error!("Could not remove {}: {}", name, e);
                    self.ui_state.error = Some(format!("Could not remove {}: {}", name, e));
                }
            },
            TaskResult::Extracted { name, result } => {
                if self.ui_state.analyzing.as_deref() == Some(name.as_str()) {
                    self.ui_state.analyzing = None;
                }
                match result {
                    Ok(extraction) => {
                        self.ui_state.extracted.insert(name, extraction.questions);
                    }
                    Err(e) => {
                        log::error!("Analysis of {} failed: {}", name, e);
                        self.ui_state.error = Some(format!("Could not analyze {}: {}", name, e));
                    }
                }
            }
            TaskResult::Feedback { ticket, result } => {
                if let Some(tutor) = &mut self.tutor {
                    let outcome = tutor.complete(ticket, result);
                    log::debug!("Feedback {:?}", outcome);
                }
            }
        }
    }

    /// Load the handed-off questions (or the practice set) and show the board.
    fn open_whiteboard(&mut self) {
        let questions = match self.session.load_questions() {
            Ok(Some(set)) if !set.is_empty() => set,
            Ok(_) => QuestionSet::practice(),
            Err(e) => {
                log::warn!("Could not read questions, using practice set: {}", e);
                QuestionSet::practice()
            }
        };
        log::info!("Opening whiteboard with {} questions", questions.len());

        let mut whiteboard = Whiteboard::new(Size::ZERO, self.window.scale_factor());
        whiteboard.set_feedback_delay(self.services.feedback_delay());
        self.tutor = Some(TutorSession::new(questions, whiteboard));
        self.ui_state.board_rect = None;
        change_page(&mut self.ui_state, &mut self.camera, Page::Whiteboard);
    }

    fn apply_action(&mut self, action: UiAction, now: Instant) {
        match action {
            UiAction::Start => change_page(&mut self.ui_state, &mut self.camera, Page::Upload),
            UiAction::PickFile => file_ops::pick_file(),
            UiAction::OpenCamera => {
                if let Some(request) = self.camera.request() {
                    camera::request_stream(request);
                }
            }
            UiAction::Capture => {
                let captured = self.camera.capture(
                    |frame| encode_jpeg(frame, DEFAULT_JPEG_QUALITY),
                    camera::unix_millis(),
                );
                match captured {
                    Ok(file) => self.start_upload(file),
                    Err(e) => self.ui_state.error = Some(e.to_string()),
                }
            }
            UiAction::CancelCamera => self.camera.cancel(),
            UiAction::Analyze(name) => {
                if let Some(file) = self.ui_state.local_files.get(&name).cloned() {
                    self.start_analysis(file);
                }
            }
            UiAction::Remove(name) => self.tasks.remove(name),
            UiAction::RefreshUploads => self.tasks.list_uploads(),
            UiAction::StartWhiteboard(name) => {
                let Some(questions) = self.ui_state.extracted.get(&name) else {
                    return;
                };
                if let Err(e) = self.session.save_questions(questions) {
                    log::error!("Could not hand off questions: {}", e);
                    self.ui_state.error = Some(format!("Could not open the whiteboard: {}", e));
                    return;
                }
                self.open_whiteboard();
            }
            UiAction::PracticeQuestions => {
                if let Err(e) = self.session.clear() {
                    log::warn!("Could not clear handed-off questions: {}", e);
                }
                self.open_whiteboard();
            }
            UiAction::DismissError => self.ui_state.error = None,
            UiAction::BackToUpload => {
                self.tutor = None;
                self.ui_state.board_rect = None;
                change_page(&mut self.ui_state, &mut self.camera, Page::Upload);
            }
            board_action => self.apply_board_action(board_action, now),
        }
    }

    fn apply_board_action(&mut self, action: UiAction, now: Instant) {
        let Some(tutor) = self.tutor.as_mut() else {
            return;
        };
        let drawing = &mut tutor.whiteboard_mut().drawing;
        match action {
            UiAction::SetTool(tool) => drawing.tool = tool,
            UiAction::SetColor([r, g, b]) => drawing.color = Color::from_rgb8(r, g, b),
            UiAction::SetStrokeWidth(width) => drawing.set_stroke_width(width),
            UiAction::ZoomIn => drawing.zoom.zoom_in(),
            UiAction::ZoomOut => drawing.zoom.zoom_out(),
            UiAction::ZoomReset => drawing.zoom.reset(),
            UiAction::Download => match tutor.whiteboard().snapshot().encode_png() {
                Ok(png) => file_ops::save_snapshot(&png),
                Err(e) => log::error!("Could not encode the board: {}", e),
            },
            UiAction::ClearBoard => tutor.clear_board(),
            UiAction::DismissFeedback => tutor.whiteboard_mut().dismiss_feedback(),
            UiAction::Navigate(NavAction::Next) => {
                tutor.next(now);
            }
            UiAction::Navigate(NavAction::Previous) => {
                tutor.previous(now);
            }
            other => log::debug!("Ignoring {:?} on the whiteboard", other),
        }
    }

    /// Keep the bitmap matched to the on-screen board.
    fn sync_board(&mut self, pixels_per_point: f64) {
        let Some(layout) = self.board_layout() else {
            return;
        };
        if let Some(tutor) = &mut self.tutor {
            tutor.whiteboard_mut().resize(layout.size, pixels_per_point);
        }
    }

    fn build_scene(&mut self) -> Scene {
        let layout = self.board_layout();
        let (Some(tutor), Some(layout)) = (&self.tutor, layout) else {
            return Scene::new();
        };
        let viewport_size = Size::new(
            self.surface.config.width as f64,
            self.surface.config.height as f64,
        );
        let cursor = self
            .cursor
            .filter(|p| layout.contains(*p))
            .map(|p| layout.to_local(p));

        let render_ctx = RenderContext::new(tutor.whiteboard(), layout, viewport_size)
            .with_scale_factor(self.window.scale_factor())
            .with_background(self.config.background_color)
            .with_cursor(cursor);
        self.board_renderer.build_scene(&render_ctx);
        self.board_renderer.take_scene()
    }

    fn redraw(&mut self, render_cx: Option<&vello::util::RenderContext>) {
        let now = Instant::now();
        self.process_background(now);

        let egui_input = self.egui_state.take_egui_input(&self.window);
        let mut action = None;
        let egui_output = {
            let ui_state = &mut self.ui_state;
            let tutor = self.tutor.as_ref();
            self.egui_ctx.run(egui_input, |ctx| {
                if let Some(a) = render_ui(ctx, ui_state, tutor) {
                    action = Some(a);
                }
            })
        };

        #[cfg(target_arch = "wasm32")]
        for command in &egui_output.platform_output.commands {
            if let egui::OutputCommand::OpenUrl(open) = command {
                file_ops::open_url(&open.url);
            }
        }

        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output);
        let egui_primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);

        if let Some(action) = action {
            self.apply_action(action, now);
        }
        self.sync_board(egui_output.pixels_per_point as f64);

        let scene = self.build_scene();

        let Some(render_cx) = render_cx else {
            return;
        };
        let device_handle = &render_cx.devices[self.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return;
            }
        };

        let width = self.surface.config.width;
        let height = self.surface.config.height;

        let params = RenderParams {
            base_color: self.config.background_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Rgba8Unorm is the only storage-binding format WebGPU guarantees;
        // the result is blitted to the surface format afterwards.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        if let Err(e) = self.vello_renderer.render_to_texture(
            device,
            queue,
            &scene,
            &render_texture_view,
            &params,
        ) {
            log::error!("Failed to render: {:?}", e);
            return;
        }

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        {
            let mut blit_encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                label: Some("blit encoder"),
            });
            self.texture_blitter
                .copy(device, &mut blit_encoder, &render_texture_view, &surface_view);
            queue.submit(std::iter::once(blit_encoder.finish()));
        }

        for (id, image_delta) in &egui_output.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: egui_output.pixels_per_point,
        };

        {
            let mut egui_encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                label: Some("egui encoder"),
            });
            self.egui_renderer.update_buffers(
                device,
                queue,
                &mut egui_encoder,
                &egui_primitives,
                &screen_descriptor,
            );

            let render_pass = egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: vello::wgpu::Operations {
                        load: vello::wgpu::LoadOp::Load, // Keep the board underneath
                        store: vello::wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // egui-wgpu wants a 'static pass
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &egui_primitives, &screen_descriptor);
            drop(render_pass);

            queue.submit(std::iter::once(egui_encoder.finish()));
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        surface_texture.present();
        self.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending_window.is_some() {
            return;
        }

        log::info!("Creating window...");

        #[cfg(not(target_arch = "wasm32"))]
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        // On WASM, attach a full-viewport canvas to the DOM
        #[cfg(target_arch = "wasm32")]
        let window_attrs = {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let Some(web_window) = web_sys::window() else {
                log::error!("No browser window");
                return;
            };
            let Some(document) = web_window.document() else {
                log::error!("No document");
                return;
            };

            let viewport_width = web_window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(self.config.width as f64);
            let viewport_height = web_window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(self.config.height as f64);

            if let Some(loading) = document.get_element_by_id("loading") {
                loading.remove();
            }

            let canvas = document
                .get_element_by_id("prorev-canvas")
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
                .or_else(|| {
                    let app_div = document.get_element_by_id("app")?;
                    let canvas = document.create_element("canvas").ok()?;
                    canvas.set_id("prorev-canvas");
                    app_div.append_child(&canvas).ok()?;
                    canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok()
                });
            let Some(canvas) = canvas else {
                log::error!("Failed to create canvas");
                return;
            };

            let dpr = web_window.device_pixel_ratio();
            let physical_width = (viewport_width * dpr) as u32;
            let physical_height = (viewport_height * dpr) as u32;

            canvas.set_width(physical_width);
            canvas.set_height(physical_height);
            let style = canvas.style();
            let _ = style.set_property("width", "100%");
            let _ = style.set_property("height", "100%");
            let _ = style.set_property("display", "block");
            let _ = style.set_property("position", "fixed");
            let _ = style.set_property("top", "0");
            let _ = style.set_property("left", "0");

            log::info!(
                "Canvas created: {}x{} (physical: {}x{}, dpr: {})",
                viewport_width,
                viewport_height,
                physical_width,
                physical_height,
                dpr
            );

            Window::default_attributes()
                .with_title(&self.config.title)
                .with_canvas(Some(canvas))
        };

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };
        log::info!("Surface size: {}x{}", width, height);

        // On native, block on async surface creation
        #[cfg(not(target_arch = "wasm32"))]
        {
            let render_cx = self.render_cx.get_or_insert_with(vello::util::RenderContext::new);

            let surface = match pollster::block_on(render_cx.create_surface(
                window.clone(),
                width,
                height,
                PresentMode::AutoVsync,
            )) {
                Ok(surface) => surface,
                Err(e) => {
                    log::error!("Failed to create surface: {:?}", e);
                    event_loop.exit();
                    return;
                }
            };

            // SAFETY: the surface borrows the window, which the App keeps
            // alive in the same AppState for as long as the surface.
            let surface: RenderSurface<'static> = unsafe { std::mem::transmute(surface) };
            if let Err(e) = self.finish_init(window, surface) {
                log::error!("Initialization failed: {}", e);
                event_loop.exit();
            }
        }

        // On WASM, store window for later async initialization
        #[cfg(target_arch = "wasm32")]
        {
            self.pending_window = Some(window);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // On WASM, handle async initialization
        #[cfg(target_arch = "wasm32")]
        if self.state.is_none() {
            if let Some(window) = self.pending_window.clone() {
                if !self.init_in_progress.get() {
                    self.init_in_progress.set(true);

                    let Some(web_window) = web_sys::window() else {
                        return;
                    };
                    let dpr = web_window.device_pixel_ratio();
                    let viewport_width = web_window
                        .inner_width()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(self.config.width as f64);
                    let viewport_height = web_window
                        .inner_height()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(self.config.height as f64);

                    let width = (viewport_width * dpr) as u32;
                    let height = (viewport_height * dpr) as u32;

                    let self_ptr = self as *mut Self;
                    let window_clone = window.clone();

                    wasm_bindgen_futures::spawn_local(async move {
                        log::info!("Creating surface asynchronously...");
                        let mut render_cx = vello::util::RenderContext::new();

                        match render_cx
                            .create_surface(window_clone.clone(), width, height, PresentMode::AutoVsync)
                            .await
                        {
                            Ok(surface) => {
                                let surface: RenderSurface<'static> =
                                    unsafe { std::mem::transmute(surface) };

                                // SAFETY: WASM is single-threaded and the event
                                // loop keeps the App alive.
                                let app = unsafe { &mut *self_ptr };
                                app.render_cx = Some(render_cx);
                                if let Err(e) = app.finish_init(window_clone, surface) {
                                    log::error!("Initialization failed: {}", e);
                                }
                            }
                            Err(e) => {
                                log::error!("Failed to create surface: {:?}", e);
                                let app = unsafe { &mut *self_ptr };
                                app.init_in_progress.set(false);
                            }
                        }
                    });
                }

                window.request_redraw();
            }
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        let egui_response = state.egui_state.on_window_event(&state.window, &event);

        // The board only sees presses that egui did not claim.
        let egui_wants_pointer = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                state.redraw(self.render_cx.as_ref());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let point = state.logical(position);
                state.cursor = Some(point);
                state.pointer_moved(point);
            }

            WindowEvent::CursorLeft { .. } => {
                state.cursor = None;
                state.pointer_left();
            }

            WindowEvent::MouseInput { state: button_state, button: MouseButton::Left, .. } => {
                let Some(position) = state.cursor else {
                    return;
                };
                match button_state {
                    ElementState::Pressed => {
                        state.pointer_down(position, PointerSource::Mouse, egui_wants_pointer)
                    }
                    ElementState::Released => state.pointer_up(position),
                }
            }

            WindowEvent::Touch(touch) => {
                let point = state.logical(touch.location);
                match touch.phase {
                    TouchPhase::Started => {
                        state.pointer_down(point, PointerSource::Touch, egui_wants_pointer)
                    }
                    TouchPhase::Moved => state.pointer_moved(point),
                    TouchPhase::Ended => state.pointer_up(point),
                    TouchPhase::Cancelled => state.pointer_left(),
                }
            }

            WindowEvent::HoveredFile(_) => {
                state.ui_state.hovering_files = true;
            }

            WindowEvent::HoveredFileCancelled => {
                state.ui_state.hovering_files = false;
            }

            #[cfg(feature = "native")]
            WindowEvent::DroppedFile(path) => {
                state.ui_state.hovering_files = false;
                file_ops::drop_path(&path);
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prorev_core::{CaptureError, Frame};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Two tracks that report live until stopped.
    struct FakeStream {
        live: Rc<Cell<usize>>,
    }

    impl FakeStream {
        fn new(live: &Rc<Cell<usize>>) -> Self {
            live.set(2);
            Self { live: live.clone() }
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
            Ok(Frame { width: 1, height: 1, rgba: vec![0; 4] })
        }
    }

    fn upload_page() -> UiState {
        let mut ui_state = UiState::new();
        ui_state.page = Page::Upload;
        ui_state
    }

    #[test]
    fn test_leaving_upload_closes_open_camera() {
        let live = Rc::new(Cell::new(0));
        let mut ui_state = upload_page();
        let mut camera = CameraSession::new();
        let request = camera.request().unwrap();
        camera.opened(request, FakeStream::new(&live));
        assert_eq!(camera.active_tracks(), 2);

        change_page(&mut ui_state, &mut camera, Page::Whiteboard);
        assert_eq!(ui_state.page, Page::Whiteboard);
        assert_eq!(camera.state(), CameraState::Closed);
        assert_eq!(ui_state.camera_state, CameraState::Closed);
        assert_eq!(camera.active_tracks(), 0);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_grant_after_leaving_upload_is_stopped() {
        let live = Rc::new(Cell::new(0));
        let mut ui_state = upload_page();
        let mut camera = CameraSession::new();
        let request = camera.request().unwrap();

        change_page(&mut ui_state, &mut camera, Page::Whiteboard);
        camera.opened(request, FakeStream::new(&live));
        assert_eq!(camera.state(), CameraState::Closed);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_staying_on_upload_keeps_camera() {
        let live = Rc::new(Cell::new(0));
        let mut ui_state = upload_page();
        let mut camera = CameraSession::new();
        let request = camera.request().unwrap();
        camera.opened(request, FakeStream::new(&live));

        change_page(&mut ui_state, &mut camera, Page::Upload);
        assert_eq!(camera.state(), CameraState::Open);
        assert_eq!(live.get(), 2);
    }
}
