//! UI components using egui.

use egui::{
    include_image, vec2, Align, Align2, Color32, Context, CornerRadius, Frame, ImageSource, Key,
    Layout, Margin, RichText, ScrollArea, Sense, Stroke,
};
use kurbo::{Point, Size};
use prorev_core::tools::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use prorev_core::{
    CameraState, DrawingState, IntakeFile, QuestionSet, ToolKind, TutorSession, UploadList,
};
use prorev_render::BoardLayout;
use std::collections::HashMap;

use prorev_widgets::colors::{AMBER, CYAN, GRAY, GREEN, RED};
use prorev_widgets::{
    card_frame, drop_zone, panel_frame, section_label, suggestion_list, theme, toolbar_frame,
    vertical_separator, ActionButton, ColorSwatch, IconButton, MathLabel, MathStyle, NavAction,
    NavigationControls, ProgressBar, PEN_COLORS,
};

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Landing,
    Upload,
    Whiteboard,
}

/// UI state owned by the app between frames.
#[derive(Default)]
pub struct UiState {
    pub page: Page,
    /// Documents in the bucket.
    pub uploads: UploadList,
    /// Contents of files uploaded in this session, kept for re-analysis.
    pub local_files: HashMap<String, IntakeFile>,
    /// Questions extracted per uploaded file.
    pub extracted: HashMap<String, QuestionSet>,
    /// Uploads still in flight.
    pub uploading: usize,
    /// File currently being analyzed.
    pub analyzing: Option<String>,
    /// Dismissable message shown on the upload page.
    pub error: Option<String>,
    /// Files are being dragged over the window.
    pub hovering_files: bool,
    /// Mirrored from the camera session.
    pub camera_state: CameraState,
    pub camera_error: Option<String>,
    pub sidebar_open: bool,
    /// Whiteboard area from the last layout pass, in logical pixels.
    pub board_rect: Option<egui::Rect>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            sidebar_open: true,
            ..Self::default()
        }
    }

    /// Re-running analysis needs the file's bytes and an idle extractor.
    pub fn can_analyze(&self, name: &str) -> bool {
        self.analyzing.is_none() && self.local_files.contains_key(name)
    }

    /// Progress line under the drop zone.
    pub fn status_line(&self) -> Option<String> {
        if self.uploading > 0 {
            Some("Uploading...".to_string())
        } else {
            self.analyzing
                .as_ref()
                .map(|name| format!("Analyzing \"{}\"...", name))
        }
    }

    pub fn camera_busy(&self) -> bool {
        matches!(self.camera_state, CameraState::Requesting | CameraState::Open)
    }

    /// Where to draw and hit-test the board, once the whiteboard page has
    /// been laid out.
    pub fn board_layout(&self) -> Option<BoardLayout> {
        if self.page != Page::Whiteboard {
            return None;
        }
        let rect = self.board_rect?;
        Some(BoardLayout::new(
            Point::new(rect.min.x as f64, rect.min.y as f64),
            Size::new(rect.width() as f64, rect.height() as f64),
        ))
    }
}

/// Actions that can be triggered by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Leave the landing page.
    Start,
    /// Open the platform file picker.
    PickFile,
    OpenCamera,
    Capture,
    CancelCamera,
    /// Extract questions from an uploaded file again.
    Analyze(String),
    /// Delete an uploaded file from the bucket.
    Remove(String),
    RefreshUploads,
    /// Hand a file's questions to the whiteboard.
    StartWhiteboard(String),
    /// Open the whiteboard with the built-in questions.
    PracticeQuestions,
    DismissError,
    BackToUpload,
    SetTool(ToolKind),
    SetColor([u8; 3]),
    SetStrokeWidth(f64),
    ZoomIn,
    ZoomOut,
    ZoomReset,
    /// Save the board as a PNG.
    Download,
    ClearBoard,
    DismissFeedback,
    Navigate(NavAction),
}

/// Icons used in the whiteboard toolbar.
struct Icons {
    back: ImageSource<'static>,
    sidebar: ImageSource<'static>,
    pen: ImageSource<'static>,
    eraser: ImageSource<'static>,
    zoom_in: ImageSource<'static>,
    zoom_out: ImageSource<'static>,
    download: ImageSource<'static>,
    trash: ImageSource<'static>,
}

fn icons() -> Icons {
    Icons {
        back: include_image!("../assets/arrow-left.svg"),
        sidebar: include_image!("../assets/sidebar.svg"),
        pen: include_image!("../assets/pen.svg"),
        eraser: include_image!("../assets/eraser.svg"),
        zoom_in: include_image!("../assets/zoom-in.svg"),
        zoom_out: include_image!("../assets/zoom-out.svg"),
        download: include_image!("../assets/download.svg"),
        trash: include_image!("../assets/trash.svg"),
    }
}

/// Render the UI for the current page and return any triggered action.
pub fn render_ui(ctx: &Context, ui_state: &mut UiState, tutor: Option<&TutorSession>) -> Option<UiAction> {
    egui_extras::install_image_loaders(ctx);

    match ui_state.page {
        Page::Landing => render_landing(ctx),
        Page::Upload => {
            let page_action = render_upload_page(ctx, ui_state);
            let camera_action = render_camera_controls(ctx, ui_state);
            page_action.or(camera_action)
        }
        Page::Whiteboard => match tutor {
            Some(tutor) => render_whiteboard(ctx, ui_state, tutor),
            None => {
                ui_state.board_rect = None;
                None
            }
        },
    }
}

fn render_landing(ctx: &Context) -> Option<UiAction> {
    let mut action = None;
    let background = GRAY.shade(9);

    egui::CentralPanel::default()
        .frame(Frame::new().fill(background))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space((ui.available_height() * 0.3).max(24.0));
                ui.label(RichText::new("ProRev").size(56.0).strong().color(CYAN.shade(4)));
                ui.add_space(8.0);
                ui.label(
                    RichText::new("The smart whiteboard that you always needed.")
                        .size(20.0)
                        .color(Color32::WHITE),
                );
                ui.add_space(4.0);
                ui.label(
                    RichText::new("Upload your homework, work it out by hand, and get hints as you go.")
                        .size(14.0)
                        .color(GRAY.shade(4)),
                );
                ui.add_space(24.0);
                if ActionButton::new("Start Now").min_width(160.0).show(ui) {
                    action = Some(UiAction::Start);
                }
            });
        });

    action
}

fn page_frame() -> Frame {
    Frame::new()
        .fill(GRAY.shade(1))
        .inner_margin(Margin::symmetric(24, 24))
}

fn render_upload_page(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    let mut action = None;

    egui::CentralPanel::default().frame(page_frame()).show(ctx, |ui| {
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            let width = ui.available_width().min(720.0);
            let side = ((ui.available_width() - width) / 2.0).max(0.0);
            ui.horizontal(|ui| {
                ui.add_space(side);
                ui.vertical(|ui| {
                    ui.set_width(width);
                    if let Some(a) = upload_column(ui, ui_state) {
                        action = Some(a);
                    }
                });
            });
        });
    });

    action
}

fn upload_column(ui: &mut egui::Ui, ui_state: &UiState) -> Option<UiAction> {
    let mut action = None;

    ui.label(RichText::new("ProRev AI Assistant").size(28.0).strong().color(theme::TEXT));
    ui.label(
        RichText::new("Upload or capture homework images and PDFs")
            .size(15.0)
            .color(theme::TEXT_MUTED),
    );
    ui.add_space(16.0);

    if let Some(error) = &ui_state.error {
        Frame::new()
            .fill(RED.shade(0))
            .stroke(Stroke::new(1.0, RED.shade(3)))
            .corner_radius(CornerRadius::same(6))
            .inner_margin(Margin::symmetric(12, 8))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(error).color(RED.shade(7)));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("Dismiss").clicked() {
                            action = Some(UiAction::DismissError);
                        }
                    });
                });
            });
        ui.add_space(12.0);
    }

    let zone = drop_zone(
        ui,
        ui_state.hovering_files,
        "Drop a homework file here",
        "or click to browse (JPEG, PNG or PDF)",
    );
    if zone.clicked {
        action = Some(UiAction::PickFile);
    }
    ui.add_space(12.0);

    ui.horizontal(|ui| {
        if ActionButton::new("Use camera")
            .secondary()
            .enabled(!ui_state.camera_busy())
            .show(ui)
        {
            action = Some(UiAction::OpenCamera);
        }
        if ActionButton::new("Practice questions").secondary().show(ui) {
            action = Some(UiAction::PracticeQuestions);
        }
        if ActionButton::new("Refresh").secondary().show(ui) {
            action = Some(UiAction::RefreshUploads);
        }
    });

    if let Some(error) = &ui_state.camera_error {
        ui.label(RichText::new(error).color(theme::ERROR).size(12.0));
    }

    if let Some(status) = ui_state.status_line() {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new(status).color(theme::ACCENT));
        });
    }

    ui.add_space(20.0);
    section_label(ui, "UPLOADED FILES");
    ui.add_space(4.0);

    if ui_state.uploads.is_empty() {
        ui.label(RichText::new("No files uploaded yet.").color(theme::TEXT_MUTED).italics());
    }

    for file in ui_state.uploads.iter() {
        panel_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.hyperlink_to(file.name.as_str(), &file.url);
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ActionButton::new("Remove").danger().show(ui) {
                        action = Some(UiAction::Remove(file.name.clone()));
                    }
                    if ActionButton::new("Analyze")
                        .secondary()
                        .enabled(ui_state.can_analyze(&file.name))
                        .show(ui)
                    {
                        action = Some(UiAction::Analyze(file.name.clone()));
                    }
                });
            });

            if let Some(questions) = ui_state.extracted.get(&file.name) {
                ui.add_space(6.0);
                for (i, question) in questions.questions.iter().enumerate() {
                    ui.horizontal_top(|ui| {
                        ui.label(RichText::new(format!("{}.", i + 1)).color(theme::TEXT_MUTED));
                        MathLabel::new(&question.title).size(13.0).show(ui);
                    });
                }
                ui.add_space(6.0);
                if ActionButton::new("Start whiteboard").show(ui) {
                    action = Some(UiAction::StartWhiteboard(file.name.clone()));
                }
            }
        });
        ui.add_space(8.0);
    }

    action
}

/// Capture and cancel buttons under the camera preview.
fn render_camera_controls(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    if !ui_state.camera_busy() {
        return None;
    }
    let mut action = None;

    egui::Area::new(egui::Id::new("camera_controls"))
        .order(egui::Order::Foreground)
        .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -32.0))
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.horizontal(|ui| match ui_state.camera_state {
                    CameraState::Requesting => {
                        ui.spinner();
                        ui.label("Waiting for camera permission...");
                        if ActionButton::new("Cancel").secondary().show(ui) {
                            action = Some(UiAction::CancelCamera);
                        }
                    }
                    _ => {
                        ui.label("Line up your homework in the preview");
                        if ActionButton::new("Capture").show(ui) {
                            action = Some(UiAction::Capture);
                        }
                        if ActionButton::new("Cancel").secondary().show(ui) {
                            action = Some(UiAction::CancelCamera);
                        }
                    }
                });
            });
        });

    action
}

/// Single-key shortcuts on the whiteboard.
fn board_shortcuts(ctx: &Context) -> Option<UiAction> {
    if ctx.wants_keyboard_input() {
        return None;
    }
    ctx.input(|i| {
        if i.key_pressed(Key::P) {
            Some(UiAction::SetTool(ToolKind::Pen))
        } else if i.key_pressed(Key::E) {
            Some(UiAction::SetTool(ToolKind::Eraser))
        } else if i.key_pressed(Key::ArrowRight) {
            Some(UiAction::Navigate(NavAction::Next))
        } else if i.key_pressed(Key::ArrowLeft) {
            Some(UiAction::Navigate(NavAction::Previous))
        } else if i.key_pressed(Key::Plus) || i.key_pressed(Key::Equals) {
            Some(UiAction::ZoomIn)
        } else if i.key_pressed(Key::Minus) {
            Some(UiAction::ZoomOut)
        } else if i.key_pressed(Key::Num0) {
            Some(UiAction::ZoomReset)
        } else {
            None
        }
    })
}

/// "Analyzing..." while a feedback request is out, "Listening..." otherwise.
pub fn assistant_status(loading: bool) -> &'static str {
    if loading { "Analyzing..." } else { "Listening..." }
}

fn render_whiteboard(ctx: &Context, ui_state: &mut UiState, tutor: &TutorSession) -> Option<UiAction> {
    let mut action = board_shortcuts(ctx);
    let navigator = tutor.navigator();
    let drawing = tutor.whiteboard().drawing;
    let icons = icons();

    egui::TopBottomPanel::top("question")
        .frame(
            Frame::new()
                .fill(Color32::WHITE)
                .inner_margin(Margin::symmetric(16, 10)),
        )
        .show(ctx, |ui| {
            match navigator.current() {
                Some(question) => {
                    MathLabel::new(&question.title).size(18.0).show(ui);
                }
                None => {
                    ui.label(RichText::new("Loading question...").size(18.0).color(theme::TEXT_MUTED));
                }
            }
            ui.add_space(4.0);
            ProgressBar::new(navigator.progress()).show(ui);
        });

    egui::TopBottomPanel::top("toolbar")
        .frame(Frame::new().inner_margin(Margin::symmetric(12, 6)))
        .show(ctx, |ui| {
            toolbar_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    if let Some(a) = toolbar(ui, ui_state, tutor, &drawing, &icons) {
                        action = Some(a);
                    }
                });
            });
        });

    egui::TopBottomPanel::bottom("navigation")
        .frame(
            Frame::new()
                .fill(Color32::WHITE)
                .inner_margin(Margin::symmetric(16, 8)),
        )
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if let Some(nav) = NavigationControls::new(navigator.progress()).show(ui) {
                    action = Some(UiAction::Navigate(nav));
                }
            });
        });

    if ui_state.sidebar_open {
        egui::SidePanel::left("hints")
            .exact_width(300.0)
            .resizable(false)
            .frame(
                Frame::new()
                    .fill(GRAY.shade(9))
                    .inner_margin(Margin::same(12)),
            )
            .show(ctx, |ui| {
                ui.label(RichText::new("Hints").size(16.0).strong().color(Color32::WHITE));
                ui.add_space(8.0);
                if navigator.suggestions_pending() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new("Loading hints...").color(GRAY.shade(4)));
                    });
                } else {
                    ScrollArea::vertical().show(ui, |ui| {
                        suggestion_list(ui, navigator.visible_suggestions());
                    });
                }
            });
    }

    egui::CentralPanel::default()
        .frame(Frame::NONE.inner_margin(Margin::same(12)))
        .show(ctx, |ui| {
            // Hover-only so the board keeps receiving raw pointer input.
            let rect = ui.available_rect_before_wrap();
            ui.allocate_rect(rect, Sense::hover());
            ui_state.board_rect = Some(rect);
        });

    if let Some(a) = render_feedback(ctx, ui_state, tutor) {
        action = Some(a);
    }

    action
}

fn toolbar(
    ui: &mut egui::Ui,
    ui_state: &mut UiState,
    tutor: &TutorSession,
    drawing: &DrawingState,
    icons: &Icons,
) -> Option<UiAction> {
    let mut action = None;
    ui.spacing_mut().item_spacing = vec2(4.0, 0.0);

    if IconButton::new(icons.back.clone(), "Back to uploads").show(ui) {
        action = Some(UiAction::BackToUpload);
    }
    if IconButton::new(icons.sidebar.clone(), "Hints")
        .selected(ui_state.sidebar_open)
        .show(ui)
    {
        ui_state.sidebar_open = !ui_state.sidebar_open;
    }
    vertical_separator(ui);

    for (tool, icon) in [(ToolKind::Pen, &icons.pen), (ToolKind::Eraser, &icons.eraser)] {
        let shortcut = if tool == ToolKind::Pen { "P" } else { "E" };
        if IconButton::new(icon.clone(), tool.label())
            .shortcut(shortcut)
            .selected(drawing.tool == tool)
            .show(ui)
        {
            action = Some(UiAction::SetTool(tool));
        }
    }
    vertical_separator(ui);

    let current = drawing.color.to_rgba8();
    let current = [current.r, current.g, current.b];
    for pen in &PEN_COLORS {
        let (clicked, _) = ColorSwatch::new(pen.color32(), pen.name)
            .selected(pen.rgb == current)
            .show(ui);
        if clicked {
            action = Some(UiAction::SetColor(pen.rgb));
        }
    }
    ui.add_space(6.0);

    let mut width = drawing.stroke_width();
    let slider = egui::Slider::new(&mut width, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH)
        .step_by(1.0)
        .suffix(" px");
    if ui.add(slider).on_hover_text("Pen width").changed() {
        action = Some(UiAction::SetStrokeWidth(width));
    }
    vertical_separator(ui);

    if IconButton::new(icons.zoom_out.clone(), "Zoom out").shortcut("-").show(ui) {
        action = Some(UiAction::ZoomOut);
    }
    let percent = ui
        .add(
            egui::Label::new(RichText::new(format!("{}%", drawing.zoom.percent())).size(12.0))
                .sense(Sense::click()),
        )
        .on_hover_text("Reset zoom (0)");
    if percent.clicked() {
        action = Some(UiAction::ZoomReset);
    }
    if IconButton::new(icons.zoom_in.clone(), "Zoom in").shortcut("+").show(ui) {
        action = Some(UiAction::ZoomIn);
    }
    vertical_separator(ui);

    if IconButton::new(icons.download.clone(), "Download solution").show(ui) {
        action = Some(UiAction::Download);
    }
    if IconButton::new(icons.trash.clone(), "Clear board").show(ui) {
        action = Some(UiAction::ClearBoard);
    }

    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
        let loading = tutor.is_loading_feedback();
        let (fill, text) = if loading {
            (AMBER.shade(1), AMBER.shade(8))
        } else {
            (GREEN.shade(1), GREEN.shade(8))
        };
        Frame::new()
            .fill(fill)
            .corner_radius(CornerRadius::same(12))
            .inner_margin(Margin::symmetric(10, 4))
            .show(ui, |ui| {
                ui.label(RichText::new(assistant_status(loading)).size(12.0).color(text));
            });
    });

    action
}

/// The assistant's verdict, pinned to the bottom of the board.
fn render_feedback(ctx: &Context, ui_state: &UiState, tutor: &TutorSession) -> Option<UiAction> {
    let feedback = tutor.whiteboard().feedback()?;
    let board = ui_state.board_rect?;
    let mut action = None;

    let fill = if feedback.is_correct {
        GREEN.shade(6)
    } else {
        AMBER.shade(6)
    };
    let text_style = MathStyle {
        color: Color32::WHITE,
        ..MathStyle::on_dark()
    };

    egui::Area::new(egui::Id::new("assistant_feedback"))
        .order(egui::Order::Foreground)
        .pivot(Align2::LEFT_BOTTOM)
        .fixed_pos(board.left_bottom() + vec2(16.0, -16.0))
        .show(ctx, |ui| {
            ui.set_max_width((board.width() - 32.0).max(200.0));
            card_frame().fill(fill).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("ProRev Assistant:").strong().color(Color32::WHITE));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui
                            .add(egui::Button::new(RichText::new("✕").color(Color32::WHITE)).frame(false))
                            .on_hover_text("Dismiss")
                            .clicked()
                        {
                            action = Some(UiAction::DismissFeedback);
                        }
                    });
                });
                MathLabel::new(&feedback.suggestion).style(text_style).show(ui);
            });
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(name: &str) -> IntakeFile {
        IntakeFile::accept(name, None, vec![1]).unwrap()
    }

    #[test]
    fn test_defaults() {
        let state = UiState::new();
        assert_eq!(state.page, Page::Landing);
        assert!(state.sidebar_open);
        assert!(state.status_line().is_none());
        assert!(!state.camera_busy());
    }

    #[test]
    fn test_status_prefers_upload() {
        let mut state = UiState::new();
        state.analyzing = Some("hw.png".into());
        assert_eq!(state.status_line().as_deref(), Some("Analyzing \"hw.png\"..."));
        state.uploading = 1;
        assert_eq!(state.status_line().as_deref(), Some("Uploading..."));
    }

    #[test]
    fn test_can_analyze_needs_local_bytes() {
        let mut state = UiState::new();
        assert!(!state.can_analyze("hw.png"));
        state.local_files.insert("hw.png".into(), intake("hw.png"));
        assert!(state.can_analyze("hw.png"));
        state.analyzing = Some("other.pdf".into());
        assert!(!state.can_analyze("hw.png"));
    }

    #[test]
    fn test_board_layout_only_on_whiteboard() {
        let mut state = UiState::new();
        state.board_rect = Some(egui::Rect::from_min_size(egui::pos2(10.0, 20.0), vec2(300.0, 200.0)));
        assert!(state.board_layout().is_none());

        state.page = Page::Whiteboard;
        let layout = state.board_layout().unwrap();
        assert_eq!(layout.origin, Point::new(10.0, 20.0));
        assert_eq!(layout.size, Size::new(300.0, 200.0));
    }

    #[test]
    fn test_camera_busy_states() {
        let mut state = UiState::new();
        state.camera_state = CameraState::Requesting;
        assert!(state.camera_busy());
        state.camera_state = CameraState::Open;
        assert!(state.camera_busy());
        state.camera_state = CameraState::Captured;
        assert!(!state.camera_busy());
    }

    #[test]
    fn test_assistant_status() {
        assert_eq!(assistant_status(true), "Analyzing...");
        assert_eq!(assistant_status(false), "Listening...");
    }
}
