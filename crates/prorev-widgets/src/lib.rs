//! egui widget components for ProRev, with Tailwind-inspired styling.
//!
//! - **Math**: labels that typeset `$...$` markup inline with prose
//! - **Suggestion**: hint cards with a kind-specific glyph and accent
//! - **Navigation**: question progress bar and previous/next controls
//! - **Buttons**: toolbar icon buttons and page action buttons
//! - **Colors**: the Tailwind shades the app uses and pen color swatches
//! - **Layout**: section labels, separators, panel frames, drop zones

pub mod buttons;
pub mod colors;
pub mod layout;
pub mod math;
pub mod navigation;
pub mod suggestion;

pub use buttons::{ActionButton, ActionKind, IconButton};
pub use colors::{ColorSwatch, PenColor, TailwindColor, PEN_COLORS, SHADE_400, SHADE_500};
pub use layout::{
    card_frame, drop_zone, panel_frame, section_label, separator, toolbar_frame,
    vertical_separator, DropZoneResponse,
};
pub use math::{layout_job, MathLabel, MathStyle};
pub use navigation::{NavAction, NavigationControls, ProgressBar};
pub use suggestion::{suggestion_list, suggestion_style, SuggestionCard, SuggestionStyle};

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Small button size (icons, color swatches)
    pub const SMALL: f32 = 20.0;
    /// Panel corner radius
    pub const PANEL_RADIUS: u8 = 8;
    /// Body text size
    pub const BODY: f32 = 14.0;
}

/// Standard colors used across widgets.
pub mod theme {
    use egui::Color32;

    /// Text color (dark gray)
    pub const TEXT: Color32 = Color32::from_rgb(60, 60, 60);
    /// Muted text color
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 120, 120);
    /// Border color
    pub const BORDER: Color32 = Color32::from_rgb(220, 220, 220);
    /// Selection/active color (blue)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
    /// Hover background
    pub const HOVER_BG: Color32 = Color32::from_rgb(245, 245, 245);
    /// Selected background
    pub const SELECTED_BG: Color32 = Color32::from_rgb(235, 245, 255);
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
    /// Hint card background (gray-800)
    pub const CARD_BG: Color32 = Color32::from_rgb(31, 41, 55);
    /// Text on dark cards (gray-100)
    pub const CARD_TEXT: Color32 = Color32::from_rgb(243, 244, 246);
    /// Math that failed to typeset (red-500)
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
    /// Correct-answer feedback (green-400)
    pub const SUCCESS: Color32 = Color32::from_rgb(74, 222, 128);
    /// Not-yet-correct feedback (yellow-400)
    pub const WARNING: Color32 = Color32::from_rgb(250, 204, 21);
}
