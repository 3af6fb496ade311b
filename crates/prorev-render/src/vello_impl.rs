//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer};
use kurbo::{Affine, Circle, Point, Rect, Stroke};
use peniko::{Blob, Color, Fill, ImageAlphaType, ImageBrush, ImageData, ImageFormat};
use prorev_core::Bitmap;
use std::sync::Arc;
use vello::Scene;

/// Vello-based renderer for the whiteboard.
pub struct VelloRenderer {
    scene: Scene,
    /// Uploaded bitmap and the revision it was taken from.
    image_cache: Option<(u64, ImageData)>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            image_cache: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Copy the bitmap into an image, reusing the last copy when the bitmap
    /// has not changed.
    fn board_image(&mut self, bitmap: &Bitmap) -> ImageData {
        match &self.image_cache {
            Some((revision, data))
                if *revision == bitmap.revision()
                    && data.width == bitmap.width()
                    && data.height == bitmap.height() =>
            {
                data.clone()
            }
            _ => {
                let data = ImageData {
                    data: Blob::new(Arc::new(bitmap.pixels().to_vec())),
                    format: ImageFormat::Rgba8,
                    width: bitmap.width(),
                    height: bitmap.height(),
                    alpha_type: ImageAlphaType::Alpha,
                };
                self.image_cache = Some((bitmap.revision(), data.clone()));
                data
            }
        }
    }

    /// Cover everything outside `board` (physical pixels) with the window
    /// background so a zoomed board doesn't spill over.
    fn mask_outside(&mut self, board: Rect, viewport: Rect, color: Color) {
        let bands = [
            Rect::new(viewport.x0, viewport.y0, viewport.x1, board.y0),
            Rect::new(viewport.x0, board.y1, viewport.x1, viewport.y1),
            Rect::new(viewport.x0, board.y0, board.x0, board.y1),
            Rect::new(board.x1, board.y0, viewport.x1, board.y1),
        ];
        for band in bands {
            if band.width() > 0.0 && band.height() > 0.0 {
                self.scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &band);
            }
        }
    }

    /// Outline showing the area the current tool will paint.
    fn draw_tool_outline(&mut self, center: Point, diameter: f64, scale: f64) {
        let circle = Circle::new(center, (diameter / 2.0).max(1.0));
        let stroke = Stroke::new(1.0 / scale);
        self.scene.stroke(
            &stroke,
            Affine::scale(scale),
            Color::from_rgba8(107, 114, 128, 200), // Gray-500
            None,
            &circle,
        );
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();

        let scale = ctx.scale_factor;
        let viewport = Rect::new(0.0, 0.0, ctx.viewport_size.width, ctx.viewport_size.height);
        let board = ctx.layout.rect().scale_from_origin(scale);
        if board.width() <= 0.0 || board.height() <= 0.0 {
            return;
        }

        let whiteboard = ctx.whiteboard;
        let zoom = whiteboard.drawing.zoom;
        let bitmap = whiteboard.bitmap();

        // White page under the bitmap, in case the bitmap lags a resize.
        self.scene.fill(Fill::NonZero, Affine::IDENTITY, Color::WHITE, None, &board);

        if bitmap.width() > 0 && bitmap.height() > 0 {
            // Bitmap pixels are physical; zoom scales them on screen.
            let image = self.board_image(bitmap);
            let transform = Affine::translate(board.origin().to_vec2()) * zoom.transform();
            self.scene.draw_image(&ImageBrush::from(image), transform);
        }

        self.mask_outside(board, viewport, ctx.background_color);
        self.scene.stroke(&Stroke::new(1.0), Affine::IDENTITY, ctx.border_color, None, &board);

        if let Some(cursor) = ctx.cursor {
            let center = ctx.layout.origin + cursor.to_vec2();
            let diameter = whiteboard.drawing.effective_width() * zoom.level();
            self.draw_tool_outline(center, diameter, scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::BoardLayout;
    use kurbo::Size;
    use prorev_core::Whiteboard;

    fn context(whiteboard: &Whiteboard) -> RenderContext<'_> {
        RenderContext::new(
            whiteboard,
            BoardLayout::new(Point::new(10.0, 10.0), Size::new(200.0, 100.0)),
            Size::new(800.0, 600.0),
        )
    }

    #[test]
    fn test_renderer_creation() {
        let renderer = VelloRenderer::new();
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_scene_draws_board() {
        let whiteboard = Whiteboard::new(Size::new(200.0, 100.0), 1.0);
        let mut renderer = VelloRenderer::new();
        renderer.build_scene(&context(&whiteboard));
        assert!(!renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_image_cached_by_revision() {
        let mut whiteboard = Whiteboard::new(Size::new(200.0, 100.0), 1.0);
        let mut renderer = VelloRenderer::new();
        renderer.build_scene(&context(&whiteboard));
        assert_eq!(renderer.image_cache.as_ref().map(|(r, _)| *r), Some(0));

        whiteboard.clear();
        renderer.build_scene(&context(&whiteboard));
        assert_eq!(renderer.image_cache.as_ref().map(|(r, _)| *r), Some(1));
    }

    #[test]
    fn test_empty_layout_draws_nothing() {
        let whiteboard = Whiteboard::new(Size::new(0.0, 0.0), 1.0);
        let mut renderer = VelloRenderer::new();
        let ctx = RenderContext::new(&whiteboard, BoardLayout::default(), Size::new(800.0, 600.0));
        renderer.build_scene(&ctx);
        assert!(renderer.scene().encoding().is_empty());
    }
}
