use crate::layout::EvaluatorLayout;
use crate::text::TextCache;
use crate::view::{EvaluatorView, ParticipantView};
use ab_glyph::FontVec;
use anyhow::{Result, anyhow, ensure};
use std::sync::Arc;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

const BACKGROUND: [u8; 3] = [0, 0, 0];
const IDLE_BACKGROUND: [u8; 3] = [30, 30, 30];
const OPTION_FILL: [u8; 3] = [40, 70, 140];
const UNKNOWN_FILL: [u8; 3] = [90, 90, 90];

/// Software renderer for one window. Paints a view into an RGBA canvas that
/// the caller copies into its frame buffer.
pub struct SurfaceRenderer {
    canvas: Pixmap,
    large: Option<TextCache<FontVec>>,
    small: Option<TextCache<FontVec>>,
    feedback: Option<TextCache<FontVec>>,
}

impl SurfaceRenderer {
    pub fn new(
        width: u32,
        height: u32,
        font: Option<Arc<FontVec>>,
        large_px: f32,
        small_px: f32,
    ) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        let white = Color::from_rgba8(255, 255, 255, 255);
        let green = Color::from_rgba8(120, 220, 120, 255);

        Ok(Self {
            canvas,
            large: font.clone().map(|f| TextCache::new(f, large_px, white)),
            small: font.clone().map(|f| TextCache::new(f, small_px, white)),
            feedback: font.map(|f| TextCache::new(f, large_px, green)),
        })
    }

    /// Zero-sized (minimized) windows keep the previous canvas.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(canvas) = Pixmap::new(width, height) {
            self.canvas = canvas;
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.large.is_some()
    }

    pub fn draw_participant(&mut self, view: &ParticipantView) {
        self.canvas.fill(rgb(BACKGROUND));
        let Some(full) = Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32)
        else {
            return;
        };

        let text = match view {
            ParticipantView::Blank => None,
            ParticipantView::Stimulus(word) => {
                self.large.as_mut().and_then(|c| c.get_or_render(word))
            }
            ParticipantView::Feedback(word) => {
                self.feedback.as_mut().and_then(|c| c.get_or_render(word))
            }
            ParticipantView::Finished => self
                .small
                .as_mut()
                .and_then(|c| c.get_or_render("Thank you!")),
        };
        if let Some(text) = text {
            blit_centered(&mut self.canvas, &text, full);
        }
    }

    /// Paints the evaluator view and returns the layout it drew.
    pub fn draw_evaluator(&mut self, view: &EvaluatorView) -> EvaluatorLayout {
        let layout = EvaluatorLayout::new(self.width(), self.height(), view.option_count());
        let EvaluatorView::Controls {
            prompt,
            labels,
            unknown,
        } = view
        else {
            self.canvas.fill(rgb(IDLE_BACKGROUND));
            return layout;
        };
        self.canvas.fill(rgb(BACKGROUND));

        for (rect, label) in layout.options.iter().zip(labels) {
            fill(&mut self.canvas, *rect, OPTION_FILL);
            if let Some(text) = self.small.as_mut().and_then(|c| c.get_or_render(label)) {
                blit_centered(&mut self.canvas, &text, *rect);
            }
        }
        if let Some(rect) = layout.unknown {
            fill(&mut self.canvas, rect, UNKNOWN_FILL);
            if let Some(text) = self.small.as_mut().and_then(|c| c.get_or_render(unknown)) {
                blit_centered(&mut self.canvas, &text, rect);
            }
        }
        if let (Some(rect), Some(text)) = (
            layout.prompt,
            self.small.as_mut().and_then(|c| c.get_or_render(prompt)),
        ) {
            blit_centered(&mut self.canvas, &text, rect);
        }
        layout
    }

    /// Copies the canvas into an RGBA8 frame of the same size.
    pub fn copy_to(&self, frame: &mut [u8]) -> Result<()> {
        let data = self.canvas.data();
        ensure!(
            frame.len() == data.len(),
            "frame is {} bytes, canvas is {} bytes",
            frame.len(),
            data.len()
        );
        frame.copy_from_slice(data);
        Ok(())
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::from_rgba8(r, g, b, 255)
}

fn fill(canvas: &mut Pixmap, rect: Rect, color: [u8; 3]) {
    let mut paint = Paint::default();
    paint.set_color(rgb(color));
    canvas.fill_rect(rect, &paint, Transform::identity(), None);
}

fn blit_centered(canvas: &mut Pixmap, text: &Pixmap, area: Rect) {
    let x = area.left() + (area.width() - text.width() as f32) / 2.0;
    let y = area.top() + (area.height() - text.height() as f32) / 2.0;
    canvas.draw_pixmap(
        x.round() as i32,
        y.round() as i32,
        text.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> SurfaceRenderer {
        SurfaceRenderer::new(400, 300, None, 100.0, 50.0).unwrap()
    }

    fn pixel(r: &SurfaceRenderer, x: f32, y: f32) -> [u8; 3] {
        let p = r.canvas().pixel(x as u32, y as u32).unwrap();
        [p.red(), p.green(), p.blue()]
    }

    #[test]
    fn hidden_controls_paint_idle_background() {
        let mut r = renderer();
        let layout = r.draw_evaluator(&EvaluatorView::Hidden);
        assert!(layout.options.is_empty());
        assert_eq!(pixel(&r, 200.0, 150.0), IDLE_BACKGROUND);
    }

    #[test]
    fn revealed_controls_paint_one_box_per_label() {
        let mut r = renderer();
        let view = EvaluatorView::Controls {
            prompt: "Which word was said?".into(),
            labels: vec!["tuuli".into(), "tulli".into()],
            unknown: "unknown".into(),
        };
        let layout = r.draw_evaluator(&view);

        assert_eq!(layout.options.len(), 2);
        let b = layout.options[1];
        assert_eq!(pixel(&r, b.left() + 2.0, b.top() + 2.0), OPTION_FILL);
        let u = layout.unknown.unwrap();
        assert_eq!(pixel(&r, u.left() + 2.0, u.top() + 2.0), UNKNOWN_FILL);
    }

    #[test]
    fn participant_without_font_is_plain_background() {
        let mut r = renderer();
        assert!(!r.has_font());
        r.draw_participant(&ParticipantView::Stimulus("tuli".into()));
        assert_eq!(pixel(&r, 200.0, 150.0), BACKGROUND);
    }

    #[test]
    fn copy_requires_matching_frame() {
        let r = renderer();
        let mut frame = vec![0u8; 400 * 300 * 4];
        r.copy_to(&mut frame).unwrap();
        assert!(r.copy_to(&mut frame[..16]).is_err());
    }

    #[test]
    fn zero_sized_resize_keeps_canvas() {
        let mut r = renderer();
        r.resize(0, 0);
        assert_eq!((r.width(), r.height()), (400, 300));
        r.resize(640, 480);
        assert_eq!((r.width(), r.height()), (640, 480));
    }
}
