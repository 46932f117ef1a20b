use splitscreen_core::Decision;
use tiny_skia::Rect;

/// Where the evaluator's controls sit: a prompt band on top, one column per
/// option across the middle, and the opt-out button underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorLayout {
    pub prompt: Option<Rect>,
    pub options: Vec<Rect>,
    pub unknown: Option<Rect>,
}

impl EvaluatorLayout {
    pub fn new(width: u32, height: u32, option_count: usize) -> Self {
        let (w, h) = (width as f32, height as f32);
        let margin = (w * 0.02).max(4.0);
        let prompt = Rect::from_xywh(margin, margin, (w - 2.0 * margin).max(1.0), h * 0.18);

        let top = h * 0.2;
        let band = h * 0.6;
        let columns = option_count as f32;
        let col_w = (w - margin * (columns + 1.0)) / columns.max(1.0);
        // All or nothing: a missing column would shift every later index.
        let options = (0..option_count)
            .map(|i| {
                let x = margin + i as f32 * (col_w + margin);
                Rect::from_xywh(x, top, col_w, band)
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();

        let unknown = Rect::from_xywh(w * 0.35, h * 0.83, w * 0.3, h * 0.12);

        Self {
            prompt,
            options,
            unknown,
        }
    }

    /// Maps a pointer position to the decision under it.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<Decision> {
        if let Some(i) = self.options.iter().position(|r| contains(r, x, y)) {
            return Some(Decision::Option(i));
        }
        self.unknown
            .filter(|r| contains(r, x, y))
            .map(|_| Decision::Unknown)
    }
}

fn contains(r: &Rect, x: f32, y: f32) -> bool {
    x >= r.left() && x < r.right() && y >= r.top() && y < r.bottom()
}
