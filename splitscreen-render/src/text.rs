use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    let font = FontVec::try_from_vec(bytes)
        .with_context(|| format!("parsing font {}", path.display()))?;
    tracing::info!(path = %path.display(), glyphs = font.glyph_count(), "font loaded");
    Ok(font)
}

/// Rasterizes one line of text into a tight, transparent pixmap.
/// Returns `None` when nothing in `text` has an outline (e.g. only spaces).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Lay out on a baseline at the ascent.
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Source premultiplied by coverage, composited "over" what is there.
            let a = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            let blend =
                |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let out_a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            let channel = |c: u8| c.min(out_a);

            if let Some(px) = PremultipliedColorU8::from_rgba(
                channel(blend(cu[0], bg.red())),
                channel(blend(cu[1], bg.green())),
                channel(blend(cu[2], bg.blue())),
                out_a,
            ) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Rendered text by string, for one font size and colour. Words repeat across
/// replicated decks, so each is rasterized once.
pub struct TextCache<F: Font> {
    font: Arc<F>,
    size_px: f32,
    color: Color,
    map: HashMap<Atom, Option<Arc<Pixmap>>>,
}

impl<F: Font> TextCache<F> {
    pub fn new(font: Arc<F>, size_px: f32, color: Color) -> Self {
        Self {
            font,
            size_px,
            color,
            map: HashMap::new(),
        }
    }

    pub fn get_or_render(&mut self, text: &str) -> Option<Arc<Pixmap>> {
        let atom = Atom::from(text);
        if let Some(cached) = self.map.get(&atom) {
            return cached.clone();
        }
        let pm = render_text_pixmap(text, self.size_px, self.font.as_ref(), self.color)
            .map(Arc::new);
        if pm.is_none() {
            tracing::debug!(text, "no outline to draw");
        }
        self.map.insert(atom, pm.clone());
        pm
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
