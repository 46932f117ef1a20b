pub mod layout;
pub mod render;
pub mod text;
pub mod view;

pub use layout::EvaluatorLayout;
pub use render::SurfaceRenderer;
pub use text::{TextCache, load_font, render_text_pixmap};
pub use view::{EvaluatorView, ParticipantView};

pub use ab_glyph::FontVec;
