//! Styled text: model, font registry, line layout and glyph rasterization.

pub mod engine;
pub mod fonts;
pub mod layout;
pub mod model;

pub use engine::{TextEngine, render_text};
pub use fonts::{FaceStyle, FontFace, FontRegistry, system_bold_font_path, system_font_path};
pub use layout::{ELLIPSIS, TextLayout, TextMeasure, layout_text};
pub use model::{Overflow, Text, TextAlign, TextBox, TextContent, TextRun, TextStyle, VerticalAlign};
