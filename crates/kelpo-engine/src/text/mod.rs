//! Bitmap-font text meshes.
//!
//! A font atlas is a headerless square RGB888 image holding a 16×16 grid of
//! glyphs starting at the space character. Strings become textured quads in
//! screen space, appended to the same batch the 3D scene is projected into.

mod atlas;
mod mesh;

pub use atlas::{build_font_atlas, build_font_atlas_from_bytes, FontAtlas, FontError, GLYPHS_PER_ROW};
pub use mesh::{append_text, character_height, character_width, text_width, TextError};
