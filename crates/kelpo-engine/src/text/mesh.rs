use thiserror::Error;

use super::{FontAtlas, GLYPHS_PER_ROW};
use crate::batch::{Batch, BatchError};
use crate::polygon::{Triangle, Vertex};

const CHAR_WIDTH: f32 = 32.0;
const CHAR_HEIGHT: f32 = 32.0;
const FIRST_GLYPH: u32 = ' ' as u32;

#[derive(Debug, Error, PartialEq)]
pub enum TextError {
    /// Only printable ASCII (code 32 and up) has a glyph cell.
    #[error("character {ch:?} at index {index} has no glyph in the font atlas")]
    UnsupportedCharacter { ch: char, index: usize },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Unscaled glyph quad width in pixels.
#[inline]
pub fn character_width() -> f32 {
    CHAR_WIDTH
}

/// Unscaled glyph quad height in pixels.
#[inline]
pub fn character_height() -> f32 {
    CHAR_HEIGHT
}

/// Horizontal extent in pixels of `text` as [`append_text`] lays it out.
pub fn text_width(text: &str, scale: f32) -> f32 {
    match text.chars().count() {
        0 => 0.0,
        n => (n - 1) as f32 * advance(scale) + CHAR_WIDTH * scale,
    }
}

#[inline]
fn advance(scale: f32) -> f32 {
    CHAR_WIDTH * scale / 2.0
}

/// Appends two screen-space triangles per character of `text`.
///
/// The top-left of the first glyph is at `(x, y)`; the pen moves right by
/// half a glyph width per character. Returns the number of triangles added.
///
/// The whole string is validated first, so on error the batch is untouched.
pub fn append_text(
    batch: &mut Batch<Triangle>,
    atlas: &FontAtlas,
    text: &str,
    x: f32,
    y: f32,
    color: [u8; 4],
    scale: f32,
) -> Result<usize, TextError> {
    if let Some((index, ch)) = text
        .chars()
        .enumerate()
        .find(|&(_, ch)| !ch.is_ascii() || (ch as u32) < FIRST_GLYPH)
    {
        return Err(TextError::UnsupportedCharacter { ch, index });
    }

    let count = text.len() * 2;
    batch.reserve(count)?;

    let (w, h) = (CHAR_WIDTH * scale, CHAR_HEIGHT * scale);
    let mut pen_x = x;

    for byte in text.bytes() {
        let cell = u32::from(byte) - FIRST_GLYPH;
        let step = 1.0 / GLYPHS_PER_ROW as f32;
        let u0 = (cell % GLYPHS_PER_ROW) as f32 * step;
        let v0 = (cell / GLYPHS_PER_ROW) as f32 * step;
        let (u1, v1) = (u0 + step, v0 + step);

        let corner = |px: f32, py: f32, u: f32, v: f32| {
            Vertex::at(px, py, 0.0).with_uv(u, v).with_color(color)
        };
        let top_left = corner(pen_x, y, u0, v0);
        let bottom_left = corner(pen_x, y + h, u0, v1);
        let bottom_right = corner(pen_x + w, y + h, u1, v1);
        let top_right = corner(pen_x + w, y, u1, v0);

        batch.push_copy(&Triangle::textured([top_left, bottom_left, bottom_right], atlas.texture()))?;
        batch.push_copy(&Triangle::textured([top_left, bottom_right, top_right], atlas.texture()))?;

        pen_x += advance(scale);
    }

    Ok(count)
}
