use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::polygon::{Texture, TextureError, TextureId, TextureRegistry};

/// Glyph cells per atlas row (and per column).
pub const GLYPHS_PER_ROW: u32 = 16;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font image of {bytes} bytes is not a square RGB888 image")]
    NotSquare { bytes: usize },

    #[error("font image side {side} is not a multiple of 16")]
    BadSide { side: u32 },

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("failed to read font image {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads a font atlas image from disk and converts it to a texture.
pub fn build_font_atlas(path: impl AsRef<Path>) -> Result<Texture, FontError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    build_font_atlas_from_bytes(&bytes)
}

/// Converts in-memory RGB888 atlas bytes; the side length is inferred.
pub fn build_font_atlas_from_bytes(bytes: &[u8]) -> Result<Texture, FontError> {
    let side = square_side(bytes.len()).ok_or(FontError::NotSquare { bytes: bytes.len() })?;
    if side % GLYPHS_PER_ROW != 0 {
        return Err(FontError::BadSide { side });
    }

    let texture = Texture::create_from_rgb888(side, side, bytes)?;
    log::debug!("font atlas built: {side}x{side}");
    Ok(texture)
}

fn square_side(len: usize) -> Option<u32> {
    if len == 0 || len % 3 != 0 {
        return None;
    }
    let pixels = len / 3;
    let side = (pixels as f64).sqrt().round() as usize;
    (side * side == pixels).then(|| u32::try_from(side).ok()).flatten()
}

/// A font atlas that lives in a [`TextureRegistry`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FontAtlas {
    texture: TextureId,
    side: u32,
}

impl FontAtlas {
    /// Loads the image at `path` and registers it.
    pub fn load(path: impl AsRef<Path>, textures: &mut TextureRegistry) -> Result<Self, FontError> {
        let texture = build_font_atlas(path)?;
        Ok(Self::register(texture, textures))
    }

    /// Registers an already-built atlas texture.
    pub fn register(texture: Texture, textures: &mut TextureRegistry) -> Self {
        let side = texture.width();
        Self {
            texture: textures.insert(texture),
            side,
        }
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Side length of the atlas image in pixels.
    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Side length of one glyph cell in atlas pixels.
    #[inline]
    pub fn cell_side(&self) -> u32 {
        self.side / GLYPHS_PER_ROW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_is_inferred_from_length() {
        let tex = build_font_atlas_from_bytes(&vec![0u8; 32 * 32 * 3]).unwrap();
        assert_eq!((tex.width(), tex.height()), (32, 32));
    }

    #[test]
    fn rejects_non_square_and_bad_side() {
        assert!(matches!(
            build_font_atlas_from_bytes(&[0u8; 10]),
            Err(FontError::NotSquare { bytes: 10 })
        ));
        assert!(matches!(
            build_font_atlas_from_bytes(&vec![0u8; 20 * 20 * 3]),
            Err(FontError::BadSide { side: 20 })
        ));
        assert!(matches!(
            build_font_atlas_from_bytes(&[]),
            Err(FontError::NotSquare { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = build_font_atlas("/definitely/not/here/font.raw").unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn register_keeps_side_and_id() {
        let mut textures = TextureRegistry::new();
        let tex = build_font_atlas_from_bytes(&vec![255u8; 16 * 16 * 3]).unwrap();
        let atlas = FontAtlas::register(tex, &mut textures);

        assert_eq!(atlas.side(), 16);
        assert_eq!(atlas.cell_side(), 1);
        assert!(textures.contains(atlas.texture()));
    }
}
