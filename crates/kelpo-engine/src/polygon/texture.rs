use std::io::Read;

use thiserror::Error;

use super::Rgba5551;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture dimensions must be non-zero (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel stream too short: expected {expected} bytes, got {actual}")]
    TruncatedSource { expected: usize, actual: usize },

    #[error("failed to read pixel stream")]
    Io(#[from] std::io::Error),
}

/// Raster image in the packed 5-5-5-1 format every backend consumes.
///
/// `levels[0]` is full resolution; each further level halves the side length.
/// A level may be emptied with [`Texture::release_pixels`] once a backend holds
/// its own copy; metadata stays valid so the texture can still be identified.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    levels: Vec<Vec<Rgba5551>>,
}

impl Texture {
    /// Converts `width * height` RGB888 triplets (row-major) into level 0.
    ///
    /// Extra trailing bytes are ignored.
    pub fn create_from_rgb888(width: u32, height: u32, pixels: &[u8]) -> Result<Self, TextureError> {
        let count = pixel_count(width, height)?;
        let expected = count * 3;
        if pixels.len() < expected {
            return Err(TextureError::TruncatedSource {
                expected,
                actual: pixels.len(),
            });
        }

        let level0 = pixels[..expected]
            .chunks_exact(3)
            .map(|px| Rgba5551::from_rgb888(px[0], px[1], px[2]))
            .collect();

        Ok(Self {
            width,
            height,
            levels: vec![level0],
        })
    }

    /// Streams `width * height` RGB888 triplets from `reader`.
    pub fn create_from_rgb888_reader<R: Read>(
        width: u32,
        height: u32,
        mut reader: R,
    ) -> Result<Self, TextureError> {
        let expected = pixel_count(width, height)? * 3;
        let mut buf = Vec::with_capacity(expected);
        reader.by_ref().take(expected as u64).read_to_end(&mut buf)?;
        Self::create_from_rgb888(width, height, &buf)
    }

    /// Builds a texture from already-packed levels.
    ///
    /// Returns `None` if no level is given or a level's size does not match its
    /// expected side length.
    pub fn from_levels(width: u32, height: u32, levels: Vec<Vec<Rgba5551>>) -> Option<Self> {
        if levels.is_empty() || width == 0 || height == 0 {
            return None;
        }
        let tex = Self { width, height, levels };
        let sizes_match = tex.levels.iter().enumerate().all(|(m, level)| {
            let (w, h) = tex.mip_size(m as u32);
            level.len() == (w as usize) * (h as usize)
        });
        sizes_match.then_some(tex)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of mip levels (always at least 1).
    #[inline]
    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Side lengths of mip level `level` (never below 1).
    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        let shift = level.min(31);
        ((self.width >> shift).max(1), (self.height >> shift).max(1))
    }

    /// Pixels of mip level `level`. Empty after [`Texture::release_pixels`].
    pub fn level(&self, level: u32) -> Option<&[Rgba5551]> {
        self.levels.get(level as usize).map(Vec::as_slice)
    }

    pub fn level_mut(&mut self, level: u32) -> Option<&mut [Rgba5551]> {
        self.levels.get_mut(level as usize).map(Vec::as_mut_slice)
    }

    /// `true` while every level still holds its pixel storage.
    pub fn has_pixels(&self) -> bool {
        self.levels.iter().all(|l| !l.is_empty())
    }

    /// Frees pixel storage of every level, keeping dimensions and level count.
    pub fn release_pixels(&mut self) {
        for level in &mut self.levels {
            *level = Vec::new();
        }
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize, TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize)
}

/// Handle to a texture in a [`TextureRegistry`].
///
/// The generation makes handles to released textures fail to resolve even if
/// the slot has been reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId {
    index: u32,
    generation: u32,
}

impl TextureId {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct Slot {
    generation: u32,
    texture: Option<Texture>,
}

/// Owner of all textures referenced by triangles.
#[derive(Default)]
pub struct TextureRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `texture` and returns its handle.
    pub fn insert(&mut self, texture: Texture) -> TextureId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.texture = Some(texture);
            return TextureId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            texture: Some(texture),
        });
        TextureId { index, generation: 0 }
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.texture.as_ref())
    }

    pub fn get_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.texture.as_mut())
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.get(id).is_some()
    }

    /// Releases a texture. The handle, and every copy of it, stops resolving.
    pub fn release(&mut self, id: TextureId) -> Option<Texture> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?;

        let texture = slot.texture.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(texture)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.texture.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates live textures with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &Texture)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.texture.as_ref().map(|t| {
                (
                    TextureId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    t,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_image_packs_to_zero() {
        let tex = Texture::create_from_rgb888(4, 2, &[0u8; 4 * 2 * 3]).unwrap();
        assert_eq!(tex.mip_level_count(), 1);
        let level0 = tex.level(0).unwrap();
        assert_eq!(level0.len(), 8);
        assert!(level0.iter().all(|p| p.raw() == 0 && !p.alpha()));
    }

    #[test]
    fn full_red_sets_alpha_everywhere() {
        let pixels: Vec<u8> = std::iter::repeat([255u8, 0, 0]).take(9).flatten().collect();
        let tex = Texture::create_from_rgb888(3, 3, &pixels).unwrap();
        assert!(tex.level(0).unwrap().iter().all(|p| p.alpha() && p.red() == 31));
    }

    #[test]
    fn pixels_are_row_major() {
        // 2x1: red then blue.
        let tex = Texture::create_from_rgb888(2, 1, &[255, 0, 0, 0, 0, 255]).unwrap();
        let level0 = tex.level(0).unwrap();
        assert_eq!(level0[0], Rgba5551::from_rgb888(255, 0, 0));
        assert_eq!(level0[1], Rgba5551::from_rgb888(0, 0, 255));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let err = Texture::create_from_rgb888(2, 2, &[0u8; 11]).unwrap_err();
        assert!(matches!(err, TextureError::TruncatedSource { expected: 12, actual: 11 }));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Texture::create_from_rgb888(0, 4, &[]),
            Err(TextureError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn reader_variant_matches_slice_variant() {
        let pixels: Vec<u8> = (0..48u8).collect();
        let a = Texture::create_from_rgb888(4, 4, &pixels).unwrap();
        let b = Texture::create_from_rgb888_reader(4, 4, std::io::Cursor::new(&pixels)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn release_pixels_keeps_metadata() {
        let mut tex = Texture::create_from_rgb888(2, 2, &[7u8; 12]).unwrap();
        tex.release_pixels();
        assert!(!tex.has_pixels());
        assert_eq!((tex.width(), tex.height(), tex.mip_level_count()), (2, 2, 1));
        assert_eq!(tex.level(0).map(<[_]>::len), Some(0));
    }

    #[test]
    fn from_levels_validates_mip_chain() {
        let l0 = vec![Rgba5551::default(); 16];
        let l1 = vec![Rgba5551::default(); 4];
        let l2 = vec![Rgba5551::default(); 1];
        let tex = Texture::from_levels(4, 4, vec![l0.clone(), l1, l2]).unwrap();
        assert_eq!(tex.mip_level_count(), 3);
        assert_eq!(tex.mip_size(2), (1, 1));

        assert!(Texture::from_levels(4, 4, vec![l0, vec![Rgba5551::default(); 3]]).is_none());
        assert!(Texture::from_levels(4, 4, Vec::new()).is_none());
    }

    #[test]
    fn registry_handles_go_stale_after_release() {
        let mut reg = TextureRegistry::new();
        let tex = Texture::create_from_rgb888(1, 1, &[1, 2, 3]).unwrap();

        let a = reg.insert(tex.clone());
        assert!(reg.contains(a));
        assert!(reg.release(a).is_some());
        assert!(!reg.contains(a));
        assert!(reg.release(a).is_none());

        // Slot is reused with a new generation; the old handle stays dead.
        let b = reg.insert(tex);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(reg.get(a).is_none());
        assert!(reg.get(b).is_some());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![b]);
    }
}
