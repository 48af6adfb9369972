use super::{TextureId, Vertex};

/// Three vertices and an optional texture.
///
/// The texture is a handle, not an owner: triangles are copied by value far
/// more often than textures change, and a stale handle simply fails to resolve.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub texture: Option<TextureId>,
}

impl Triangle {
    #[inline]
    pub const fn new(vertices: [Vertex; 3]) -> Self {
        Self {
            vertices,
            texture: None,
        }
    }

    #[inline]
    pub const fn textured(vertices: [Vertex; 3], texture: TextureId) -> Self {
        Self {
            vertices,
            texture: Some(texture),
        }
    }

    #[inline]
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }
}
