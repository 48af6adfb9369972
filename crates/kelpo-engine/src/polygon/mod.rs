//! Polygon data model shared by the pipeline and every backend.
//!
//! - `Vertex`: homogeneous position, normal, texture coordinates, 8-bit color
//! - `Triangle`: three vertices plus an optional texture handle
//! - `Texture`: packed 16-bit (5-5-5-1) pixels with a mip chain
//! - `TextureRegistry`: owner of textures, hands out generational `TextureId`s

mod color;
mod texture;
mod triangle;
mod vertex;

pub use color::Rgba5551;
pub use texture::{Texture, TextureError, TextureId, TextureRegistry};
pub use triangle::Triangle;
pub use vertex::Vertex;
