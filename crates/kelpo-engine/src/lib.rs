//! Kelpo engine crate.
//!
//! Backend-agnostic triangle rendering: CPU-side batching and the
//! world → clip → screen transform pipeline, a text-mesh generator, and a
//! versioned backend interface with a software and a `wgpu` implementation.
//!
//! Typical frame:
//! 1. duplicate the source mesh into a world batch, rotate/translate it
//! 2. project the world batch into a screen batch, append text
//! 3. `clear_frame`, `draw_triangles(&screen)`, `flip_surface`

pub mod backend;
pub mod batch;
pub mod error;
pub mod interface;
pub mod polygon;
pub mod text;
pub mod transform;
pub mod window;

pub mod logging;
pub mod time;

pub use batch::{Batch, BatchError};
pub use error::{ErrorChannel, ErrorKind, ErrorRecord, Feature};
pub use interface::{Backend, BackendState, InitParams, Interface, Registry, Version};
pub use polygon::{Rgba5551, Texture, TextureId, TextureRegistry, Triangle, Vertex};
