//! Object → world → clip → screen transform pipeline.
//!
//! Per-frame relay (three batches):
//! - `source`: immutable mesh, loaded once
//! - `world`: cleared, refilled with [`duplicate`], then rotated/translated in place
//! - `screen`: cleared, refilled by [`project_to_screen`], handed to the backend
//!
//! No clipping is done here. Triangles are passed through even if they extend
//! outside the viewport; only triangles with a vertex behind the eye (clip
//! `w <= 0`) are dropped, see [`project_to_screen`].

mod matrix;
mod pipeline;

pub use matrix::{clip_space_matrix, model_matrix, screen_space_matrix};
pub use pipeline::{duplicate, project_to_screen, rotate, transform, translate, ProjectionStats};
