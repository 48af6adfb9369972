//! Platform-agnostic window messages.
//!
//! Backends translate their native window events into [`WindowMessage`]s and
//! hand them to the installed [`MessageHandler`] from `process_events`.

mod message;

pub use message::{Key, MessageHandler, WindowMessage};
