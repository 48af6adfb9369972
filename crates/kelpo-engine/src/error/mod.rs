//! Error reporting channel.
//!
//! Every component reports structured failures here instead of aborting:
//! - `ErrorKind` enumerates what went wrong (with stable numeric codes)
//! - `ErrorRecord` pairs a kind with optional free-form context
//! - `ErrorChannel` is a bounded FIFO that never grows past its capacity
//!
//! `ErrorRecord` also serves as the error type returned by backend calls, so a
//! failure can be propagated with `?` and then queued by the interface layer.

mod channel;
mod kind;

pub use channel::{ErrorChannel, DEFAULT_ERROR_CAPACITY};
pub use kind::{ErrorKind, ErrorRecord, Feature, RenderResult};
