//! Built-in backends.
//!
//! Both are reachable through [`Registry::with_builtin_backends`](crate::interface::Registry::with_builtin_backends);
//! the concrete types are public for callers that want to downcast an
//! [`Interface`](crate::interface::Interface) to read back backend state.

pub mod software;

#[cfg(feature = "wgpu")]
pub mod wgpu;
