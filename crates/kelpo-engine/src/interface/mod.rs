//! Backend abstraction.
//!
//! A [`Backend`] is one implementation of the rendering capability table (a
//! native graphics API, or the CPU). Applications never hold a backend
//! directly: a [`Registry`] maps names to backend factories and hands out an
//! [`Interface`], which enforces the lifecycle
//! `Uninitialized → Initializing → Running → Releasing → Released`.
//!
//! Failures never abort. They are returned from backend calls as
//! [`ErrorRecord`](crate::error::ErrorRecord)s and queued by the interface in the
//! caller's [`ErrorChannel`](crate::error::ErrorChannel).

mod backend;
mod handle;
mod params;
mod registry;
mod version;

pub use backend::Backend;
pub use handle::{BackendState, Interface};
pub use params::InitParams;
pub use registry::{BackendFactory, Registry};
pub use version::{Version, INTERFACE_VERSION};
