use std::cell::Cell;
use std::rc::Rc;

use raw_window_handle::RawWindowHandle;

use super::{Backend, InitParams, Version, INTERFACE_VERSION};
use crate::error::{ErrorChannel, ErrorRecord, RenderResult};
use crate::polygon::{Texture, TextureId, Triangle};
use crate::window::MessageHandler;

/// Lifecycle position of an [`Interface`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Running,
    Releasing,
    /// Terminal. A released interface cannot be initialized again.
    Released,
}

/// Clears the registry's "interface active" flag when dropped.
#[derive(Debug)]
pub(super) struct ActiveSlot(pub(super) Rc<Cell<bool>>);

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Handle to one backend.
///
/// Forwarding rules:
/// - `initialize` only from `Uninitialized`; failure rolls back to `Uninitialized`
/// - `release` only from `Running`; afterwards the handle is `Released` for good
/// - every other call is forwarded only while `Running`, otherwise it is
///   ignored and a `NativeApiCallFailed` record is queued
///
/// Queries (`name`, `version`, `state`, `is_open`, `window_handle`) never
/// record errors. Dropping a running interface releases its backend.
pub struct Interface {
    backend: Box<dyn Backend>,
    state: BackendState,
    slot: Option<ActiveSlot>,
}

impl Interface {
    /// Wraps a backend that did not come from a [`Registry`](super::Registry).
    pub fn from_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            state: BackendState::Uninitialized,
            slot: None,
        }
    }

    pub(super) fn with_slot(backend: Box<dyn Backend>, slot: ActiveSlot) -> Self {
        Self {
            backend,
            state: BackendState::Uninitialized,
            slot: Some(slot),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.backend.version()
    }

    #[inline]
    pub fn state(&self) -> BackendState {
        self.state
    }

    /// Read-only access to the backend, for downcasting through `as_any`.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Brings the backend up. Returns `true` once it is running.
    pub fn initialize(&mut self, params: &InitParams, errors: &mut ErrorChannel) -> bool {
        if self.state != BackendState::Uninitialized {
            errors.push(ErrorRecord::api_call(format!(
                "initialize called on a {:?} interface",
                self.state
            )));
            return false;
        }

        let version = self.backend.version();
        if !version.is_compatible() {
            errors.push(ErrorRecord::api_call(format!(
                "backend '{}' {version} is incompatible with interface {INTERFACE_VERSION}",
                self.backend.name()
            )));
            return false;
        }

        self.state = BackendState::Initializing;
        log::info!(
            "initializing '{}' backend: {}x{}x{}, vsync {}, device {}",
            self.backend.name(),
            params.width,
            params.height,
            params.bits_per_pixel,
            if params.vsync { "on" } else { "off" },
            params.device_index
        );

        match self.backend.initialize(params, errors) {
            Ok(()) => {
                self.state = BackendState::Running;
                log::info!("'{}' backend running", self.backend.name());
                true
            }
            Err(record) => {
                log::error!("'{}' backend failed to initialize: {record}", self.backend.name());
                errors.push(record);
                self.state = BackendState::Uninitialized;
                false
            }
        }
    }

    /// Shuts the backend down. Returns `true` if it released cleanly.
    ///
    /// The interface ends up `Released` even if the backend reports a failure.
    pub fn release(&mut self, errors: &mut ErrorChannel) -> bool {
        if self.state != BackendState::Running {
            errors.push(ErrorRecord::api_call(format!(
                "release called on a {:?} interface",
                self.state
            )));
            return false;
        }

        match self.release_backend() {
            Ok(()) => true,
            Err(record) => {
                errors.push(record);
                false
            }
        }
    }

    /// `false` unless running with an open window.
    pub fn is_open(&self) -> bool {
        self.state == BackendState::Running && self.backend.is_open()
    }

    pub fn window_handle(&self) -> Option<RawWindowHandle> {
        if self.state == BackendState::Running {
            self.backend.window_handle()
        } else {
            None
        }
    }

    pub fn set_message_handler(&mut self, handler: MessageHandler, errors: &mut ErrorChannel) -> bool {
        if !self.check_running("set_message_handler", errors) {
            return false;
        }
        self.backend.set_message_handler(handler);
        true
    }

    pub fn process_events(&mut self, errors: &mut ErrorChannel) -> bool {
        self.forward("process_events", errors, |b| b.process_events())
    }

    pub fn flip_surface(&mut self, errors: &mut ErrorChannel) -> bool {
        self.forward("flip_surface", errors, |b| b.flip_surface())
    }

    pub fn clear_frame(&mut self, errors: &mut ErrorChannel) -> bool {
        self.forward("clear_frame", errors, |b| b.clear_frame())
    }

    pub fn upload_texture(&mut self, id: TextureId, texture: &Texture, errors: &mut ErrorChannel) -> bool {
        self.forward("upload_texture", errors, |b| b.upload_texture(id, texture))
    }

    pub fn update_texture(&mut self, id: TextureId, texture: &Texture, errors: &mut ErrorChannel) -> bool {
        self.forward("update_texture", errors, |b| b.update_texture(id, texture))
    }

    pub fn purge_textures(&mut self, errors: &mut ErrorChannel) -> bool {
        self.forward("purge_textures", errors, |b| b.purge_textures())
    }

    pub fn draw_triangles(&mut self, triangles: &[Triangle], errors: &mut ErrorChannel) -> bool {
        self.forward("draw_triangles", errors, |b| b.draw_triangles(triangles))
    }

    fn check_running(&self, call: &str, errors: &mut ErrorChannel) -> bool {
        if self.state == BackendState::Running {
            return true;
        }
        errors.push(ErrorRecord::api_call(format!(
            "{call} ignored: interface is {:?}",
            self.state
        )));
        false
    }

    fn forward(
        &mut self,
        call: &str,
        errors: &mut ErrorChannel,
        f: impl FnOnce(&mut dyn Backend) -> RenderResult<()>,
    ) -> bool {
        if !self.check_running(call, errors) {
            return false;
        }
        match f(self.backend.as_mut()) {
            Ok(()) => true,
            Err(record) => {
                errors.push(record);
                false
            }
        }
    }

    fn release_backend(&mut self) -> RenderResult<()> {
        self.state = BackendState::Releasing;
        log::info!("releasing '{}' backend", self.backend.name());
        let result = self.backend.release();
        self.state = BackendState::Released;
        self.slot = None;
        result
    }
}

impl Drop for Interface {
    fn drop(&mut self) {
        if self.state == BackendState::Running {
            if let Err(record) = self.release_backend() {
                log::warn!("release on drop failed: {record}");
            }
        }
    }
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("backend", &self.backend.name())
            .field("version", &self.backend.version())
            .field("state", &self.state)
            .finish()
    }
}
