use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::handle::ActiveSlot;
use super::{Backend, Interface, Version, INTERFACE_VERSION};
use crate::error::{ErrorChannel, ErrorRecord};

/// Builds a fresh, uninitialized backend.
pub type BackendFactory = Box<dyn Fn() -> Box<dyn Backend>>;

struct Entry {
    version: Version,
    factory: BackendFactory,
}

/// Name-keyed table of backend factories.
///
/// At most one [`Interface`] created by a registry may be live at a time; it
/// stops counting once released or dropped.
pub struct Registry {
    entries: BTreeMap<String, Entry>,
    active: Rc<Cell<bool>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            active: Rc::new(Cell::new(false)),
        }
    }

    /// A registry holding every backend compiled into this crate.
    pub fn with_builtin_backends() -> Self {
        use crate::backend::software::SoftwareBackend;

        let mut registry = Self::new();
        registry.register(SoftwareBackend::NAME, SoftwareBackend::VERSION, || {
            Box::new(SoftwareBackend::new())
        });

        #[cfg(feature = "wgpu")]
        {
            use crate::backend::wgpu::WgpuBackend;
            registry.register(WgpuBackend::NAME, WgpuBackend::VERSION, || {
                Box::new(WgpuBackend::new(Default::default()))
            });
        }

        registry
    }

    /// Adds or replaces the backend registered under `name`.
    ///
    /// `version` must be what the factory's backends report; it is checked
    /// before the factory is ever invoked.
    pub fn register<F>(&mut self, name: impl Into<String>, version: Version, factory: F)
    where
        F: Fn() -> Box<dyn Backend> + 'static,
    {
        let name = name.into();
        log::debug!("registering backend '{name}' {version}");
        self.entries.insert(
            name,
            Entry {
                version,
                factory: Box::new(factory),
            },
        );
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// `true` while an interface from this registry is live and not released.
    pub fn has_active_interface(&self) -> bool {
        self.active.get()
    }

    /// Instantiates the backend registered under `name`.
    ///
    /// Returns `None`, with exactly one `NativeApiCallFailed` record queued, if
    /// the name is unknown, the backend's major version is incompatible, or
    /// another interface is still active. Nothing is acquired in those cases.
    pub fn create_interface(&self, name: &str, errors: &mut ErrorChannel) -> Option<Interface> {
        let Some(entry) = self.entries.get(name) else {
            errors.push(ErrorRecord::api_call(format!("unknown backend '{name}'")));
            return None;
        };

        if !entry.version.is_compatible() {
            errors.push(ErrorRecord::api_call(format!(
                "backend '{name}' {} is incompatible with interface {INTERFACE_VERSION}",
                entry.version
            )));
            return None;
        }

        if self.active.get() {
            errors.push(ErrorRecord::api_call(format!(
                "cannot create '{name}': another interface is still active"
            )));
            return None;
        }

        let backend = (entry.factory)();
        self.active.set(true);
        log::debug!("created '{name}' interface");
        Some(Interface::with_slot(backend, ActiveSlot(self.active.clone())))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtin_backends()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::interface::handle::tests::{StageLog, StagedBackend};
    use crate::interface::{BackendState, InitParams};

    fn registry_with_counter() -> (Registry, Rc<Cell<u32>>, Rc<StageLog>) {
        let built = Rc::new(Cell::new(0));
        let log = Rc::new(StageLog::default());
        let mut registry = Registry::new();

        let (b, l) = (built.clone(), log.clone());
        registry.register("staged", INTERFACE_VERSION, move || {
            b.set(b.get() + 1);
            Box::new(StagedBackend::new(l.clone()))
        });

        let b = built.clone();
        registry.register("future", Version::new(INTERFACE_VERSION.major + 1, 0, 0), move || {
            b.set(b.get() + 1);
            Box::new(StagedBackend::new(Rc::new(StageLog::default())))
        });

        (registry, built, log)
    }

    #[test]
    fn unknown_backend_reports_once_and_builds_nothing() {
        let (registry, built, log) = registry_with_counter();
        let mut errors = ErrorChannel::new();

        assert!(registry.create_interface("glide", &mut errors).is_none());

        let drained = errors.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind, ErrorKind::NativeApiCallFailed);
        assert_eq!(built.get(), 0);
        assert!(log.take().is_empty());
        assert!(!registry.has_active_interface());
    }

    #[test]
    fn version_gate_runs_before_factory() {
        let (registry, built, _log) = registry_with_counter();
        let mut errors = ErrorChannel::new();

        assert!(registry.create_interface("future", &mut errors).is_none());
        assert_eq!(built.get(), 0);
        assert_eq!(errors.drain().len(), 1);
    }

    #[test]
    fn only_one_interface_is_active_at_a_time() {
        let (registry, built, _log) = registry_with_counter();
        let mut errors = ErrorChannel::new();

        let mut first = registry.create_interface("staged", &mut errors).unwrap();
        assert!(registry.has_active_interface());
        assert!(registry.create_interface("staged", &mut errors).is_none());
        assert_eq!(errors.drain().len(), 1);

        assert!(first.initialize(&InitParams::default(), &mut errors));
        assert!(first.release(&mut errors));
        assert_eq!(first.state(), BackendState::Released);
        assert!(!registry.has_active_interface());

        let second = registry.create_interface("staged", &mut errors).unwrap();
        drop(second);
        assert!(!registry.has_active_interface());
        assert!(registry.create_interface("staged", &mut errors).is_some());
        assert_eq!(built.get(), 3);
    }

    #[test]
    fn builtin_registry_has_the_software_backend() {
        let registry = Registry::with_builtin_backends();
        assert!(registry.contains("software"));
        #[cfg(feature = "wgpu")]
        assert!(registry.backend_names().any(|n| n == "wgpu"));
    }
}
