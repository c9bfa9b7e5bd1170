//! Static Host Require
//!
//! In-memory registry implementing the `HostRequire` hook handed to module
//! loaders.

use crate::domain::errors::LoaderError;
use crate::domain::value_objects::ModuleHandle;
use crate::ports::outbound::HostRequire;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

/// Host-side packages registered by name.
#[derive(Default)]
pub struct StaticHostRequire {
    modules: RwLock<HashMap<String, ModuleHandle>>,
}

impl StaticHostRequire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, module: ModuleHandle) -> Option<ModuleHandle> {
        self.modules.write().insert(name.into(), module)
    }

    /// Builder form of [`StaticHostRequire::register`].
    pub fn with_module(self, name: impl Into<String>, module: ModuleHandle) -> Self {
        self.register(name, module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

impl HostRequire for StaticHostRequire {
    fn require(&self, module: &str) -> Result<ModuleHandle, LoaderError> {
        trace!(module, "Host require");
        self.modules
            .read()
            .get(module)
            .cloned()
            .ok_or_else(|| LoaderError::HostModuleNotFound(module.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::AmbientHandle;

    #[test]
    fn test_registered_module_resolves_to_same_handle() {
        let handle = AmbientHandle::new("fs");
        let registry = StaticHostRequire::new().with_module("fs", handle.clone());

        assert_eq!(registry.require("fs").unwrap(), handle);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_module() {
        let registry = StaticHostRequire::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.require("path").unwrap_err(),
            LoaderError::HostModuleNotFound("path".to_string())
        );
    }

    #[test]
    fn test_register_replaces() {
        let registry = StaticHostRequire::new();
        let first = AmbientHandle::new(1u8);
        assert!(registry.register("m", first.clone()).is_none());
        assert_eq!(registry.register("m", AmbientHandle::new(2u8)), Some(first));
        assert!(registry.contains("m"));
    }
}
