//! Configuration types for the prerender host

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default module name of the DOM library.
pub const DEFAULT_DOM_LIBRARY: &str = "jquery";
/// Default module name of the MVC framework.
pub const DEFAULT_FRAMEWORK: &str = "backbone";
/// Default prefix for generated context labels.
pub const DEFAULT_CONTEXT_PREFIX: &str = "prerender";

/// Runtime configuration shared by all instances of a host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory config paths are resolved against
    pub host_root: PathBuf,

    /// Module loaded with `window` interposed
    pub dom_library_module: String,

    /// Module patched for server-side routing
    pub framework_module: String,

    /// Generate a unique context label for instances created without one
    pub auto_context: bool,

    /// Prefix of generated context labels (`<prefix>-<n>`)
    pub context_prefix: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host_root: PathBuf::from("."),
            dom_library_module: DEFAULT_DOM_LIBRARY.to_string(),
            framework_module: DEFAULT_FRAMEWORK.to_string(),
            auto_context: false,
            context_prefix: DEFAULT_CONTEXT_PREFIX.to_string(),
        }
    }
}

impl HostConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PRERENDER_HOST_ROOT`: Config path root (default: .)
    /// - `PRERENDER_DOM_LIBRARY`: DOM library module (default: jquery)
    /// - `PRERENDER_FRAMEWORK`: Framework module (default: backbone)
    /// - `PRERENDER_AUTO_CONTEXT`: Generate context labels (default: false)
    /// - `PRERENDER_CONTEXT_PREFIX`: Generated label prefix (default: prerender)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            host_root: non_empty("PRERENDER_HOST_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.host_root),

            dom_library_module: non_empty("PRERENDER_DOM_LIBRARY")
                .unwrap_or(defaults.dom_library_module),

            framework_module: non_empty("PRERENDER_FRAMEWORK")
                .unwrap_or(defaults.framework_module),

            auto_context: non_empty("PRERENDER_AUTO_CONTEXT")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.auto_context),

            context_prefix: non_empty("PRERENDER_CONTEXT_PREFIX")
                .unwrap_or(defaults.context_prefix),
        }
    }

    /// Generated context label for the `n`th instance.
    pub fn context_label(&self, n: u64) -> String {
        format!("{}-{}", self.context_prefix, n)
    }
}
