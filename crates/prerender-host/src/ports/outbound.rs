//! Outbound Ports (Driven Ports / SPI)
//!
//! The external collaborators an app instance drives: the DOM builder, the
//! module loader, the MVC framework's history, the config source and the
//! host-side require hook.

use crate::algorithms::config_patcher::PatchedConfig;
use crate::algorithms::overlay::GlobalOverlay;
use crate::domain::errors::{DomError, LoaderError, RoutingError};
use crate::domain::value_objects::{AmbientHandle, ModuleHandle, Window};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Builds documents from markup.
pub trait DomBuilder: Send + Sync {
    /// Parse `html` into a fresh document.
    fn build(&self, html: &str) -> Result<Arc<dyn DocumentHandle>, DomError>;
}

/// A document owned by exactly one app instance.
pub trait DocumentHandle: Send + Sync {
    /// Create the window hosting this document.
    fn create_window(&self) -> Window;

    /// Serialized markup of the whole document.
    fn inner_html(&self) -> String;
}

/// Creates configured module loaders.
pub trait LoaderFactory: Send + Sync {
    /// Configure a fresh loader.
    ///
    /// The overlay is the loader's view of the ambient globals: module code
    /// evaluated by the loader reads `window` and friends from it.
    fn configure(
        &self,
        config: &PatchedConfig,
        overlay: Arc<GlobalOverlay>,
    ) -> Result<Arc<dyn ModuleLoader>, LoaderError>;
}

/// A configured module loader.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Resolve `modules`, in order, once all of them are ready.
    async fn load(&self, modules: &[String]) -> Result<Vec<ModuleHandle>, LoaderError>;
}

/// The host's own module resolver, handed to the loader so loader-internal
/// modules can still reach host-side packages.
pub trait HostRequire: Send + Sync {
    fn require(&self, module: &str) -> Result<ModuleHandle, LoaderError>;
}

/// Reads loader configuration sources.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Read the source text at `path`, relative to the host root.
    async fn read(&self, path: &str) -> std::io::Result<String>;
}

/// The MVC framework module, as carried inside its module handle.
///
/// The framework module handle must wrap an `Arc<dyn Framework>`.
pub trait Framework: Send + Sync {
    /// Assign the DOM library onto the framework's static binding slot.
    fn set_dom_library(&self, dom_library: ModuleHandle);

    /// The framework's history singleton.
    fn history(&self) -> Arc<dyn HistoryBackend>;
}

/// Accepts or rejects URL fragments for one route.
pub trait RouteMatcher: Send + Sync {
    /// The route as registered.
    fn pattern(&self) -> &str;

    fn matches(&self, fragment: &str) -> bool;
}

/// One registered route.
#[derive(Clone)]
pub struct RouteHandler {
    pub route: Arc<dyn RouteMatcher>,
}

impl RouteHandler {
    pub fn new(route: Arc<dyn RouteMatcher>) -> Self {
        Self { route }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("route", &self.route.pattern())
            .finish()
    }
}

/// Options for starting history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryOptions {
    /// Use `pushState` URLs instead of hash fragments.
    pub push_state: bool,
    /// Root path the application is served from.
    pub root: Option<String>,
    /// Do not run the route for the current URL on start.
    pub silent: bool,
}

/// The framework's history singleton, unpatched.
pub trait HistoryBackend: Send + Sync {
    fn set_location(&self, location: AmbientHandle);

    fn set_history(&self, history: AmbientHandle);

    /// Registered routes in lookup order.
    fn handlers(&self) -> Vec<RouteHandler>;

    /// Start listening; returns whether a route matched the current URL.
    fn start(&self, options: &HistoryOptions) -> Result<bool, RoutingError>;

    fn stop(&self);

    /// Navigate to `fragment`; with `trigger` the route handler runs.
    /// Returns whether a route matched.
    fn navigate(&self, fragment: &str, trigger: bool) -> bool;
}

/// Server-safe routing surface an app instance depends on.
pub trait RoutingBackend: Send + Sync {
    fn handlers(&self) -> Vec<RouteHandler>;

    fn start(&self, options: &HistoryOptions) -> Result<bool, RoutingError>;

    fn stop(&self);

    fn navigate(&self, fragment: &str, trigger: bool) -> bool;
}
