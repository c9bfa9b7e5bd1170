//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::HostError;
use crate::domain::value_objects::{ModuleHandle, RouteMatch};
use async_trait::async_trait;

/// Primary app instance API
#[async_trait]
pub trait AppInstanceApi: Send + Sync {
    /// Initialize the instance.
    ///
    /// This is the main entry point. It:
    /// 1. Builds a fresh document from the template
    /// 2. Waits for the initialization slot
    /// 3. Reads and patches the loader configuration
    /// 4. Loads the DOM library with `window` interposed
    /// 5. Loads and patches the framework
    /// 6. Loads the root dependencies
    async fn init(&mut self) -> Result<(), HostError>;

    /// Load modules through the instance's configured loader.
    async fn require(&self, modules: &[String]) -> Result<Vec<ModuleHandle>, HostError>;

    /// First registered route accepting `path`.
    fn route_exists(&self, path: &str) -> Option<RouteMatch>;

    /// Run the route handler for `path`, if a registered route accepts it.
    ///
    /// Navigation is not queued behind other instances' initialization. If
    /// another instance is loading its DOM library at the same moment, its
    /// `window` is already installed and the handler sees that value instead
    /// of this instance's.
    fn navigate(&self, path: &str) -> bool;

    /// Serialized markup of the current document; empty before `init`.
    fn get_html(&self) -> String;

    /// Navigate to `path` and return the resulting markup.
    ///
    /// Returns `None` when no registered route accepts `path`. Shares the
    /// ambient `window` caveat of [`AppInstanceApi::navigate`].
    fn snapshot(&self, path: &str) -> Result<Option<String>, HostError>;
}
