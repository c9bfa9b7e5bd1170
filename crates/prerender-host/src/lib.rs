//! # Prerender Host
//!
//! Runs several instances of a browser single-page application inside one
//! server process so each can render static HTML snapshots.
//!
//! The application code assumes it owns the process: it loads once and reads
//! `window`, `document`, `navigator` and `history` as globals. The host makes
//! that assumption hold for one instance at a time:
//!
//! - **Initialization Serializer**: instances initialize one after another,
//!   in request order
//! - **Global Overlay**: ambient bindings are installed around each call that
//!   needs them, reference counted so nested calls agree on one value
//! - **Configuration Patcher**: the loader config is rewritten so the app's
//!   root modules load only after the framework is patched for the server
//!
//! ## Architecture
//!
//! - **Domain**: Settings, handles, errors and invariants
//! - **Algorithms**: Overlay, relaxed literal parser, config patcher, serializer
//! - **Ports**: Inbound (AppInstanceApi) and Outbound (DomBuilder, LoaderFactory,
//!   ModuleLoader, ConfigSource, HostRequire, Framework, HistoryBackend, RoutingBackend)
//! - **Adapters**: FsConfigSource, OverlayRoutingBackend, PatternRoute, StaticHostRequire
//! - **Application**: HostContext and the AppInstance service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prerender_host::{AppInstanceApi, HostConfig, HostContext};
//! use std::sync::Arc;
//!
//! let host = Arc::new(HostContext::with_fs_config(HostConfig::from_env(), dom, loaders));
//! let mut app = host.create_instance(template, "public/js/config.js", None);
//! app.init().await?;
//! if let Some(html) = app.snapshot("users/42")? {
//!     // serve html
//! }
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use adapters::{FsConfigSource, OverlayRoutingBackend, PatternRoute, StaticHostRequire};
pub use algorithms::{
    patch_config, Admission, Bindings, GlobalOverlay, InitPermit, InitSerializer, OverlayGuard,
    PatchedConfig,
};
pub use application::{AppInstance, HostCollaborators, HostContext};
pub use config::HostConfig;
pub use domain::entities::*;
pub use domain::errors::*;
pub use domain::value_objects::*;
pub use ports::inbound::AppInstanceApi;
pub use ports::outbound::{
    ConfigSource, DocumentHandle, DomBuilder, Framework, HistoryBackend, HistoryOptions,
    HostRequire, LoaderFactory, ModuleLoader, RouteHandler, RouteMatcher, RoutingBackend,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
