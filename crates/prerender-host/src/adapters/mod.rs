//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: the filesystem config source, the
//! overlay-wrapped routing backend, framework-style route patterns and the
//! in-memory host require registry.

mod fs_config_source;
mod host_require;
mod pattern_route;
mod routing_backend;

pub use fs_config_source::FsConfigSource;
pub use host_require::StaticHostRequire;
pub use pattern_route::PatternRoute;
pub use routing_backend::{
    OverlayRoutingBackend, NAVIGATE_BINDINGS, START_BINDINGS, STOP_BINDINGS,
};
