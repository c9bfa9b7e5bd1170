//! Ports module for the prerender host
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::AppInstanceApi;
pub use outbound::{
    ConfigSource, DocumentHandle, DomBuilder, Framework, HistoryBackend, HistoryOptions,
    HostRequire, LoaderFactory, ModuleLoader, RouteHandler, RouteMatcher, RoutingBackend,
};
