//! # Application Module
//!
//! The host context shared by all instances and the app instance service
//! orchestrating the init pipeline.

pub mod host;
pub mod service;

pub use host::{HostCollaborators, HostContext};
pub use service::AppInstance;
