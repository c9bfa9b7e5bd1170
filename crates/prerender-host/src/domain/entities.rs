//! # Domain Entities
//!
//! Construction inputs of an app instance, the deferred root dependency
//! list and the pipeline phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable construction inputs of an app instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Markup the instance's document is built from.
    pub html_template: String,
    /// Loader configuration source, relative to the host root.
    pub config_path: String,
    /// Isolation label handed to the module loader.
    pub context: Option<String>,
}

impl AppSettings {
    /// Create settings without a context label.
    pub fn new(html_template: impl Into<String>, config_path: impl Into<String>) -> Self {
        Self {
            html_template: html_template.into(),
            config_path: config_path.into(),
            context: None,
        }
    }

    /// Set the isolation label.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Label used in logs: the context when set, else the config path.
    pub fn label(&self) -> &str {
        self.context.as_deref().unwrap_or(&self.config_path)
    }
}

/// The application's own top-level modules, loaded after the core
/// framework has been patched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDependencies(Vec<String>);

impl RootDependencies {
    pub fn new(modules: Vec<String>) -> Self {
        Self(modules)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for RootDependencies {
    fn from(modules: Vec<String>) -> Self {
        Self(modules)
    }
}

/// Steps of the initialization pipeline, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitPhase {
    BuildDocument,
    AwaitSlot,
    ReadConfig,
    PatchConfig,
    ConfigureLoader,
    LoadDomLibrary,
    LoadFramework,
    BindFramework,
    LoadRootDependencies,
    Complete,
}

impl InitPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildDocument => "build_document",
            Self::AwaitSlot => "await_slot",
            Self::ReadConfig => "read_config",
            Self::PatchConfig => "patch_config",
            Self::ConfigureLoader => "configure_loader",
            Self::LoadDomLibrary => "load_dom_library",
            Self::LoadFramework => "load_framework",
            Self::BindFramework => "bind_framework",
            Self::LoadRootDependencies => "load_root_dependencies",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for InitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
