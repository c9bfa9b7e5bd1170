//! # Host Context
//!
//! The process-level state every app instance shares: the ambient overlay,
//! the initialization queue and the external collaborators.
//!
//! Tests build independent contexts; a real host typically holds one.

use crate::adapters::FsConfigSource;
use crate::algorithms::overlay::GlobalOverlay;
use crate::algorithms::serializer::InitSerializer;
use crate::application::service::AppInstance;
use crate::config::HostConfig;
use crate::domain::entities::AppSettings;
use crate::ports::outbound::{ConfigSource, DomBuilder, HostRequire, LoaderFactory};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// External collaborators driven by app instances.
#[derive(Clone)]
pub struct HostCollaborators {
    pub dom: Arc<dyn DomBuilder>,
    pub loader_factory: Arc<dyn LoaderFactory>,
    pub config_source: Arc<dyn ConfigSource>,
    pub host_require: Option<Arc<dyn HostRequire>>,
}

impl HostCollaborators {
    pub fn new(
        dom: Arc<dyn DomBuilder>,
        loader_factory: Arc<dyn LoaderFactory>,
        config_source: Arc<dyn ConfigSource>,
    ) -> Self {
        Self {
            dom,
            loader_factory,
            config_source,
            host_require: None,
        }
    }

    /// Attach the hook handed to loaders for host-side packages.
    pub fn with_host_require(mut self, host_require: Arc<dyn HostRequire>) -> Self {
        self.host_require = Some(host_require);
        self
    }
}

/// Shared state of one host.
pub struct HostContext {
    config: HostConfig,
    overlay: Arc<GlobalOverlay>,
    serializer: Arc<InitSerializer>,
    collaborators: HostCollaborators,
    next_context: AtomicU64,
}

impl HostContext {
    pub fn new(config: HostConfig, collaborators: HostCollaborators) -> Self {
        Self::with_overlay(config, collaborators, Arc::new(GlobalOverlay::new()))
    }

    /// Use an existing overlay, e.g. one built with
    /// [`GlobalOverlay::recording`].
    pub fn with_overlay(
        config: HostConfig,
        collaborators: HostCollaborators,
        overlay: Arc<GlobalOverlay>,
    ) -> Self {
        Self {
            config,
            overlay,
            serializer: Arc::new(InitSerializer::new()),
            collaborators,
            next_context: AtomicU64::new(1),
        }
    }

    /// Context reading config sources from `config.host_root`.
    pub fn with_fs_config(
        config: HostConfig,
        dom: Arc<dyn DomBuilder>,
        loader_factory: Arc<dyn LoaderFactory>,
    ) -> Self {
        let config_source = Arc::new(FsConfigSource::new(config.host_root.clone()));
        Self::new(config, HostCollaborators::new(dom, loader_factory, config_source))
    }

    /// Build an app instance bound to this context.
    ///
    /// With `auto_context` set, instances created without a label get a
    /// unique one.
    pub fn create_instance(
        self: &Arc<Self>,
        html_template: impl Into<String>,
        config_path: impl Into<String>,
        context: Option<String>,
    ) -> AppInstance {
        let mut settings = AppSettings::new(html_template, config_path);
        settings.context = context.or_else(|| {
            self.config.auto_context.then(|| {
                let n = self.next_context.fetch_add(1, Ordering::Relaxed);
                self.config.context_label(n)
            })
        });

        debug!(
            instance = %settings.label(),
            config_path = %settings.config_path,
            "App instance created"
        );
        AppInstance::new(Arc::clone(self), settings)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn overlay(&self) -> &Arc<GlobalOverlay> {
        &self.overlay
    }

    pub fn serializer(&self) -> &Arc<InitSerializer> {
        &self.serializer
    }

    pub fn dom(&self) -> &Arc<dyn DomBuilder> {
        &self.collaborators.dom
    }

    pub fn loader_factory(&self) -> &Arc<dyn LoaderFactory> {
        &self.collaborators.loader_factory
    }

    pub fn config_source(&self) -> &Arc<dyn ConfigSource> {
        &self.collaborators.config_source
    }

    pub fn host_require(&self) -> Option<&Arc<dyn HostRequire>> {
        self.collaborators.host_require.as_ref()
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("config", &self.config)
            .field("overlay", &self.overlay)
            .field("init_active", &self.serializer.is_active())
            .field("init_pending", &self.serializer.pending_len())
            .finish()
    }
}
