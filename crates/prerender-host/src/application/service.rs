//! App Instance Service
//!
//! Main service implementing AppInstanceApi.

use crate::adapters::OverlayRoutingBackend;
use crate::algorithms::config_patcher::patch_config;
use crate::application::host::HostContext;
use crate::domain::entities::{AppSettings, InitPhase};
use crate::domain::errors::{HostError, LoaderError};
use crate::domain::value_objects::{binding, ModuleHandle, RouteMatch, Window};
use crate::metrics;
use crate::ports::inbound::AppInstanceApi;
use crate::ports::outbound::{
    DocumentHandle, Framework, HistoryOptions, ModuleLoader, RoutingBackend,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Everything a successful init produces, committed at once.
struct LoadedRuntime {
    loader: Arc<dyn ModuleLoader>,
    routing: Arc<dyn RoutingBackend>,
    dom_library: ModuleHandle,
    window: Window,
}

/// One application instance
///
/// Orchestrates the init pipeline:
/// 1. Build a fresh document
/// 2. Wait for the initialization slot
/// 3. Read and patch the loader configuration
/// 4. Load the DOM library with `window` interposed
/// 5. Load and patch the framework
/// 6. Load the root dependencies
/// 7. Release the slot
pub struct AppInstance {
    host: Arc<HostContext>,
    settings: AppSettings,
    document: Option<Arc<dyn DocumentHandle>>,
    runtime: Option<LoadedRuntime>,
}

impl AppInstance {
    /// Create an uninitialized instance.
    pub fn new(host: Arc<HostContext>, settings: AppSettings) -> Self {
        Self {
            host,
            settings,
            document: None,
            runtime: None,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn context_label(&self) -> Option<&str> {
        self.settings.context.as_deref()
    }

    /// Whether the last `init` completed.
    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    /// The DOM library module, once loaded.
    pub fn dom_library(&self) -> Option<&ModuleHandle> {
        self.runtime.as_ref().map(|runtime| &runtime.dom_library)
    }

    /// The window of the current document, once initialized.
    pub fn window(&self) -> Option<&Window> {
        self.runtime.as_ref().map(|runtime| &runtime.window)
    }

    /// Start the framework's history with the window's bindings interposed.
    pub fn start_history(&self, options: &HistoryOptions) -> Result<bool, HostError> {
        let runtime = self.runtime()?;
        Ok(runtime.routing.start(options)?)
    }

    pub fn stop_history(&self) -> Result<(), HostError> {
        self.runtime()?.routing.stop();
        Ok(())
    }

    fn runtime(&self) -> Result<&LoadedRuntime, HostError> {
        self.runtime.as_ref().ok_or(HostError::NotInitialized)
    }

    async fn load_one(
        &self,
        loader: &Arc<dyn ModuleLoader>,
        module: &str,
        phase: InitPhase,
    ) -> Result<ModuleHandle, HostError> {
        debug!(phase = %phase, module, "Loading module");
        let modules = vec![module.to_string()];
        let loaded = loader.load(&modules).await?;
        loaded.into_iter().next().ok_or_else(|| {
            HostError::Loader(LoaderError::Load {
                modules,
                message: "loader resolved no module".to_string(),
            })
        })
    }

    /// Steps 3 to 10 of the pipeline; runs while holding the slot.
    async fn load_runtime(
        &self,
        document: &Arc<dyn DocumentHandle>,
    ) -> Result<LoadedRuntime, HostError> {
        let host = &self.host;
        let config_path = &self.settings.config_path;

        debug!(phase = %InitPhase::ReadConfig, path = %config_path, "Reading loader config");
        let source = host
            .config_source()
            .read(config_path)
            .await
            .map_err(|source| HostError::ConfigRead {
                path: config_path.clone(),
                source,
            })?;

        let (config, root_dependencies) = patch_config(
            &source,
            config_path,
            self.settings.context.as_deref(),
            host.host_require().cloned(),
        )?;
        debug!(
            phase = %InitPhase::PatchConfig,
            base_url = config.base_url().unwrap_or_default(),
            deps = root_dependencies.len(),
            "Loader config patched"
        );

        let loader = host
            .loader_factory()
            .configure(&config, Arc::clone(host.overlay()))?;

        let window = document.create_window();
        let dom_module = &host.config().dom_library_module;
        let dom_library = {
            let _window = host.overlay().scope(window.bindings(&[binding::WINDOW]));
            self.load_one(&loader, dom_module, InitPhase::LoadDomLibrary)
                .await?
        };

        let framework_module = &host.config().framework_module;
        let framework = self
            .load_one(&loader, framework_module, InitPhase::LoadFramework)
            .await?
            .downcast::<Arc<dyn Framework>>()
            .ok_or_else(|| HostError::ModuleShape {
                module: framework_module.clone(),
                expected: "framework",
            })?;

        debug!(phase = %InitPhase::BindFramework, "Patching framework for server-side use");
        framework.set_dom_library(dom_library.clone());
        let routing = OverlayRoutingBackend::new(framework.history(), host.overlay(), &window);

        if !root_dependencies.is_empty() {
            debug!(
                phase = %InitPhase::LoadRootDependencies,
                modules = ?root_dependencies.as_slice(),
                "Loading root dependencies"
            );
            loader.load(root_dependencies.as_slice()).await?;
        }

        Ok(LoadedRuntime {
            loader,
            routing: Arc::new(routing),
            dom_library,
            window,
        })
    }

    async fn run_init(&mut self) -> Result<(), HostError> {
        debug!(phase = %InitPhase::BuildDocument, "Building document");
        let document = self.host.dom().build(&self.settings.html_template)?;
        self.document = Some(Arc::clone(&document));
        self.runtime = None;

        debug!(phase = %InitPhase::AwaitSlot, "Waiting for initialization slot");
        let admission = self.host.serializer().request(self.settings.label());
        let permit = admission.admitted().await?;
        let ticket = permit.ticket();
        let started = Instant::now();

        let result = self.load_runtime(&document).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_init_completed(outcome, started.elapsed().as_secs_f64());
        drop(permit);

        match result {
            Ok(runtime) => {
                self.runtime = Some(runtime);
                info!(
                    phase = %InitPhase::Complete,
                    ticket = %ticket,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "App instance initialized"
                );
                Ok(())
            }
            Err(e) => {
                warn!(ticket = %ticket, error = %e, kind = e.kind(), "App instance init failed");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInstance")
            .field("settings", &self.settings)
            .field("has_document", &self.document.is_some())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[async_trait]
impl AppInstanceApi for AppInstance {
    async fn init(&mut self) -> Result<(), HostError> {
        let span = info_span!("app_init", instance = %self.settings.label());
        self.run_init().instrument(span).await
    }

    async fn require(&self, modules: &[String]) -> Result<Vec<ModuleHandle>, HostError> {
        let runtime = self.runtime()?;
        debug!(instance = %self.settings.label(), ?modules, "Require");
        Ok(runtime.loader.load(modules).await?)
    }

    fn route_exists(&self, path: &str) -> Option<RouteMatch> {
        let runtime = self.runtime.as_ref()?;
        let handlers = runtime.routing.handlers();

        if handlers.is_empty() {
            return path.is_empty().then_some(RouteMatch::Trivial);
        }

        handlers
            .iter()
            .find(|handler| handler.route.matches(path))
            .map(|handler| RouteMatch::Route(handler.route.pattern().to_string()))
    }

    fn navigate(&self, path: &str) -> bool {
        match (self.route_exists(path), self.runtime.as_ref()) {
            (Some(RouteMatch::Route(_)), Some(runtime)) => runtime.routing.navigate(path, true),
            _ => false,
        }
    }

    fn get_html(&self) -> String {
        self.document
            .as_ref()
            .map(|document| document.inner_html())
            .unwrap_or_default()
    }

    fn snapshot(&self, path: &str) -> Result<Option<String>, HostError> {
        self.runtime()?;

        match self.route_exists(path) {
            None => Ok(None),
            Some(RouteMatch::Trivial) => Ok(Some(self.get_html())),
            Some(RouteMatch::Route(_)) => {
                self.navigate(path);
                Ok(Some(self.get_html()))
            }
        }
    }
}
