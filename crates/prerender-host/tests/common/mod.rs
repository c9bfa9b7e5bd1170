//! In-memory collaborators for the integration tests.
//!
//! - `FakeDom` builds documents whose body is rewritten by history navigation
//! - `FakeLoaderFactory` resolves `jquery`, `backbone` and application
//!   modules, yielding to the scheduler before each resolution
//! - `FakeConfigSource` serves config sources from a path map

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use prerender_host::{
    binding, AmbientHandle, AppInstance, ConfigSource, DocumentHandle, DomBuilder, DomError,
    Framework, GlobalOverlay, HistoryBackend, HistoryOptions, HostCollaborators, HostConfig,
    HostContext, HostRequire, LoaderError, LoaderFactory, ModuleHandle, ModuleLoader,
    PatchedConfig, PatternRoute, RouteHandler, RoutingError, Window,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEMPLATE: &str = "<html><head></head><body></body></html>";

pub const GOOD_CONFIG: &str = r#"
    require.config({
        paths: { jquery: 'lib/jquery', backbone: 'lib/backbone' },
        deps: ['app'],
    });
"#;

pub const MALFORMED_CONFIG: &str = "require.config({ paths: { jquery: lib/jquery } });";

// =============================================================================
// DOM
// =============================================================================

/// Body markup shared between a document and its window's `document` handle.
#[derive(Clone, Default)]
pub struct DocumentBody(pub Arc<Mutex<String>>);

pub struct FakeDocument {
    template: String,
    body: DocumentBody,
    serial: u64,
}

impl DocumentHandle for FakeDocument {
    fn create_window(&self) -> Window {
        let id = self.serial;
        Window {
            window: AmbientHandle::new(format!("window-{id}")),
            location: AmbientHandle::new(format!("location-{id}")),
            history: AmbientHandle::new(format!("history-{id}")),
            navigator: AmbientHandle::new(format!("navigator-{id}")),
            document: AmbientHandle::new(self.body.clone()),
        }
    }

    fn inner_html(&self) -> String {
        let body = self.body.0.lock();
        self.template
            .replace("<body></body>", &format!("<body>{}</body>", body))
    }
}

#[derive(Default)]
pub struct FakeDom {
    built: AtomicU64,
}

impl DomBuilder for FakeDom {
    fn build(&self, html: &str) -> Result<Arc<dyn DocumentHandle>, DomError> {
        if html.is_empty() {
            return Err(DomError("empty template".to_string()));
        }
        Ok(Arc::new(FakeDocument {
            template: html.to_string(),
            body: DocumentBody::default(),
            serial: self.built.fetch_add(1, Ordering::Relaxed),
        }))
    }
}

// =============================================================================
// FRAMEWORK
// =============================================================================

/// History that renders the navigated fragment into the ambient `document`.
pub struct FakeHistory {
    overlay: Arc<GlobalOverlay>,
    routes: Vec<PatternRoute>,
    started: Mutex<bool>,
}

impl HistoryBackend for FakeHistory {
    fn set_location(&self, _location: AmbientHandle) {}

    fn set_history(&self, _history: AmbientHandle) {}

    fn handlers(&self) -> Vec<RouteHandler> {
        self.routes
            .iter()
            .map(|route| RouteHandler::new(Arc::new(route.clone())))
            .collect()
    }

    fn start(&self, _options: &HistoryOptions) -> Result<bool, RoutingError> {
        let mut started = self.started.lock();
        if *started {
            return Err(RoutingError::AlreadyStarted);
        }
        *started = true;
        Ok(false)
    }

    fn stop(&self) {
        *self.started.lock() = false;
    }

    fn navigate(&self, fragment: &str, trigger: bool) -> bool {
        if !trigger || !self.routes.iter().any(|route| route.extract(fragment).is_some()) {
            return false;
        }
        let Some(document) = self.overlay.get(binding::DOCUMENT) else {
            return false;
        };
        match document.downcast_ref::<DocumentBody>() {
            Some(body) => {
                *body.0.lock() = format!("<main>{fragment}</main>");
                true
            }
            None => false,
        }
    }
}

pub struct FakeFramework {
    history: Arc<FakeHistory>,
    dom_library: Mutex<Option<ModuleHandle>>,
}

impl Framework for FakeFramework {
    fn set_dom_library(&self, dom_library: ModuleHandle) {
        *self.dom_library.lock() = Some(dom_library);
    }

    fn history(&self) -> Arc<dyn HistoryBackend> {
        self.history.clone()
    }
}

// =============================================================================
// LOADER
// =============================================================================

/// Shared observations across every loader of a factory.
#[derive(Default)]
pub struct LoadLog {
    /// `<context>:<module>` in resolution order
    pub entries: Mutex<Vec<String>>,
    /// `window` changed while the DOM library was loading
    pub window_violations: AtomicUsize,
    /// DOM library loads that found no `window`
    pub missing_window: AtomicUsize,
}

impl LoadLog {
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Contexts in the order their `module` resolved.
    pub fn contexts_for(&self, module: &str) -> Vec<String> {
        let suffix = format!(":{module}");
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }
}

pub struct FakeLoader {
    context: String,
    overlay: Arc<GlobalOverlay>,
    host_require: Option<Arc<dyn HostRequire>>,
    routes: Vec<String>,
    log: Arc<LoadLog>,
}

impl FakeLoader {
    async fn resolve(&self, module: &str) -> Result<ModuleHandle, LoaderError> {
        tokio::task::yield_now().await;

        let handle = match module {
            "jquery" => {
                let Some(before) = self.overlay.get(binding::WINDOW) else {
                    self.log.missing_window.fetch_add(1, Ordering::SeqCst);
                    return Err(LoaderError::Load {
                        modules: vec![module.to_string()],
                        message: "window is not defined".to_string(),
                    });
                };
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                    if self.overlay.get(binding::WINDOW).as_ref() != Some(&before) {
                        self.log.window_violations.fetch_add(1, Ordering::SeqCst);
                    }
                }
                AmbientHandle::new(format!("jquery@{}", self.context))
            }
            "backbone" => {
                let routes = self
                    .routes
                    .iter()
                    .map(|route| PatternRoute::new(route.as_str()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| LoaderError::Load {
                        modules: vec![module.to_string()],
                        message: e.to_string(),
                    })?;
                let framework: Arc<dyn Framework> = Arc::new(FakeFramework {
                    history: Arc::new(FakeHistory {
                        overlay: Arc::clone(&self.overlay),
                        routes,
                        started: Mutex::new(false),
                    }),
                    dom_library: Mutex::new(None),
                });
                AmbientHandle::new(framework)
            }
            "broken" => {
                return Err(LoaderError::Load {
                    modules: vec![module.to_string()],
                    message: "script error".to_string(),
                })
            }
            other => match self.host_require.as_ref().map(|hook| hook.require(other)) {
                Some(Ok(handle)) => handle,
                _ => AmbientHandle::new(other.to_string()),
            },
        };

        self.log
            .entries
            .lock()
            .push(format!("{}:{}", self.context, module));
        Ok(handle)
    }
}

#[async_trait]
impl ModuleLoader for FakeLoader {
    async fn load(&self, modules: &[String]) -> Result<Vec<ModuleHandle>, LoaderError> {
        let mut handles = Vec::with_capacity(modules.len());
        for module in modules {
            handles.push(self.resolve(module).await?);
        }
        Ok(handles)
    }
}

pub struct FakeLoaderFactory {
    pub routes: Vec<String>,
    pub log: Arc<LoadLog>,
}

impl FakeLoaderFactory {
    pub fn new(routes: &[&str]) -> Self {
        Self {
            routes: routes.iter().map(|route| route.to_string()).collect(),
            log: Arc::new(LoadLog::default()),
        }
    }
}

impl LoaderFactory for FakeLoaderFactory {
    fn configure(
        &self,
        config: &PatchedConfig,
        overlay: Arc<GlobalOverlay>,
    ) -> Result<Arc<dyn ModuleLoader>, LoaderError> {
        if config.base_url().is_none() {
            return Err(LoaderError::Configure("baseUrl missing".to_string()));
        }
        Ok(Arc::new(FakeLoader {
            context: config.context().unwrap_or("_").to_string(),
            overlay,
            host_require: config.host_require().cloned(),
            routes: self.routes.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

// =============================================================================
// CONFIG SOURCE
// =============================================================================

#[derive(Default)]
pub struct FakeConfigSource {
    files: HashMap<String, String>,
}

impl FakeConfigSource {
    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl ConfigSource for FakeConfigSource {
    async fn read(&self, path: &str) -> std::io::Result<String> {
        tokio::task::yield_now().await;
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("{path} not found"))
        })
    }
}

// =============================================================================
// FIXTURE
// =============================================================================

pub struct Fixture {
    pub host: Arc<HostContext>,
    pub log: Arc<LoadLog>,
}

impl Fixture {
    pub fn new(routes: &[&str]) -> Self {
        Self::with_host_require(routes, None)
    }

    pub fn with_host_require(routes: &[&str], host_require: Option<Arc<dyn HostRequire>>) -> Self {
        let factory = FakeLoaderFactory::new(routes);
        let log = Arc::clone(&factory.log);
        let source = FakeConfigSource::default()
            .with_file("public/js/config.js", GOOD_CONFIG)
            .with_file("public/js/malformed.js", MALFORMED_CONFIG);

        let mut collaborators =
            HostCollaborators::new(Arc::new(FakeDom::default()), Arc::new(factory), Arc::new(source));
        if let Some(hook) = host_require {
            collaborators = collaborators.with_host_require(hook);
        }

        let config = HostConfig {
            auto_context: true,
            ..HostConfig::default()
        };
        let host = HostContext::with_overlay(
            config,
            collaborators,
            Arc::new(GlobalOverlay::recording()),
        );

        Self {
            host: Arc::new(host),
            log,
        }
    }

    pub fn instance(&self, config_path: &str) -> AppInstance {
        self.host.create_instance(TEMPLATE, config_path, None)
    }

    /// Wait until `n` requests are queued behind the active one.
    pub async fn wait_for_pending(&self, n: usize) {
        while self.host.serializer().pending_len() < n {
            tokio::task::yield_now().await;
        }
    }
}
