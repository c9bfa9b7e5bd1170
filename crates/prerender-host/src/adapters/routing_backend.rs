//! # Overlay Routing Backend
//!
//! Adapts the framework's history singleton for server-side use.
//!
//! Each history operation is wrapped with [`GlobalOverlay::wrap`], so the
//! ambient bindings it reads exist only for the duration of the call:
//!
//! | Operation  | Bindings                          |
//! |------------|-----------------------------------|
//! | `start`    | `window`, `navigator`, `document` |
//! | `stop`     | `window`                          |
//! | `navigate` | `window`, `document`              |

use crate::algorithms::overlay::GlobalOverlay;
use crate::domain::errors::RoutingError;
use crate::domain::value_objects::{binding, Window};
use crate::ports::outbound::{HistoryBackend, HistoryOptions, RouteHandler, RoutingBackend};
use std::sync::Arc;
use tracing::debug;

type StartFn = Box<dyn Fn(HistoryOptions) -> Result<bool, RoutingError> + Send + Sync>;
type StopFn = Box<dyn Fn(()) + Send + Sync>;
type NavigateFn = Box<dyn Fn((String, bool)) -> bool + Send + Sync>;

/// Ambient bindings installed around `start`.
pub const START_BINDINGS: &[&str] = &[binding::WINDOW, binding::NAVIGATOR, binding::DOCUMENT];
/// Ambient bindings installed around `stop`.
pub const STOP_BINDINGS: &[&str] = &[binding::WINDOW];
/// Ambient bindings installed around `navigate`.
pub const NAVIGATE_BINDINGS: &[&str] = &[binding::WINDOW, binding::DOCUMENT];

/// History operations bound to one instance's window.
pub struct OverlayRoutingBackend {
    history: Arc<dyn HistoryBackend>,
    start: StartFn,
    stop: StopFn,
    navigate: NavigateFn,
}

impl OverlayRoutingBackend {
    /// Point `history` at the window's location and history objects and
    /// wrap its operations with the window's bindings.
    pub fn new(
        history: Arc<dyn HistoryBackend>,
        overlay: &Arc<GlobalOverlay>,
        window: &Window,
    ) -> Self {
        history.set_location(window.location.clone());
        history.set_history(window.history.clone());

        let start = {
            let history = Arc::clone(&history);
            overlay.wrap(window.bindings(START_BINDINGS), move |options: HistoryOptions| {
                history.start(&options)
            })
        };
        let stop = {
            let history = Arc::clone(&history);
            overlay.wrap(window.bindings(STOP_BINDINGS), move |()| history.stop())
        };
        let navigate = {
            let history = Arc::clone(&history);
            overlay.wrap(
                window.bindings(NAVIGATE_BINDINGS),
                move |(fragment, trigger): (String, bool)| history.navigate(&fragment, trigger),
            )
        };

        Self {
            history,
            start: Box::new(start),
            stop: Box::new(stop),
            navigate: Box::new(navigate),
        }
    }
}

impl RoutingBackend for OverlayRoutingBackend {
    fn handlers(&self) -> Vec<RouteHandler> {
        self.history.handlers()
    }

    fn start(&self, options: &HistoryOptions) -> Result<bool, RoutingError> {
        debug!(push_state = options.push_state, silent = options.silent, "Starting history");
        (self.start)(options.clone())
    }

    fn stop(&self) {
        debug!("Stopping history");
        (self.stop)(())
    }

    fn navigate(&self, fragment: &str, trigger: bool) -> bool {
        debug!(fragment, trigger, "Navigating");
        (self.navigate)((fragment.to_string(), trigger))
    }
}
