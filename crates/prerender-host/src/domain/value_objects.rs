//! # Value Objects
//!
//! Opaque handles exchanged with the external collaborators, the ambient
//! binding names the host interposes, and small identifiers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Names of the ambient bindings legacy code reads as globals.
pub mod binding {
    /// The document window.
    pub const WINDOW: &str = "window";
    /// The window's navigator.
    pub const NAVIGATOR: &str = "navigator";
    /// The window's document.
    pub const DOCUMENT: &str = "document";
    /// The window's history object.
    pub const HISTORY: &str = "history";
}

/// Shared, type-erased handle to a value owned by an external collaborator.
///
/// Equality is pointer identity: two handles are equal only when they refer
/// to the same allocation.
#[derive(Clone)]
pub struct AmbientHandle {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AmbientHandle {
    /// Wrap a value in a new handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already shared value without reallocating it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the wrapped value out if it is a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Whether both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }

    /// Type name of the wrapped value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for AmbientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AmbientHandle {}

impl fmt::Debug for AmbientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AmbientHandle<{}>({:p})",
            self.type_name,
            Arc::as_ptr(&self.inner) as *const ()
        )
    }
}

/// A resolved module export, as returned by the module loader.
pub type ModuleHandle = AmbientHandle;

/// The window created from a document, with the objects the framework and
/// the overlay need from it.
#[derive(Clone, Debug)]
pub struct Window {
    /// The window object itself.
    pub window: AmbientHandle,
    /// `window.location`
    pub location: AmbientHandle,
    /// `window.history`
    pub history: AmbientHandle,
    /// `window.navigator`
    pub navigator: AmbientHandle,
    /// `window.document`
    pub document: AmbientHandle,
}

impl Window {
    /// Bindings for the given ambient names, in the order given.
    ///
    /// Unknown names are skipped.
    pub fn bindings(&self, names: &[&str]) -> Vec<(String, AmbientHandle)> {
        names
            .iter()
            .filter_map(|name| {
                let handle = match *name {
                    binding::WINDOW => &self.window,
                    binding::NAVIGATOR => &self.navigator,
                    binding::DOCUMENT => &self.document,
                    binding::HISTORY => &self.history,
                    _ => return None,
                };
                Some(((*name).to_string(), handle.clone()))
            })
            .collect()
    }
}

/// Result of a successful route lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteMatch {
    /// A registered route whose matcher accepted the path.
    Route(String),
    /// Empty path with no routes registered at all.
    Trivial,
}

impl RouteMatch {
    /// The matching route pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Route(pattern) => Some(pattern),
            Self::Trivial => None,
        }
    }
}

/// Position of a request in the initialization queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
