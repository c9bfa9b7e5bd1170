//! # Global Overlay
//!
//! Reference-counted table of ambient bindings.
//!
//! The first `install` of a name sets the slot; nested installs of the same
//! name only bump the count and observe the value already in place, so every
//! call in a nested chain sees one consistent value. The slot disappears when
//! the last matching `remove` runs.
//!
//! ```text
//! install(window, A) ─┐ count 1, slot = A
//!   install(window, B)│ count 2, slot = A   (returns A)
//!   remove(window)    │ count 1, slot = A
//! remove(window) ─────┘ count 0, slot gone
//! ```

use crate::domain::invariants::OverlayOp;
use crate::domain::value_objects::AmbientHandle;
use crate::metrics;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Name/value pairs to interpose for the duration of a call.
pub type Bindings<V = AmbientHandle> = Vec<(String, V)>;

struct Slot<V> {
    value: V,
    count: usize,
}

struct OverlayState<V> {
    slots: HashMap<String, Slot<V>>,
    journal: Option<Vec<OverlayOp>>,
}

impl<V> OverlayState<V> {
    fn record(&mut self, op: OverlayOp) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(op);
        }
    }
}

/// Ambient-binding overlay shared by every instance of a host.
pub struct GlobalOverlay<V = AmbientHandle> {
    state: Mutex<OverlayState<V>>,
}

impl<V: Clone> GlobalOverlay<V> {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OverlayState {
                slots: HashMap::new(),
                journal: None,
            }),
        }
    }

    /// Create an overlay that records every effective install and remove.
    pub fn recording() -> Self {
        let overlay = Self::new();
        overlay.state.lock().journal = Some(Vec::new());
        overlay
    }

    /// Install `value` under `name` unless the name is already held.
    ///
    /// Returns the value now in the slot: `value` for the first install,
    /// the existing value for nested installs.
    pub fn install(&self, name: &str, value: V) -> V {
        let mut state = self.state.lock();

        let (current, count) = match state.slots.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                slot.count += 1;
                (slot.value.clone(), slot.count)
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot {
                    value: value.clone(),
                    count: 1,
                });
                (value, 1)
            }
        };
        state.record(OverlayOp::Install(name.to_string()));
        drop(state);

        trace!(binding = name, count, "Ambient binding installed");
        if count == 1 {
            metrics::adjust_overlay_bindings(1);
        }
        current
    }

    /// Release one hold on `name`.
    ///
    /// Returns `true` when this was the last hold and the slot was deleted.
    /// Removing a name that is not held is a no-op returning `false`.
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.state.lock();

        let Some(slot) = state.slots.get_mut(name) else {
            trace!(binding = name, "Remove of unheld ambient binding ignored");
            return false;
        };

        slot.count -= 1;
        let count = slot.count;
        if count == 0 {
            state.slots.remove(name);
        }
        state.record(OverlayOp::Remove(name.to_string()));
        drop(state);

        trace!(binding = name, count, "Ambient binding released");
        if count == 0 {
            metrics::adjust_overlay_bindings(-1);
        }
        count == 0
    }

    /// Current value of `name`, if held.
    pub fn get(&self, name: &str) -> Option<V> {
        self.state.lock().slots.get(name).map(|slot| slot.value.clone())
    }

    /// Outstanding holds on `name`.
    pub fn count(&self, name: &str) -> usize {
        self.state.lock().slots.get(name).map_or(0, |slot| slot.count)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.state.lock().slots.contains_key(name)
    }

    /// Names currently held, sorted.
    pub fn installed_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().slots.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().slots.is_empty()
    }

    /// Recorded operations, empty unless built with [`GlobalOverlay::recording`].
    pub fn journal(&self) -> Vec<OverlayOp> {
        self.state.lock().journal.clone().unwrap_or_default()
    }

    /// Install all bindings and return a guard that removes them on drop.
    pub fn scope(self: &Arc<Self>, bindings: Bindings<V>) -> OverlayGuard<V> {
        let installed = bindings
            .into_iter()
            .map(|(name, value)| {
                let current = self.install(&name, value);
                (name, current)
            })
            .collect();

        OverlayGuard {
            overlay: Arc::clone(self),
            installed,
        }
    }

    /// Run `f` with the bindings installed, removing them afterwards even if
    /// `f` panics.
    pub fn with_bindings<R>(self: &Arc<Self>, bindings: Bindings<V>, f: impl FnOnce() -> R) -> R {
        let _guard = self.scope(bindings);
        f()
    }

    /// Wrap `f` so that every call runs inside [`GlobalOverlay::with_bindings`].
    pub fn wrap<A, R, F>(self: &Arc<Self>, bindings: Bindings<V>, f: F) -> impl Fn(A) -> R + Send + Sync
    where
        F: Fn(A) -> R + Send + Sync,
        V: Send + Sync,
    {
        let overlay = Arc::clone(self);
        move |args| overlay.with_bindings(bindings.clone(), || f(args))
    }
}

impl<V: Clone> Default for GlobalOverlay<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for GlobalOverlay<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let mut counts: Vec<_> = state
            .slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.count))
            .collect();
        counts.sort();
        f.debug_struct("GlobalOverlay").field("counts", &counts).finish()
    }
}

/// Holds one install per binding; removes them in reverse order on drop.
#[must_use = "bindings are removed as soon as the guard is dropped"]
pub struct OverlayGuard<V: Clone = AmbientHandle> {
    overlay: Arc<GlobalOverlay<V>>,
    installed: Vec<(String, V)>,
}

impl<V: Clone> OverlayGuard<V> {
    /// The value `name` resolved to when this guard installed it.
    pub fn value(&self, name: &str) -> Option<&V> {
        self.installed
            .iter()
            .find(|(installed, _)| installed == name)
            .map(|(_, value)| value)
    }

    /// Remove the bindings now.
    pub fn release(self) {}
}

impl<V: Clone> Drop for OverlayGuard<V> {
    fn drop(&mut self) {
        for (name, _) in self.installed.iter().rev() {
            self.overlay.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invariants::invariant_overlay_balanced;
    use proptest::prelude::*;

    fn overlay() -> Arc<GlobalOverlay<&'static str>> {
        Arc::new(GlobalOverlay::recording())
    }

    #[test]
    fn test_first_install_sets_slot() {
        let overlay = overlay();
        assert_eq!(overlay.install("window", "A"), "A");
        assert_eq!(overlay.get("window"), Some("A"));
        assert_eq!(overlay.count("window"), 1);
    }

    #[test]
    fn test_nested_install_keeps_first_value() {
        let overlay = overlay();
        overlay.install("window", "A");

        assert_eq!(overlay.install("window", "B"), "A");
        assert_eq!(overlay.get("window"), Some("A"));

        assert!(!overlay.remove("window"));
        assert_eq!(overlay.get("window"), Some("A"));

        assert!(overlay.remove("window"));
        assert_eq!(overlay.get("window"), None);
        assert!(!overlay.is_installed("window"));
    }

    #[test]
    fn test_remove_unheld_is_noop() {
        let overlay = overlay();
        assert!(!overlay.remove("navigator"));
        assert!(overlay.journal().is_empty());
    }

    #[test]
    fn test_scope_removes_on_drop() {
        let overlay = overlay();
        {
            let guard = overlay.scope(vec![
                ("window".to_string(), "A"),
                ("document".to_string(), "D"),
            ]);
            assert_eq!(guard.value("window"), Some(&"A"));
            assert_eq!(overlay.installed_names(), vec!["document", "window"]);
        }
        assert!(overlay.is_empty());
        assert!(invariant_overlay_balanced(&overlay.journal()));
    }

    #[test]
    fn test_guard_reports_outer_value() {
        let overlay = overlay();
        let _outer = overlay.scope(vec![("window".to_string(), "A")]);
        let inner = overlay.scope(vec![("window".to_string(), "B")]);

        assert_eq!(inner.value("window"), Some(&"A"));
        inner.release();
        assert_eq!(overlay.count("window"), 1);
    }

    #[test]
    fn test_with_bindings_removes_after_panic() {
        let overlay = overlay();
        let inner = Arc::clone(&overlay);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            inner.with_bindings(vec![("window".to_string(), "A")], || panic!("boom"))
        }));

        assert!(result.is_err());
        assert!(overlay.is_empty());
        assert!(invariant_overlay_balanced(&overlay.journal()));
    }

    #[test]
    fn test_with_bindings_removes_after_error() {
        let overlay = overlay();
        let result: Result<(), &str> =
            overlay.with_bindings(vec![("window".to_string(), "A")], || Err("failed"));

        assert!(result.is_err());
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_wrap_scopes_each_call() {
        let overlay = overlay();
        let observer = Arc::clone(&overlay);
        let wrapped = overlay.wrap(
            vec![("window".to_string(), "A"), ("navigator".to_string(), "N")],
            move |fragment: &str| (fragment.len(), observer.get("window"), observer.get("navigator")),
        );

        assert_eq!(wrapped("home"), (4, Some("A"), Some("N")));
        assert!(overlay.is_empty());
        assert_eq!(wrapped(""), (0, Some("A"), Some("N")));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_nested_wrap_shares_outer_window() {
        let overlay = overlay();
        let observer = Arc::clone(&overlay);
        let inner = overlay.wrap(vec![("window".to_string(), "B")], move |_: ()| {
            (observer.get("window"), observer.count("window"))
        });

        let seen = overlay.with_bindings(vec![("window".to_string(), "A")], || inner(()));

        assert_eq!(seen, (Some("A"), 2));
        assert!(overlay.is_empty());
        assert!(invariant_overlay_balanced(&overlay.journal()));
    }

    proptest! {
        /// Any nesting of scopes over a small name set leaves the overlay
        /// empty and balanced once every guard is dropped.
        #[test]
        fn prop_nested_scopes_balance(names in proptest::collection::vec(0usize..3, 1..12)) {
            let overlay = overlay();
            let labels = ["window", "navigator", "document"];
            let mut guards = Vec::new();

            for index in &names {
                guards.push(overlay.scope(vec![(labels[*index].to_string(), labels[*index])]));
            }
            for index in &names {
                prop_assert_eq!(overlay.get(labels[*index]), Some(labels[*index]));
            }
            while let Some(guard) = guards.pop() {
                drop(guard);
            }

            prop_assert!(overlay.is_empty());
            prop_assert!(invariant_overlay_balanced(&overlay.journal()));
        }

        /// The first installed value survives any number of nested installs.
        #[test]
        fn prop_first_writer_wins(depth in 1usize..10) {
            let overlay: GlobalOverlay<usize> = GlobalOverlay::new();
            overlay.install("window", 0);
            for value in 1..=depth {
                prop_assert_eq!(overlay.install("window", value), 0);
            }
            for _ in 0..depth {
                prop_assert!(!overlay.remove("window"));
                prop_assert_eq!(overlay.get("window"), Some(0));
            }
            prop_assert!(overlay.remove("window"));
            prop_assert!(overlay.get("window").is_none());
        }
    }
}
