//! Domain invariants for the prerender host

use std::collections::HashMap;

/// INVARIANT-1: Queue Handoff
/// Requests are only ever pending behind an active initialization.
pub fn invariant_queue_handoff(active: bool, pending: usize) -> bool {
    active || pending == 0
}

/// INVARIANT-2: FIFO Completion
/// Instances complete initialization in the order they requested it.
pub fn invariant_fifo_completion<T: PartialEq>(requested: &[T], completed: &[T]) -> bool {
    requested.len() == completed.len() && requested.iter().zip(completed).all(|(r, c)| r == c)
}

/// One observed overlay operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayOp {
    Install(String),
    Remove(String),
}

/// INVARIANT-3: Balanced Overlay
/// Every install of a name is matched by exactly one remove, and no remove
/// precedes its install.
pub fn invariant_overlay_balanced(ops: &[OverlayOp]) -> bool {
    let mut depth: HashMap<&str, usize> = HashMap::new();

    for op in ops {
        match op {
            OverlayOp::Install(name) => *depth.entry(name.as_str()).or_insert(0) += 1,
            OverlayOp::Remove(name) => match depth.get_mut(name.as_str()) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            },
        }
    }

    depth.values().all(|count| *count == 0)
}
