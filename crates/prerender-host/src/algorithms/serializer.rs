//! # Initialization Serializer
//!
//! FIFO admission queue guaranteeing at most one app instance is
//! mid-initialization at a time.
//!
//! ```text
//!          request()                    permit dropped
//!  Idle ───────────────→ Active ──────────────────────→ Idle
//!                          │  ↑                        (pending empty)
//!                          │  └── head of pending promoted directly
//!                          ↓        (pending non-empty)
//!                 request() while active → appended to pending
//! ```
//!
//! Admission is granted in arrival order. The active slot is handed to the
//! next pending request under the same lock that clears it, so no caller can
//! observe an idle queue while requests are waiting.

use crate::domain::errors::SerializerError;
use crate::domain::invariants::invariant_queue_handoff;
use crate::domain::value_objects::Ticket;
use crate::metrics;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

struct PendingEntry {
    ticket: Ticket,
    label: String,
    grant: oneshot::Sender<()>,
}

struct QueueState {
    active: Option<(Ticket, String)>,
    pending: VecDeque<PendingEntry>,
    next_ticket: u64,
}

/// Process-wide initialization queue.
pub struct InitSerializer {
    state: Mutex<QueueState>,
}

impl InitSerializer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                active: None,
                pending: VecDeque::new(),
                next_ticket: 0,
            }),
        }
    }

    /// Enter the queue without blocking.
    ///
    /// The returned admission resolves once this request holds the active
    /// slot.
    pub fn request(self: &Arc<Self>, label: impl Into<String>) -> Admission {
        let label = label.into();
        let mut state = self.state.lock();

        let ticket = Ticket(state.next_ticket);
        state.next_ticket += 1;

        let grant = if state.active.is_none() {
            state.active = Some((ticket, label.clone()));
            None
        } else {
            let (tx, rx) = oneshot::channel();
            state.pending.push_back(PendingEntry {
                ticket,
                label: label.clone(),
                grant: tx,
            });
            Some(rx)
        };
        let depth = state.pending.len();
        debug_assert!(invariant_queue_handoff(state.active.is_some(), depth));
        drop(state);

        metrics::record_init_requested();
        if grant.is_some() {
            metrics::adjust_queue_depth(1);
        }
        debug!(
            ticket = %ticket,
            instance = %label,
            pending = depth,
            admitted = grant.is_none(),
            "Initialization requested"
        );

        Admission {
            serializer: Arc::clone(self),
            ticket,
            grant,
            settled: false,
        }
    }

    /// Whether some initialization holds the active slot.
    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Requests waiting behind the active one.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Label of the request holding the active slot.
    pub fn active_label(&self) -> Option<String> {
        self.state
            .lock()
            .active
            .as_ref()
            .map(|(_, label)| label.clone())
    }

    /// Release the active slot held by `ticket` and promote the next
    /// waiting request.
    fn complete(&self, ticket: Ticket) {
        let mut state = self.state.lock();

        match &state.active {
            Some((active, _)) if *active == ticket => {}
            _ => {
                warn!(ticket = %ticket, "Completion for a ticket that is not active ignored");
                return;
            }
        }

        state.active = None;
        let mut dequeued = 0i64;
        while let Some(entry) = state.pending.pop_front() {
            dequeued += 1;
            if entry.grant.send(()).is_ok() {
                debug!(
                    released = %ticket,
                    ticket = %entry.ticket,
                    instance = %entry.label,
                    pending = state.pending.len(),
                    "Initialization slot handed off"
                );
                state.active = Some((entry.ticket, entry.label));
                break;
            }
        }

        let depth = state.pending.len();
        debug_assert!(invariant_queue_handoff(state.active.is_some(), depth));
        let idle = state.active.is_none();
        drop(state);

        metrics::adjust_queue_depth(-dequeued);
        if idle {
            debug!(released = %ticket, "Initialization queue idle");
        }
    }

    /// Withdraw `ticket` whether it is still waiting or was granted but
    /// never observed.
    fn abandon(&self, ticket: Ticket) {
        let mut state = self.state.lock();

        if let Some(index) = state.pending.iter().position(|entry| entry.ticket == ticket) {
            state.pending.remove(index);
            let depth = state.pending.len();
            drop(state);

            metrics::adjust_queue_depth(-1);
            debug!(ticket = %ticket, pending = depth, "Queued initialization withdrawn");
            return;
        }
        drop(state);

        self.complete(ticket);
    }
}

impl Default for InitSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// A place in the initialization queue.
///
/// Dropping an admission before it resolves gives the place up.
#[must_use = "an admission does nothing unless awaited"]
pub struct Admission {
    serializer: Arc<InitSerializer>,
    ticket: Ticket,
    grant: Option<oneshot::Receiver<()>>,
    settled: bool,
}

impl Admission {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Whether the active slot was granted at request time.
    pub fn is_immediate(&self) -> bool {
        self.grant.is_none()
    }

    /// Wait for the active slot.
    pub async fn admitted(mut self) -> Result<InitPermit, SerializerError> {
        if let Some(grant) = self.grant.take() {
            if grant.await.is_err() {
                self.settled = true;
                return Err(SerializerError::GrantLost {
                    ticket: self.ticket.0,
                });
            }
        }

        self.settled = true;
        debug!(ticket = %self.ticket, "Initialization admitted");

        Ok(InitPermit {
            serializer: Arc::clone(&self.serializer),
            ticket: self.ticket,
        })
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if !self.settled {
            self.serializer.abandon(self.ticket);
        }
    }
}

/// Holds the active slot; completes the initialization when dropped.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct InitPermit {
    serializer: Arc<InitSerializer>,
    ticket: Ticket,
}

impl InitPermit {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Release the slot now.
    pub fn complete(self) {}
}

impl fmt::Debug for InitPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitPermit")
            .field("ticket", &self.ticket)
            .finish()
    }
}

impl Drop for InitPermit {
    fn drop(&mut self) {
        self.serializer.complete(self.ticket);
    }
}
