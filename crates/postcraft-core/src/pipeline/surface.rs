//! Scoped global listeners and the scroll lock.
//!
//! A host exposes its event surface through [`HostSurface`]. The pipeline
//! never attaches a listener for longer than the interaction that needs it:
//! every attachment is a [`Subscription`] guard that detaches on drop, and the
//! page scroll lock is a [`ScrollLock`] guard that restores scrolling on drop.
//! Whatever path ends an interaction (gesture end, discard, submit, close,
//! dropping the composer) releases everything it acquired.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Global events the pipeline may listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
    TouchMove,
    TouchEnd,
    OutsideClick,
    EscapeKey,
}

/// Host-assigned id of an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The host's global event surface (document/window in a browser).
pub trait HostSurface: Send + Sync {
    /// Start routing `kind` events to the pipeline.
    fn attach(&self, kind: ListenerKind) -> ListenerId;

    /// Stop routing events for a listener returned by `attach`.
    fn detach(&self, id: ListenerId);

    /// Suppress or restore page scrolling.
    fn set_scroll_locked(&self, locked: bool);
}

/// An attached listener; detaches when dropped.
pub struct Subscription {
    surface: Arc<dyn HostSurface>,
    id: ListenerId,
    kind: ListenerKind,
}

impl Subscription {
    pub fn attach(surface: &Arc<dyn HostSurface>, kind: ListenerKind) -> Self {
        let id = surface.attach(kind);
        tracing::trace!("Attached {kind:?} listener {id:?}");
        Self {
            surface: Arc::clone(surface),
            id,
            kind,
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::trace!("Detached {:?} listener {:?}", self.kind, self.id);
        self.surface.detach(self.id);
    }
}

/// Page scroll suppression; scrolling comes back when dropped.
pub struct ScrollLock {
    surface: Arc<dyn HostSurface>,
}

impl ScrollLock {
    pub fn acquire(surface: &Arc<dyn HostSurface>) -> Self {
        surface.set_scroll_locked(true);
        Self {
            surface: Arc::clone(surface),
        }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.surface.set_scroll_locked(false);
    }
}

/// Everything held for as long as the composer modal is open.
pub struct ModalSession {
    _outside_click: Subscription,
    _escape: Subscription,
    _scroll: ScrollLock,
}

impl ModalSession {
    pub fn open(surface: &Arc<dyn HostSurface>) -> Self {
        Self {
            _outside_click: Subscription::attach(surface, ListenerKind::OutsideClick),
            _escape: Subscription::attach(surface, ListenerKind::EscapeKey),
            _scroll: ScrollLock::acquire(surface),
        }
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    next_id: u64,
    live: HashMap<ListenerId, ListenerKind>,
    scroll_locked: bool,
    total_attached: u64,
}

/// In-memory surface that records live listeners and the scroll state.
///
/// Used by hosts with no real event surface (the CLI) and by tests to check
/// that nothing leaks.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    state: Mutex<RecordingState>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        // A poisoned lock still holds consistent bookkeeping
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of listeners currently attached.
    pub fn live_listeners(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of currently attached listeners of one kind.
    pub fn live_of(&self, kind: ListenerKind) -> usize {
        self.lock().live.values().filter(|k| **k == kind).count()
    }

    /// Listeners attached over the surface's lifetime.
    pub fn total_attached(&self) -> u64 {
        self.lock().total_attached
    }

    pub fn scroll_locked(&self) -> bool {
        self.lock().scroll_locked
    }
}

impl HostSurface for RecordingSurface {
    fn attach(&self, kind: ListenerKind) -> ListenerId {
        let mut state = self.lock();
        state.next_id += 1;
        state.total_attached += 1;
        let id = ListenerId(state.next_id);
        state.live.insert(id, kind);
        id
    }

    fn detach(&self, id: ListenerId) {
        self.lock().live.remove(&id);
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.lock().scroll_locked = locked;
    }
}
