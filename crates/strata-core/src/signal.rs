//! Signal/slot system for Strata.
//!
//! Collections publish every observable change through signals. A signal owns
//! a list of connected slots (closures); emitting the signal invokes each
//! slot in connection order with a reference to the emitted arguments.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - Plain notification, slots return nothing
//! - [`CancelableSignal<Args>`] - Pre-change notification that any slot may veto
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Re-entrancy
//!
//! Slots are invoked after the connection table has been snapshotted and its
//! lock released. A slot may therefore read from the object that emitted the
//! signal, connect further slots, or disconnect itself. Slots connected
//! during an emission are first invoked on the next emission.
//!
//! # Example
//!
//! ```
//! use strata_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`] or [`CancelableSignal::disconnect`]. The ID
    /// remains valid until the connection is explicitly disconnected or the
    /// signal is dropped.
    pub struct ConnectionId;
}

/// Live slots, each tagged with the sequence number it was connected at.
///
/// Slot keys are reused after a disconnect, so iteration order of the map
/// says nothing about connection order; the sequence number does.
struct Connections<S: ?Sized> {
    slots: SlotMap<ConnectionId, (u64, Arc<S>)>,
    next_seq: u64,
}

/// Connection storage shared by both signal flavours.
struct SlotTable<S: ?Sized> {
    connections: Mutex<Connections<S>>,
    blocked: AtomicBool,
}

impl<S: ?Sized> SlotTable<S> {
    fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                next_seq: 0,
            }),
            blocked: AtomicBool::new(false),
        }
    }

    fn insert(&self, slot: Arc<S>) -> ConnectionId {
        let mut connections = self.connections.lock();
        let seq = connections.next_seq;
        connections.next_seq += 1;
        connections.slots.insert((seq, slot))
    }

    fn remove(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.remove(id).is_some()
    }

    fn clear(&self) {
        self.connections.lock().slots.clear();
    }

    fn len(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Clones the live slots in connection order so they can be invoked
    /// without the lock held.
    fn snapshot(&self) -> Vec<Arc<S>> {
        let mut slots: Vec<_> = self.connections.lock().slots.values().cloned().collect();
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, slot)| slot).collect()
    }

    fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }
}

type Slot<Args> = dyn Fn(&Args) + Send + Sync;
type VetoSlot<Args> = dyn Fn(&Args) -> bool + Send + Sync;

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`; slots must be `Send + Sync` as well.
/// Slots always run on the emitting thread.
pub struct Signal<Args> {
    table: SlotTable<Slot<Args>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            table: SlotTable::new(),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// assert!(signal.disconnect(id));
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.table.insert(Arc::new(slot))
    }

    /// Connect a slot that is disconnected when the returned guard drops.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            disconnect: Box::new(move || {
                self.disconnect(id);
            }),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.table.remove(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.table.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.table.len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.table.set_blocked(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.table.is_blocked()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(skip_all, target = "strata_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots = self.table.snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");
        for slot in slots {
            slot(&args);
        }
    }
}

/// A signal whose slots may veto the change being announced.
///
/// Each slot returns `true` to cancel. Emission stops at the first slot that
/// cancels, and [`emit`](Self::emit) reports whether the change was vetoed.
/// A blocked signal never vetoes.
///
/// # Example
///
/// ```
/// use strata_core::CancelableSignal;
///
/// let page_changing = CancelableSignal::<usize>::new();
/// page_changing.connect(|&page| page > 3);
///
/// assert!(!page_changing.emit(2));
/// assert!(page_changing.emit(5));
/// ```
pub struct CancelableSignal<Args> {
    table: SlotTable<VetoSlot<Args>>,
}

impl<Args: 'static> Default for CancelableSignal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> CancelableSignal<Args> {
    /// Create a new cancelable signal with no connections.
    pub fn new() -> Self {
        Self {
            table: SlotTable::new(),
        }
    }

    /// Connect a slot; returning `true` from the slot cancels the change.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        self.table.insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.table.remove(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.table.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.table.len()
    }

    /// Block signal emission temporarily.
    pub fn set_blocked(&self, blocked: bool) {
        self.table.set_blocked(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.table.is_blocked()
    }

    /// Emit the signal and return `true` if any slot cancelled.
    #[tracing::instrument(skip_all, target = "strata_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> bool {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "cancelable signal blocked, skipping emit");
            return false;
        }

        let cancelled = self.table.snapshot().into_iter().any(|slot| slot(&args));
        if cancelled {
            tracing::trace!(target: targets::SIGNAL, "change vetoed by slot");
        }
        cancelled
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`]. The guard borrows the signal, so
/// the borrow checker guarantees the signal outlives it.
///
/// # Example
///
/// ```
/// use strata_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);
/// }
/// signal.emit(43);
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<'a> {
    disconnect: Box<dyn Fn() + 'a>,
    id: ConnectionId,
}

impl ConnectionGuard<'_> {
    /// The ID of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        (self.disconnect)();
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
static_assertions::assert_impl_all!(CancelableSignal<i32>: Send, Sync);
