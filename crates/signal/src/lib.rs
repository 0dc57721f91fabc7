//! `live-model-signal` — an ordered multicast signal.
//!
//! A `Signal<E>` is an explicit observer list: listeners are attached in a
//! known order, delivery is synchronous and follows attachment order, and a
//! listener may be registered for a single delivery only. There is no global
//! event bus; every signal is an owned value.

use std::collections::BTreeMap;
use std::fmt;

/// Boxed listener callback, as stored by [`Signal`].
pub type Listener<E> = Box<dyn FnMut(&E) + Send + Sync>;

/// Handle returned by [`Signal::listen`], used to detach the listener later.
pub type ListenerId = u64;

struct Entry<E> {
    callback: Listener<E>,
    once: bool,
}

/// An ordered multicast signal.
///
/// Listener ids are handed out in ascending order and delivery iterates ids
/// in ascending order, so delivery order equals attachment order.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use live_model_signal::Signal;
///
/// let total = Arc::new(AtomicUsize::new(0));
/// let sink = total.clone();
///
/// let mut signal: Signal<u32> = Signal::new();
/// signal.listen(move |n: &u32| {
///     sink.fetch_add(*n as usize, Ordering::SeqCst);
/// });
///
/// signal.dispatch(&2);
/// signal.dispatch(&3);
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct Signal<E> {
    next_id: ListenerId,
    listeners: BTreeMap<ListenerId, Entry<E>>,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            listeners: BTreeMap::new(),
        }
    }

    /// Attach a listener; it stays attached until [`Signal::unlisten`].
    pub fn listen<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.insert(Box::new(listener), false)
    }

    /// Attach a listener that is removed after its first delivery.
    pub fn listen_once<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.insert(Box::new(listener), true)
    }

    /// Detach a listener. Returns `false` if the id is not attached.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver `event` to every current listener, in attachment order.
    ///
    /// One-shot listeners are dropped after their delivery. The call returns
    /// only after every listener has run.
    pub fn dispatch(&mut self, event: &E) {
        let ids: Vec<ListenerId> = self.listeners.keys().copied().collect();
        for id in ids {
            let Some(entry) = self.listeners.get_mut(&id) else {
                continue;
            };
            (entry.callback)(event);
            if entry.once {
                self.listeners.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Detach every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    fn insert(&mut self, callback: Listener<E>, once: bool) -> ListenerId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(id, Entry { callback, once });
        id
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
