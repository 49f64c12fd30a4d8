use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::{Session, SessionEvent};

pub type SessionCallback = Arc<dyn Fn(SessionEvent, Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    callbacks: Vec<(u64, SessionCallback)>,
}

/// Registry of session-change callbacks
#[derive(Clone, Default)]
pub struct SessionListeners {
    table: Arc<Mutex<ListenerTable>>,
}

fn lock(table: &Mutex<ListenerTable>) -> MutexGuard<'_, ListenerTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: SessionCallback) -> Subscription {
        let mut table = lock(&self.table);
        table.next_id += 1;
        let id = table.next_id;
        table.callbacks.push((id, callback));
        tracing::debug!("session listener {} registered", id);

        Subscription {
            table: Arc::downgrade(&self.table),
            id: Some(id),
        }
    }

    pub fn notify(&self, event: SessionEvent, session: Option<&Session>) {
        // Callbacks run outside the lock so they may unsubscribe themselves
        let callbacks: Vec<SessionCallback> = lock(&self.table)
            .callbacks
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        tracing::debug!("session event {:?} -> {} listener(s)", event, callbacks.len());
        for callback in callbacks {
            callback(event, session);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.table).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a registered callback; unregisters exactly once, on
/// [`Subscription::unsubscribe`] or on drop, whichever comes first.
pub struct Subscription {
    table: Weak<Mutex<ListenerTable>>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(table) = self.table.upgrade() {
                lock(&table).callbacks.retain(|(existing, _)| *existing != id);
                tracing::debug!("session listener {} released", id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
