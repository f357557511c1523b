//! Session-scoped cart store with change subscriptions.
//!
//! Replaces the source system's global cart singleton: one store, carts keyed
//! by session, and observers notified through subscriptions rather than
//! reaching into shared mutable state.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock, mpsc};

use couture_core::SessionId;

use crate::cart::Cart;

/// Change notification emitted after a cart mutation is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    pub session_id: SessionId,
}

/// In-memory cart store, one cart per session.
#[derive(Debug, Default)]
pub struct SessionCartStore {
    carts: RwLock<HashMap<SessionId, Cart>>,
    subscribers: Mutex<Vec<mpsc::Sender<CartChanged>>>,
}

impl SessionCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cart for a session (an empty one if none stored yet).
    pub fn get(&self, session_id: SessionId) -> Cart {
        self.carts
            .read()
            .ok()
            .and_then(|m| m.get(&session_id).cloned())
            .unwrap_or_else(|| Cart::empty(session_id))
    }

    /// Store the new cart state and notify subscribers.
    pub fn put(&self, cart: Cart) {
        let session_id = cart.session_id;
        if let Ok(mut map) = self.carts.write() {
            map.insert(session_id, cart);
        }
        self.notify(session_id);
    }

    /// Drop a session's cart entirely.
    pub fn remove(&self, session_id: SessionId) {
        if let Ok(mut map) = self.carts.write() {
            map.remove(&session_id);
        }
        self.notify(session_id);
    }

    /// Subscribe to change notifications (dead receivers are dropped on the
    /// next notify).
    pub fn subscribe(&self) -> mpsc::Receiver<CartChanged> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    fn notify(&self, session_id: SessionId) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(CartChanged { session_id }).is_ok());
        }
    }
}
