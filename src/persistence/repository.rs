//! Typed repositories over the local store.
//!
//! Each operation is a single read-modify-write of the whole document.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{LocalStore, StoreError};
use crate::domain::entities::database::{Settings, MAX_SIGNALS, MAX_TICKER_MESSAGES};
use crate::domain::entities::post::Post;
use crate::domain::entities::signal::TradeSignal;
use crate::domain::entities::user::User;

/// Trade signals and ticker messages
#[derive(Clone)]
pub struct SignalRepository {
    store: Arc<LocalStore>,
}

impl SignalRepository {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Newest first
    pub fn list_signals(&self) -> Result<Vec<TradeSignal>, StoreError> {
        Ok(self.store.load()?.signals)
    }

    /// Prepend and keep the 50 most recent
    pub fn add_signal(&self, signal: TradeSignal) -> Result<(), StoreError> {
        if !signal.has_consistent_levels() {
            warn!(
                "Signal {} has inconsistent {} levels (entry {}, sl {}, tp1 {}, tp2 {})",
                signal.id, signal.direction, signal.entry, signal.sl, signal.tp1, signal.tp2
            );
        }
        let id = signal.id.clone();
        self.store.update(move |db| {
            db.signals.insert(0, signal);
            db.signals.truncate(MAX_SIGNALS);
        })?;
        debug!("Added signal: {}", id);
        Ok(())
    }

    /// Remove the signal with `id`; returns false when nothing matched
    pub fn delete_signal(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.store.update(|db| {
            match db.signals.iter().position(|s| s.id == id) {
                Some(index) => {
                    db.signals.remove(index);
                    true
                }
                None => false,
            }
        })?;
        debug!("Delete signal {}: removed={}", id, removed);
        Ok(removed)
    }

    pub fn list_ticker(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.store.load()?.ticker_messages)
    }

    /// Replace the whole list; the caller owns the cap
    pub fn set_ticker(&self, messages: Vec<String>) -> Result<(), StoreError> {
        self.store.update(move |db| db.ticker_messages = messages)
    }

    /// Admin path: prepend one message and keep the 5 newest
    pub fn push_ticker(&self, message: &str) -> Result<Vec<String>, StoreError> {
        let message = message.trim();
        if message.is_empty() {
            return self.list_ticker();
        }
        let message = message.to_string();
        self.store.update(move |db| {
            db.ticker_messages.insert(0, message);
            db.ticker_messages.truncate(MAX_TICKER_MESSAGES);
            db.ticker_messages.clone()
        })
    }
}

/// Community feed
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<LocalStore>,
}

impl PostRepository {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.store.load()?.posts)
    }

    pub fn add_post(&self, post: Post) -> Result<(), StoreError> {
        self.store.update(move |db| db.posts.insert(0, post))
    }
}

/// Current user and settings
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<LocalStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn current_user(&self) -> Result<Option<User>, StoreError> {
        Ok(self.store.load()?.user)
    }

    /// Replace the current user; `None` logs out
    pub fn set_user(&self, user: Option<User>) -> Result<(), StoreError> {
        self.store.update(move |db| db.user = user)
    }

    pub fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.store.load()?.settings)
    }
}
