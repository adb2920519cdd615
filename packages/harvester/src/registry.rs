//! Process-wide table of in-flight extraction sessions.
//!
//! Two actors touch this: the HTTP stop-handler flips a session's liveness,
//! and the scroll/extract loop polls it between cycles. Liveness is a
//! `CancellationToken`, so the flip is an atomic, advisory signal; nothing
//! here preempts a cycle in progress.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct SessionEntry {
    token: CancellationToken,
    started_at: DateTime<Utc>,
}

/// Outcome of a stop request, distinguishing "stopped" from "no such
/// session" for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Session was known; its liveness flag is now down.
    Stopped,
    /// No live session under that identifier.
    NotFound,
}

/// Registry of live sessions keyed by identifier.
///
/// Injected into the loop and the stop-handler via shared state; entries are
/// inserted when a scrape request is accepted and removed during terminal
/// cleanup. Lock sections are a few map operations, never held across await
/// points.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a time-derived session identifier. Millisecond resolution is
    /// enough in practice; a collision with an in-flight session gets a
    /// disambiguating suffix rather than clobbering it.
    pub fn next_session_id(&self) -> String {
        let base = Utc::now().timestamp_millis().to_string();
        let sessions = self.sessions.read().unwrap();
        if !sessions.contains_key(&base) {
            return base;
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{base}-{n}");
            if !sessions.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Insert a session and return its cancellation token.
    pub fn register(&self, session_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        let entry = SessionEntry {
            token: token.clone(),
            started_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session_id.to_string(), entry);
        debug!(session_id, "session registered");
        token
    }

    /// Flip a session's liveness flag. The session itself stays registered
    /// until its loop observes the flag and finalizes.
    pub fn cancel(&self, session_id: &str) -> CancelOutcome {
        let sessions = self.sessions.read().unwrap();
        match sessions.get(session_id) {
            Some(entry) => {
                entry.token.cancel();
                debug!(session_id, "session cancellation requested");
                CancelOutcome::Stopped
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// True while the session exists and has not been stopped.
    pub fn is_live(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .unwrap()
            .get(session_id)
            .is_some_and(|entry| !entry.token.is_cancelled())
    }

    /// Remove a session at terminal cleanup.
    pub fn remove(&self, session_id: &str) {
        if self.sessions.write().unwrap().remove(session_id).is_some() {
            debug!(session_id, "session removed");
        }
    }

    /// Number of registered sessions, cancelled-but-not-yet-finalized ones
    /// included.
    pub fn active_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Start timestamp for a registered session.
    pub fn started_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions
            .read()
            .unwrap()
            .get(session_id)
            .map(|entry| entry.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_cancel_remove_lifecycle() {
        let registry = SessionRegistry::new();
        let id = registry.next_session_id();

        let token = registry.register(&id);
        assert!(registry.is_live(&id));
        assert_eq!(registry.active_count(), 1);
        assert!(!token.is_cancelled());

        assert_eq!(registry.cancel(&id), CancelOutcome::Stopped);
        assert!(token.is_cancelled());
        assert!(!registry.is_live(&id));
        // Cancelled sessions stay registered until their loop finalizes.
        assert_eq!(registry.active_count(), 1);

        registry.remove(&id);
        assert_eq!(registry.active_count(), 0);
        assert!(!registry.is_live(&id));
    }

    #[test]
    fn cancel_unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        let id = registry.next_session_id();
        registry.register(&id);

        assert_eq!(registry.cancel("missing"), CancelOutcome::NotFound);
        // The miss must not disturb other sessions.
        assert!(registry.is_live(&id));
    }

    #[test]
    fn minted_ids_never_collide_with_registered_ones() {
        let registry = SessionRegistry::new();
        let first = registry.next_session_id();
        registry.register(&first);

        // Same-millisecond requests take the suffix path.
        let second = registry.next_session_id();
        assert_ne!(first, second);
    }
}
