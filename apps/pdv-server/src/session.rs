//! # Session Store
//!
//! Server-side sessions with inactivity expiry.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  login ──► create(user) ──► session id (JWT jti)                       │
//! │                                  │                                      │
//! │  request ──► check(id, now) ─────┤                                      │
//! │               ├── unknown ───────┼──► 401                               │
//! │               ├── idle too long ─┼──► removed, 401 "Sessão expirada"    │
//! │               └── alive ─────────┴──► touch(now), continue              │
//! │                                                                         │
//! │  logout ──► revoke(id)        user deactivated ──► revoke_user(id)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The inactivity policy is shared by every session and can be swapped at
//! runtime when a manager saves new security settings.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use pdv_core::inactivity::{ActivityState, InactivityPolicy, InactivityTracker};
use uuid::Uuid;

/// One signed-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    tracker: InactivityTracker,
}

/// Why a session check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Sessão não encontrada")]
    Unknown,

    #[error("Sessão expirada por inatividade")]
    Expired,
}

/// Shared session table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    policy: Arc<RwLock<InactivityPolicy>>,
}

impl SessionStore {
    pub fn new(policy: InactivityPolicy) -> Self {
        SessionStore {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            policy: Arc::new(RwLock::new(policy)),
        }
    }

    pub fn policy(&self) -> InactivityPolicy {
        *self.policy.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_policy(&self, policy: InactivityPolicy) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Opens a session for `user_id` and returns its id.
    pub fn create(&self, user_id: &str, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            user_id: user_id.to_string(),
            tracker: InactivityTracker::new(now),
        };

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), session);

        tracing::debug!(session_id = %id, user_id = %user_id, "Session created");
        id
    }

    /// Validates a session and, when `touch` is set, records activity.
    ///
    /// An expired session is removed.
    pub fn check(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        touch: bool,
    ) -> Result<(Session, ActivityState), SessionError> {
        let policy = self.policy();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        let session = sessions.get_mut(session_id).ok_or(SessionError::Unknown)?;

        if session.tracker.state(&policy, now).is_expired() {
            let user_id = session.user_id.clone();
            sessions.remove(session_id);
            tracing::info!(session_id = %session_id, user_id = %user_id, "Session expired by inactivity");
            return Err(SessionError::Expired);
        }

        if touch {
            session.tracker.touch(now);
        }

        let state = session.tracker.state(&policy, now);
        Ok((session.clone(), state))
    }

    pub fn revoke(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    /// Ends every session of a user. Returns how many were removed.
    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    /// Drops sessions idle past the timeout. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let policy = self.policy();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| !s.tracker.state(&policy, now).is_expired());
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> SessionStore {
        SessionStore::new(InactivityPolicy::default())
    }

    #[test]
    fn test_session_touch_keeps_alive() {
        let store = store();
        let t0 = Utc::now();
        let id = store.create("u1", t0);

        let (session, state) = store.check(&id, t0 + Duration::minutes(20), true).unwrap();
        assert_eq!(session.user_id, "u1");
        assert!(matches!(state, ActivityState::Active { .. }));

        // 20 minutes after the touch, still alive
        assert!(store.check(&id, t0 + Duration::minutes(40), true).is_ok());
    }

    #[test]
    fn test_idle_session_expires_and_is_removed() {
        let store = store();
        let t0 = Utc::now();
        let id = store.create("u1", t0);

        assert_eq!(
            store.check(&id, t0 + Duration::minutes(31), true).unwrap_err(),
            SessionError::Expired
        );
        assert_eq!(
            store.check(&id, t0 + Duration::minutes(31), true).unwrap_err(),
            SessionError::Unknown
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_check_without_touch_keeps_idle_clock() {
        let store = store();
        let t0 = Utc::now();
        let id = store.create("u1", t0);

        let (_, state) = store.check(&id, t0 + Duration::minutes(26), false).unwrap();
        assert!(matches!(state, ActivityState::Warning { .. }));
        // Checks without touch leave the idle clock running
        assert_eq!(
            store.check(&id, t0 + Duration::minutes(31), false).unwrap_err(),
            SessionError::Expired
        );
    }

    #[test]
    fn test_policy_change_applies_to_existing_sessions() {
        let store = store();
        let t0 = Utc::now();
        let id = store.create("u1", t0);

        store.set_policy(InactivityPolicy {
            timeout: Duration::minutes(5),
            warning: Duration::minutes(1),
            warnings_enabled: true,
        });
        assert_eq!(
            store.check(&id, t0 + Duration::minutes(6), true).unwrap_err(),
            SessionError::Expired
        );
    }

    #[test]
    fn test_revoke_and_purge() {
        let store = store();
        let t0 = Utc::now();
        let a = store.create("u1", t0);
        store.create("u1", t0);
        store.create("u2", t0 - Duration::hours(1));

        assert_eq!(store.purge_expired(t0), 1);
        assert!(store.revoke(&a));
        assert!(!store.revoke(&a));
        assert_eq!(store.revoke_user("u1"), 1);
        assert!(store.is_empty());
    }
}
