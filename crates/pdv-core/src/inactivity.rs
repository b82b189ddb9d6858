//! # Inactivity Tracking
//!
//! Decides whether a session is active, about to expire, or expired.
//!
//! ```text
//!  last_activity                       timeout − warning           timeout
//!       │──────────── Active ─────────────────│────── Warning ───────│── Expired ──►
//! ```
//!
//! Pure: callers pass `now`. pdv-server keeps one tracker per session and
//! touches it on every authenticated request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::SecuritySettings;

/// Timeout and warning window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityPolicy {
    pub timeout: Duration,
    pub warning: Duration,
    pub warnings_enabled: bool,
}

impl Default for InactivityPolicy {
    fn default() -> Self {
        SecuritySettings::default().into()
    }
}

impl From<SecuritySettings> for InactivityPolicy {
    fn from(s: SecuritySettings) -> Self {
        InactivityPolicy {
            timeout: Duration::minutes(s.inactivity_timeout_minutes),
            warning: Duration::minutes(s.warning_minutes),
            warnings_enabled: s.warnings_enabled,
        }
    }
}

impl From<InactivityPolicy> for SecuritySettings {
    fn from(p: InactivityPolicy) -> Self {
        SecuritySettings {
            inactivity_timeout_minutes: p.timeout.num_minutes(),
            warning_minutes: p.warning.num_minutes(),
            warnings_enabled: p.warnings_enabled,
        }
    }
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ActivityState {
    Active { remaining_secs: i64 },
    Warning { remaining_secs: i64 },
    Expired,
}

impl ActivityState {
    pub fn is_expired(&self) -> bool {
        matches!(self, ActivityState::Expired)
    }
}

/// Last-activity clock of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityTracker {
    last_activity: DateTime<Utc>,
}

impl InactivityTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        InactivityTracker { last_activity: now }
    }

    /// Records activity at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn state(&self, policy: &InactivityPolicy, now: DateTime<Utc>) -> ActivityState {
        let idle = now - self.last_activity;
        let remaining = policy.timeout - idle;

        if remaining <= Duration::zero() {
            return ActivityState::Expired;
        }
        let remaining_secs = remaining.num_seconds();
        if policy.warnings_enabled && remaining <= policy.warning {
            ActivityState::Warning { remaining_secs }
        } else {
            ActivityState::Active { remaining_secs }
        }
    }
}
