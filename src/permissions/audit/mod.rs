/*!
 * Permission Audit Trail
 * Tracks permission decisions and cache failures for monitoring
 */

use crate::core::limits::{
    MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_USER as MAX_USER_EVENTS, MAX_AUDIT_USERS,
};
use crate::core::types::{GuildId, PermissionKey, UserId};
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Outcome of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Granted,
    Denied,
    /// No role mentioned the key; the caller's default applied
    Defaulted,
    /// Owner bypass, cache not consulted
    OwnerBypass,
    /// Cache unreachable; failed closed
    CacheFailure,
}

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// One recorded decision
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub user_id: UserId,
    pub guild_id: Option<GuildId>,
    pub keys: Vec<PermissionKey>,
    pub decision: Decision,
    pub severity: AuditSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn new(
        user_id: UserId,
        guild_id: Option<GuildId>,
        keys: Vec<PermissionKey>,
        decision: Decision,
    ) -> Self {
        let severity = match decision {
            Decision::Granted | Decision::OwnerBypass | Decision::Defaulted => AuditSeverity::Info,
            Decision::Denied => AuditSeverity::Warning,
            Decision::CacheFailure => AuditSeverity::Critical,
        };

        Self {
            user_id,
            guild_id,
            keys,
            decision,
            severity,
            detail: None,
            logged_at: SystemTime::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Audit logger for permission checks
///
/// Granted checks only bump a counter so the hot path stays lock-free; every
/// other decision is kept in the bounded buffers.
pub struct AuditLogger {
    /// Global event log (ring buffer)
    events: RwLock<VecDeque<AuditEvent>>,
    /// Per-user event logs
    user_events: Arc<DashMap<UserId, VecDeque<AuditEvent>, RandomState>>,
    /// Denial counters for monitoring
    denial_counts: Arc<DashMap<UserId, u64, RandomState>>,
    /// Tracked users, oldest first
    tracked: Mutex<VecDeque<UserId>>,
    granted: AtomicU64,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS)),
            user_events: Arc::new(DashMap::with_hasher(RandomState::new())),
            denial_counts: Arc::new(DashMap::with_hasher(RandomState::new())),
            tracked: Mutex::new(VecDeque::new()),
            granted: AtomicU64::new(0),
        }
    }

    /// Record a decision
    pub fn log(&self, event: AuditEvent) {
        if event.decision == Decision::Granted {
            self.granted.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let user_id = event.user_id;
        let counts_as_denial = matches!(event.decision, Decision::Denied | Decision::CacheFailure);

        push_bounded(&mut self.events.write(), event.clone(), MAX_AUDIT_EVENTS);
        self.track(user_id);
        if let Some(mut user_log) = self.user_events.get_mut(&user_id) {
            push_bounded(&mut user_log, event, MAX_USER_EVENTS);
        }

        if counts_as_denial {
            *self.denial_counts.entry(user_id).or_insert(0) += 1;
        }
    }

    /// Start a log for a new user, evicting the oldest one when full
    fn track(&self, user_id: UserId) {
        if self.user_events.contains_key(&user_id) {
            return;
        }

        let mut tracked = self.tracked.lock();
        if self.user_events.contains_key(&user_id) {
            return;
        }
        while tracked.len() >= MAX_AUDIT_USERS {
            let Some(evicted) = tracked.pop_front() else {
                break;
            };
            self.user_events.remove(&evicted);
            self.denial_counts.remove(&evicted);
        }
        tracked.push_back(user_id);
        self.user_events
            .insert(user_id, VecDeque::with_capacity(MAX_USER_EVENTS));
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent events of one user, newest first
    pub fn for_user(&self, user_id: UserId, limit: usize) -> Vec<AuditEvent> {
        self.user_events
            .get(&user_id)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn denial_count(&self, user_id: UserId) -> u64 {
        self.denial_counts.get(&user_id).map(|e| *e).unwrap_or(0)
    }

    /// Users with at least one denial
    pub fn users_with_denials(&self) -> Vec<(UserId, u64)> {
        self.denial_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn clear_user(&self, user_id: UserId) {
        let mut tracked = self.tracked.lock();
        tracked.retain(|tracked_id| *tracked_id != user_id);
        self.user_events.remove(&user_id);
        self.denial_counts.remove(&user_id);
    }

    /// Get statistics
    pub fn stats(&self) -> AuditStats {
        let events = self.events.read();
        let total_events = events.len();
        let cache_failures = events
            .iter()
            .filter(|event| event.decision == Decision::CacheFailure)
            .count();
        drop(events);

        AuditStats {
            total_events,
            total_granted: self.granted.load(Ordering::Relaxed),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum(),
            cache_failures,
            users_tracked: self.user_events.len(),
        }
    }
}

fn push_bounded(buffer: &mut VecDeque<AuditEvent>, event: AuditEvent, cap: usize) {
    while buffer.len() >= cap {
        buffer.pop_front();
    }
    buffer.push_back(event);
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    /// Retained non-granted events
    pub total_events: usize,
    pub total_granted: u64,
    pub total_denials: u64,
    /// Failures among the retained events
    pub cache_failures: usize,
    pub users_tracked: usize,
}
