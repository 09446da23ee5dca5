use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::GenerateError;
use crate::types::StyleProfile;

/// Identifies one user's analyze/generate conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Style profiles keyed by session.
///
/// Each session holds at most one profile; storing again overwrites it. The
/// store keeps at most `capacity` sessions and evicts the least recently
/// stored one when a new session would exceed it.
#[derive(Debug)]
pub struct ProfileStore {
    capacity: usize,
    inner: Mutex<Profiles>,
}

#[derive(Debug, Default)]
struct Profiles {
    entries: HashMap<SessionId, (u64, StyleProfile)>,
    order: BTreeMap<u64, SessionId>,
    next_seq: u64,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` sessions (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Profiles::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `profile` for `session`, returning the profile it replaced.
    pub fn store(&self, session: SessionId, profile: StyleProfile) -> Option<StyleProfile> {
        let mut profiles = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = profiles.next_seq;
        profiles.next_seq += 1;

        let previous = profiles.entries.insert(session, (seq, profile));
        if let Some((old_seq, _)) = &previous {
            profiles.order.remove(old_seq);
        }
        profiles.order.insert(seq, session);

        while profiles.entries.len() > self.capacity {
            let Some((_, evicted)) = profiles.order.pop_first() else {
                break;
            };
            profiles.entries.remove(&evicted);
            tracing::debug!(session = %evicted, "evicted style profile");
        }
        previous.map(|(_, profile)| profile)
    }

    pub fn get(&self, session: &SessionId) -> Option<StyleProfile> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(session)
            .map(|(_, profile)| profile.clone())
    }

    /// Profile for `session`, failing when no analysis has completed for it.
    pub fn require(&self, session: Option<&SessionId>) -> Result<StyleProfile, GenerateError> {
        session
            .and_then(|session| self.get(session))
            .ok_or(GenerateError::AnalysisMissing)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
