use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::store::MemorySessionStorage;
use super::submission::InFlightFlag;

/// Header carrying the client's session identifier.
pub const SESSION_HEADER: &str = "x-intake-session";

/// Sessions untouched for this long are dropped, like a closed browser tab.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live sessions; the least recently used one makes room.
pub const DEFAULT_CAPACITY: usize = 10_000;

const MAX_SESSION_ID_LENGTH: usize = 128;

/// Storage and submission flag owned by one browser session.
#[derive(Debug, Default)]
pub struct ClientSession {
    pub storage: Arc<MemorySessionStorage>,
    pub in_flight: InFlightFlag,
    edits: Mutex<()>,
}

impl ClientSession {
    /// Serializes load-modify-persist cycles on this session's answers.
    ///
    /// Never hold the guard across an `.await`.
    pub fn lock_edits(&self) -> MutexGuard<'_, ()> {
        self.edits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Entry {
    session: Arc<ClientSession>,
    last_seen: Instant,
    recency: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<String, Entry>,
    clock: u64,
}

/// All live client sessions. Each gets its own session storage, like a browser tab.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<Sessions>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT, DEFAULT_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    /// Look up or create the session. `None` when the id is malformed.
    ///
    /// Creating a session first sweeps idle ones, then evicts the least recently
    /// used session if the registry is still full.
    pub fn session(&self, id: &str) -> Option<Arc<ClientSession>> {
        if !is_valid_session_id(id) {
            return None;
        }

        let now = Instant::now();
        let mut sessions = self.lock();
        sessions.clock += 1;
        let recency = sessions.clock;

        if let Some(entry) = sessions.entries.get_mut(id) {
            if now.duration_since(entry.last_seen) < self.idle_timeout {
                entry.last_seen = now;
                entry.recency = recency;
                return Some(entry.session.clone());
            }
        }

        let idle_timeout = self.idle_timeout;
        let before = sessions.entries.len();
        sessions
            .entries
            .retain(|_, entry| now.duration_since(entry.last_seen) < idle_timeout);
        let expired = before - sessions.entries.len();
        if expired > 0 {
            debug!(expired, "dropped idle sessions");
        }

        if sessions.entries.len() >= self.capacity {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.recency)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.entries.remove(&oldest);
                debug!("session registry full; evicted least recently used session");
            }
        }

        let session = Arc::new(ClientSession::default());
        sessions.entries.insert(
            id.to_string(),
            Entry {
                session: session.clone(),
                last_seen: now,
                recency,
            },
        );
        Some(session)
    }

    /// Forget a session once its application is submitted or cancelled.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
