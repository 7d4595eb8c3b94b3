//! Server shared state
//!
//! Holds configuration and one resolution engine per mounted location
//! picker session. Sessions not used for `server.session_ttl_secs` are
//! dropped, since a closed browser tab never unmounts its picker.

use crate::config::Config;
use crate::coord::{Position, ReferencePoint};
use crate::error::Result;
use crate::geo::GeoProvider;
use crate::resolve::{EventLog, LookupPolicy, ResolutionEngine};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Recent notifications kept per session
pub const SESSION_HISTORY: usize = 64;

/// Engine backing one picker session
pub type Session<P> = ResolutionEngine<P, EventLog>;

/// A session with the time it was last used
struct SessionEntry<P> {
    session: Arc<Session<P>>,
    last_used: tokio::time::Instant,
}

impl<P> SessionEntry<P> {
    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_used.elapsed() >= ttl
    }
}

/// Shared state for the HTTP server
pub struct AppState<P> {
    /// Configuration
    pub config: Config,

    provider: P,
    policy: LookupPolicy,
    reference: ReferencePoint,
    session_ttl: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry<P>>>,
    started_at: Instant,
}

impl<P: GeoProvider + Clone> AppState<P> {
    /// Create new application state
    pub fn new(config: Config, provider: P) -> Result<Self> {
        Ok(Self {
            policy: config.lookup_policy(),
            reference: config.reference_point()?,
            session_ttl: config.session_ttl(),
            config,
            provider,
            sessions: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        })
    }

    pub fn reference(&self) -> &ReferencePoint {
        &self.reference
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Mount a new picker session with optional stored values
    pub async fn open_session(
        &self,
        position: Option<Position>,
        address: String,
    ) -> (Uuid, Arc<Session<P>>) {
        let engine = ResolutionEngine::new(
            self.provider.clone(),
            EventLog::bounded(SESSION_HISTORY),
            self.policy.clone(),
            self.reference.clone(),
        )
        .with_initial(position, address);

        let id = Uuid::new_v4();
        let session = Arc::new(engine);

        let mut sessions = self.sessions.write().await;
        let ttl = self.session_ttl;
        sessions.retain(|_, entry| !entry.is_idle(ttl));
        sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&session),
                last_used: tokio::time::Instant::now(),
            },
        );
        (id, session)
    }

    /// Look up a session and mark it as used
    pub async fn session(&self, id: &Uuid) -> Option<Arc<Session<P>>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if entry.is_idle(self.session_ttl) {
            sessions.remove(id);
            return None;
        }
        entry.last_used = tokio::time::Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Unmount a session; returns whether it existed
    pub async fn close_session(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop sessions unused for longer than the TTL; returns how many
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.session_ttl;
        sessions.retain(|_, entry| !entry.is_idle(ttl));

        let swept = before - sessions.len();
        if swept > 0 {
            debug!("Dropped {} idle session(s)", swept);
        }
        swept
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
