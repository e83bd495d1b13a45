use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::history::History;
use crate::models::{ImageAnalysis, Sample, SuggestionRecord, Thresholds};
use crate::monitor::MonitorHandle;

/// Everything one user accumulates while interacting with the service.
pub struct Session {
    pub samples: History<Sample>,
    pub suggestions: History<SuggestionRecord>,
    pub image_analysis: Option<ImageAnalysis>,
    pub thresholds: Thresholds,
    pub monitor: Option<MonitorHandle>,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            samples: History::with_capacity(config.history.samples),
            suggestions: History::with_capacity(config.history.suggestions),
            image_analysis: None,
            thresholds: Thresholds::from(&config.thresholds),
            monitor: None,
        }
    }

    /// Moves samples produced by the background monitor into the history.
    pub fn collect_monitor_samples(&mut self) -> usize {
        let Some(monitor) = self.monitor.as_mut() else {
            return 0;
        };
        let drained = monitor.drain();
        let count = drained.len();
        for sample in drained {
            self.samples.push(sample);
        }
        count
    }

    pub fn monitor_running(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| m.is_running())
    }
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

/// Sessions keyed by id. State is never shared between two ids.
pub struct SessionStore {
    sessions: DashMap<Uuid, Entry>,
    config: Arc<AppConfig>,
}

impl SessionStore {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Returns the session for `id`, creating a fresh one when `id` is absent
    /// or unknown. The flag tells whether a new session was created.
    pub fn resolve(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Session>>, bool) {
        if let Some(id) = id {
            if let Some(mut entry) = self.sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return (id, entry.session.clone(), false);
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(&self.config)));
        self.sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        debug!("Created session {}", id);
        (id, session, true)
    }

    /// Returns the session for `id` if it is registered, without creating
    /// one.
    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        let mut entry = self.sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions not seen for `idle`. Their monitors stop with them.
    pub fn sweep_idle(&self, idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_seen.elapsed() < idle);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("Expired {} idle sessions", removed);
        }
        removed
    }
}
