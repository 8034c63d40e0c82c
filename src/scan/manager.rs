use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info, instrument};

use super::session::ScanSession;
use super::types::SessionOutcome;

/// Registry of in-flight camera scan sessions
///
/// Lets an HTTP caller cancel a running session by id while another request
/// is long-polling its outcome. Sessions remove themselves on completion.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<ScanSession>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the session and spawns its camera flow; the returned
    /// receiver resolves with the terminal outcome
    pub async fn start_camera_session(
        self: &Arc<Self>,
        session: Arc<ScanSession>,
    ) -> oneshot::Receiver<SessionOutcome> {
        let session_id = session.id().to_string();
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), session.clone());
        }
        debug!(session_id = %session_id, "Camera scan session registered");

        let (tx, rx) = oneshot::channel();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = session.run_camera().await;
            manager.remove(&session_id).await;
            // The caller may have gone away; the outcome is then discarded
            let _ = tx.send(outcome);
        });

        rx
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<ScanSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Cancels the session with the given id; unknown or already-finished
    /// ids are a no-op. Returns whether a live session was found.
    #[instrument(skip(self))]
    pub async fn cancel(&self, session_id: &str) -> bool {
        let session = self.get(session_id).await;
        match session {
            Some(session) => {
                session.cancel().await;
                info!(session_id = %session_id, "Session cancelled via manager");
                true
            }
            None => {
                debug!(session_id = %session_id, "Cancel for unknown session is a no-op");
                false
            }
        }
    }

    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    async fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::InMemoryProductCatalog;
    use crate::event::EventBus;
    use crate::ledger::models::Profile;
    use crate::ledger::repository::{InMemoryProfileStore, InMemoryScanEventStore};
    use crate::ledger::service::RewardLedger;
    use crate::scan::detector::UnavailableDetector;
    use crate::scan::types::ScanTimings;
    use std::time::Duration;

    fn fast_timings() -> ScanTimings {
        ScanTimings {
            detection_timeout: Duration::from_millis(30),
            settle_delay: Duration::from_millis(10),
            exit_delay: Duration::from_millis(10),
        }
    }

    fn make_session() -> Arc<ScanSession> {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let profiles = Arc::new(InMemoryProfileStore::with_profiles(vec![Profile::new(
            "user-1".to_string(),
            None,
        )]));
        let scans = Arc::new(InMemoryScanEventStore::new(catalog.clone()));
        let ledger = Arc::new(RewardLedger::new(profiles, scans));

        ScanSession::new(
            "user-1".to_string(),
            catalog,
            ledger,
            Arc::new(UnavailableDetector),
            EventBus::new(),
            fast_timings(),
        )
    }

    #[tokio::test]
    async fn session_is_removed_after_completion() {
        let manager = Arc::new(SessionManager::new());
        let session = make_session();
        let session_id = session.id().to_string();

        let rx = manager.start_camera_session(session).await;
        assert_eq!(manager.active_count().await, 1);

        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Settled(_)));
        assert_eq!(manager.active_count().await, 0);
        assert!(manager.get(&session_id).await.is_none());
    }

    #[tokio::test]
    async fn cancel_unknown_session_is_a_no_op() {
        let manager = Arc::new(SessionManager::new());
        assert!(!manager.cancel("nonexistent").await);
    }
}
