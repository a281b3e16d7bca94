use std::sync::Arc;

use active_model::Database;
use config::SiteConfig;

use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(db: Database, site: SiteConfig) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
            site: Arc::new(site),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}
