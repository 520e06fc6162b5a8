//! Per-shelf adapter instances, shared across request handlers.
//!
//! The table lock covers only lookup and insertion, so two callers racing on a
//! new shelf id still end up with the same instance. Login runs under the
//! instance's own lock: concurrent first requests for one shelf produce a
//! single upstream login, and requests for other shelves are never blocked by
//! it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapter::{LoginState, SiteAdapter};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::formats::{ShelfCredential, ShelfId};
use crate::registry::Registry;

pub struct Session {
    shelf_id: ShelfId,
    credential: ShelfCredential,
    adapter: Mutex<Box<dyn SiteAdapter>>,
}

impl Session {
    pub fn shelf_id(&self) -> &ShelfId {
        &self.shelf_id
    }

    /// Exclusive access to the adapter. Hold the guard for the whole operation;
    /// adapters keep cookie and login state between requests.
    pub fn adapter(&self) -> MutexGuard<'_, Box<dyn SiteAdapter>> {
        self.adapter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("shelf_id", &self.shelf_id)
            .finish_non_exhaustive()
    }
}

pub struct SessionManager {
    registry: Registry,
    config: ClientConfig,
    sessions: Mutex<HashMap<ShelfId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(registry: Registry, config: ClientConfig) -> Self {
        Self {
            registry,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the logged-in session for `credential.shelf_id`, creating and
    /// logging in the adapter on first use.
    ///
    /// A login failure is returned to the caller and leaves the instance
    /// logged out, so the next call retries. A credential that differs from
    /// the cached one (password change, different site) replaces the instance.
    pub fn get_session(&self, credential: ShelfCredential) -> Result<Arc<Session>> {
        let session = self.lookup_or_insert(credential)?;

        let mut adapter = session.adapter();
        if adapter.login_state() == LoginState::NotLoggedIn {
            adapter.login()?;
        }
        drop(adapter);

        Ok(session)
    }

    /// Drops the cached instance for `shelf_id`. Returns whether one existed.
    pub fn invalidate(&self, shelf_id: &ShelfId) -> bool {
        let removed = self.table().remove(shelf_id).is_some();
        if removed {
            tracing::info!(shelf_id = %shelf_id, "session invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    fn lookup_or_insert(&self, credential: ShelfCredential) -> Result<Arc<Session>> {
        let mut table = self.table();

        if let Some(existing) = table.get(&credential.shelf_id) {
            if existing.credential == credential {
                return Ok(Arc::clone(existing));
            }
            tracing::info!(
                shelf_id = %credential.shelf_id,
                "credential changed; replacing session"
            );
        }

        let shelf_id = credential.shelf_id.clone();
        let adapter = self.registry.build(credential.clone(), &self.config)?;
        let session = Arc::new(Session {
            shelf_id: shelf_id.clone(),
            credential,
            adapter: Mutex::new(adapter),
        });
        tracing::debug!(shelf_id = %shelf_id, "session created");
        table.insert(shelf_id, Arc::clone(&session));
        Ok(session)
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ShelfId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
