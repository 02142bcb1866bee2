//! Per-datastore exclusive locks
//!
//! A datastore is either unlocked or locked by one session. `lock` overwrites
//! any previous holder without checking it: deciding whether a session may
//! take a lock (NETCONF `lock-denied`) is the protocol layer's job, see
//! [`crate::handler`].

use tracing::{debug, info};

use crate::datastore::Datastore;
use crate::error::{Result, XmldbError};
use crate::store::{Existence, SessionId, StoreName};

impl Datastore {
    /// Fail with not-found unless the datastore has metadata or a backing file
    fn ensure_known(&self, name: StoreName) -> Result<()> {
        if self.registry.get(name).is_some() || self.existence(name)? != Existence::Absent {
            Ok(())
        } else {
            Err(XmldbError::NotFound(name))
        }
    }

    /// Lock a datastore for a session, replacing any previous holder
    pub fn lock(&mut self, name: StoreName, id: SessionId) -> Result<()> {
        self.ensure_known(name)?;
        let meta = self.registry.entry(name);
        if let Some(prev) = meta.lock_holder.replace(id)
            && prev != id
        {
            debug!(store = %name, %prev, "lock taken over");
        }
        info!(store = %name, session = %id, "locked");
        Ok(())
    }

    /// Unlock a datastore regardless of holder
    pub fn unlock(&mut self, name: StoreName) -> Result<()> {
        self.ensure_known(name)?;
        if let Some(meta) = self.registry.get_mut(name)
            && let Some(id) = meta.lock_holder.take()
        {
            info!(store = %name, session = %id, "unlocked");
        }
        Ok(())
    }

    /// Unlock every datastore held by a session, eg when it dies.
    /// Returns the number of datastores released.
    pub fn unlock_all(&mut self, id: SessionId) -> usize {
        let mut released = 0;
        for (name, meta) in self.registry.iter_mut() {
            if meta.lock_holder == Some(id) {
                meta.lock_holder = None;
                released += 1;
                info!(store = %name, session = %id, "unlocked on session end");
            }
        }
        released
    }

    /// Session holding the lock on a datastore, if any
    pub fn is_locked(&self, name: StoreName) -> Result<Option<SessionId>> {
        match self.registry.get(name) {
            Some(meta) => Ok(meta.lock_holder),
            None => self.ensure_known(name).map(|()| None),
        }
    }
}
