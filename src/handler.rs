//! NETCONF operation handler
//!
//! Transport-agnostic dispatch of the datastore operations of RFC 6241 onto a
//! [`Datastore`]. This is where lock eligibility is checked: the engine's own
//! `lock` trusts its caller.

use std::fmt;

use crate::datastore::Datastore;
use crate::error::XmldbError;
use crate::store::{SessionId, StoreName};

/// Datastore operations a session can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rpc {
    /// `<lock>`
    Lock { target: StoreName },
    /// `<unlock>`
    Unlock { target: StoreName },
    /// `<copy-config>`
    CopyConfig { source: StoreName, target: StoreName },
    /// `<delete-config>`
    DeleteConfig { target: StoreName },
    /// `<commit>`: candidate into running
    Commit,
    /// `<discard-changes>`: running into candidate
    DiscardChanges,
    /// `<close-session>`
    CloseSession,
    /// `<kill-session>`
    KillSession { id: SessionId },
}

/// NETCONF `error-tag` values produced by the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    /// Lock held by another session, or candidate has pending changes
    LockDenied,
    /// Target locked by another session
    InUse,
    /// Unknown datastore or bad parameter
    InvalidValue,
    /// Operation not allowed on this datastore
    OperationNotSupported,
    /// Any engine failure
    OperationFailed,
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTag::LockDenied => f.write_str("lock-denied"),
            ErrorTag::InUse => f.write_str("in-use"),
            ErrorTag::InvalidValue => f.write_str("invalid-value"),
            ErrorTag::OperationNotSupported => f.write_str("operation-not-supported"),
            ErrorTag::OperationFailed => f.write_str("operation-failed"),
        }
    }
}

/// `<rpc-reply>` outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcReply {
    /// `<ok/>`
    Ok,
    /// `<rpc-error>`
    Error {
        /// Error tag
        tag: ErrorTag,
        /// Human readable message
        message: String,
        /// Lock holder, for `lock-denied`
        session: Option<SessionId>,
    },
}

impl RpcReply {
    fn error(tag: ErrorTag, message: impl Into<String>) -> Self {
        RpcReply::Error {
            tag,
            message: message.into(),
            session: None,
        }
    }

    /// Check if the reply is `<ok/>`
    pub fn is_ok(&self) -> bool {
        matches!(self, RpcReply::Ok)
    }

    /// Error tag of a failed reply
    pub fn tag(&self) -> Option<ErrorTag> {
        match self {
            RpcReply::Ok => None,
            RpcReply::Error { tag, .. } => Some(*tag),
        }
    }
}

impl From<XmldbError> for RpcReply {
    fn from(err: XmldbError) -> Self {
        let tag = if err.is_not_found() {
            ErrorTag::InvalidValue
        } else {
            ErrorTag::OperationFailed
        };
        RpcReply::error(tag, err.to_string())
    }
}

/// Main datastore request handler
#[derive(Debug)]
pub struct RequestHandler {
    /// The datastore engine
    datastore: Datastore,
}

impl RequestHandler {
    /// Create a new request handler with the given datastore
    pub fn new(datastore: Datastore) -> Self {
        Self { datastore }
    }

    /// Get a reference to the datastore
    pub fn datastore(&self) -> &Datastore {
        &self.datastore
    }

    /// Get a mutable reference to the datastore
    pub fn datastore_mut(&mut self) -> &mut Datastore {
        &mut self.datastore
    }

    /// Handle an operation on behalf of a session
    pub fn handle(&mut self, session: SessionId, rpc: &Rpc) -> RpcReply {
        let result = match *rpc {
            Rpc::Lock { target } => self.handle_lock(session, target),
            Rpc::Unlock { target } => self.handle_unlock(session, target),
            Rpc::CopyConfig { source, target } => {
                // Candidate diverges unless it is refreshed from running
                let modified = (target == StoreName::Candidate).then_some(source != StoreName::Running);
                self.handle_copy(session, source, target, modified)
            }
            Rpc::DeleteConfig { target } => self.handle_delete(session, target),
            Rpc::Commit => {
                self.handle_copy(session, StoreName::Candidate, StoreName::Running, Some(false))
            }
            Rpc::DiscardChanges => {
                self.handle_copy(session, StoreName::Running, StoreName::Candidate, Some(false))
            }
            Rpc::CloseSession => {
                self.datastore.unlock_all(session);
                Ok(RpcReply::Ok)
            }
            Rpc::KillSession { id } => self.handle_kill(session, id),
        };
        result.unwrap_or_else(RpcReply::from)
    }

    /// Reply for a store held by someone other than `session`
    fn held_by_other(
        &self,
        session: SessionId,
        target: StoreName,
        tag: ErrorTag,
    ) -> Result<Option<RpcReply>, XmldbError> {
        match self.datastore.is_locked(target)? {
            Some(holder) if holder != session => Ok(Some(RpcReply::Error {
                tag,
                message: format!("Operation failed, lock is already held on {target}"),
                session: Some(holder),
            })),
            _ => Ok(None),
        }
    }

    /// Candidate modified flag, unset if the candidate has no metadata
    fn candidate_modified(&self) -> bool {
        self.datastore
            .modified_get(StoreName::Candidate)
            .unwrap_or(false)
    }

    fn handle_lock(&mut self, session: SessionId, target: StoreName) -> Result<RpcReply, XmldbError> {
        if let Some(reply) = self.held_by_other(session, target, ErrorTag::LockDenied)? {
            return Ok(reply);
        }
        if target == StoreName::Candidate && self.candidate_modified() {
            return Ok(RpcReply::error(
                ErrorTag::LockDenied,
                "Operation failed, candidate has uncommitted changes",
            ));
        }
        self.datastore.lock(target, session)?;
        Ok(RpcReply::Ok)
    }

    fn handle_unlock(&mut self, session: SessionId, target: StoreName) -> Result<RpcReply, XmldbError> {
        match self.datastore.is_locked(target)? {
            Some(holder) if holder == session => {
                self.datastore.unlock(target)?;
                Ok(RpcReply::Ok)
            }
            Some(holder) => Ok(RpcReply::Error {
                tag: ErrorTag::OperationFailed,
                message: format!("Unlock failed, lock is held by session {holder}"),
                session: Some(holder),
            }),
            None => Ok(RpcReply::error(
                ErrorTag::OperationFailed,
                format!("Unlock failed, lock is not active on {target}"),
            )),
        }
    }

    /// Copy `source` into `target`, then set the candidate modified flag
    /// to `modified` if given
    fn handle_copy(
        &mut self,
        session: SessionId,
        source: StoreName,
        target: StoreName,
        modified: Option<bool>,
    ) -> Result<RpcReply, XmldbError> {
        if let Some(reply) = self.held_by_other(session, target, ErrorTag::InUse)? {
            return Ok(reply);
        }
        self.datastore.copy(source, target)?;
        if let Some(value) = modified {
            match self.datastore.modified_set(StoreName::Candidate, value) {
                Err(e) if !e.is_not_found() => return Err(e),
                _ => {}
            }
        }
        Ok(RpcReply::Ok)
    }

    fn handle_delete(&mut self, session: SessionId, target: StoreName) -> Result<RpcReply, XmldbError> {
        if target == StoreName::Running {
            return Ok(RpcReply::error(
                ErrorTag::OperationNotSupported,
                "Cannot delete the running datastore",
            ));
        }
        if let Some(reply) = self.held_by_other(session, target, ErrorTag::InUse)? {
            return Ok(reply);
        }
        self.datastore.delete(target)?;
        Ok(RpcReply::Ok)
    }

    fn handle_kill(&mut self, session: SessionId, id: SessionId) -> Result<RpcReply, XmldbError> {
        if id == session {
            return Ok(RpcReply::error(
                ErrorTag::InvalidValue,
                "A session cannot kill itself",
            ));
        }
        self.datastore.unlock_all(id);
        Ok(RpcReply::Ok)
    }
}
