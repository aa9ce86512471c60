use crate::receive::CompletionHandler;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;
use uuid::Uuid;

/// Lifecycle of the armed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Armed,
    /// At least one upload landed; later uploads overwrite the same target.
    Fulfilled { uploads: u32 },
}

/// Why an upload could not be matched to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    NoSession,
    Expired,
}

struct ArmedSession {
    id: String,
    target_filename: String,
    handler: Arc<dyn CompletionHandler>,
    state: SessionState,
    armed_at: SystemTime,
}

/// Read-only view of the armed session for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub target_filename: String,
    pub state: SessionState,
    pub armed_at: SystemTime,
}

/// Everything one upload needs, copied out so the lock is not held across I/O.
#[derive(Clone)]
pub struct UploadTicket {
    pub session_id: String,
    pub target_filename: String,
    pub handler: Arc<dyn CompletionHandler>,
}

impl fmt::Debug for UploadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTicket")
            .field("session_id", &self.session_id)
            .field("target_filename", &self.target_filename)
            .finish_non_exhaustive()
    }
}

impl ArmedSession {
    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            target_filename: self.target_filename.clone(),
            state: self.state,
            armed_at: self.armed_at,
        }
    }
}

/// Single slot holding the one session a phone may upload into.
///
/// Arming replaces whatever was there; the previous target and handler are
/// dropped, never merged. Cloning shares the slot.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<RwLock<Option<ArmedSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a new session with a fresh token, replacing any previous one.
    pub fn arm(&self, target_filename: &str, handler: Arc<dyn CompletionHandler>) -> SessionInfo {
        let session = ArmedSession {
            id: Uuid::new_v4().to_string(),
            target_filename: target_filename.to_string(),
            handler,
            state: SessionState::Armed,
            armed_at: SystemTime::now(),
        };
        let info = session.info();

        let mut slot = self.write();
        if let Some(previous) = slot.replace(session) {
            tracing::debug!(
                previous = %previous.id,
                state = ?previous.state,
                "Replacing armed session"
            );
        }
        tracing::info!(session_id = %info.id, target = %info.target_filename, "Session armed");
        info
    }

    pub fn current(&self) -> Option<SessionInfo> {
        self.read().as_ref().map(ArmedSession::info)
    }

    /// True when `token` names the armed session.
    pub fn is_current(&self, token: &str) -> bool {
        self.read().as_ref().is_some_and(|s| s.id == token)
    }

    /// Resolves the session an upload belongs to.
    ///
    /// `None` accepts whatever session is armed; `Some(token)` must match it.
    pub fn ticket(&self, token: Option<&str>) -> Result<UploadTicket, LookupError> {
        let slot = self.read();
        let session = slot.as_ref().ok_or(LookupError::NoSession)?;

        if let Some(token) = token {
            if token != session.id {
                tracing::warn!(
                    expected = %session.id,
                    got = %token,
                    "Upload for a session that is no longer armed"
                );
                return Err(LookupError::Expired);
            }
        }

        Ok(UploadTicket {
            session_id: session.id.clone(),
            target_filename: session.target_filename.clone(),
            handler: session.handler.clone(),
        })
    }

    /// Records a finished upload. Ignored if the session was replaced meanwhile.
    pub fn record_upload(&self, session_id: &str) -> bool {
        let mut slot = self.write();
        match slot.as_mut() {
            Some(session) if session.id == session_id => {
                session.state = match session.state {
                    SessionState::Armed => SessionState::Fulfilled { uploads: 1 },
                    SessionState::Fulfilled { uploads } => SessionState::Fulfilled {
                        uploads: uploads.saturating_add(1),
                    },
                };
                true
            }
            _ => false,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<ArmedSession>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Session slot lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<ArmedSession>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Session slot lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }
}
