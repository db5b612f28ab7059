//! # Session Store
//!
//! Holds the bearer credential for the current user.
//!
//! ```text
//!   LoggedOut ──set_token──▶ LoggedIn(token) ──clear_token──▶ LoggedOut
//! ```
//!
//! The token is persisted through a [`TokenStore`] so a restart finds the
//! user still logged in. Subscribers are notified of every transition.

use rent_core::{RentError, RentResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Opaque bearer credential. Redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Current authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn(BearerToken),
}

impl SessionState {
    pub fn token(&self) -> Option<&BearerToken> {
        match self {
            SessionState::LoggedIn(token) => Some(token),
            SessionState::LoggedOut => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn(_))
    }
}

/// Persistence for the session token
pub trait TokenStore: Send + Sync {
    fn load(&self) -> RentResult<Option<String>>;
    fn save(&self, token: &str) -> RentResult<()>;
    fn clear(&self) -> RentResult<()>;
}

/// Token store that forgets everything on restart
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already stored
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> RentResult<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| RentError::Storage("token store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> RentResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| RentError::Storage("token store poisoned".to_string()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> RentResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| RentError::Storage("token store poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Token store backed by a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> RentResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RentError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, token: &str) -> RentResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RentError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        std::fs::write(&self.path, token).map_err(|e| {
            RentError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = std::fs::set_permissions(&self.path, perms) {
                warn!("Could not restrict token file permissions: {}", e);
            }
        }

        Ok(())
    }

    fn clear(&self) -> RentResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RentError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Session store shared by the HTTP client and the reservation flow
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    store: Box<dyn TokenStore>,
}

impl SessionStore {
    /// Create the store, picking up a persisted token if there is one
    pub fn init(store: Box<dyn TokenStore>) -> RentResult<Self> {
        let initial = match store.load()? {
            Some(token) => {
                debug!("Restored persisted session token");
                SessionState::LoggedIn(BearerToken::new(token))
            }
            None => SessionState::LoggedOut,
        };

        let (state, _) = watch::channel(initial);
        Ok(Self { state, store })
    }

    /// In-memory store starting logged out
    pub fn in_memory() -> Self {
        let (state, _) = watch::channel(SessionState::LoggedOut);
        Self {
            state,
            store: Box::new(MemoryTokenStore::new()),
        }
    }

    /// Current token, if logged in
    pub fn token(&self) -> Option<BearerToken> {
        self.state.borrow().token().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    /// Transition to `LoggedIn`; the token is persisted first
    pub fn set_token(&self, token: impl Into<String>) -> RentResult<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(RentError::InvalidRequest("empty session token".to_string()));
        }

        self.store.save(&token)?;
        self.state
            .send_replace(SessionState::LoggedIn(BearerToken::new(token)));
        info!("Session started");
        Ok(())
    }

    /// Transition to `LoggedOut`.
    ///
    /// The in-memory state is cleared even when the persisted copy cannot
    /// be removed; the storage error is still returned.
    pub fn clear_token(&self) -> RentResult<()> {
        let previous = self.state.send_replace(SessionState::LoggedOut);
        if previous.is_logged_in() {
            info!("Session ended");
        }
        self.store.clear()
    }

    /// Receive every future state transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
