use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::directory::{canonical_email, IdentityDirectory};
use super::principal::{Identity, Role};
use super::session::SessionStore;
use crate::error::{AppError, AppResult};
use crate::notices::NoticeBoard;
use crate::security::CredentialHasher;

/// Shown for both unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const LOGOUT_REDIRECT: &str = "/login";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Outcome of a successful auth operation. The controller never navigates;
/// whoever receives the event decides what to do with `redirect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    LoggedIn { identity: Identity, redirect: String },
    Registered { identity: Identity, redirect: String },
    LoggedOut { redirect: String },
}

impl AuthEvent {
    pub fn redirect(&self) -> &str {
        match self {
            AuthEvent::LoggedIn { redirect, .. }
            | AuthEvent::Registered { redirect, .. }
            | AuthEvent::LoggedOut { redirect } => redirect.as_str(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::LoggedIn { identity, .. } | AuthEvent::Registered { identity, .. } => Some(identity),
            AuthEvent::LoggedOut { .. } => None,
        }
    }
}

// Marks the controller as Authenticating for the lifetime of the guard.
struct Phase<'a>(&'a AtomicBool);

impl<'a> Phase<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Phase(flag)
    }
}

impl Drop for Phase<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::SeqCst); }
}

/// Login, registration and logout over an injected directory and the process
/// session. Operations are serialized: a second call waits for the first to
/// finish, including its simulated round trip.
pub struct AuthController {
    directory: Arc<dyn IdentityDirectory>,
    sessions: Arc<SessionStore>,
    notices: Arc<NoticeBoard>,
    hasher: CredentialHasher,
    latency: Duration,
    gate: tokio::sync::Mutex<()>,
    authenticating: AtomicBool,
}

impl AuthController {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        sessions: Arc<SessionStore>,
        notices: Arc<NoticeBoard>,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            directory,
            sessions,
            notices,
            hasher,
            latency: Duration::ZERO,
            gate: tokio::sync::Mutex::new(()),
            authenticating: AtomicBool::new(false),
        }
    }

    /// Delay applied before resolving login and registration, standing in for
    /// the auth backend round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn directory(&self) -> &Arc<dyn IdentityDirectory> { &self.directory }

    pub fn state(&self) -> AuthState {
        if self.authenticating.load(Ordering::SeqCst) {
            AuthState::Authenticating
        } else if self.sessions.get().is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn current(&self) -> Option<Identity> { self.sessions.get().identity }

    async fn round_trip(&self) {
        if !self.latency.is_zero() { tokio::time::sleep(self.latency).await; }
    }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<AuthEvent> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            self.notices.error("Email and password are required");
            return Err(AppError::user("missing_fields", "Email and password are required"));
        }
        let _gate = self.gate.lock().await;
        let _phase = Phase::enter(&self.authenticating);
        self.round_trip().await;

        let email = canonical_email(&req.email).to_string();
        // argon2 runs on the blocking pool, never on an async worker
        let verified = {
            let directory = self.directory.clone();
            let (email, password) = (email.clone(), req.password.clone());
            tokio::task::spawn_blocking(move || directory.verify(&email, &password))
                .await
                .map_err(|e| AppError::internal("verify_failed".to_string(), e.to_string()))?
        };
        match verified {
            Some(identity) => {
                self.sessions.set(identity.clone());
                self.notices.success("Login successful");
                info!(target: "auth", email = %identity.email, role = %identity.role, "auth.login ok");
                Ok(AuthEvent::LoggedIn { redirect: identity.role.dashboard_path(), identity })
            }
            None => {
                self.notices.error(INVALID_CREDENTIALS);
                info!(target: "auth", %email, "auth.login rejected");
                Err(AppError::auth("invalid_credentials", INVALID_CREDENTIALS))
            }
        }
    }

    /// Boolean form of [`login`](Self::login) for callers that only need the
    /// verdict; the details go to the notice board.
    pub async fn login_ok(&self, email: &str, password: &str) -> bool {
        self.login(&LoginRequest { email: email.to_string(), password: password.to_string() }).await.is_ok()
    }

    pub async fn register(&self, req: &RegisterRequest) -> AppResult<AuthEvent> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
            self.notices.error("Name, email and password are required");
            return Err(AppError::user("missing_fields", "Name, email and password are required"));
        }
        let _gate = self.gate.lock().await;
        let _phase = Phase::enter(&self.authenticating);
        self.round_trip().await;

        let email = canonical_email(&req.email).to_string();
        if self.directory.find_by_email(&email).is_some() {
            self.notices.error("Email already registered");
            info!(target: "auth", %email, "auth.register duplicate");
            return Err(AppError::conflict("email_taken", "Email already registered"));
        }

        let hashed = {
            let hasher = self.hasher.clone();
            let password = req.password.clone();
            tokio::task::spawn_blocking(move || hasher.hash(&password)).await
        };
        let credential = match hashed {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => return Err(self.register_failed(e.to_string())),
            Err(e) => return Err(self.register_failed(e.to_string())),
        };
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            email,
            role: req.role,
        };
        if let Err(e) = self.directory.add(identity.clone(), credential) {
            self.notices.error(e.message().to_string());
            return Err(e);
        }
        self.sessions.set(identity.clone());
        self.notices.success("Registration successful");
        info!(target: "auth", email = %identity.email, role = %identity.role, id = %identity.id, "auth.register ok");
        Ok(AuthEvent::Registered { redirect: identity.role.dashboard_path(), identity })
    }

    fn register_failed(&self, reason: String) -> AppError {
        warn!(target: "auth", "credential hashing failed: {}", reason);
        self.notices.error("Failed to register. Please try again.");
        AppError::internal("hash_failed", "Failed to register. Please try again.")
    }

    pub async fn register_ok(&self, name: &str, email: &str, password: &str, role: Role) -> bool {
        let req = RegisterRequest { name: name.into(), email: email.into(), password: password.into(), role };
        self.register(&req).await.is_ok()
    }

    /// Always succeeds. Calling it while logged out leaves the same end state.
    pub async fn logout(&self) -> AuthEvent {
        let _gate = self.gate.lock().await;
        let who = self.sessions.get().identity.map(|i| i.email);
        self.sessions.clear();
        self.notices.success("Logged out successfully");
        debug!(target: "auth", email = ?who, "auth.logout");
        AuthEvent::LoggedOut { redirect: LOGOUT_REDIRECT.to_string() }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
