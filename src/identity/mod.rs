//! Identity, session and access control for the dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod directory;
mod session;
mod provider;
mod authorizer;

pub use principal::{Identity, Role};
pub use directory::{canonical_email, EmailMatch, IdentityDirectory, InMemoryDirectory, DEMO_PASSWORD};
pub use session::{FileSlot, MemorySlot, Session, SessionSlot, SessionStore, SlotError, SESSION_KEY};
pub use provider::{AuthController, AuthEvent, AuthState, LoginRequest, RegisterRequest, INVALID_CREDENTIALS, LOGOUT_REDIRECT};
pub use authorizer::{check, GuardDecision, RoleSet, HOME_PATH, LOGIN_PATH};
