use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::principal::{Identity, Role};
use crate::error::{AppError, AppResult};
use crate::security::CredentialHasher;

/// Shared password of the seeded demo accounts. Only ever hashed into the demo
/// seed; registered identities always carry their own credential.
pub const DEMO_PASSWORD: &str = "password";

/// How email addresses are compared for lookups and duplicate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

/// Canonical form of a submitted email: surrounding whitespace is dropped.
/// Every lookup, insert and login goes through this.
pub fn canonical_email(email: &str) -> &str { email.trim() }

impl EmailMatch {
    pub fn matches(&self, stored: &str, candidate: &str) -> bool {
        match self {
            EmailMatch::Exact => stored == candidate,
            EmailMatch::CaseInsensitive => stored.to_lowercase() == candidate.to_lowercase(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(EmailMatch::Exact),
            "case_insensitive" | "insensitive" => Some(EmailMatch::CaseInsensitive),
            _ => None,
        }
    }
}

/// Registry of known identities. Injected into the auth controller so each
/// test can run against its own directory.
pub trait IdentityDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<Identity>;
    /// Check-and-insert under a single write lock. Fails with a conflict when
    /// the email is already present.
    fn add(&self, identity: Identity, credential: String) -> AppResult<()>;
    /// Returns the identity only when the email exists and `password` verifies
    /// against that identity's own stored credential.
    fn verify(&self, email: &str, password: &str) -> Option<Identity>;
    fn list(&self) -> Vec<Identity>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

#[derive(Debug, Clone)]
struct Entry {
    identity: Identity,
    credential: String,
}

pub struct InMemoryDirectory {
    entries: RwLock<Vec<Entry>>,
    hasher: CredentialHasher,
    policy: EmailMatch,
    // verified against on unknown emails so both failure paths cost one hash
    dummy_credential: Option<String>,
}

impl InMemoryDirectory {
    pub fn new(hasher: CredentialHasher, policy: EmailMatch) -> Self {
        let dummy_credential = hasher.hash("benkyo-dummy-credential").ok();
        Self { entries: RwLock::new(Vec::new()), hasher, policy, dummy_credential }
    }

    pub fn hasher(&self) -> &CredentialHasher { &self.hasher }

    /// Seed the student, staff and admin demo accounts.
    pub fn seed_demo(&self) -> Result<()> {
        let seed = [
            ("1", "Student User", "student@example.com", Role::Student),
            ("2", "Staff Member", "staff@example.com", Role::Staff),
            ("3", "Admin User", "admin@example.com", Role::Admin),
        ];
        for (id, name, email, role) in seed {
            if self.find_by_email(email).is_some() { continue; }
            let credential = self.hasher.hash(DEMO_PASSWORD)?;
            let identity = Identity { id: id.into(), name: name.into(), email: email.into(), role };
            self.add(identity, credential).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        }
        Ok(())
    }
}

impl IdentityDirectory for InMemoryDirectory {
    fn find_by_email(&self, email: &str) -> Option<Identity> {
        let email = canonical_email(email);
        self.entries
            .read()
            .iter()
            .find(|e| self.policy.matches(&e.identity.email, email))
            .map(|e| e.identity.clone())
    }

    fn add(&self, mut identity: Identity, credential: String) -> AppResult<()> {
        identity.email = canonical_email(&identity.email).to_string();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| self.policy.matches(&e.identity.email, &identity.email)) {
            return Err(AppError::conflict("email_taken", "Email already registered"));
        }
        debug!(target: "directory", email = %identity.email, role = %identity.role, "directory.add");
        entries.push(Entry { identity, credential });
        Ok(())
    }

    fn verify(&self, email: &str, password: &str) -> Option<Identity> {
        let email = canonical_email(email);
        let found = {
            let entries = self.entries.read();
            entries.iter().find(|e| self.policy.matches(&e.identity.email, email)).cloned()
        };
        match found {
            Some(entry) => {
                if self.hasher.verify(&entry.credential, password) { Some(entry.identity) } else { None }
            }
            None => {
                if let Some(dummy) = &self.dummy_credential { let _ = self.hasher.verify(dummy, password); }
                None
            }
        }
    }

    fn list(&self) -> Vec<Identity> {
        self.entries.read().iter().map(|e| e.identity.clone()).collect()
    }

    fn len(&self) -> usize { self.entries.read().len() }
}
