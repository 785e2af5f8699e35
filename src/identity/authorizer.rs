use serde::Serialize;

use super::principal::Role;
use super::session::Session;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Roles allowed into a protected region. Empty means any authenticated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const ANY: RoleSet = RoleSet(&[]);
    pub const STUDENT: RoleSet = RoleSet(&[Role::Student]);
    pub const STAFF: RoleSet = RoleSet(&[Role::Staff]);
    pub const ADMIN: RoleSet = RoleSet(&[Role::Admin]);

    pub const fn of(roles: &'static [Role]) -> Self { RoleSet(roles) }

    pub fn only(role: Role) -> Self {
        match role {
            Role::Student => Self::STUDENT,
            Role::Staff => Self::STAFF,
            Role::Admin => Self::ADMIN,
        }
    }

    pub fn is_any(&self) -> bool { self.0.is_empty() }

    pub fn admits(&self, role: Role) -> bool { self.is_any() || self.0.contains(&role) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Render-or-redirect check for a protected region. Callers evaluate it on
/// every navigation against the session as it is at that moment.
pub fn check(session: &Session, allowed: RoleSet) -> GuardDecision {
    let Some(identity) = session.identity.as_ref() else {
        return GuardDecision::Redirect(LOGIN_PATH.to_string());
    };
    if !allowed.admits(identity.role) {
        // wrong role is a silent bounce home, not an error
        return GuardDecision::Redirect(HOME_PATH.to_string());
    }
    GuardDecision::Allow
}
