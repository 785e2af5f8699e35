//! Current location of the client and the observer that moves it in response
//! to auth events and guarded visits.

use serde::Serialize;
use tracing::debug;

use crate::identity::{check, AuthEvent, GuardDecision, Session};
use crate::routes::{normalize, resolve, Page};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Visit {
    Render { location: String, page: Page },
    /// The guard bounced the visit; `location` is where it landed.
    Redirect { requested: String, location: String, page: Page },
    NotFound { location: String },
}

impl Visit {
    pub fn location(&self) -> &str {
        match self {
            Visit::Render { location, .. } | Visit::Redirect { location, .. } | Visit::NotFound { location } => location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    location: String,
}

impl Default for Navigator {
    fn default() -> Self { Self { location: "/".to_string() } }
}

impl Navigator {
    pub fn new() -> Self { Self::default() }

    pub fn location(&self) -> &str { &self.location }

    /// Follow the redirect carried by an auth event.
    pub fn apply(&mut self, event: &AuthEvent) -> &str {
        self.location = event.redirect().to_string();
        debug!(target: "nav", to = %self.location, "navigate.auth_event");
        &self.location
    }

    /// Resolve `path`, run the guard against the session as it is now, and
    /// record where the client ends up. Home is only for anonymous visitors;
    /// a signed-in user landing there is forwarded to their dashboard.
    pub fn visit(&mut self, path: &str, session: &Session) -> Visit {
        let requested = normalize(path);
        let Some(page) = resolve(&requested) else {
            self.location = requested.clone();
            return Visit::NotFound { location: requested };
        };
        let decision = match page.allowed_roles() {
            Some(allowed) => check(session, allowed),
            None => GuardDecision::Allow,
        };
        let (location, landed) = match decision {
            GuardDecision::Allow => (requested.clone(), page),
            GuardDecision::Redirect(to) => {
                debug!(target: "nav", from = %requested, to = %to, "navigate.guard_redirect");
                // guard targets are public pages, so one hop is enough
                let landed = resolve(&to).unwrap_or(Page::Home);
                (to, landed)
            }
        };
        let (location, landed) = match (&landed, session.identity.as_ref()) {
            (Page::Home, Some(identity)) => (identity.role.dashboard_path(), Page::Dashboard { role: identity.role }),
            _ => (location, landed),
        };
        self.location = location.clone();
        if location == requested {
            Visit::Render { location, page: landed }
        } else {
            Visit::Redirect { requested, location, page: landed }
        }
    }

    /// A rehydrated session sitting on an entry page goes to its dashboard.
    pub fn on_startup(&mut self, session: &Session) -> Option<String> {
        let identity = session.identity.as_ref()?;
        if matches!(self.location.as_str(), "/" | "/login" | "/register") {
            self.location = identity.role.dashboard_path();
            return Some(self.location.clone());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, Role};

    fn session(role: Role) -> Session {
        Session { identity: Some(Identity { id: "1".into(), name: "U".into(), email: "u@example.com".into(), role }) }
    }

    #[test]
    fn anonymous_visit_to_protected_lands_on_login() {
        let mut nav = Navigator::new();
        let v = nav.visit("/admin/users", &Session::default());
        assert_eq!(v, Visit::Redirect { requested: "/admin/users".into(), location: "/login".into(), page: Page::Login });
        assert_eq!(nav.location(), "/login");
    }

    #[test]
    fn wrong_role_bounce_ends_on_own_dashboard() {
        let mut nav = Navigator::new();
        let v = nav.visit("/staff/recordings", &session(Role::Student));
        assert_eq!(
            v,
            Visit::Redirect {
                requested: "/staff/recordings".into(),
                location: "/student/dashboard".into(),
                page: Page::Dashboard { role: Role::Student },
            }
        );
    }

    #[test]
    fn home_forwards_signed_in_users_only() {
        let mut nav = Navigator::new();
        let v = nav.visit("/", &session(Role::Staff));
        assert_eq!(v.location(), "/staff/dashboard");
        assert!(matches!(v, Visit::Redirect { .. }));
        assert_eq!(nav.visit("/", &Session::default()), Visit::Render { location: "/".into(), page: Page::Home });
    }

    #[test]
    fn allowed_visit_renders_and_not_found_is_recorded() {
        let mut nav = Navigator::new();
        assert!(matches!(nav.visit("/student/notes/", &session(Role::Student)), Visit::Render { .. }));
        assert_eq!(nav.location(), "/student/notes");
        assert!(matches!(nav.visit("/nowhere", &session(Role::Student)), Visit::NotFound { .. }));
    }

    #[test]
    fn guard_is_reevaluated_per_visit() {
        let mut nav = Navigator::new();
        assert!(matches!(nav.visit("/staff/dashboard", &session(Role::Staff)), Visit::Render { .. }));
        assert!(matches!(nav.visit("/staff/dashboard", &Session::default()), Visit::Redirect { .. }));
    }

    #[test]
    fn applies_auth_event_redirects() {
        let mut nav = Navigator::new();
        nav.apply(&AuthEvent::LoggedOut { redirect: "/login".into() });
        assert_eq!(nav.location(), "/login");
    }

    #[test]
    fn startup_redirect_only_from_entry_pages() {
        let mut nav = Navigator::new();
        assert_eq!(nav.on_startup(&session(Role::Admin)), Some("/admin/dashboard".into()));
        assert_eq!(nav.on_startup(&session(Role::Admin)), None);
        let mut anon = Navigator::new();
        assert_eq!(anon.on_startup(&Session::default()), None);
        assert_eq!(anon.location(), "/");
    }
}
