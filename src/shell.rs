//! Dashboard chrome around page content: sidebar menu, header with profile
//! link, notifications link and the logout affordance.

use serde::Serialize;

use crate::identity::{Role, Session};
use crate::nav::{nav_items_for, NavigationItem};
use crate::routes::Page;

pub const NOTIFICATIONS_PATH: &str = "/notifications";
pub const LOGOUT_ACTION: &str = "/api/logout";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub name: String,
    pub initial: Option<char>,
    pub role: Role,
    pub profile_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    pub method: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellView {
    pub title: String,
    pub menu_collapsed: bool,
    pub nav: &'static [NavigationItem],
    pub header: Option<HeaderView>,
    pub notifications_path: &'static str,
    pub logout: ActionView,
    pub content: Page,
}

#[derive(Debug, Default)]
pub struct ViewShell {
    menu_collapsed: bool,
}

impl ViewShell {
    pub fn new() -> Self { Self::default() }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_collapsed = !self.menu_collapsed;
        self.menu_collapsed
    }

    pub fn render(&self, session: &Session, content: Page) -> ShellView {
        let identity = session.identity.as_ref();
        let header = identity.map(|i| HeaderView {
            name: i.name.clone(),
            initial: i.initial(),
            role: i.role,
            profile_path: i.role.profile_path(),
        });
        ShellView {
            title: content.title(),
            menu_collapsed: self.menu_collapsed,
            nav: nav_items_for(identity.map(|i| i.role)),
            header,
            notifications_path: NOTIFICATIONS_PATH,
            logout: ActionView { method: "POST", path: LOGOUT_ACTION },
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn staff_session() -> Session {
        Session {
            identity: Some(Identity { id: "2".into(), name: "Staff Member".into(), email: "staff@example.com".into(), role: Role::Staff }),
        }
    }

    #[test]
    fn renders_role_menu_and_header() {
        let shell = ViewShell::new();
        let view = shell.render(&staff_session(), Page::Dashboard { role: Role::Staff });
        assert_eq!(view.title, "Staff Dashboard");
        let labels: Vec<&str> = view.nav.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["Dashboard", "Students", "Recordings", "Quizzes", "Assignments"]);
        let header = view.header.unwrap();
        assert_eq!(header.profile_path, "/staff/profile");
        assert_eq!(header.initial, Some('S'));
        assert_eq!(view.logout.path, "/api/logout");
    }

    #[test]
    fn anonymous_shell_has_no_menu() {
        let view = ViewShell::new().render(&Session::default(), Page::Notifications);
        assert!(view.nav.is_empty());
        assert!(view.header.is_none());
    }

    #[test]
    fn toggle_is_cosmetic() {
        let mut shell = ViewShell::new();
        assert!(shell.toggle_menu());
        let view = shell.render(&staff_session(), Page::StaffStudents);
        assert!(view.menu_collapsed);
        assert_eq!(view.nav.len(), 5);
    }
}
