//! Role-scoped sidebar navigation.

use serde::Serialize;

use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Home,
    BookOpen,
    FileText,
    BookOpenCheck,
    ClipboardCheck,
    Users,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationItem {
    pub label: &'static str,
    pub icon: Icon,
    pub path: &'static str,
}

const fn item(label: &'static str, icon: Icon, path: &'static str) -> NavigationItem {
    NavigationItem { label, icon, path }
}

const STUDENT_NAV: &[NavigationItem] = &[
    item("Dashboard", Icon::Home, "/student/dashboard"),
    item("Notes", Icon::BookOpen, "/student/notes"),
    item("Flashcards", Icon::FileText, "/student/flashcards"),
    item("Quizzes", Icon::BookOpenCheck, "/student/quizzes"),
    item("Assignments", Icon::ClipboardCheck, "/student/assignments"),
];

const STAFF_NAV: &[NavigationItem] = &[
    item("Dashboard", Icon::Home, "/staff/dashboard"),
    item("Students", Icon::Users, "/staff/students"),
    item("Recordings", Icon::BookOpen, "/staff/recordings"),
    item("Quizzes", Icon::BookOpenCheck, "/staff/quizzes"),
    item("Assignments", Icon::ClipboardCheck, "/staff/assignments"),
];

const ADMIN_NAV: &[NavigationItem] = &[
    item("Dashboard", Icon::Home, "/admin/dashboard"),
    item("Users", Icon::Users, "/admin/users"),
    item("Content", Icon::FileText, "/admin/content"),
    item("Settings", Icon::User, "/admin/settings"),
];

/// Ordered sidebar entries for a role; no role means no entries.
pub fn nav_items_for(role: Option<Role>) -> &'static [NavigationItem] {
    match role {
        Some(Role::Student) => STUDENT_NAV,
        Some(Role::Staff) => STAFF_NAV,
        Some(Role::Admin) => ADMIN_NAV,
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(role: Option<Role>) -> Vec<&'static str> {
        nav_items_for(role).iter().map(|i| i.label).collect()
    }

    #[test]
    fn staff_menu_order() {
        assert_eq!(labels(Some(Role::Staff)), vec!["Dashboard", "Students", "Recordings", "Quizzes", "Assignments"]);
    }

    #[test]
    fn student_and_admin_menus() {
        assert_eq!(labels(Some(Role::Student)), vec!["Dashboard", "Notes", "Flashcards", "Quizzes", "Assignments"]);
        assert_eq!(labels(Some(Role::Admin)), vec!["Dashboard", "Users", "Content", "Settings"]);
        assert!(nav_items_for(None).is_empty());
    }

    #[test]
    fn pure_and_scoped_to_role_prefix() {
        for role in Role::ALL {
            assert_eq!(nav_items_for(Some(role)), nav_items_for(Some(role)));
            let prefix = format!("/{}/", role.as_str());
            assert!(nav_items_for(Some(role)).iter().all(|i| i.path.starts_with(&prefix)));
            assert_eq!(nav_items_for(Some(role))[0].path, role.dashboard_path());
        }
    }
}
