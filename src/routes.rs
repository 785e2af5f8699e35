//! Route surface of the dashboard: path -> page, with the role allow-list each
//! protected page is wrapped in.

use serde::Serialize;

use crate::identity::{Role, RoleSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Page {
    Home,
    Login,
    Register,
    Notifications,
    Dashboard { role: Role },
    Profile { role: Role },
    StudentNotes,
    StudentFlashcards,
    StudentQuizzes,
    StudentAssignments,
    StaffStudents,
    StaffStudentDetail { id: String },
    StaffMessages { id: String },
    StaffRecordings,
    StaffQuizzes,
    StaffAssignments,
    AdminUsers,
    AdminContent,
    AdminSettings,
}

impl Page {
    /// `None` for public pages.
    pub fn allowed_roles(&self) -> Option<RoleSet> {
        match self {
            Page::Home | Page::Login | Page::Register | Page::Notifications => None,
            Page::Dashboard { role } | Page::Profile { role } => Some(RoleSet::only(*role)),
            Page::StudentNotes | Page::StudentFlashcards | Page::StudentQuizzes | Page::StudentAssignments => {
                Some(RoleSet::STUDENT)
            }
            Page::StaffStudents
            | Page::StaffStudentDetail { .. }
            | Page::StaffMessages { .. }
            | Page::StaffRecordings
            | Page::StaffQuizzes
            | Page::StaffAssignments => Some(RoleSet::STAFF),
            Page::AdminUsers | Page::AdminContent | Page::AdminSettings => Some(RoleSet::ADMIN),
        }
    }

    pub fn is_protected(&self) -> bool { self.allowed_roles().is_some() }

    pub fn title(&self) -> String {
        match self {
            Page::Home => "Benkyō".into(),
            Page::Login => "Login".into(),
            Page::Register => "Register".into(),
            Page::Notifications => "Notifications".into(),
            Page::Dashboard { role } => match role {
                Role::Student => "Student Dashboard".into(),
                Role::Staff => "Staff Dashboard".into(),
                Role::Admin => "Admin Dashboard".into(),
            },
            Page::Profile { .. } => "User Profile".into(),
            Page::StudentNotes => "My Notes".into(),
            Page::StudentFlashcards => "Flashcards".into(),
            Page::StudentQuizzes | Page::StaffQuizzes => "Quizzes".into(),
            Page::StudentAssignments | Page::StaffAssignments => "Assignments".into(),
            Page::StaffStudents => "Students".into(),
            Page::StaffStudentDetail { .. } => "Student Profile".into(),
            Page::StaffMessages { .. } => "Messages".into(),
            Page::StaffRecordings => "Class Recordings".into(),
            Page::AdminUsers => "User Management".into(),
            Page::AdminContent => "Content Management".into(),
            Page::AdminSettings => "System Settings".into(),
        }
    }
}

/// Strip query/fragment and trailing slashes; the root stays `/`.
pub fn normalize(path: &str) -> String {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".to_string() } else if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{}", trimmed) }
}

/// Resolve a path to its page; `None` is the not-found view.
pub fn resolve(path: &str) -> Option<Page> {
    let norm = normalize(path);
    let segs: Vec<&str> = norm.split('/').filter(|s| !s.is_empty()).collect();
    let page = match segs.as_slice() {
        [] => Page::Home,
        ["login"] => Page::Login,
        ["register"] => Page::Register,
        ["notifications"] => Page::Notifications,
        [role, "dashboard"] => Page::Dashboard { role: role.parse().ok()? },
        [role, "profile"] => Page::Profile { role: role.parse().ok()? },
        ["student", "notes"] => Page::StudentNotes,
        ["student", "flashcards"] => Page::StudentFlashcards,
        ["student", "quizzes"] => Page::StudentQuizzes,
        ["student", "assignments"] => Page::StudentAssignments,
        ["staff", "students"] => Page::StaffStudents,
        ["staff", "student", id] => Page::StaffStudentDetail { id: id.to_string() },
        ["staff", "messages", id] => Page::StaffMessages { id: id.to_string() },
        ["staff", "recordings"] => Page::StaffRecordings,
        ["staff", "quizzes"] => Page::StaffQuizzes,
        ["staff", "assignments"] => Page::StaffAssignments,
        ["admin", "users"] => Page::AdminUsers,
        ["admin", "content"] => Page::AdminContent,
        ["admin", "settings"] => Page::AdminSettings,
        _ => return None,
    };
    Some(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes() {
        assert_eq!(resolve("/"), Some(Page::Home));
        assert_eq!(resolve("/login"), Some(Page::Login));
        assert_eq!(resolve("/register/"), Some(Page::Register));
        assert_eq!(resolve("/notifications?x=1"), Some(Page::Notifications));
        assert!(!Page::Notifications.is_protected());
    }

    #[test]
    fn role_scoped_routes_carry_allow_list() {
        let p = resolve("/staff/dashboard").unwrap();
        assert_eq!(p, Page::Dashboard { role: Role::Staff });
        assert_eq!(p.allowed_roles(), Some(RoleSet::STAFF));
        assert_eq!(resolve("/admin/profile").unwrap().allowed_roles(), Some(RoleSet::ADMIN));
        assert_eq!(resolve("/student/notes").unwrap().allowed_roles(), Some(RoleSet::STUDENT));
        assert_eq!(resolve("/staff/student/42"), Some(Page::StaffStudentDetail { id: "42".into() }));
        assert_eq!(resolve("/staff/messages/7"), Some(Page::StaffMessages { id: "7".into() }));
    }

    #[test]
    fn unmatched_is_not_found() {
        assert_eq!(resolve("/teacher/dashboard"), None);
        assert_eq!(resolve("/student/users"), None);
        assert_eq!(resolve("/admin/users/extra"), None);
    }

    #[test]
    fn every_nav_destination_resolves_under_its_role() {
        for role in Role::ALL {
            for item in crate::nav::nav_items_for(Some(role)) {
                let page = resolve(item.path).unwrap_or_else(|| panic!("{} unresolved", item.path));
                assert!(page.allowed_roles().unwrap().admits(role));
            }
        }
    }
}
