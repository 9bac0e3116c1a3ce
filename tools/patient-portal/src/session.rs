use crate::graph::{NodeId, ADMIN_MENU, LOGIN_MENU, PATIENT_MENU, PROFESSIONAL_MENU};
use crate::records::UserRecord;
use crate::types::Role;

/// Single-slot session; there is never more than one principal.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current_user: Option<UserRecord>,
}

impl Session {
    pub fn current_user(&self) -> Option<&UserRecord> {
        self.current_user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn login(&mut self, user: UserRecord) {
        self.current_user = Some(user);
    }

    /// Returns the user that was logged in, if any.
    pub fn logout(&mut self) -> Option<UserRecord> {
        self.current_user.take()
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user.as_ref().and_then(UserRecord::role)
    }

    pub fn role_menu(&self) -> NodeId {
        role_menu_for(self.current_user.as_ref())
    }
}

pub fn role_menu_for(user: Option<&UserRecord>) -> NodeId {
    match user.and_then(UserRecord::role) {
        Some(Role::Patient) => PATIENT_MENU,
        Some(Role::Professional) => PROFESSIONAL_MENU,
        Some(Role::Admin) => ADMIN_MENU,
        None => LOGIN_MENU,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn user(role: &str) -> UserRecord {
        UserRecord {
            nhi: None,
            id: Some(12345),
            email: "someone@email.com".to_string(),
            password: "pw".to_string(),
            role: role.to_string(),
            first_name: "Some".to_string(),
            last_name: "One".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn anonymous_session_resolves_to_login_menu() {
        assert_eq!(Session::default().role_menu(), LOGIN_MENU);
    }

    #[test]
    fn roles_map_to_their_menus() {
        let mut session = Session::default();
        for (role, expected) in [
            ("patient", PATIENT_MENU),
            ("professional", PROFESSIONAL_MENU),
            ("admin", ADMIN_MENU),
            ("superuser", LOGIN_MENU),
        ] {
            session.login(user(role));
            assert_eq!(session.role_menu(), expected, "role {role}");
        }
    }

    #[test]
    fn logout_empties_the_slot() {
        let mut session = Session::default();
        session.login(user("admin"));
        assert!(session.is_logged_in());
        let previous = session.logout().expect("was logged in");
        assert_eq!(previous.role, "admin");
        assert!(!session.is_logged_in());
        assert!(session.logout().is_none());
    }
}
