//! Mock login directory. Accounts live in memory with plain passwords; this picks
//! the tenant and role for a session and is not a security boundary.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Instructor,
    Reception,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    password: String,
    pub tenant: String,
    pub role: Role,
}

impl Account {
    pub fn new(email: &str, password: &str, tenant: &str, role: Role) -> Self {
        Self {
            email: email.to_ascii_lowercase(),
            password: password.to_string(),
            tenant: tenant.to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub tenant: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    accounts: Vec<Account>,
}

impl Directory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Built-in demo accounts for two studios.
    pub fn demo() -> Self {
        Self::new(vec![
            Account::new("admin@studiocore.com", "admin123", "studiocore", Role::Admin),
            Account::new("ana@studiocore.com", "ana123", "studiocore", Role::Instructor),
            Account::new("recepcao@studiocore.com", "recepcao123", "studiocore", Role::Reception),
            Account::new("admin@equilibrio.com", "admin123", "equilibrio", Role::Admin),
        ])
    }

    /// Email is matched case-insensitively, password exactly.
    pub fn login(&self, email: &str, password: &str) -> Option<Session> {
        let email = email.trim().to_ascii_lowercase();
        self.accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .map(|a| Session {
                email: a.email.clone(),
                tenant: a.tenant.clone(),
                role: a.role,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_resolves_tenant_and_role() {
        let dir = Directory::demo();
        let session = dir.login("Ana@StudioCore.com ", "ana123").unwrap();
        assert_eq!(session.tenant, "studiocore");
        assert_eq!(session.role, Role::Instructor);
    }

    #[test]
    fn wrong_password_rejected() {
        let dir = Directory::demo();
        assert!(dir.login("ana@studiocore.com", "ANA123").is_none());
        assert!(dir.login("nobody@studiocore.com", "ana123").is_none());
    }

    #[test]
    fn same_password_different_tenants() {
        let dir = Directory::demo();
        assert_eq!(dir.login("admin@equilibrio.com", "admin123").unwrap().tenant, "equilibrio");
        assert_eq!(dir.login("admin@studiocore.com", "admin123").unwrap().tenant, "studiocore");
    }
}
