//! Request scoped identity handed to the service by the web layer
use super::error::ValidationError;
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[n(0)]
    Admin,
    #[n(1)]
    Manager,
    #[n(2)]
    Employee,
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// The verified caller of a service operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: &str, name: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            role,
        }
    }

    /// Builds a principal from the session claims. Any missing claim, or an
    /// unrecognised role, means there is no session.
    pub fn from_claims(
        user_id: Option<&str>,
        name: Option<&str>,
        role: Option<&str>,
    ) -> Option<Self> {
        let role = role?.parse().ok()?;
        Some(Self::new(user_id?, name?, role))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The applicant owns their requests; administrators may act on any.
    pub fn may_modify(&self, staff_id: &str) -> bool {
        self.is_admin() || self.user_id == staff_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_build_principal() {
        let principal =
            Principal::from_claims(Some("staff_1"), Some("Meera"), Some("manager")).unwrap();
        assert_eq!(principal.role, Role::Manager);
        assert_eq!(principal.user_id, "staff_1");
    }

    #[test]
    fn missing_or_bad_claims_yield_none() {
        assert!(Principal::from_claims(None, Some("Meera"), Some("manager")).is_none());
        assert!(Principal::from_claims(Some("staff_1"), None, Some("manager")).is_none());
        assert!(Principal::from_claims(Some("staff_1"), Some("Meera"), None).is_none());
        assert!(Principal::from_claims(Some("staff_1"), Some("Meera"), Some("root")).is_none());
    }

    #[test]
    fn ownership() {
        let employee = Principal::new("staff_1", "Meera", Role::Employee);
        let admin = Principal::new("admin_1", "Root", Role::Admin);
        assert!(employee.may_modify("staff_1"));
        assert!(!employee.may_modify("staff_2"));
        assert!(admin.may_modify("staff_2"));
    }
}
