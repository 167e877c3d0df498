use serde::{Deserialize, Serialize};

/// Role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Staff,
}

/// An authenticated identity acting against vendor-scoped resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub role: Role,
    /// Owning vendor; meaningful only for staff accounts.
    pub vendor_id: Option<i64>,
    pub name: String,
    pub email: String,
}

/// The vendor scope an identity acts under. Single source of truth for
/// "which vendor's data does this identity act on behalf of."
///
/// Staff act under their owning vendor's id, everyone else under their own
/// id. Admin global scope is expressed by the resolver bypass in
/// [`crate::access::can_access_vendor`], not here.
pub fn effective_vendor_id(user: Option<&User>) -> Option<i64> {
    let user = user?;
    match user.role {
        Role::Staff => user.vendor_id,
        _ => Some(user.id),
    }
}

/// True iff the user is present and carries exactly this role.
pub fn has_role(user: Option<&User>, role: Role) -> bool {
    user.map(|u| u.role == role).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role, vendor_id: Option<i64>) -> User {
        User {
            id,
            role,
            vendor_id,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        }
    }

    #[test]
    fn staff_acts_under_owning_vendor() {
        let staff = user(42, Role::Staff, Some(7));
        assert_eq!(effective_vendor_id(Some(&staff)), Some(7));
    }

    #[test]
    fn vendor_acts_under_own_id() {
        let vendor = user(7, Role::Vendor, None);
        assert_eq!(effective_vendor_id(Some(&vendor)), Some(7));
    }

    #[test]
    fn absent_user_has_no_scope() {
        assert_eq!(effective_vendor_id(None), None);
    }

    #[test]
    fn staff_without_vendor_has_no_scope() {
        let orphan = user(42, Role::Staff, None);
        assert_eq!(effective_vendor_id(Some(&orphan)), None);
    }

    #[test]
    fn has_role_matches_exactly() {
        let staff = user(1, Role::Staff, Some(2));
        assert!(has_role(Some(&staff), Role::Staff));
        assert!(!has_role(Some(&staff), Role::Admin));
        assert!(!has_role(None, Role::Staff));
    }
}
