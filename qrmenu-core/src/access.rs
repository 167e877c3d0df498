use crate::identity::{effective_vendor_id, Role, User};

/// A requested vendor scope, normalized from a numeric or numeric-string
/// form. Non-numeric input normalizes to a non-matching sentinel so checks
/// fail closed instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorScope(Option<i64>);

impl VendorScope {
    pub fn as_i64(self) -> Option<i64> {
        self.0
    }
}

impl From<i64> for VendorScope {
    fn from(id: i64) -> Self {
        VendorScope(Some(id))
    }
}

impl From<&str> for VendorScope {
    fn from(raw: &str) -> Self {
        VendorScope(raw.trim().parse::<i64>().ok())
    }
}

impl From<&String> for VendorScope {
    fn from(raw: &String) -> Self {
        VendorScope::from(raw.as_str())
    }
}

/// Guard invoked before every read or mutation of vendor-scoped resources
/// (menu items, orders, staff accounts, invoices).
///
/// Fails closed on an absent user. Admins bypass scoping entirely. Everyone
/// else must match the target scope through [`effective_vendor_id`].
///
/// The result must be recomputed per request from the caller's current
/// identity, never cached across requests.
pub fn can_access_vendor(user: Option<&User>, scope: impl Into<VendorScope>) -> bool {
    let Some(user) = user else {
        return false;
    };
    if user.role == Role::Admin {
        return true;
    }
    match (effective_vendor_id(Some(user)), scope.into().as_i64()) {
        (Some(mine), Some(target)) => mine == target,
        _ => false,
    }
}
