pub mod access;
pub mod identity;

pub use access::{can_access_vendor, VendorScope};
pub use identity::{effective_vendor_id, has_role, Role, User};
