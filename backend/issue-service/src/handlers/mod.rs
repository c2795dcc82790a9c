pub mod auth;
pub mod issues;

use crate::models::User;

/// City scope for reads and admin writes: super admins see everything,
/// everyone else only their own city.
pub fn city_scope(user: &User) -> Option<&str> {
    if user.role() == crate::models::UserRole::SuperAdmin {
        None
    } else {
        user.city.as_deref()
    }
}
