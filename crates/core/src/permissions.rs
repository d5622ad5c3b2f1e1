//! Well-known form permission name constants.
//!
//! These must match the permission catalog seeded by the auth service.

/// Grants editing of form instances owned by other users.
pub const PERM_FORMS_EDIT: &str = "forms.edit";

/// Grants full administration of templates and instances within a tenant.
pub const PERM_FORMS_ADMIN: &str = "forms.admin";

/// Returns true when the permission set grants elevated form access,
/// i.e. editing instances the caller does not own.
pub fn has_elevated_form_access(permissions: &[String]) -> bool {
    permissions
        .iter()
        .any(|p| p == PERM_FORMS_EDIT || p == PERM_FORMS_ADMIN)
}
