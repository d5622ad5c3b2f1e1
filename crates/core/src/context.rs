//! Caller identity passed explicitly into engine operations.

use crate::types::DbId;

/// Tenant and user identity for the current request.
///
/// Controllers resolve this from the authenticated session and pass it down.
/// Engine code never reads ambient global state for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: DbId,
    pub user_id: DbId,
}

impl RequestContext {
    pub fn new(tenant_id: DbId, user_id: DbId) -> Self {
        Self { tenant_id, user_id }
    }
}
