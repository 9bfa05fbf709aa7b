//! # Operator Session
//!
//! The identity of whoever is driving the current request.
//!
//! ## Flow
//! ```text
//! identity provider ──► users table ──► Operator { id, name, role }
//!                                            │
//!                    ┌───────────────────────┼──────────────────────┐
//!                    ▼                       ▼                      ▼
//!               cart store            process_sale            void_sale
//!              (keyed by id)       (operator on sale)     (role == admin)
//! ```
//!
//! The operator is resolved once at the boundary and passed explicitly into
//! every operation that needs it. Business logic never looks it up on its own.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};

/// The authenticated operator of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Operator {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Operator {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// Builds the session context for an active user.
    ///
    /// Returns `None` for deactivated accounts.
    pub fn from_user(user: &User) -> Option<Self> {
        user.active
            .then(|| Operator::new(user.id.clone(), user.name.clone(), user.role))
    }

    #[inline]
    pub fn is_in_role(&self, role: Role) -> bool {
        self.role == role
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.is_in_role(Role::Admin)
    }

    /// Fails with `PermissionDenied` unless the operator holds `role`.
    ///
    /// ```rust
    /// use gesticom_core::{Operator, Role};
    ///
    /// let cashier = Operator::new("u2", "Luis", Role::Worker);
    /// assert!(cashier.require_role(Role::Admin, "void sale").is_err());
    /// ```
    pub fn require_role(&self, role: Role, action: &str) -> CoreResult<()> {
        if self.is_in_role(role) {
            Ok(())
        } else {
            Err(CoreError::permission_denied(action, role.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, active: bool) -> User {
        User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            national_id: "12.345.678-5".to_string(),
            email: "ana@gesticom.cl".to_string(),
            role,
            active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_user() {
        let op = Operator::from_user(&user(Role::Admin, true)).unwrap();
        assert_eq!(op.id, "u1");
        assert!(op.is_admin());

        assert!(Operator::from_user(&user(Role::Admin, false)).is_none());
    }

    #[test]
    fn test_require_role() {
        let admin = Operator::new("u1", "Ana", Role::Admin);
        let worker = Operator::new("u2", "Luis", Role::Worker);

        assert!(admin.require_role(Role::Admin, "void sale").is_ok());
        let err = worker.require_role(Role::Admin, "void sale").unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
        assert!(worker.is_in_role(Role::Worker));
    }
}
