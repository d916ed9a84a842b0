//! # Session
//!
//! The logged-in employee, as a value.
//!
//! There is no process-wide "current user". Whoever handles a login keeps the
//! returned [`Session`] and passes it to the operations that care about roles.
//! The stores and the order processor never look at it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Employee, EntityId, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub employee_id: EntityId,
    pub username: String,
    pub role: Role,
}

impl Session {
    /// Opens a session for an employee whose credentials were already checked.
    pub fn for_employee(employee: &Employee) -> Self {
        Session {
            employee_id: employee.id,
            username: employee.username.clone(),
            role: employee.role,
        }
    }

    /// True when the session may act as `role`. Admin may act as anyone.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Role::Admin || self.role == role
    }

    /// Fails with `Forbidden` unless [`has_role`](Self::has_role) holds.
    pub fn require_role(&self, role: Role, action: &str) -> CoreResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: self.role.to_string(),
                action: action.to_string(),
            })
        }
    }
}
