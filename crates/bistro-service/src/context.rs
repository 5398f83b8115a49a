//! The authenticated user behind a request.

use serde::{Deserialize, Serialize};

use bistro_core::StaffRole;

/// Who is performing an operation.
///
/// Passed into every mutating service call and stamped onto the records it
/// produces (`processed_by`, `voided_by`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub role: StaffRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: StaffRole) -> Self {
        Actor {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }
}
