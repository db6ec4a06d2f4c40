use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who changed reference data, through which system, and within which operation.
///
/// The resolver never inspects these values; stores persist them next to each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditContext {
    changed_by: Uuid,
    changed_by_system: Uuid,
    operation_id: Uuid,
}

impl AuditContext {
    /// Creates an audit context for a fresh operation.
    #[must_use]
    pub fn new(changed_by: Uuid, changed_by_system: Uuid) -> Self {
        Self {
            changed_by,
            changed_by_system,
            operation_id: Uuid::new_v4(),
        }
    }

    /// Creates an audit context bound to an existing operation id.
    #[must_use]
    pub fn with_operation_id(changed_by: Uuid, changed_by_system: Uuid, operation_id: Uuid) -> Self {
        Self {
            changed_by,
            changed_by_system,
            operation_id,
        }
    }

    /// Returns a copy of this context with a newly generated operation id.
    #[must_use]
    pub fn next_operation(&self) -> Self {
        Self::new(self.changed_by, self.changed_by_system)
    }

    /// Returns the acting party.
    #[must_use]
    pub fn changed_by(&self) -> Uuid {
        self.changed_by
    }

    /// Returns the system that performed the change on behalf of the actor.
    #[must_use]
    pub fn changed_by_system(&self) -> Uuid {
        self.changed_by_system
    }

    /// Returns the batch or operation identifier.
    #[must_use]
    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }
}

impl Display for AuditContext {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}/{}@{}",
            self.changed_by, self.changed_by_system, self.operation_id
        )
    }
}
