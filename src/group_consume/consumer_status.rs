use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Lifecycle of a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerStatus {
    /// Registered and eligible for partition assignment
    ///
    /// transition: removed by the caller => Dead
    Active,

    /// Removed, kept only for history
    ///
    /// transition: none, a consumer that left has to register again under a new id
    Dead,
}

impl ConsumerStatus {
    pub const fn can_transition_to(current: ConsumerStatus, target: ConsumerStatus) -> bool {
        matches!(
            (current, target),
            (ConsumerStatus::Active, ConsumerStatus::Dead)
        )
    }
}

impl Display for ConsumerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumerStatus::Active => write!(f, "ACTIVE"),
            ConsumerStatus::Dead => write!(f, "DEAD"),
        }
    }
}
