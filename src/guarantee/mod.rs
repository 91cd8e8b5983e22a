mod simulator;

pub use simulator::GuaranteeSimulator;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::AppError;

/// Consistency contract between committing an offset and processing the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryGuarantee {
    /// commit, then process: a failed message is gone
    AtMostOnce,
    /// process, then commit: a failed message is retried and may show up twice
    AtLeastOnce,
    /// transactional, idempotent commit
    ExactlyOnce,
}

impl DeliveryGuarantee {
    pub const ALL: [DeliveryGuarantee; 3] = [
        DeliveryGuarantee::AtMostOnce,
        DeliveryGuarantee::AtLeastOnce,
        DeliveryGuarantee::ExactlyOnce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryGuarantee::AtMostOnce => "at-most-once",
            DeliveryGuarantee::AtLeastOnce => "at-least-once",
            DeliveryGuarantee::ExactlyOnce => "exactly-once",
        }
    }

    /// One line on the trade-off this guarantee makes.
    pub fn explanation(&self) -> &'static str {
        match self {
            DeliveryGuarantee::AtMostOnce => {
                "commit before processing: fast, but failed messages are lost"
            }
            DeliveryGuarantee::AtLeastOnce => {
                "commit after processing: no message is lost, but duplicates are possible"
            }
            DeliveryGuarantee::ExactlyOnce => {
                "transaction plus idempotent commit: every message is processed exactly once"
            }
        }
    }
}

impl Display for DeliveryGuarantee {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryGuarantee {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryGuarantee::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| AppError::UnknownGuarantee(s.to_string()))
    }
}

/// Outcome of replaying a backlog under one guarantee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub guarantee: DeliveryGuarantee,
    pub total_messages: usize,
    pub success_count: usize,
    pub duplicate_count: usize,
    pub lost_count: usize,
    pub fail_rate_percent: u32,
    pub explanation: &'static str,
}
