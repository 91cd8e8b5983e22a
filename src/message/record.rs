use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A record stored in a partition.
///
/// `offset` comes from the topic wide allocator, so the offsets held by a
/// single partition are increasing but not contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub offset: u64,
    pub key: Option<String>,
    pub value: String,
    pub partition: u32,
    pub produced_at: DateTime<Utc>,
}

impl Message {
    pub fn new(offset: u64, key: Option<String>, value: String, partition: u32) -> Self {
        Self {
            offset,
            key,
            value,
            partition,
            produced_at: Utc::now(),
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p{}@{} key={}",
            self.partition,
            self.offset,
            self.key.as_deref().unwrap_or("-")
        )
    }
}

/// A message as handed to a consumer by a consume pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumedRecord {
    pub offset: u64,
    pub partition: u32,
    pub key: Option<String>,
    pub value: String,
    pub consumer_id: String,
}

impl ConsumedRecord {
    pub fn new(message: Message, consumer_id: impl Into<String>) -> Self {
        Self {
            offset: message.offset,
            partition: message.partition,
            key: message.key,
            value: message.value,
            consumer_id: consumer_id.into(),
        }
    }
}
