use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::group_consume::ActiveConsumer;
use crate::message::ConsumedRecord;
use crate::stats::StatsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicLifecycle {
    Created,
}

impl Display for TopicLifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicLifecycle::Created => write!(f, "CREATED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicStatus {
    pub partition_count: u32,
    pub status: TopicLifecycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProduceResult {
    pub offset: u64,
    pub partition: u32,
    pub key: Option<String>,
    /// unix millis
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkProduceResult {
    pub produced_count: usize,
    pub duration_ms: u128,
    /// messages per second
    pub throughput: f64,
    pub partition_distribution: BTreeMap<u32, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResult {
    pub consumer_id: String,
    pub group_id: String,
    pub assigned_partitions: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveResult {
    pub removed_consumer: String,
    pub rebalanced: bool,
    pub active_consumers: Vec<ActiveConsumer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumeResult {
    pub consumed_count: usize,
    pub duration_ms: u128,
    pub messages: Vec<ConsumedRecord>,
    pub stats: StatsSnapshot,
}
