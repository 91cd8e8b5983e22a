use std::collections::BTreeMap;

use serde::Serialize;

use crate::group_consume::ActiveConsumer;
use crate::service::TopicState;

/// Raw counters of a topic. Formatting is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub produced_total: u64,
    pub consumed_total: u64,
    /// Sum of all partition sizes
    pub pending_total: usize,
    pub partition_count: u32,
    pub partition_sizes: BTreeMap<u32, usize>,
    pub active_consumers: Vec<ActiveConsumer>,
}

impl StatsSnapshot {
    /// Reads the topic without touching it.
    ///
    /// Group locks are awaited first, the counters are read right after
    /// without suspending.
    pub async fn collect(topic: &TopicState) -> Self {
        let active_consumers = topic.groups().active_consumers().await;
        let partition_sizes = topic.partitions().sizes();
        Self {
            produced_total: topic.produced_total(),
            consumed_total: topic.consumed_total(),
            pending_total: partition_sizes.values().sum(),
            partition_count: topic.partition_count(),
            partition_sizes,
            active_consumers,
        }
    }
}
