mod consumer_group;
mod consumer_metadata;
mod consumer_status;
mod group_manager;

pub use consumer_group::MemberAssignment;
pub use consumer_status::ConsumerStatus;
pub use group_manager::ActiveConsumer;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

/// Consumers sharing one group id, in registration order.
///
/// Dead members stay in `members` for audit, only active ones take part in
/// a rebalance.
#[derive(Debug)]
pub struct ConsumerGroup {
    id: String,
    generation_id: u32,
    members: Vec<ConsumerMetadata>,
}

/// A registered consumer
#[derive(Debug, Clone)]
pub struct ConsumerMetadata {
    id: String,
    group_id: String,
    // topic wide registration sequence, orders consumers across groups
    registration_seq: u64,
    status: ConsumerStatus,
    assigned_partitions: Vec<u32>,
    consumed_count: u64,
    last_consumed_offset: Option<u64>,
}

/// Registry of every consumer group of a topic.
///
/// Each group sits behind its own lock. A group's write lock serializes
/// membership changes and rebalance with the per-drain ownership check of a
/// consume pass for that group.
#[derive(Debug, Default)]
pub struct GroupManager {
    groups: DashMap<String, Arc<RwLock<ConsumerGroup>>>,
    // consumer id -> group id
    consumer_index: DashMap<String, String>,
    next_registration_seq: AtomicU64,
}
