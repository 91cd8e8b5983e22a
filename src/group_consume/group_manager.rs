use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ConsumerGroup;
use super::ConsumerMetadata;
use super::GroupManager;
use super::MemberAssignment;
use crate::{AppError, AppResult};

/// Point-in-time view of an active consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveConsumer {
    pub consumer_id: String,
    pub group_id: String,
    pub partitions: Vec<u32>,
    pub consumed_count: u64,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_group(&self, group_id: &str) -> Option<Arc<RwLock<ConsumerGroup>>> {
        self.groups.get(group_id).map(|g| g.value().clone())
    }

    fn get_or_create_group(&self, group_id: &str) -> Arc<RwLock<ConsumerGroup>> {
        self.groups
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(ConsumerGroup::new(group_id))))
            .value()
            .clone()
    }

    /// Registers a new active consumer and rebalances its group
    ///
    /// # Arguments
    /// * `group_id` - Group to join
    /// * `consumer_id` - Id of the new consumer, must never have been used before
    /// * `partition_count` - Partitions of the topic
    ///
    /// # Returns
    /// The partitions assigned to the new consumer
    pub async fn register(
        &self,
        group_id: &str,
        consumer_id: &str,
        partition_count: u32,
    ) -> AppResult<Vec<u32>> {
        // claim the id first, the shard guard must not live across an await
        match self.consumer_index.entry(consumer_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(AppError::ConsumerAlreadyExists(consumer_id.to_string()))
            }
            Entry::Vacant(entry) => {
                entry.insert(group_id.to_string());
            }
        }

        let group = self.get_or_create_group(group_id);
        let mut group = group.write().await;
        // taken under the group lock so member order and seq order agree
        let seq = self.next_registration_seq.fetch_add(1, Ordering::SeqCst);
        group.add_member(ConsumerMetadata::new(consumer_id, group_id, seq));
        let assignment = group.rebalance(partition_count);
        info!(
            "consumer {} joined group {}, generation {}",
            consumer_id,
            group_id,
            group.generation_id()
        );

        Ok(assignment
            .into_iter()
            .find(|a| a.consumer_id == consumer_id)
            .map(|a| a.partitions)
            .unwrap_or_default())
    }

    /// Marks a consumer dead and rebalances its group
    ///
    /// Unknown or already dead consumers are ignored.
    ///
    /// # Returns
    /// `true` if an active consumer was removed
    pub async fn remove(&self, consumer_id: &str, partition_count: u32) -> bool {
        let Some(group_id) = self.consumer_index.get(consumer_id).map(|g| g.value().clone())
        else {
            debug!("remove unknown consumer {}", consumer_id);
            return false;
        };
        let Some(group) = self.get_group(&group_id) else {
            return false;
        };

        let mut group = group.write().await;
        if !group.mark_member_dead(consumer_id) {
            debug!("consumer {} already dead", consumer_id);
            return false;
        }
        group.rebalance(partition_count);
        info!(
            "consumer {} left group {}, generation {}",
            consumer_id,
            group_id,
            group.generation_id()
        );
        true
    }

    /// Recomputes the assignment of a group without a membership change.
    ///
    /// An unknown group yields an empty assignment.
    pub async fn rebalance(&self, group_id: &str, partition_count: u32) -> Vec<MemberAssignment> {
        match self.get_group(group_id) {
            Some(group) => group.write().await.rebalance(partition_count),
            None => Vec::new(),
        }
    }

    /// Active consumers of every group, in registration order.
    pub async fn active_consumers(&self) -> Vec<ActiveConsumer> {
        // collect the handles first so no map guard is held while awaiting
        let groups: Vec<Arc<RwLock<ConsumerGroup>>> =
            self.groups.iter().map(|g| g.value().clone()).collect();

        let mut active = Vec::new();
        for group in groups {
            let group = group.read().await;
            active.extend(group.active_members().map(|m| {
                (
                    m.registration_seq(),
                    ActiveConsumer {
                        consumer_id: m.id().to_string(),
                        group_id: m.group_id().to_string(),
                        partitions: m.assigned_partitions().to_vec(),
                        consumed_count: m.consumed_count(),
                    },
                )
            }));
        }
        active.sort_by_key(|(seq, _)| *seq);
        active.into_iter().map(|(_, consumer)| consumer).collect()
    }

    /// Looks up a consumer, dead or alive.
    pub async fn get_consumer(&self, consumer_id: &str) -> Option<ConsumerMetadata> {
        let group_id = self.consumer_index.get(consumer_id)?.value().clone();
        let group = self.get_group(&group_id)?;
        let group = group.read().await;
        let member = group.get_member(consumer_id).cloned();
        member
    }
}
