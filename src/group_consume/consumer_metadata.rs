use tracing::debug;

use super::ConsumerMetadata;
use super::ConsumerStatus;

impl ConsumerMetadata {
    /// Creates an active consumer with no partitions assigned
    ///
    /// # Arguments
    /// * `id` - Unique consumer id
    /// * `group_id` - Group the consumer joins
    /// * `registration_seq` - Topic wide registration order
    pub fn new(id: impl Into<String>, group_id: impl Into<String>, registration_seq: u64) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            registration_seq,
            status: ConsumerStatus::Active,
            assigned_partitions: Vec::new(),
            consumed_count: 0,
            last_consumed_offset: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn registration_seq(&self) -> u64 {
        self.registration_seq
    }

    pub fn status(&self) -> ConsumerStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ConsumerStatus::Active
    }

    /// Partitions owned after the last rebalance, ascending.
    pub fn assigned_partitions(&self) -> &[u32] {
        &self.assigned_partitions
    }

    pub fn consumed_count(&self) -> u64 {
        self.consumed_count
    }

    pub fn last_consumed_offset(&self) -> Option<u64> {
        self.last_consumed_offset
    }

    /// Marks the consumer dead and drops its assignment.
    ///
    /// # Returns
    /// `false` if the consumer was already dead
    pub fn mark_dead(&mut self) -> bool {
        if !ConsumerStatus::can_transition_to(self.status, ConsumerStatus::Dead) {
            return false;
        }
        debug!(
            "consumer {} transition_to: {} -> {}",
            self.id,
            self.status,
            ConsumerStatus::Dead
        );
        self.status = ConsumerStatus::Dead;
        self.assigned_partitions.clear();
        true
    }

    pub(super) fn clear_assignment(&mut self) {
        self.assigned_partitions.clear();
    }

    pub(super) fn assign(&mut self, partition: u32) {
        self.assigned_partitions.push(partition);
    }

    /// Books one processed message against this consumer.
    pub fn record_consumed(&mut self, offset: u64) {
        self.consumed_count += 1;
        self.last_consumed_offset = Some(offset);
    }
}
