// Copyright 2025 jonefeewang@gmail.com
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::group_consume::GroupManager;
use crate::message::{Message, PartitionStore, Router};
use crate::{AppError, AppResult};

/// Everything that lives and dies with one topic: partitions, offset
/// allocator, consumer groups and counters.
///
/// A reset never touches a state other callers still hold; the broker
/// swaps in a fresh one unless it owns the only reference.
#[derive(Debug)]
pub struct TopicState {
    partitions: PartitionStore,
    router: Router,
    groups: GroupManager,
    consumed_total: AtomicU64,
}

impl TopicState {
    pub fn new(partition_count: u32) -> Self {
        Self {
            partitions: PartitionStore::new(partition_count),
            router: Router::new(partition_count),
            groups: GroupManager::new(),
            consumed_total: AtomicU64::new(0),
        }
    }

    /// Discards every message, consumer and counter and reshapes the topic to
    /// `partition_count` partitions.
    pub fn reset(&mut self, partition_count: u32) {
        self.partitions.reset(partition_count);
        self.router = Router::new(partition_count);
        self.groups = GroupManager::new();
        *self.consumed_total.get_mut() = 0;
    }

    pub fn partition_count(&self) -> u32 {
        self.partitions.partition_count()
    }

    pub fn is_initialized(&self) -> bool {
        self.partition_count() > 0
    }

    pub fn ensure_initialized(&self) -> AppResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AppError::TopicNotInitialized)
        }
    }

    pub fn partitions(&self) -> &PartitionStore {
        &self.partitions
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    /// Routes and appends one message.
    pub fn produce(&self, key: Option<String>, value: String) -> AppResult<Message> {
        let partition = self.router.route(key.as_deref())?;
        self.partitions.produce(partition, key, value)
    }

    pub fn produced_total(&self) -> u64 {
        self.partitions.produced_total()
    }

    pub fn consumed_total(&self) -> u64 {
        self.consumed_total.load(Ordering::SeqCst)
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed_total.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_discards_everything() -> AppResult<()> {
        let mut topic = TopicState::new(2);
        topic.produce(Some("k".into()), "a".into())?;
        topic.groups().register("g", "c1", 2).await?;
        topic.record_consumed();

        topic.reset(5);

        assert_eq!(topic.partition_count(), 5);
        assert_eq!(topic.produced_total(), 0);
        assert_eq!(topic.consumed_total(), 0);
        assert_eq!(topic.partitions().pending_total(), 0);
        assert!(topic.groups().get_group("g").is_none());
        // the old consumer id is free again
        topic.groups().register("g", "c1", 5).await?;
        assert_eq!(topic.produce(None, "b".into())?.offset, 1);
        Ok(())
    }
}
