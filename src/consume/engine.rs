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

use std::time::Duration;

use tracing::{debug, trace};

use crate::message::ConsumedRecord;
use crate::service::TopicState;

/// Runs one bounded drain pass for `group_id`
///
/// Every active member, in registration order, polls each of its partitions
/// once. A drained message costs `processing_time` of sleep on the calling
/// task before it is booked, so a pass takes roughly
/// `drained * processing_time`. Empty partitions are skipped and the pass
/// never waits for new messages.
///
/// Ownership is checked under the group lock right before each drain, and
/// the lock is released while a message is processed. A member that loses a
/// partition to a concurrent rebalance stops draining it from then on.
///
/// # Returns
/// The drained records in drain order, empty for an unknown group
pub async fn consume_group(
    topic: &TopicState,
    group_id: &str,
    processing_time: Duration,
) -> Vec<ConsumedRecord> {
    let Some(group) = topic.groups().get_group(group_id) else {
        debug!("consume for unknown group {}", group_id);
        return Vec::new();
    };

    let polls: Vec<(String, u32)> = group
        .read()
        .await
        .active_members()
        .flat_map(|member| {
            member
                .assigned_partitions()
                .iter()
                .map(move |partition| (member.id().to_string(), *partition))
        })
        .collect();

    let mut records = Vec::new();
    for (consumer_id, partition) in polls {
        let drained = {
            let group = group.read().await;
            if group.owns_partition(&consumer_id, partition) {
                topic.partitions().drain(partition)
            } else {
                trace!("consumer {} no longer owns partition {}", consumer_id, partition);
                None
            }
        };
        let Some(message) = drained else {
            continue;
        };

        if !processing_time.is_zero() {
            tokio::time::sleep(processing_time).await;
        }

        // a member removed meanwhile is still booked, dead members keep history
        if let Some(member) = group.write().await.get_member_mut(&consumer_id) {
            member.record_consumed(message.offset);
        }
        topic.record_consumed();
        trace!("consumer {} processed {}", consumer_id, message);
        records.push(ConsumedRecord::new(message, consumer_id));
    }

    debug!("group {} consumed {} messages", group_id, records.len());
    records
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::AppResult;

    #[tokio::test]
    async fn test_one_message_per_assigned_partition() -> AppResult<()> {
        let topic = TopicState::new(3);
        for round in 0..3 {
            for p in 0..3 {
                topic.partitions().produce(p, None, format!("p{}-{}", p, round))?;
            }
        }
        topic.groups().register("g", "c1", 3).await?;
        topic.groups().register("g", "c2", 3).await?;

        let records = consume_group(&topic, "g", Duration::ZERO).await;

        let drained: Vec<(&str, u32, u64)> = records
            .iter()
            .map(|r| (r.consumer_id.as_str(), r.partition, r.offset))
            .collect();
        assert_eq!(drained, vec![("c1", 0, 1), ("c1", 2, 3), ("c2", 1, 2)]);
        assert_eq!(topic.consumed_total(), 3);
        assert_eq!(topic.partitions().pending_total(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_member_bookkeeping() -> AppResult<()> {
        let topic = TopicState::new(1);
        topic.produce(Some("k".into()), "a".into())?;
        topic.produce(Some("k".into()), "b".into())?;
        topic.groups().register("g", "solo", 1).await?;

        let first = consume_group(&topic, "g", Duration::ZERO).await;
        let second = consume_group(&topic, "g", Duration::ZERO).await;
        let third = consume_group(&topic, "g", Duration::ZERO).await;

        assert_eq!(first[0].value, "a");
        assert_eq!(second[0].value, "b");
        assert!(third.is_empty());

        let solo = topic.groups().get_consumer("solo").await.unwrap();
        assert_eq!(solo.consumed_count(), 2);
        assert_eq!(solo.last_consumed_offset(), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_group_consumes_nothing() -> AppResult<()> {
        let topic = TopicState::new(2);
        topic.produce(None, "x".into())?;

        assert!(consume_group(&topic, "nobody", Duration::ZERO).await.is_empty());
        assert_eq!(topic.partitions().pending_total(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_time_scales_with_drained_messages() -> AppResult<()> {
        let topic = TopicState::new(4);
        for p in 0..4 {
            topic.partitions().produce(p, None, "x".into())?;
        }
        topic.groups().register("g", "c", 4).await?;

        let started = tokio::time::Instant::now();
        let records = consume_group(&topic, "g", Duration::from_millis(25)).await;

        assert_eq!(records.len(), 4);
        assert!(started.elapsed() >= Duration::from_millis(100));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_group_lock_released_while_processing() -> AppResult<()> {
        let topic = Arc::new(TopicState::new(3));
        for p in 0..3 {
            topic.partitions().produce(p, None, "x".into())?;
        }
        topic.groups().register("g", "c1", 3).await?;

        let pass = {
            let topic = topic.clone();
            tokio::spawn(async move {
                consume_group(&topic, "g", Duration::from_millis(500)).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // the first message is in flight: neither pending nor consumed yet
        let started = tokio::time::Instant::now();
        let active = topic.groups().active_consumers().await;
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(active[0].partitions, vec![0, 1, 2]);
        assert_eq!(topic.partitions().pending_total(), 2);
        assert_eq!(topic.consumed_total(), 0);

        let records = pass.await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(topic.consumed_total(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_partition_not_drained_mid_pass() -> AppResult<()> {
        let topic = Arc::new(TopicState::new(3));
        for p in 0..3 {
            topic.partitions().produce(p, None, format!("p{}", p))?;
        }
        topic.groups().register("g", "c1", 3).await?;

        let pass = {
            let topic = topic.clone();
            tokio::spawn(async move {
                consume_group(&topic, "g", Duration::from_millis(100)).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // c1 keeps 0 and 2, partition 1 moves to c2 while c1 processes p0
        assert_eq!(topic.groups().register("g", "c2", 3).await?, vec![1]);

        let records = pass.await.unwrap();
        let drained: Vec<(&str, u32)> = records
            .iter()
            .map(|r| (r.consumer_id.as_str(), r.partition))
            .collect();
        assert_eq!(drained, vec![("c1", 0), ("c1", 2)]);
        assert_eq!(topic.partitions().size(1), 1);

        let c1 = topic.groups().get_consumer("c1").await.unwrap();
        assert_eq!(c1.consumed_count(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_member_removed_mid_pass_keeps_history() -> AppResult<()> {
        let topic = Arc::new(TopicState::new(2));
        for p in 0..2 {
            topic.partitions().produce(p, None, "x".into())?;
        }
        topic.groups().register("g", "c1", 2).await?;

        let pass = {
            let topic = topic.clone();
            tokio::spawn(async move {
                consume_group(&topic, "g", Duration::from_millis(100)).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(topic.groups().remove("c1", 2).await);

        let records = pass.await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(topic.partitions().size(1), 1);

        let c1 = topic.groups().get_consumer("c1").await.unwrap();
        assert!(!c1.is_active());
        assert_eq!(c1.consumed_count(), 1);
        assert_eq!(c1.last_consumed_offset(), Some(1));
        Ok(())
    }
}
