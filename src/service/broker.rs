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

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::response::{
    BulkProduceResult, ConsumeResult, ProduceResult, RegisterResult, RemoveResult,
    TopicLifecycle, TopicStatus,
};
use super::{LabConfig, TopicState};
use crate::consume::consume_group;
use crate::group_consume::MemberAssignment;
use crate::guarantee::{DeliveryGuarantee, DeliveryReport, GuaranteeSimulator};
use crate::stats::StatsSnapshot;
use crate::{AppError, AppResult};

/// In-process entry point of the lab: one topic, its consumer groups and
/// the delivery guarantee replay.
///
/// Every call works on the topic state current when it starts. `init_topic`
/// swaps in a fresh state, so a reset is atomic for callers and calls
/// already running finish against the state they began with.
#[derive(Debug)]
pub struct Broker {
    config: LabConfig,
    topic: RwLock<Arc<TopicState>>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::with_config(LabConfig::default())
    }
}

impl Broker {
    /// Creates a broker whose topic is not initialized yet.
    pub fn with_config(config: LabConfig) -> Self {
        Broker {
            config,
            topic: RwLock::new(Arc::new(TopicState::new(0))),
        }
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    fn topic(&self) -> Arc<TopicState> {
        self.topic.read().clone()
    }

    fn reset_topic(&self, partition_count: u32) -> AppResult<Arc<TopicState>> {
        if partition_count == 0 {
            return Err(AppError::InvalidPartitionCount(partition_count));
        }
        let mut current = self.topic.write();
        match Arc::get_mut(&mut *current) {
            Some(state) => state.reset(partition_count),
            // still held by running calls, they finish on the old state
            None => *current = Arc::new(TopicState::new(partition_count)),
        }
        info!("topic reset with {} partitions", partition_count);
        Ok(current.clone())
    }

    /// Creates the topic, discarding every message, consumer and counter of
    /// the previous one.
    pub fn init_topic(&self, partition_count: u32) -> AppResult<TopicStatus> {
        let topic = self.reset_topic(partition_count)?;
        Ok(TopicStatus {
            partition_count: topic.partition_count(),
            status: TopicLifecycle::Created,
        })
    }

    pub fn produce(
        &self,
        key: Option<String>,
        value: impl Into<String>,
    ) -> AppResult<ProduceResult> {
        let message = self.topic().produce(key, value.into())?;
        Ok(ProduceResult {
            offset: message.offset,
            partition: message.partition,
            key: message.key,
            timestamp: message.produced_at.timestamp_millis(),
        })
    }

    fn produce_bulk_into(
        topic: &TopicState,
        message_count: usize,
        key_count: usize,
    ) -> AppResult<BulkProduceResult> {
        topic.ensure_initialized()?;
        let started = Instant::now();
        for i in 0..message_count {
            let key = (key_count > 0).then(|| format!("key_{}", i % key_count));
            let value = format!("Message_{}_{}", i, Utc::now().timestamp_millis());
            topic.produce(key, value)?;
        }
        let elapsed = started.elapsed();

        let seconds = elapsed.as_secs_f64();
        let throughput = if seconds > 0.0 {
            message_count as f64 / seconds
        } else {
            0.0
        };
        debug!(
            "bulk produced {} messages over {} keys in {:?}",
            message_count, key_count, elapsed
        );
        Ok(BulkProduceResult {
            produced_count: message_count,
            duration_ms: elapsed.as_millis(),
            throughput,
            partition_distribution: topic.partitions().sizes(),
        })
    }

    /// Produces `message_count` messages keyed round-robin over `key_count`
    /// keys (`key_0`, `key_1`, ...). With `key_count == 0` messages carry no
    /// key and are spread randomly.
    pub fn produce_bulk(
        &self,
        message_count: usize,
        key_count: usize,
    ) -> AppResult<BulkProduceResult> {
        Self::produce_bulk_into(&self.topic(), message_count, key_count)
    }

    pub async fn register_consumer(
        &self,
        group_id: &str,
        consumer_id: &str,
    ) -> AppResult<RegisterResult> {
        let topic = self.topic();
        topic.ensure_initialized()?;
        let assigned_partitions = topic
            .groups()
            .register(group_id, consumer_id, topic.partition_count())
            .await?;
        Ok(RegisterResult {
            consumer_id: consumer_id.to_string(),
            group_id: group_id.to_string(),
            assigned_partitions,
        })
    }

    /// Marks a consumer dead and rebalances its group. Unknown ids are a no-op.
    pub async fn remove_consumer(&self, consumer_id: &str) -> RemoveResult {
        let topic = self.topic();
        let rebalanced = topic
            .groups()
            .remove(consumer_id, topic.partition_count())
            .await;
        RemoveResult {
            removed_consumer: consumer_id.to_string(),
            rebalanced,
            active_consumers: topic.groups().active_consumers().await,
        }
    }

    /// Recomputes a group's assignment without a membership change.
    pub async fn rebalance(&self, group_id: &str) -> Vec<MemberAssignment> {
        let topic = self.topic();
        topic
            .groups()
            .rebalance(group_id, topic.partition_count())
            .await
    }

    /// One bounded drain pass for the group, see [`consume_group`].
    pub async fn consume(&self, group_id: &str, processing_time_ms: u64) -> ConsumeResult {
        let topic = self.topic();
        let started = Instant::now();
        let messages =
            consume_group(&topic, group_id, Duration::from_millis(processing_time_ms)).await;
        let duration_ms = started.elapsed().as_millis();

        ConsumeResult {
            consumed_count: messages.len(),
            duration_ms,
            messages,
            stats: StatsSnapshot::collect(&topic).await,
        }
    }

    /// Resets the topic to the configured replay size, produces a fresh
    /// backlog and drains it under `guarantee`.
    ///
    /// Like `init_topic`, this discards the current topic and its consumers.
    pub async fn simulate_delivery_guarantee(
        &self,
        guarantee: DeliveryGuarantee,
        message_count: usize,
        fail_rate_percent: u32,
    ) -> AppResult<DeliveryReport> {
        let replay_config = &self.config.guarantee;
        let topic = self.reset_topic(replay_config.partitions)?;
        Self::produce_bulk_into(&topic, message_count, replay_config.key_count)?;

        let mut simulator =
            GuaranteeSimulator::new(Duration::from_millis(replay_config.external_call_delay_ms));
        let report = simulator.replay(&topic, guarantee, fail_rate_percent).await;
        info!(
            "{} simulation: success={} duplicate={} lost={} of {}",
            guarantee,
            report.success_count,
            report.duplicate_count,
            report.lost_count,
            report.total_messages
        );
        Ok(report)
    }

    pub async fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::collect(&self.topic()).await
    }
}
