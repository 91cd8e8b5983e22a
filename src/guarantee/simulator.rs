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

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::{DeliveryGuarantee, DeliveryReport};
use crate::service::TopicState;

/// Replays a topic backlog under a delivery guarantee.
///
/// Failures are drawn per message and only ever show up as counts in the
/// report. Nothing is retried for real.
#[derive(Debug)]
pub struct GuaranteeSimulator {
    rng: StdRng,
    external_call_delay: Duration,
}

impl GuaranteeSimulator {
    pub fn new(external_call_delay: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            external_call_delay,
        }
    }

    /// Same draws on every run, for reproducible reports.
    pub fn seeded(seed: u64, external_call_delay: Duration) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            external_call_delay,
        }
    }

    /// `true` with probability `fail_rate_percent`; 0 never fails, 100 always does.
    fn draw_failure(&mut self, fail_rate_percent: u32) -> bool {
        self.rng.gen_range(0..100) < fail_rate_percent
    }

    /// Drains every partition of `topic`, lowest index first, and classifies
    /// each message
    ///
    /// * at-most-once: the offset is committed before processing, a failed
    ///   message is counted as lost
    /// * at-least-once: processing happens before the commit; a failure is
    ///   retried, the first sight of an offset counts as success and any
    ///   later sight as a duplicate
    /// * exactly-once: the commit is idempotent on the offset, every offset
    ///   counts as success once whatever the draw
    ///
    /// The backlog is drained once, so each offset is seen once and the
    /// at-least-once duplicate count stays at zero.
    ///
    /// # Arguments
    /// * `fail_rate_percent` - clamped to 100
    pub async fn replay(
        &mut self,
        topic: &TopicState,
        guarantee: DeliveryGuarantee,
        fail_rate_percent: u32,
    ) -> DeliveryReport {
        let fail_rate_percent = fail_rate_percent.min(100);
        let mut processed_offsets = HashSet::new();
        let mut total_messages = 0;
        let mut success_count = 0;
        let mut duplicate_count = 0;
        let mut lost_count = 0;

        for partition in 0..topic.partition_count() {
            while let Some(message) = topic.partitions().drain(partition) {
                total_messages += 1;
                if !self.external_call_delay.is_zero() {
                    tokio::time::sleep(self.external_call_delay).await;
                }
                let failed = self.draw_failure(fail_rate_percent);
                trace!("replay {} failed={}", message, failed);

                match guarantee {
                    DeliveryGuarantee::AtMostOnce => {
                        if failed {
                            lost_count += 1;
                        } else {
                            success_count += 1;
                        }
                    }
                    // a failed attempt is retried and lands in the same bookkeeping
                    DeliveryGuarantee::AtLeastOnce => {
                        if processed_offsets.insert(message.offset) {
                            success_count += 1;
                        } else {
                            duplicate_count += 1;
                        }
                    }
                    DeliveryGuarantee::ExactlyOnce => {
                        if processed_offsets.insert(message.offset) {
                            success_count += 1;
                        }
                    }
                }
            }
        }

        debug!(
            "{} replay: total={} success={} duplicate={} lost={}",
            guarantee, total_messages, success_count, duplicate_count, lost_count
        );
        DeliveryReport {
            guarantee,
            total_messages,
            success_count,
            duplicate_count,
            lost_count,
            fail_rate_percent,
            explanation: guarantee.explanation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::AppResult;

    fn backlog(messages: usize) -> AppResult<TopicState> {
        let topic = TopicState::new(3);
        for i in 0..messages {
            topic.produce(Some(format!("key_{}", i % 5)), format!("m{}", i))?;
        }
        Ok(topic)
    }

    #[rstest]
    #[case(DeliveryGuarantee::AtMostOnce)]
    #[case(DeliveryGuarantee::AtLeastOnce)]
    #[case(DeliveryGuarantee::ExactlyOnce)]
    #[tokio::test]
    async fn test_zero_fail_rate_delivers_everything(
        #[case] guarantee: DeliveryGuarantee,
    ) -> AppResult<()> {
        let topic = backlog(60)?;
        let mut simulator = GuaranteeSimulator::new(Duration::ZERO);

        let report = simulator.replay(&topic, guarantee, 0).await;

        assert_eq!(report.total_messages, 60);
        assert_eq!(report.success_count, 60);
        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.lost_count, 0);
        assert_eq!(topic.partitions().pending_total(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_at_most_once_full_failure_loses_everything() -> AppResult<()> {
        let topic = backlog(100)?;
        let mut simulator = GuaranteeSimulator::new(Duration::ZERO);

        let report = simulator
            .replay(&topic, DeliveryGuarantee::AtMostOnce, 100)
            .await;

        assert_eq!(report.lost_count, 100);
        assert_eq!(report.success_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_at_most_once_partial_failure_splits_outcomes() -> AppResult<()> {
        let topic = backlog(1000)?;
        let mut simulator = GuaranteeSimulator::seeded(7, Duration::ZERO);

        let report = simulator
            .replay(&topic, DeliveryGuarantee::AtMostOnce, 30)
            .await;

        assert_eq!(report.lost_count + report.success_count, 1000);
        // 30% of 1000 draws, far from either bound
        assert!(report.lost_count > 150 && report.lost_count < 450);
        Ok(())
    }

    #[rstest]
    #[case(DeliveryGuarantee::AtLeastOnce)]
    #[case(DeliveryGuarantee::ExactlyOnce)]
    #[tokio::test]
    async fn test_retrying_guarantees_never_lose(
        #[case] guarantee: DeliveryGuarantee,
    ) -> AppResult<()> {
        let topic = backlog(100)?;
        let mut simulator = GuaranteeSimulator::new(Duration::ZERO);

        let report = simulator.replay(&topic, guarantee, 100).await;

        assert_eq!(report.success_count, 100);
        assert_eq!(report.lost_count, 0);
        assert_eq!(report.duplicate_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_fail_rate_is_clamped() -> AppResult<()> {
        let topic = backlog(10)?;
        let mut simulator = GuaranteeSimulator::new(Duration::ZERO);

        let report = simulator
            .replay(&topic, DeliveryGuarantee::AtMostOnce, 250)
            .await;

        assert_eq!(report.fail_rate_percent, 100);
        assert_eq!(report.lost_count, 10);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_call_delay() -> AppResult<()> {
        let topic = backlog(5)?;
        let mut simulator = GuaranteeSimulator::new(Duration::from_millis(10));

        let started = tokio::time::Instant::now();
        simulator
            .replay(&topic, DeliveryGuarantee::ExactlyOnce, 0)
            .await;

        assert!(started.elapsed() >= Duration::from_millis(50));
        Ok(())
    }
}
