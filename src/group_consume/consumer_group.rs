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

//! Membership and partition assignment of a single consumer group.

use serde::Serialize;
use tracing::debug;

use super::ConsumerGroup;
use super::ConsumerMetadata;

/// Partitions owned by one active member after a rebalance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberAssignment {
    pub consumer_id: String,
    pub partitions: Vec<u32>,
}

impl ConsumerGroup {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            id: group_id.into(),
            generation_id: 0,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bumped on every rebalance, including rebalances that leave the group empty.
    pub fn generation_id(&self) -> u32 {
        self.generation_id
    }

    /// Appends a member, keeping registration order.
    pub fn add_member(&mut self, member: ConsumerMetadata) {
        self.members.push(member);
    }

    /// Marks a member dead
    ///
    /// # Returns
    /// `true` if the member existed and was still active
    pub fn mark_member_dead(&mut self, consumer_id: &str) -> bool {
        self.members
            .iter_mut()
            .find(|m| m.id() == consumer_id)
            .is_some_and(|m| m.mark_dead())
    }

    pub fn get_member(&self, consumer_id: &str) -> Option<&ConsumerMetadata> {
        self.members.iter().find(|m| m.id() == consumer_id)
    }

    pub fn get_member_mut(&mut self, consumer_id: &str) -> Option<&mut ConsumerMetadata> {
        self.members.iter_mut().find(|m| m.id() == consumer_id)
    }

    /// `true` if `consumer_id` is active and owns `partition` in the current generation.
    pub fn owns_partition(&self, consumer_id: &str, partition: u32) -> bool {
        self.get_member(consumer_id)
            .is_some_and(|m| m.is_active() && m.assigned_partitions().contains(&partition))
    }

    /// All members, dead ones included, in registration order.
    pub fn members(&self) -> &[ConsumerMetadata] {
        &self.members
    }

    pub fn active_members(&self) -> impl Iterator<Item = &ConsumerMetadata> {
        self.members.iter().filter(|m| m.is_active())
    }

    pub fn active_members_mut(&mut self) -> impl Iterator<Item = &mut ConsumerMetadata> {
        self.members.iter_mut().filter(|m| m.is_active())
    }

    pub fn has_active_members(&self) -> bool {
        self.members.iter().any(|m| m.is_active())
    }

    /// Recomputes ownership of `0..partition_count` from scratch
    ///
    /// Partition `p` goes to the active member at position
    /// `p % active_count`, counting in registration order. Every previous
    /// assignment is dropped first, so any membership change may move every
    /// partition. With no active member all partitions stay unowned.
    ///
    /// # Returns
    /// The new assignment of every active member, in registration order
    pub fn rebalance(&mut self, partition_count: u32) -> Vec<MemberAssignment> {
        self.generation_id += 1;

        let mut active: Vec<&mut ConsumerMetadata> = self.active_members_mut().collect();
        active.iter_mut().for_each(|m| m.clear_assignment());

        if !active.is_empty() {
            let active_count = active.len();
            for partition in 0..partition_count {
                active[partition as usize % active_count].assign(partition);
            }
        }

        let assignment: Vec<MemberAssignment> = self
            .active_members()
            .map(|m| MemberAssignment {
                consumer_id: m.id().to_string(),
                partitions: m.assigned_partitions().to_vec(),
            })
            .collect();
        debug!(
            "group {} generation {} rebalanced: {:?}",
            self.id, self.generation_id, assignment
        );
        assignment
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    fn group_with(members: &[&str]) -> ConsumerGroup {
        let mut group = ConsumerGroup::new("g");
        for (seq, id) in members.iter().enumerate() {
            group.add_member(ConsumerMetadata::new(*id, "g", seq as u64));
        }
        group
    }

    fn owned(group: &ConsumerGroup, consumer_id: &str) -> Vec<u32> {
        group
            .get_member(consumer_id)
            .unwrap()
            .assigned_partitions()
            .to_vec()
    }

    #[test]
    fn test_striped_assignment() {
        let mut group = group_with(&["c1", "c2"]);
        group.rebalance(5);

        assert_eq!(owned(&group, "c1"), vec![0, 2, 4]);
        assert_eq!(owned(&group, "c2"), vec![1, 3]);
    }

    #[test]
    fn test_more_consumers_than_partitions() {
        let mut group = group_with(&["c1", "c2", "c3", "c4"]);
        let assignment = group.rebalance(2);

        assert_eq!(assignment.len(), 4);
        assert_eq!(owned(&group, "c1"), vec![0]);
        assert_eq!(owned(&group, "c2"), vec![1]);
        assert!(owned(&group, "c3").is_empty());
        assert!(owned(&group, "c4").is_empty());
    }

    #[rstest]
    #[case(1, 1)]
    #[case(3, 1)]
    #[case(3, 2)]
    #[case(6, 4)]
    #[case(8, 3)]
    fn test_every_partition_owned_exactly_once(
        #[case] partition_count: u32,
        #[case] consumers: usize,
    ) {
        let ids: Vec<String> = (0..consumers).map(|i| format!("c{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut group = group_with(&refs);

        let assignment = group.rebalance(partition_count);

        let mut all: Vec<u32> = assignment
            .iter()
            .flat_map(|a| a.partitions.iter().copied())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..partition_count).collect::<Vec<_>>());
    }

    #[test]
    fn test_rebalance_is_idempotent() {
        let mut group = group_with(&["a", "b", "c"]);
        let first = group.rebalance(7);
        let second = group.rebalance(7);
        assert_eq!(first, second);
        assert_eq!(group.generation_id(), 2);
    }

    #[test]
    fn test_dead_member_loses_partitions() {
        let mut group = group_with(&["a", "b", "c"]);
        group.rebalance(6);
        assert_eq!(owned(&group, "b"), vec![1, 4]);

        assert!(group.mark_member_dead("b"));
        assert!(!group.mark_member_dead("b"));
        assert!(!group.mark_member_dead("missing"));
        group.rebalance(6);

        assert!(owned(&group, "b").is_empty());
        assert_eq!(owned(&group, "a"), vec![0, 2, 4]);
        assert_eq!(owned(&group, "c"), vec![1, 3, 5]);
        // dead members are kept for history
        assert_eq!(group.members().len(), 3);
    }

    #[test]
    fn test_join_reshuffles_existing_members() {
        let mut group = group_with(&["a", "b"]);
        group.rebalance(4);
        assert_eq!(owned(&group, "b"), vec![1, 3]);

        group.add_member(ConsumerMetadata::new("c", "g", 2));
        group.rebalance(4);

        assert_eq!(owned(&group, "a"), vec![0, 3]);
        assert_eq!(owned(&group, "b"), vec![1]);
        assert_eq!(owned(&group, "c"), vec![2]);
    }

    #[test]
    fn test_empty_group_owns_nothing() {
        let mut group = group_with(&["a"]);
        group.rebalance(3);
        group.mark_member_dead("a");

        let assignment = group.rebalance(3);

        assert!(assignment.is_empty());
        assert!(!group.has_active_members());
        let owners: HashSet<&str> = group
            .members()
            .iter()
            .filter(|m| !m.assigned_partitions().is_empty())
            .map(|m| m.id())
            .collect();
        assert!(owners.is_empty());
    }

    #[test]
    fn test_owns_partition_follows_generation() {
        let mut group = group_with(&["a", "b"]);
        group.rebalance(3);
        assert!(group.owns_partition("a", 2));
        assert!(!group.owns_partition("b", 2));
        assert!(!group.owns_partition("missing", 0));

        group.mark_member_dead("a");
        group.rebalance(3);
        assert!(!group.owns_partition("a", 0));
        assert!(group.owns_partition("b", 2));
    }
}
