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

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use super::Message;
use crate::{AppError, AppResult};

/// The partitions of one topic plus the topic wide offset allocator.
///
/// Every partition is an unbounded FIFO; appends never block and never get
/// rejected.
#[derive(Debug)]
pub struct PartitionStore {
    partitions: Vec<Mutex<VecDeque<Message>>>,
    last_offset: AtomicU64,
}

impl PartitionStore {
    pub fn new(partition_count: u32) -> Self {
        Self {
            partitions: (0..partition_count)
                .map(|_| Mutex::new(VecDeque::new()))
                .collect(),
            last_offset: AtomicU64::new(0),
        }
    }

    pub fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    fn partition(&self, partition: u32) -> AppResult<&Mutex<VecDeque<Message>>> {
        self.partitions
            .get(partition as usize)
            .ok_or_else(|| AppError::InvalidValue(format!("partition index: {}", partition)))
    }

    /// Appends a message to `partition` and returns it.
    ///
    /// The offset is taken while the partition is locked, so offsets inside one
    /// partition follow its append order.
    pub fn produce(
        &self,
        partition: u32,
        key: Option<String>,
        value: String,
    ) -> AppResult<Message> {
        let queue = self.partition(partition)?;
        let mut queue = queue.lock();
        let offset = self.last_offset.fetch_add(1, Ordering::SeqCst) + 1;
        let message = Message::new(offset, key, value, partition);
        queue.push_back(message.clone());
        trace!("append {} size={}", message, queue.len());
        Ok(message)
    }

    /// Non-blocking pop of the oldest message, `None` if the partition is
    /// empty or does not exist.
    pub fn drain(&self, partition: u32) -> Option<Message> {
        let message = self.partitions.get(partition as usize)?.lock().pop_front();
        if let Some(message) = &message {
            trace!("drain {}", message);
        }
        message
    }

    pub fn size(&self, partition: u32) -> usize {
        self.partitions
            .get(partition as usize)
            .map_or(0, |queue| queue.lock().len())
    }

    pub fn sizes(&self) -> BTreeMap<u32, usize> {
        (0..self.partition_count())
            .map(|partition| (partition, self.size(partition)))
            .collect()
    }

    pub fn pending_total(&self) -> usize {
        self.partitions.iter().map(|queue| queue.lock().len()).sum()
    }

    /// Number of messages ever appended, which is also the last offset handed out.
    pub fn produced_total(&self) -> u64 {
        self.last_offset.load(Ordering::SeqCst)
    }

    /// Drops every message and restarts the allocator with `partition_count`
    /// empty partitions.
    pub fn reset(&mut self, partition_count: u32) {
        *self = Self::new(partition_count);
    }
}
