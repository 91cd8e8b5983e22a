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

use rand::Rng;

use crate::{AppError, AppResult};

/// Picks the partition a produced message lands in.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    partition_count: u32,
}

impl Router {
    pub fn new(partition_count: u32) -> Self {
        Self { partition_count }
    }

    /// Routes a message to a partition index
    ///
    /// # Arguments
    /// * `key` - Optional message key
    ///
    /// # Returns
    /// * keyed messages: `crc32c(key) % partition_count`, so a key always maps
    ///   to the same partition and per-key ordering holds
    /// * keyless messages: a uniformly random partition
    /// * `AppError::TopicNotInitialized` when the topic has no partitions
    pub fn route(&self, key: Option<&str>) -> AppResult<u32> {
        if self.partition_count == 0 {
            return Err(AppError::TopicNotInitialized);
        }
        let partition = match key {
            Some(key) => crc32c::crc32c(key.as_bytes()) % self.partition_count,
            None => rand::thread_rng().gen_range(0..self.partition_count),
        };
        Ok(partition)
    }
}
