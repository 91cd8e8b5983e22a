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

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to callers of the broker.
///
/// Only precondition failures live here. Unknown consumers or groups and
/// simulated processing failures are reported through result values.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("topic is not initialized, call init_topic first")]
    TopicNotInitialized,

    #[error("invalid partition count: {0}, must be greater than zero")]
    InvalidPartitionCount(u32),

    #[error("consumer already registered: {0}")]
    ConsumerAlreadyExists(String),

    #[error("unknown delivery guarantee: {0}")]
    UnknownGuarantee(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("config file error: {0}")]
    ConfigFileError(#[from] config::ConfigError),

    #[error("tracing init error: {0}")]
    TracingInitError(String),
}
