use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TopicConfig {
    /// Partitions created when the cli starts a fresh topic.
    pub default_partitions: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProduceConfig {
    pub default_message_count: usize,
    pub default_key_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ConsumeConfig {
    pub default_group: String,
    /// Simulated processing time spent on every drained message.
    pub default_processing_time_ms: u64,
}

/// Settings for the delivery guarantee replay.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GuaranteeConfig {
    /// The replay always runs against a freshly reset topic of this size.
    pub partitions: u32,
    /// Number of round-robin keys used when producing the replay backlog.
    pub key_count: usize,
    /// Simulated downstream call made for every replayed message.
    pub external_call_delay_ms: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LabConfig {
    pub topic: TopicConfig,
    pub produce: ProduceConfig,
    pub consume: ConsumeConfig,
    pub guarantee: GuaranteeConfig,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            default_partitions: 3,
        }
    }
}

impl Default for ProduceConfig {
    fn default() -> Self {
        Self {
            default_message_count: 100,
            default_key_count: 10,
        }
    }
}

impl Default for ConsumeConfig {
    fn default() -> Self {
        Self {
            default_group: "group-1".to_string(),
            default_processing_time_ms: 10,
        }
    }
}

impl Default for GuaranteeConfig {
    fn default() -> Self {
        Self {
            partitions: 3,
            key_count: 5,
            external_call_delay_ms: 0,
        }
    }
}

impl LabConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<LabConfig> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or(AppError::InvalidValue(format!(
                "config file path: {}",
                path.as_ref().to_string_lossy()
            )))?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .build()?;

        let lab_config: LabConfig = config.try_deserialize()?;
        if lab_config.guarantee.partitions == 0 {
            return Err(AppError::InvalidPartitionCount(0));
        }

        Ok(lab_config)
    }
}
