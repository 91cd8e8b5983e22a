pub use app_error::{AppError, AppResult};
pub use broker::Broker;
pub use self::config::{ConsumeConfig, GuaranteeConfig, LabConfig, ProduceConfig, TopicConfig};
pub use response::{
    BulkProduceResult, ConsumeResult, ProduceResult, RegisterResult, RemoveResult,
    TopicLifecycle, TopicStatus,
};
pub use topic::TopicState;
pub use tracing_config::{setup_local_tracing, setup_tracing};

mod app_error;
mod broker;
mod config;
mod response;
mod topic;
mod tracing_config;
