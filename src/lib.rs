mod consume;
mod group_consume;
mod guarantee;
mod message;
mod service;
mod stats;

pub use consume::consume_group;
pub use group_consume::{
    ActiveConsumer, ConsumerGroup, ConsumerMetadata, ConsumerStatus, GroupManager,
    MemberAssignment,
};
pub use guarantee::{DeliveryGuarantee, DeliveryReport, GuaranteeSimulator};
pub use message::{ConsumedRecord, Message, PartitionStore, Router};
pub use service::{
    setup_local_tracing, setup_tracing, AppError, AppResult, Broker, BulkProduceResult,
    ConsumeConfig, ConsumeResult, GuaranteeConfig, LabConfig, ProduceConfig, ProduceResult,
    RegisterResult, RemoveResult, TopicConfig, TopicLifecycle, TopicState, TopicStatus,
};
pub use stats::StatsSnapshot;
