mod partition_store;
mod record;
mod router;

pub use partition_store::PartitionStore;
pub use record::{ConsumedRecord, Message};
pub use router::Router;
