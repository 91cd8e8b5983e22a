mod engine;

pub use engine::consume_group;
