//! Notification token store backends

pub mod memory;
pub mod upstash;

pub use memory::MemoryStore;
pub use upstash::{UpstashConfig, UpstashStore};
