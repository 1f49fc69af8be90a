pub mod memory;
pub mod redis;

pub use memory::MemoryCounterCache;
pub use redis::RedisCounterCache;
