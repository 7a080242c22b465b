//! Storage layer
//!
//! Redis is the default cache backend; DashMap (in-memory) can replace it
//! for single-node setups and tests.

pub mod memory;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
