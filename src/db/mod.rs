pub mod cache;
pub mod file;
pub mod memory;
pub mod redis;

mod macros;

pub use self::cache::ttl;
pub use self::cache::CacheKey;
pub use self::cache::CacheRecord;
pub use self::cache::CacheStore;
pub use self::cache::ResponseCache;
pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::create_redis_client;
pub use self::redis::CacheWriterHandle;
pub use self::redis::RedisStore;
