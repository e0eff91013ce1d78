pub mod postgres;
pub mod profiles;
pub mod redis;

pub use postgres::create_pool;
pub use profiles::{InMemoryProfileStore, PgProfileStore, UserProfileStore, MAX_FAVORITE_AUTHORS};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
