use thiserror::Error;

/// Cache misses are not errors; this covers the few ways configuring or
/// operating a cache can still fail outright.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,
}
