#[cfg(feature = "redis")]
pub mod redis;
#[cfg(feature = "mongodb")]
pub mod mongo;
