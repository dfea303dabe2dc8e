mod client;

pub use client::RedisStore;
