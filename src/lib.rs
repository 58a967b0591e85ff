/// Octavia - stage metadata cache
///
/// Read-through cache and JSON API in front of a third-party platform that
/// publishes user-generated stages, with author lookup, a key-value bonus
/// table and a scheduled upstream health probe.

pub mod api;
pub mod author;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod rate_limit;
pub mod server;
pub mod stage;
pub mod upstream;
