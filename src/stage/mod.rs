/// Stage domain: regions, canonical shape and the read-through cache
pub mod inflight;
pub mod models;
pub mod region;
pub mod service;

pub use models::*;
pub use region::{Region, RegionGroup};
pub use service::{StageService, DEFAULT_TTL};
