//! Infrastructure layer - Storage, caching and runtime services

pub mod cache;
pub mod logging;
pub mod observability;
pub mod storage;
pub mod temp_key;
