pub mod api;
pub mod config;
pub mod constants;
pub mod content;
pub mod domain;
pub mod enrollment;
pub mod error;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod storage;
pub mod throttle;
