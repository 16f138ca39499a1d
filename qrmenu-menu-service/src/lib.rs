use std::time::Duration;

pub mod config;
pub mod dashboard;
pub mod menu;
pub mod models;
pub mod publication;
pub mod registry;
pub mod renderer;
pub mod schema;
pub mod service;
pub mod storage;
pub mod store;
pub mod templates;

/// Upper bound for a single store or storage call.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(10);
