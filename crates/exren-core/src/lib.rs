pub mod config;
pub mod logging;

pub mod cache;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod filename;
pub mod protocol;
pub mod record;
pub mod rehydrate;
pub mod retry;
pub mod service;
pub mod store;
