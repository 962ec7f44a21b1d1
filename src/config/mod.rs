//! Configuration loading and layering.
//!
//! Handles `.sectioner.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{
    CacheConfig, Config, ConfigError, FetchConfig, RemoteConfig, SectionConfig, TraversalConfig,
};
