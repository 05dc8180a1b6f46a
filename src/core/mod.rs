//! Core types shared across rbsync.

mod config;

pub use config::{
    Config, ConfigError, RemoteConfig, RemoteOverrides, RemoteSettings, DEFAULT_TIMEOUT_SECS,
};
