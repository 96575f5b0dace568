//! Type definitions for keystash configuration

mod store_config;

pub use store_config::*;
