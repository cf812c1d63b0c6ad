//! # edugen Common Library
//!
//! Shared code for the edugen services:
//! - Configuration file loading (`TomlConfig`)
//! - Pipeline event types and the broadcast `EventBus`
//! - SSE stream helpers
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
