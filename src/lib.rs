//! Sutro Pool Bridge Library
//!
//! This library polls the mySutro cloud API for the latest pool water-quality
//! reading, caches it, and exposes the individual measurements by key.

pub mod config;
pub mod config_flow;
pub mod coordinator;
pub mod error;
pub mod field;
pub mod gateway;
pub mod reading;
pub mod sutro_api;

// Re-export commonly used types for easier access
pub use config::{BridgeSettings, ConfigEntry, ConfigStore, MemoryConfigStore};
pub use coordinator::PollingCoordinator;
pub use error::SutroError;
pub use field::{FieldAdapter, FieldBounds, FieldValue};
pub use gateway::SutroGateway;
pub use reading::Reading;
pub use sutro_api::SutroAPI;
