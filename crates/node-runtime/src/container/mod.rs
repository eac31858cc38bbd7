//! # Swap Container
//!
//! Configuration sections and the container that owns every subsystem
//! instance.

pub mod config;
pub mod subsystems;

pub use config::{
    BackendConfig, ConfigError, CoordinatorConfig, EscrowConfig, NodeConfig, NotifierConfig,
};
pub use subsystems::{ContainerError, SwapContainer};
