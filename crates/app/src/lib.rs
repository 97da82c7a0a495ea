//! Application layer: the inventory facade, its configuration and error surface.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use dashboard::{DashboardStats, MovementView};
pub use error::{AppError, AppResult};
pub use service::InventoryService;
