pub mod config;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use config::{Config, ConfigError};
pub use models::{Cart, CartUpdate, LineItem, Product, ProductId, Stock, UpdateProductAmount};
pub use observability::{init_observability, Metrics};
pub use services::{CartStore, LoadOptions, Notifier};
