// Repositories module - data access layer

pub mod cart_repository;
pub mod catalog_repository;

pub use cart_repository::{CartRepository, FileCartRepository, InMemoryCartRepository};
pub use catalog_repository::{CatalogRepository, HttpCatalogRepository};
