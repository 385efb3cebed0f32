use thiserror::Error;

use super::{CartOperation, ProductId};

/// Message shown when adding a product fails for any reason other than stock
pub const ADD_FAILED_MESSAGE: &str = "Erro na adição do produto";

/// Message shown when removing a product that is not in the cart
pub const REMOVE_FAILED_MESSAGE: &str = "Erro na remoção do produto";

/// Message shown when a quantity update fails for any reason other than stock
pub const UPDATE_FAILED_MESSAGE: &str = "Erro na alteração de quantidade do produto";

/// Message shown when the requested quantity exceeds the available stock
pub const OUT_OF_STOCK_MESSAGE: &str = "Quantidade solicitada fora de estoque";

/// Errors raised while validating a cart mutation
///
/// These never leave the store: each one is turned into a single user-facing
/// notification at the operation boundary.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Insufficient stock for product {product_id}: requested={requested}, available={available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    #[error("Product {product_id} is not in the cart")]
    NotFound { product_id: ProductId },
}

impl CartError {
    /// User-facing text for this error raised by `operation`
    pub fn notification(&self, operation: CartOperation) -> &'static str {
        match self {
            CartError::OutOfStock { .. } => OUT_OF_STOCK_MESSAGE,
            CartError::Catalog { .. } | CartError::NotFound { .. } => match operation {
                CartOperation::AddProduct => ADD_FAILED_MESSAGE,
                CartOperation::RemoveProduct => REMOVE_FAILED_MESSAGE,
                CartOperation::UpdateProductAmount => UPDATE_FAILED_MESSAGE,
            },
        }
    }
}

/// Errors from the remote catalog API
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog responded with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode catalog response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Catalog returned product {returned} for requested product {requested}")]
    ProductMismatch {
        requested: ProductId,
        returned: ProductId,
    },
}

/// Errors from the persistence slot
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Stored cart under {key} is corrupt: {message}")]
    CorruptState { key: String, message: String },
}

/// Validation errors for data read back from storage
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duplicate product in cart: {product_id}")]
    DuplicateProduct { product_id: ProductId },

    #[error("Value out of range: {field}, min={min}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        value: String,
    },
}

/// Result type alias for cart mutations
pub type CartResult<T> = Result<T, CartError>;

/// Result type alias for catalog lookups
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
