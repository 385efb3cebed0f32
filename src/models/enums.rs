use std::fmt;

/// Mutations exposed by the cart store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    AddProduct,
    RemoveProduct,
    UpdateProductAmount,
}

impl CartOperation {
    /// Label used for metrics and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            CartOperation::AddProduct => "add_product",
            CartOperation::RemoveProduct => "remove_product",
            CartOperation::UpdateProductAmount => "update_product_amount",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog endpoints queried by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogEndpoint {
    Stock,
    Products,
}

impl CatalogEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogEndpoint::Stock => "stock",
            CatalogEndpoint::Products => "products",
        }
    }
}

impl fmt::Display for CatalogEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
