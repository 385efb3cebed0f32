use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// A product in the cart together with the selected quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

/// Ordered list of line items, at most one per product
///
/// Serialized as a bare JSON array, which is also the format kept in the
/// persistence slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

/// Request model for setting the quantity of a cart item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Outcome of a cart mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// A new cart was published and written to the persistence slot
    Changed,
    /// The cart is exactly as it was before the call
    Unchanged,
}

impl LineItem {
    pub fn new(mut product: Product, amount: u32) -> Self {
        // The line item's own amount is authoritative
        product.extra.remove("amount");
        Self { product, amount }
    }

    pub fn id(&self) -> ProductId {
        self.product.id
    }

    /// Get the total price for this line (price * amount)
    pub fn total_price(&self) -> Decimal {
        self.product.price * Decimal::from(self.amount)
    }
}

impl Cart {
    /// Create an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from items without checking invariants
    ///
    /// Callers loading untrusted data should run `Validate::validate` on the result.
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    pub fn find(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.find(product_id).is_some()
    }

    /// Quantity currently selected for a product, 0 if it is not in the cart
    pub fn amount_of(&self, product_id: ProductId) -> u32 {
        self.find(product_id).map(|item| item.amount).unwrap_or(0)
    }

    /// Set the quantity of an existing item in place
    ///
    /// Returns false when the product is not in the cart.
    pub fn set_amount(&mut self, product_id: ProductId, amount: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id() == product_id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Append a new item at the end of the cart
    ///
    /// Returns false, leaving the cart untouched, when the product is already present.
    pub fn push(&mut self, item: LineItem) -> bool {
        if self.contains(item.id()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove an item, keeping the order of the others
    pub fn remove(&mut self, product_id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id() == product_id)?;
        Some(self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the total number of units in the cart
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Get the total price of all items in the cart
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::total_price).sum()
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
