use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use super::Notifier;
use crate::config::StorageConfig;
use crate::models::{
    Cart, CartError, CartOperation, CartResult, CartUpdate, CatalogError, LineItem, ProductId,
    Stock, StorageError, StorageResult, UpdateProductAmount,
};
use crate::observability::{Metrics, OperationStatus};
use crate::repositories::{CartRepository, CatalogRepository};

/// How the store treats the persistence slot on startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Start from an empty cart instead of failing when the slot is malformed
    pub reset_on_corrupt: bool,
}

impl From<&StorageConfig> for LoadOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            reset_on_corrupt: config.reset_on_corrupt,
        }
    }
}

/// Whether moving from `previous` to `next` needs a publish and a storage write
pub fn should_persist(previous: &Cart, next: &Cart) -> bool {
    previous != next
}

/// Session-scoped cart state with stock-checked mutations
///
/// Every mutation holds the cart lock from the first read until the new cart
/// is published, catalog calls included, so concurrent callers observe the
/// operations one after another. Failures never reach the caller: each one
/// produces exactly one notification and leaves the cart untouched.
pub struct CartStore {
    current: Mutex<Arc<Cart>>,
    publisher: watch::Sender<Arc<Cart>>,
    catalog: Arc<dyn CatalogRepository>,
    repository: Arc<dyn CartRepository>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<Metrics>>,
}

impl CartStore {
    /// Create a store around an explicit initial cart
    pub fn new(
        cart: Cart,
        catalog: Arc<dyn CatalogRepository>,
        repository: Arc<dyn CartRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cart = Arc::new(cart);
        let (publisher, _) = watch::channel(Arc::clone(&cart));

        Self {
            current: Mutex::new(cart),
            publisher,
            catalog,
            repository,
            notifier,
            metrics: None,
        }
    }

    /// Create a store from the cart held in the persistence slot
    #[instrument(skip_all, fields(reset_on_corrupt = options.reset_on_corrupt))]
    pub async fn load(
        catalog: Arc<dyn CatalogRepository>,
        repository: Arc<dyn CartRepository>,
        notifier: Arc<dyn Notifier>,
        options: LoadOptions,
    ) -> StorageResult<Self> {
        let cart = match repository.load_cart().await {
            Ok(Some(cart)) => {
                info!("Restored cart with {} items", cart.len());
                cart
            }
            Ok(None) => {
                info!("No stored cart, starting empty");
                Cart::new()
            }
            Err(StorageError::CorruptState { key, message }) if options.reset_on_corrupt => {
                warn!(key = %key, reason = %message, "Stored cart is corrupt, starting empty");
                Cart::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to load stored cart");
                return Err(e);
            }
        };

        Ok(Self::new(cart, catalog, repository, notifier))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_line_items(self.cart().len());
        self.metrics = Some(metrics);
        self
    }

    /// Current published cart
    pub fn cart(&self) -> Arc<Cart> {
        self.publisher.borrow().clone()
    }

    /// Receiver that observes every cart published from now on
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.publisher.subscribe()
    }

    /// Add one unit of a product, appending it when it is not in the cart yet
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> CartUpdate {
        let mut current = self.current.lock().await;
        let result = self.try_add_product(&current, product_id).await;
        self.complete(CartOperation::AddProduct, &mut current, result)
            .await
    }

    /// Remove a product from the cart
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> CartUpdate {
        let mut current = self.current.lock().await;
        let result = try_remove_product(&current, product_id);
        self.complete(CartOperation::RemoveProduct, &mut current, result)
            .await
    }

    /// Set the quantity of a product already in the cart
    ///
    /// Non-positive amounts are ignored without any notification.
    #[instrument(skip(self), fields(product_id = request.product_id, amount = request.amount))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> CartUpdate {
        if request.amount <= 0 {
            debug!("Ignoring non-positive amount");
            self.record(CartOperation::UpdateProductAmount, OperationStatus::Unchanged);
            return CartUpdate::Unchanged;
        }
        let mut current = self.current.lock().await;
        let result = self
            .try_update_product_amount(&current, request.product_id, request.amount)
            .await;
        self.complete(CartOperation::UpdateProductAmount, &mut current, result)
            .await
    }

    async fn try_add_product(&self, cart: &Cart, product_id: ProductId) -> CartResult<Cart> {
        let target = cart.amount_of(product_id).saturating_add(1);

        let stock = self.catalog.get_stock(product_id).await?;
        ensure_available(product_id, target, &stock)?;

        let mut next = cart.clone();
        if !next.set_amount(product_id, target) {
            let product = self.catalog.get_product(product_id).await?;
            if product.id != product_id {
                return Err(CatalogError::ProductMismatch {
                    requested: product_id,
                    returned: product.id,
                }
                .into());
            }
            next.push(LineItem::new(product, target));
        }

        Ok(next)
    }

    async fn try_update_product_amount(
        &self,
        cart: &Cart,
        product_id: ProductId,
        requested: i64,
    ) -> CartResult<Cart> {
        let stock = self.catalog.get_stock(product_id).await?;
        // No stock snapshot can cover an amount beyond u32
        let amount = u32::try_from(requested).map_err(|_| CartError::OutOfStock {
            product_id,
            requested: requested.unsigned_abs(),
            available: stock.amount,
        })?;
        ensure_available(product_id, amount, &stock)?;

        let mut next = cart.clone();
        if !next.set_amount(product_id, amount) {
            return Err(CartError::NotFound { product_id });
        }

        Ok(next)
    }

    async fn complete(
        &self,
        operation: CartOperation,
        current: &mut Arc<Cart>,
        result: CartResult<Cart>,
    ) -> CartUpdate {
        match result {
            Ok(next) => self.commit(operation, current, next).await,
            Err(e) => self.reject(operation, e),
        }
    }

    async fn commit(
        &self,
        operation: CartOperation,
        current: &mut Arc<Cart>,
        next: Cart,
    ) -> CartUpdate {
        if !should_persist(&**current, &next) {
            debug!(operation = %operation, "Cart unchanged");
            self.record(operation, OperationStatus::Unchanged);
            return CartUpdate::Unchanged;
        }

        let next = Arc::new(next);
        *current = Arc::clone(&next);
        self.publisher.send_replace(Arc::clone(&next));
        self.persist(&next).await;

        if let Some(metrics) = &self.metrics {
            metrics.set_line_items(next.len());
        }
        self.record(operation, OperationStatus::Changed);

        info!(operation = %operation, items = next.len(), "Cart updated");
        CartUpdate::Changed
    }

    fn reject(&self, operation: CartOperation, error: CartError) -> CartUpdate {
        warn!(operation = %operation, error = %error, "Cart operation rejected");
        self.notifier.notify_error(error.notification(operation));
        self.record(operation, OperationStatus::Rejected);
        CartUpdate::Unchanged
    }

    async fn persist(&self, cart: &Cart) {
        let result = self.repository.save_cart(cart).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_storage_write(result.is_ok());
        }

        if let Err(e) = result {
            error!(error = %e, "Failed to persist cart");
        }
    }

    fn record(&self, operation: CartOperation, status: OperationStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cart_operation(operation, status);
        }
    }
}

fn try_remove_product(cart: &Cart, product_id: ProductId) -> CartResult<Cart> {
    let mut next = cart.clone();
    match next.remove(product_id) {
        Some(_) => Ok(next),
        None => Err(CartError::NotFound { product_id }),
    }
}

fn ensure_available(product_id: ProductId, requested: u32, stock: &Stock) -> CartResult<()> {
    if !stock.covers(requested) {
        return Err(CartError::OutOfStock {
            product_id,
            requested: u64::from(requested),
            available: stock.amount,
        });
    }
    Ok(())
}
