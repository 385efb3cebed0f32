use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shoecart_rs::models::{CatalogError, CatalogResult, Validate};
use shoecart_rs::repositories::{CartRepository, CatalogRepository, InMemoryCartRepository};
use shoecart_rs::services::RecordingNotifier;
use shoecart_rs::{CartStore, CartUpdate, Product, ProductId, Stock, UpdateProductAmount};

/// Fixed-stock catalog; ids without stock behave like a 404
struct StubCatalog {
    stock: HashMap<ProductId, u32>,
}

#[async_trait]
impl CatalogRepository for StubCatalog {
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock> {
        match self.stock.get(&product_id) {
            Some(&amount) => Ok(Stock::new(product_id, amount)),
            None => Err(CatalogError::Status {
                status: 404,
                url: format!("http://catalog/stock/{}", product_id),
            }),
        }
    }

    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product> {
        Ok(Product {
            id: product_id,
            title: format!("Tênis {}", product_id),
            price: Decimal::new(9990 + product_id as i64, 2),
            image: format!("tenis{}.jpg", product_id),
            extra: Default::default(),
        })
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(ProductId),
    Remove(ProductId),
    Update(ProductId, i64),
}

prop_compose! {
    fn arb_stock()(amounts in prop::collection::vec(0u32..6, 4)) -> HashMap<ProductId, u32> {
        // Product 5 is never in the catalog
        amounts
            .into_iter()
            .enumerate()
            .map(|(i, amount)| (i as ProductId + 1, amount))
            .collect()
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u64..=5).prop_map(Op::Add),
        1 => (1u64..=5).prop_map(Op::Remove),
        2 => ((1u64..=5), -2i64..8).prop_map(|(id, amount)| Op::Update(id, amount)),
    ]
}

/// Reference model of the cart as ordered `(id, amount)` pairs
fn apply_model(model: &mut Vec<(ProductId, u32)>, stock: &HashMap<ProductId, u32>, op: &Op) {
    match *op {
        Op::Add(id) => {
            let Some(&available) = stock.get(&id) else {
                return;
            };
            match model.iter_mut().find(|(item, _)| *item == id) {
                Some((_, amount)) if *amount < available => *amount += 1,
                Some(_) => {}
                None if available >= 1 => model.push((id, 1)),
                None => {}
            }
        }
        Op::Remove(id) => model.retain(|(item, _)| *item != id),
        Op::Update(id, amount) => {
            if amount <= 0 {
                return;
            }
            let Some(&available) = stock.get(&id) else {
                return;
            };
            if amount as u32 > available {
                return;
            }
            if let Some((_, current)) = model.iter_mut().find(|(item, _)| *item == id) {
                *current = amount as u32;
            }
        }
    }
}

async fn run(store: &CartStore, op: &Op) -> CartUpdate {
    match *op {
        Op::Add(id) => store.add_product(id).await,
        Op::Remove(id) => store.remove_product(id).await,
        Op::Update(id, amount) => {
            store
                .update_product_amount(UpdateProductAmount {
                    product_id: id,
                    amount,
                })
                .await
        }
    }
}

proptest! {
    #[test]
    fn test_operation_sequences_match_model(
        stock in arb_stock(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        tokio_test::block_on(async {
            let repository = Arc::new(InMemoryCartRepository::new());
            let store = CartStore::new(
                Default::default(),
                Arc::new(StubCatalog { stock: stock.clone() }),
                repository.clone(),
                Arc::new(RecordingNotifier::new()),
            );
            let mut model = Vec::new();

            for op in &ops {
                let before = store.cart();
                let writes_before = repository.write_count();

                let update = run(&store, op).await;
                apply_model(&mut model, &stock, op);

                let after = store.cart();
                let actual: Vec<_> = after.iter().map(|item| (item.id(), item.amount)).collect();
                prop_assert_eq!(&actual, &model);

                // Uniqueness and minimum amount hold after every step
                prop_assert!(after.validate().is_ok());
                let ids: HashSet<_> = after.iter().map(|item| item.id()).collect();
                prop_assert_eq!(ids.len(), after.len());

                for item in after.iter() {
                    prop_assert!(item.amount <= stock[&item.id()]);
                }

                match update {
                    CartUpdate::Changed => {
                        prop_assert_ne!(&*before, &*after);
                        prop_assert_eq!(repository.write_count(), writes_before + 1);
                    }
                    CartUpdate::Unchanged => {
                        prop_assert_eq!(&*before, &*after);
                        prop_assert_eq!(repository.write_count(), writes_before);
                    }
                }

                if repository.write_count() > 0 {
                    let stored = repository.load_cart().await.unwrap();
                    prop_assert_eq!(stored.as_ref(), Some(&*after));
                }
            }

            Ok(())
        })?;
    }

    #[test]
    fn test_non_positive_updates_never_notify(
        amount in i64::MIN..=0,
        id in 1u64..=5,
    ) {
        tokio_test::block_on(async {
            let notifier = Arc::new(RecordingNotifier::new());
            let repository = Arc::new(InMemoryCartRepository::new());
            let store = CartStore::new(
                Default::default(),
                Arc::new(StubCatalog { stock: HashMap::new() }),
                repository.clone(),
                notifier.clone(),
            );

            let update = store
                .update_product_amount(UpdateProductAmount { product_id: id, amount })
                .await;

            prop_assert_eq!(update, CartUpdate::Unchanged);
            prop_assert!(notifier.messages().is_empty());
            prop_assert_eq!(repository.write_count(), 0);
            Ok(())
        })?;
    }
}
