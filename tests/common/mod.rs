#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

use shoecart_rs::repositories::{FileCartRepository, HttpCatalogRepository};

pub const CART_KEY: &str = "@RocketShoes:cart";

#[derive(Default)]
struct CatalogState {
    stock: HashMap<u64, u32>,
    failing_products: HashSet<u64>,
    product_requests: usize,
}

type SharedCatalog = Arc<Mutex<CatalogState>>;

fn product_json(id: u64) -> serde_json::Value {
    let (title, price) = match id {
        1 => ("Tênis de Caminhada Leve Confortável", 179.9),
        2 => ("Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9),
        3 => ("Tênis Adidas Duramo Lite 2.0", 219.9),
        _ => ("Tênis Genérico", 99.9),
    };

    json!({
        "id": id,
        "title": title,
        "price": price,
        "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{}.jpg", id)
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

async fn mock_get_stock(
    Path(id): Path<u64>,
    Extension(state): Extension<SharedCatalog>,
) -> Response {
    let state = state.lock().unwrap();
    match state.stock.get(&id) {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => not_found(),
    }
}

async fn mock_get_product(
    Path(id): Path<u64>,
    Extension(state): Extension<SharedCatalog>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.product_requests += 1;

    if state.failing_products.contains(&id) || !state.stock.contains_key(&id) {
        return not_found();
    }
    Json(product_json(id)).into_response()
}

fn create_mock_app(state: SharedCatalog) -> Router {
    Router::new()
        .route("/stock/:id", get(mock_get_stock))
        .route("/products/:id", get(mock_get_product))
        .layer(Extension(state))
}

/// Mock storefront catalog plus a scratch directory for the storage file
pub struct TestEnvironment {
    pub base_url: String,
    pub dir: TempDir,
    state: SharedCatalog,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let state = SharedCatalog::default();
        {
            let mut catalog = state.lock().unwrap();
            catalog.stock.insert(1, 3);
            catalog.stock.insert(2, 5);
            catalog.stock.insert(3, 2);
        }

        let app = create_mock_app(state.clone());

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            base_url,
            dir: TempDir::new().expect("Failed to create temp dir"),
            state,
        }
    }

    pub fn set_stock(&self, id: u64, amount: u32) {
        self.state.lock().unwrap().stock.insert(id, amount);
    }

    /// Keep the stock endpoint working but make the product lookup 404
    pub fn fail_product(&self, id: u64) {
        self.state.lock().unwrap().failing_products.insert(id);
    }

    pub fn product_requests(&self) -> usize {
        self.state.lock().unwrap().product_requests
    }

    pub fn catalog(&self) -> HttpCatalogRepository {
        HttpCatalogRepository::with_client(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to build client"),
            &self.base_url,
        )
    }

    pub fn storage_path(&self) -> std::path::PathBuf {
        self.dir.path().join("local-storage.json")
    }

    pub fn cart_repository(&self) -> FileCartRepository {
        FileCartRepository::new(self.storage_path(), CART_KEY)
    }

    /// Cart JSON currently stored in the local-storage file
    pub fn stored_cart(&self) -> Option<serde_json::Value> {
        let text = std::fs::read_to_string(self.storage_path()).ok()?;
        let slots: HashMap<String, String> = serde_json::from_str(&text).unwrap();
        slots
            .get(CART_KEY)
            .map(|value| serde_json::from_str(value).unwrap())
    }
}
