use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn, Instrument};

use crate::config::CatalogConfig;
use crate::models::{CatalogEndpoint, CatalogError, CatalogResult, Product, ProductId, Stock};
use crate::observability::Metrics;

/// Trait defining the read-only interface to the product catalog
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch the current stock snapshot for a product
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock>;

    /// Fetch the full product record
    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product>;
}

/// Catalog backed by the storefront JSON API (`/stock/{id}`, `/products/{id}`)
pub struct HttpCatalogRepository {
    client: reqwest::Client,
    base_url: String,
    metrics: Option<Arc<Metrics>>,
}

impl HttpCatalogRepository {
    /// Create a new HTTP catalog repository
    pub fn new(config: &CatalogConfig) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_client(client, &config.catalog_base_url))
    }

    /// Create a repository around an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: CatalogEndpoint, product_id: ProductId) -> String {
        format!("{}/{}/{}", self.base_url, endpoint.as_str(), product_id)
    }

    /// Create a client span carrying the HTTP semantic attributes
    fn create_catalog_span(&self, endpoint: CatalogEndpoint, url: &str) -> tracing::Span {
        tracing::info_span!(
            "Catalog",
            "otel.kind" = "client",
            "otel.name" = %format!("GET /{}/{{id}}", endpoint.as_str()),
            "http.method" = "GET",
            "http.url" = %url,
            "http.status_code" = tracing::field::Empty,
            "catalog.endpoint" = endpoint.as_str(),
        )
    }

    async fn send<T: DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        debug!("Requesting {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: CatalogEndpoint,
        product_id: ProductId,
    ) -> CatalogResult<T> {
        let url = self.url(endpoint, product_id);
        let span = self.create_catalog_span(endpoint, &url);
        let start = Instant::now();

        let result = self.send::<T>(&url).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_request(
                endpoint,
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }

        if let Err(e) = &result {
            warn!(endpoint = %endpoint, product_id, error = %e, "Catalog request failed");
        }

        result
    }
}

#[async_trait]
impl CatalogRepository for HttpCatalogRepository {
    #[instrument(skip(self))]
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock> {
        self.fetch(CatalogEndpoint::Stock, product_id).await
    }

    #[instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product> {
        self.fetch(CatalogEndpoint::Products, product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn repository(server: &MockServer) -> HttpCatalogRepository {
        let config = CatalogConfig {
            catalog_base_url: format!("{}/", server.uri()),
            catalog_timeout_seconds: 5,
        };
        HttpCatalogRepository::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_stock_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "amount": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let stock = repository(&server).await.get_stock(1).await.unwrap();

        assert_eq!(stock, Stock::new(1, 3));
    }

    #[tokio::test]
    async fn test_get_product_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2,
                "title": "Tênis VR Caminhada Confortável Detalhes Couro Masculino",
                "price": 139.9,
                "image": "https://example.com/shoe2.jpg"
            })))
            .mount(&server)
            .await;

        let product = repository(&server).await.get_product(2).await.unwrap();

        assert_eq!(product.id, 2);
        assert_eq!(product.price, dec!(139.9));
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = repository(&server).await.get_stock(99).await;

        match result {
            Err(CatalogError::Status { status, url }) => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/stock/99"));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = repository(&server).await.get_stock(1).await;

        assert!(matches!(result, Err(CatalogError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let client = reqwest::Client::new();
        let repository = HttpCatalogRepository::with_client(client, "http://127.0.0.1:1");

        let result = repository.get_stock(1).await;

        assert!(matches!(result, Err(CatalogError::Http(_))));
    }

    #[tokio::test]
    async fn test_requests_are_counted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let repository = repository(&server).await.with_metrics(metrics.clone());

        let _ = repository.get_stock(1).await;

        let errors = metrics
            .catalog_requests_total
            .with_label_values(&["stock", "error"])
            .get();
        assert_eq!(errors, 1.0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let repository =
            HttpCatalogRepository::with_client(reqwest::Client::new(), "http://localhost:3333/");

        assert_eq!(repository.base_url(), "http://localhost:3333");
        assert_eq!(
            repository.url(CatalogEndpoint::Products, 4),
            "http://localhost:3333/products/4"
        );
    }
}
