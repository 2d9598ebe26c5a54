// Credits and subscriptions on top of the payment provider client
use chrono::{DateTime, Duration, Utc};
use lelabs_api::{BillingClient, PriceKind, Product};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;

/// Products split by how they are paid for, each cheapest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductListing {
    /// One-time credit packs
    pub products: Vec<Product>,
    /// Recurring plans
    pub subscriptions: Vec<Product>,
}

impl ProductListing {
    pub fn from_products(all: Vec<Product>) -> Self {
        let (mut products, rest): (Vec<Product>, Vec<Product>) = all
            .into_iter()
            .partition(|p| p.price.kind == PriceKind::OneTime);
        let mut subscriptions: Vec<Product> = rest
            .into_iter()
            .filter(|p| p.price.kind == PriceKind::Recurring)
            .collect();

        products.sort_by_key(|p| p.price.amount);
        subscriptions.sort_by_key(|p| p.price.amount);
        Self {
            products,
            subscriptions,
        }
    }
}

struct CachedListing {
    listing: ProductListing,
    fetched_at: DateTime<Utc>,
}

/// Product catalogue with a staleness window, plus checkout
pub struct BillingService {
    client: BillingClient,
    clock: Arc<dyn Clock>,
    access_token: Option<String>,
    stale_after: Duration,
    cache: Option<CachedListing>,
}

impl BillingService {
    pub fn new(client: BillingClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            access_token: None,
            stale_after: Duration::minutes(5),
            cache: None,
        }
    }

    /// Session token sent as a bearer credential on checkout
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }

    fn is_fresh(&self) -> bool {
        self.cache
            .as_ref()
            .map(|c| self.clock.now() - c.fetched_at < self.stale_after)
            .unwrap_or(false)
    }

    /// Cached listing, refetched once it has gone stale
    pub async fn listing(&mut self) -> crate::Result<&ProductListing> {
        if self.is_fresh() {
            debug!("Using cached product listing");
        } else {
            let all = self.client.list_products().await?;
            let listing = ProductListing::from_products(all);
            info!(
                "Product listing refreshed: {} packs, {} plans",
                listing.products.len(),
                listing.subscriptions.len()
            );
            self.cache = Some(CachedListing {
                listing,
                fetched_at: self.clock.now(),
            });
        }

        self.cache
            .as_ref()
            .map(|c| &c.listing)
            .ok_or_else(|| crate::Error::NotFound("product listing".to_string()))
    }

    pub async fn products(&mut self) -> crate::Result<&[Product]> {
        Ok(&self.listing().await?.products)
    }

    pub async fn subscriptions(&mut self) -> crate::Result<&[Product]> {
        Ok(&self.listing().await?.subscriptions)
    }

    /// Look a credit pack up in the cached listing
    pub fn find_product_by_id(&self, product_id: &str) -> Option<&Product> {
        self.cache
            .as_ref()
            .and_then(|c| c.listing.products.iter().find(|p| p.id == product_id))
    }

    /// Drop the cached listing and fetch it again
    pub async fn refresh_products(&mut self) -> crate::Result<&ProductListing> {
        self.cache = None;
        self.listing().await
    }

    /// Create a checkout session and return the URL to send the user to
    pub async fn checkout(&self, product_id: &str) -> crate::Result<String> {
        let session = self
            .client
            .create_checkout_session(product_id, self.access_token.as_deref())
            .await?;
        Ok(session.session_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use lelabs_api::RetryConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn product(id: &str, amount: i64, kind: &str) -> serde_json::Value {
        json!({
            "id": id,
            "credits": amount / 10,
            "price": { "id": format!("price_{}", id), "amount": amount, "currency": "eur", "type": kind },
            "metadata": { "bonus": 0, "tokenReceive": 0, "popular": false }
        })
    }

    fn catalogue() -> serde_json::Value {
        json!({
            "products": [
                product("big", 5000, "one_time"),
                product("pro", 2000, "recurring"),
                product("small", 500, "one_time"),
                product("lite", 900, "recurring"),
                product("odd", 100, "metered"),
            ]
        })
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn service(server: &MockServer, clock: Arc<ManualClock>) -> BillingService {
        let client = BillingClient::new(
            format!("{}/products", server.uri()),
            format!("{}/checkout", server.uri()),
        )
        .unwrap()
        .with_retry_config(RetryConfig::none());
        BillingService::new(client, clock)
    }

    #[tokio::test]
    async fn test_listing_is_partitioned_and_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalogue()))
            .mount(&server)
            .await;

        let mut billing = service(&server, Arc::new(ManualClock::new(t0())));
        let listing = billing.listing().await.unwrap();

        let packs: Vec<_> = listing.products.iter().map(|p| p.id.as_str()).collect();
        let plans: Vec<_> = listing.subscriptions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(packs, vec!["small", "big"]);
        assert_eq!(plans, vec!["lite", "pro"]);

        assert!(billing.find_product_by_id("big").is_some());
        assert!(billing.find_product_by_id("pro").is_none());
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_stale() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalogue()))
            .expect(2)
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(t0()));
        let mut billing = service(&server, clock.clone());

        billing.products().await.unwrap();
        clock.advance(Duration::minutes(4));
        billing.subscriptions().await.unwrap();
        clock.advance(Duration::minutes(2));
        billing.products().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalogue()))
            .expect(2)
            .mount(&server)
            .await;

        let mut billing = service(&server, Arc::new(ManualClock::new(t0())));
        billing.products().await.unwrap();
        billing.refresh_products().await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout"))
            .and(header("authorization", "Bearer tok_123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "sessionUrl": "https://pay.example/cs_1" })),
            )
            .mount(&server)
            .await;

        let billing = service(&server, Arc::new(ManualClock::new(t0())))
            .with_access_token(Some("tok_123".to_string()));
        assert!(billing.is_signed_in());
        assert_eq!(billing.checkout("small").await.unwrap(), "https://pay.example/cs_1");
    }

    #[tokio::test]
    async fn test_checkout_error_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "Unknown product" })),
            )
            .mount(&server)
            .await;

        let billing = service(&server, Arc::new(ManualClock::new(t0())));
        let err = billing.checkout("nope").await.unwrap_err();
        assert!(err.to_string().contains("Unknown product"));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = BillingClient::new("http://localhost/p", "http://localhost/c").unwrap();
        let billing = BillingService::new(client, Arc::new(ManualClock::new(t0())))
            .with_access_token(Some("  ".to_string()));
        assert!(!billing.is_signed_in());
    }
}
