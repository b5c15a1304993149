//! Shopify Admin REST API client.
//!
//! Pulls cash-on-delivery orders and abandoned checkouts, and writes
//! corrected contact details and outcome tags back to orders.

mod payload;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, info};

use crate::order::{
    domain::{ContactEdit, ExternalOrderId, SourceRecord, SyncTag},
    ports::{SourceClient, SourceClientError, SourceClientResult},
};
use payload::{CheckoutList, OrderList, ShopifyDocument};

/// Admin API version the client targets.
pub const API_VERSION: &str = "2024-01";

const PAGE_LIMIT: &str = "250";

/// [`SourceClient`] for one Shopify store.
#[derive(Debug, Clone)]
pub struct ShopifyClient {
    client: reqwest::Client,
    shop_name: String,
    base_url: String,
    timeout: Duration,
}

impl ShopifyClient {
    /// Creates a client for `{shop_name}.myshopify.com`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceClientError::Http`] when the token is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(
        shop_name: impl Into<String>,
        access_token: &str,
        timeout: Duration,
    ) -> SourceClientResult<Self> {
        let shop = shop_name.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Shopify-Access-Token",
            HeaderValue::from_str(access_token).map_err(SourceClientError::http)?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(SourceClientError::http)?;

        Ok(Self {
            client,
            base_url: format!("https://{shop}.myshopify.com/admin/api/{API_VERSION}"),
            shop_name: shop,
            timeout,
        })
    }

    /// Overrides the API base URL, for tests against a local server.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the shop subdomain.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.shop_name
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> SourceClientResult<reqwest::Url> {
        reqwest::Url::parse_with_params(&format!("{}{path}", self.base_url), params)
            .map_err(SourceClientError::http)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: reqwest::Url,
    ) -> SourceClientResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let body = self.checked_body(response).await?;
        serde_json::from_str(&body).map_err(|err| SourceClientError::Decode(err.to_string()))
    }

    async fn put_order(&self, order_id: u64, body: &serde_json::Value) -> SourceClientResult<()> {
        let url = self.url(&format!("/orders/{order_id}.json"), &[])?;
        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        self.checked_body(response).await?;
        Ok(())
    }

    fn transport_error(&self, err: reqwest::Error) -> SourceClientError {
        if err.is_timeout() {
            SourceClientError::Timeout(self.timeout.as_secs())
        } else {
            SourceClientError::http(err)
        }
    }

    async fn checked_body(&self, response: reqwest::Response) -> SourceClientResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        if status.is_success() {
            return Ok(body);
        }
        Err(SourceClientError::Status {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }

    /// Finds the order named `external_id`, such as `#1001`.
    async fn lookup_order(&self, external_id: &ExternalOrderId) -> SourceClientResult<ShopifyDocument> {
        let url = self.url(
            "/orders.json",
            &[
                ("name", external_id.as_str()),
                ("status", "any"),
                ("fields", "id,name,tags"),
            ],
        )?;
        let list: OrderList = self.get_json(url).await?;
        list.orders
            .into_iter()
            .find(|order| order.numeric_id().is_some())
            .ok_or_else(|| SourceClientError::NotFound(external_id.clone()))
    }
}

#[async_trait]
impl SourceClient for ShopifyClient {
    async fn fetch_orders(&self, since_days: u32) -> SourceClientResult<Vec<SourceRecord>> {
        let since = created_at_min(since_days);
        let url = self.url(
            "/orders.json",
            &[
                ("status", "any"),
                ("created_at_min", since.as_str()),
                ("financial_status", "pending"),
                ("limit", PAGE_LIMIT),
            ],
        )?;
        let list: OrderList = self.get_json(url).await?;
        let fetched = list.orders.len();
        let records: Vec<SourceRecord> = list
            .orders
            .into_iter()
            .filter(ShopifyDocument::is_cash_on_delivery)
            .map(ShopifyDocument::into_order_record)
            .collect();
        info!(
            shop = %self.shop_name,
            fetched,
            cod = records.len(),
            "fetched storefront orders"
        );
        Ok(records)
    }

    async fn fetch_abandoned_carts(
        &self,
        since_days: u32,
    ) -> SourceClientResult<Vec<SourceRecord>> {
        let since = created_at_min(since_days);
        let url = self.url(
            "/checkouts.json",
            &[("created_at_min", since.as_str()), ("limit", PAGE_LIMIT)],
        )?;
        let list: CheckoutList = self.get_json(url).await?;
        let records: Vec<SourceRecord> = list
            .checkouts
            .into_iter()
            .map(ShopifyDocument::into_cart_record)
            .collect();
        info!(shop = %self.shop_name, count = records.len(), "fetched abandoned checkouts");
        Ok(records)
    }

    async fn update_customer_info(
        &self,
        external_id: &ExternalOrderId,
        edit: &ContactEdit,
    ) -> SourceClientResult<()> {
        let order = self.lookup_order(external_id).await?;
        let order_id = order
            .numeric_id()
            .ok_or_else(|| SourceClientError::NotFound(external_id.clone()))?;
        let body = json!({
            "order": {
                "id": order_id,
                "phone": edit.phone().as_str(),
                "shipping_address": {
                    "name": edit.customer_name(),
                    "address1": edit.address(),
                    "zip": edit.postal_code(),
                    "phone": edit.phone().as_str(),
                },
            }
        });
        self.put_order(order_id, &body).await?;
        debug!(shop = %self.shop_name, order = %external_id, "pushed customer info");
        Ok(())
    }

    async fn add_tags(
        &self,
        external_id: &ExternalOrderId,
        tags: &[SyncTag],
    ) -> SourceClientResult<()> {
        let order = self.lookup_order(external_id).await?;
        let order_id = order
            .numeric_id()
            .ok_or_else(|| SourceClientError::NotFound(external_id.clone()))?;
        let merged = merge_tags(order.tag_list(), tags);
        let body = json!({ "order": { "id": order_id, "tags": merged.join(", ") } });
        self.put_order(order_id, &body).await?;
        debug!(shop = %self.shop_name, order = %external_id, "pushed tags");
        Ok(())
    }
}

fn created_at_min(since_days: u32) -> String {
    (Utc::now() - chrono::Duration::days(i64::from(since_days))).to_rfc3339()
}

fn merge_tags(mut existing: Vec<String>, added: &[SyncTag]) -> Vec<String> {
    for tag in added {
        if !existing.iter().any(|current| current == tag.as_str()) {
            existing.push(tag.as_str().to_owned());
        }
    }
    existing
}
