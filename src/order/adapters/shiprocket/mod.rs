//! Shiprocket abandoned-cart client.
//!
//! Authenticates with account credentials and reads carts from a single
//! configured endpoint. Shiprocket exposes no write-back for carts, so
//! pushes are reported as unsupported.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::order::{
    domain::{ContactEdit, ExternalOrderId, OrderSource, SourceRecord, SyncTag},
    ports::{SourceClient, SourceClientError, SourceClientResult},
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://apiv2.shiprocket.in/v1/external";

/// Endpoint read when none is configured.
pub const DEFAULT_CARTS_ENDPOINT: &str = "checkouts";

/// Lifetime assumed for an issued token.
const TOKEN_TTL_DAYS: i64 = 9;

const SOURCE_NAME: &str = "shiprocket";

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// [`SourceClient`] reading abandoned carts from Shiprocket.
#[derive(Debug)]
pub struct ShiprocketClient {
    client: reqwest::Client,
    base_url: String,
    carts_endpoint: String,
    email: String,
    password: String,
    timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl ShiprocketClient {
    /// Creates a client for the given account.
    ///
    /// # Errors
    ///
    /// Returns [`SourceClientError::Http`] when the HTTP client cannot be
    /// built.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        carts_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> SourceClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceClientError::http)?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            carts_endpoint: carts_endpoint.into().trim_matches('/').to_owned(),
            email: email.into(),
            password: password.into(),
            timeout,
            token: Mutex::new(None),
        })
    }

    /// Overrides the API base URL, for tests against a local server.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn transport_error(&self, err: reqwest::Error) -> SourceClientError {
        if err.is_timeout() {
            SourceClientError::Timeout(self.timeout.as_secs())
        } else {
            SourceClientError::http(err)
        }
    }

    async fn bearer_token(&self) -> SourceClientResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.expires_at > Utc::now()) {
            return Ok(token.value.clone());
        }

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "email": self.email, "password": self.password }))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        if !status.is_success() {
            return Err(SourceClientError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|err| SourceClientError::Decode(err.to_string()))?;
        info!("authenticated with shiprocket");
        let fresh = CachedToken {
            value: login.token,
            expires_at: Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn carts_with_reauth(&self, url: &reqwest::Url) -> SourceClientResult<Value> {
        if let Some(payload) = self.get_carts(url).await? {
            return Ok(payload);
        }
        warn!("shiprocket token rejected, re-authenticating");
        self.invalidate_token().await;
        self.get_carts(url)
            .await?
            .ok_or_else(|| SourceClientError::Status {
                status: reqwest::StatusCode::UNAUTHORIZED.as_u16(),
                body: "token rejected after re-authentication".to_owned(),
            })
    }

    /// Returns `None` when the token was rejected.
    async fn get_carts(&self, url: &reqwest::Url) -> SourceClientResult<Option<Value>> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        if !status.is_success() {
            return Err(SourceClientError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|err| SourceClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl SourceClient for ShiprocketClient {
    async fn fetch_orders(&self, _since_days: u32) -> SourceClientResult<Vec<SourceRecord>> {
        Err(SourceClientError::Unsupported(SOURCE_NAME))
    }

    async fn fetch_abandoned_carts(
        &self,
        since_days: u32,
    ) -> SourceClientResult<Vec<SourceRecord>> {
        let now = Utc::now();
        let from = (now - chrono::Duration::days(i64::from(since_days)))
            .format("%Y-%m-%d")
            .to_string();
        let to = now.format("%Y-%m-%d").to_string();
        let url = reqwest::Url::parse_with_params(
            &format!("{}/{}", self.base_url, self.carts_endpoint),
            &[
                ("created_from", from.as_str()),
                ("created_to", to.as_str()),
                ("status", "abandoned"),
            ],
        )
        .map_err(SourceClientError::http)?;

        let payload = self.carts_with_reauth(&url).await?;

        let records: Vec<SourceRecord> = cart_entries(&payload)
            .iter()
            .filter_map(parse_cart)
            .collect();
        debug!(endpoint = %self.carts_endpoint, count = records.len(), "parsed shiprocket carts");
        Ok(records)
    }

    async fn update_customer_info(
        &self,
        _external_id: &ExternalOrderId,
        _edit: &ContactEdit,
    ) -> SourceClientResult<()> {
        Err(SourceClientError::Unsupported(SOURCE_NAME))
    }

    async fn add_tags(
        &self,
        _external_id: &ExternalOrderId,
        _tags: &[SyncTag],
    ) -> SourceClientResult<()> {
        Err(SourceClientError::Unsupported(SOURCE_NAME))
    }
}

/// Finds the cart array in whichever envelope the endpoint returned.
fn cart_entries(payload: &Value) -> Vec<Value> {
    for key in ["data", "checkouts", "carts"] {
        if let Some(Value::Array(entries)) = payload.get(key) {
            return entries.clone();
        }
    }
    if let Some(Value::Array(orders)) = payload.get("orders") {
        return orders
            .iter()
            .filter(|order| text_at(order, &["status"]).as_deref() == Some("abandoned"))
            .cloned()
            .collect();
    }
    Vec::new()
}

fn parse_cart(cart: &Value) -> Option<SourceRecord> {
    let external_id = first_text(cart, &[&["id"], &["checkout_id"], &["cart_token"]])?;
    let phone = first_text(
        cart,
        &[
            &["phone"],
            &["customer", "phone"],
            &["billing_address", "phone"],
            &["shipping_address", "phone"],
        ],
    )?;
    let address_block = ["shipping_address", "billing_address"]
        .into_iter()
        .find_map(|key| cart.get(key).filter(|value| value.is_object()));
    let items = ["line_items", "products", "items"]
        .into_iter()
        .find_map(|key| cart.get(key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();
    let quantity: u64 = items
        .iter()
        .filter_map(|item| first_u64(item, &["quantity", "qty"]))
        .fold(0, u64::saturating_add);

    Some(SourceRecord {
        external_id,
        source: Some(OrderSource::AbandonedCart),
        channel: first_text(cart, &[&["channel_name"], &["store_name"]]),
        customer_name: customer_name(cart),
        phone,
        address: address_block.map(joined_address).unwrap_or_default(),
        postal_code: address_block
            .and_then(|block| first_text(block, &[&["pincode"], &["zip"]]))
            .unwrap_or_default(),
        product_name: items
            .first()
            .and_then(|item| first_text(item, &[&["name"], &["title"]]))
            .unwrap_or_default(),
        price: first_text(cart, &[&["total_price"], &["amount"]]).unwrap_or_default(),
        quantity: quantity.to_string(),
        ordered_at: first_text(cart, &[&["created_at"], &["abandoned_at"]]).unwrap_or_default(),
    })
}

fn customer_name(cart: &Value) -> String {
    if let Some(name) = first_text(cart, &[&["customer_name"]]) {
        return name;
    }
    ["customer", "billing_address"]
        .into_iter()
        .filter_map(|key| cart.get(key))
        .map(|block| {
            format!(
                "{} {}",
                text_at(block, &["first_name"]).unwrap_or_default(),
                text_at(block, &["last_name"]).unwrap_or_default()
            )
            .trim()
            .to_owned()
        })
        .find(|name| !name.is_empty())
        .unwrap_or_default()
}

fn joined_address(block: &Value) -> String {
    ["address", "address_2", "city", "state"]
        .into_iter()
        .filter_map(|key| text_at(block, &[key]))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads a non-empty string or number at `path`.
fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    let leaf = path.iter().try_fold(value, |node, key| node.get(*key))?;
    let text = match leaf {
        Value::String(text) => text.trim().to_owned(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_text(value: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| text_at(value, path))
}

fn first_u64(value: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| {
        let field = value.get(*key)?;
        field
            .as_u64()
            .or_else(|| field.as_str().and_then(|text| text.trim().parse().ok()))
            .filter(|count| *count > 0)
    })
}
