//! Wire types for the Shopify Admin REST API and their normalization.

use crate::order::domain::{OrderSource, SourceRecord};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct OrderList {
    pub(super) orders: Vec<ShopifyDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CheckoutList {
    pub(super) checkouts: Vec<ShopifyDocument>,
}

/// An order or abandoned checkout; both share the fields read here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ShopifyDocument {
    pub(super) id: Option<Value>,
    pub(super) name: Option<String>,
    pub(super) token: Option<String>,
    pub(super) tags: Option<String>,
    pub(super) financial_status: Option<String>,
    pub(super) payment_gateway_names: Vec<String>,
    pub(super) created_at: Option<String>,
    pub(super) phone: Option<String>,
    pub(super) total_price: Option<Value>,
    pub(super) customer: Option<Customer>,
    pub(super) shipping_address: Option<Address>,
    pub(super) billing_address: Option<Address>,
    pub(super) line_items: Vec<LineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Customer {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Address {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    province: Option<String>,
    zip: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LineItem {
    title: Option<String>,
    quantity: Option<u32>,
}

impl ShopifyDocument {
    /// Returns whether the order is cash on delivery.
    ///
    /// A gateway named like cash or COD qualifies, as does a pending
    /// financial status.
    pub(super) fn is_cash_on_delivery(&self) -> bool {
        let cod_gateway = self.payment_gateway_names.iter().any(|gateway| {
            let lowered = gateway.to_lowercase();
            lowered.contains("cash") || lowered.contains("cod")
        });
        cod_gateway || self.financial_status.as_deref() == Some("pending")
    }

    /// Returns the numeric Shopify identifier, if present.
    pub(super) fn numeric_id(&self) -> Option<u64> {
        match self.id.as_ref()? {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub(super) fn into_order_record(self) -> SourceRecord {
        let external_id = self.name.clone().unwrap_or_default();
        self.into_record(external_id, OrderSource::StorefrontOrder)
    }

    pub(super) fn into_cart_record(self) -> SourceRecord {
        let external_id = self
            .id
            .as_ref()
            .map(value_text)
            .filter(|text| !text.is_empty())
            .or_else(|| self.token.clone())
            .unwrap_or_default();
        self.into_record(external_id, OrderSource::AbandonedCart)
    }

    fn into_record(self, external_id: String, source: OrderSource) -> SourceRecord {
        let customer_name = self.customer_name();
        let phone = self.phone();
        let shipping = self.shipping_address.as_ref().or(self.billing_address.as_ref());
        let address = shipping.map(Address::joined).unwrap_or_default();
        let postal_code = shipping
            .and_then(|value| value.zip.clone())
            .unwrap_or_default();
        let product_name = self
            .line_items
            .first()
            .and_then(|item| item.title.clone())
            .unwrap_or_default();
        let quantity = self
            .line_items
            .iter()
            .map(|item| item.quantity.unwrap_or(0))
            .fold(0_u32, u32::saturating_add);

        SourceRecord {
            external_id,
            source: Some(source),
            channel: None,
            customer_name,
            phone,
            address,
            postal_code,
            product_name,
            price: self.total_price.as_ref().map(value_text).unwrap_or_default(),
            quantity: quantity.to_string(),
            ordered_at: self.created_at.unwrap_or_default(),
        }
    }

    fn customer_name(&self) -> String {
        let from_customer = self
            .customer
            .as_ref()
            .map(|customer| full_name(customer.first_name.as_deref(), customer.last_name.as_deref()));
        let from_address = || {
            self.shipping_address
                .as_ref()
                .or(self.billing_address.as_ref())
                .map(Address::display_name)
        };
        from_customer
            .filter(|name| !name.is_empty())
            .or_else(from_address)
            .unwrap_or_default()
    }

    fn phone(&self) -> String {
        let candidates = [
            self.customer.as_ref().and_then(|customer| customer.phone.clone()),
            self.shipping_address.as_ref().and_then(|address| address.phone.clone()),
            self.phone.clone(),
            self.billing_address.as_ref().and_then(|address| address.phone.clone()),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|phone| !phone.trim().is_empty())
            .unwrap_or_default()
    }

    /// Splits the comma-separated tag list.
    pub(super) fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Address {
    fn joined(&self) -> String {
        [&self.address1, &self.address2, &self.city, &self.province]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| full_name(self.first_name.as_deref(), self.last_name.as_deref()))
    }
}

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
        .trim()
        .to_owned()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}
