//! # Partner orders
//!
//! Shapes of the order list returned by `/partnerOrders/list/store` and the
//! selection of the most recent order for a customer. The order detail has
//! no Rust type: its contract lives in the external JSON Schema.

use std::cmp::Reverse;
use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order identifier. The API has returned it both as a number and as a
/// string, so both are accepted and rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    Number(i64),
    Text(String),
}

impl OrderId {
    /// Blank strings and zero are what the API sends for "no id yet".
    pub fn is_blank(&self) -> bool {
        match self {
            OrderId::Number(n) => *n == 0,
            OrderId::Text(s) => s.trim().is_empty(),
        }
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderId::Number(n) => write!(f, "{n}"),
            OrderId::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub customer_document: Option<String>,
}

/// `dateCreated` as sent by the API: epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateCreated {
    Millis(i64),
    Text(String),
}

impl DateCreated {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            DateCreated::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            DateCreated::Text(raw) => parse_timestamp(raw),
        }
    }
}

/// One entry of the order list. Every field is optional: a malformed entry
/// simply never matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub date_created: Option<DateCreated>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

impl OrderSummary {
    /// Read one list entry field by field, so a badly typed field only
    /// blanks itself and never the rest of the entry.
    pub fn from_entry(entry: &Value) -> Self {
        Self {
            order_id: field(entry, "orderId"),
            date_created: field(entry, "dateCreated"),
            customer: field(entry, "customer"),
        }
    }

    pub fn customer_document(&self) -> Option<&str> {
        self.customer.as_ref()?.customer_document.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.date_created.as_ref().and_then(DateCreated::to_utc)
    }
}

fn field<T: DeserializeOwned>(entry: &Value, name: &str) -> Option<T> {
    entry
        .get(name)
        .and_then(|value| T::deserialize(value).ok())
}

/// Read the list endpoint body. `None` when the body is not a JSON array.
pub fn parse_order_list(body: &Value) -> Option<Vec<OrderSummary>> {
    let entries = body.as_array()?;
    Some(entries.iter().map(OrderSummary::from_entry).collect())
}

/// Most recent order placed by `customer_doc`, by `dateCreated` descending.
///
/// Orders whose date is missing or unparseable sort after every dated one.
/// Ties keep list order.
pub fn latest_order_for<'a>(orders: &'a [OrderSummary], customer_doc: &str) -> Option<&'a OrderSummary> {
    let mut matching: Vec<&OrderSummary> = orders
        .iter()
        .filter(|o| o.customer_document() == Some(customer_doc))
        .collect();
    matching.sort_by_key(|o| Reverse(o.created_at()));
    matching.into_iter().next()
}

/// Parse the timestamp formats the order API has been seen to emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
