//! Transaction domain model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single transaction, normalized from the upstream representation and
/// tagged with the institution it was fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Positive for money leaving the account, negative for money coming in
    pub amount: Decimal,
    /// Upstream category hierarchy, most general first
    pub category: Vec<String>,
    pub date: NaiveDate,
    /// Display name of the institution whose access token produced this record
    pub institution: String,
    pub location: Location,
    pub merchant_name: Option<String>,
    pub name: String,
}

/// Where a transaction took place, as far as the upstream service knows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub store_number: Option<String>,
}

impl Location {
    /// True if the upstream service sent no location data at all
    pub fn is_empty(&self) -> bool {
        *self == Location::default()
    }
}

impl Transaction {
    /// Merchant name when known, otherwise the raw transaction name
    pub fn display_name(&self) -> &str {
        self.merchant_name
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Most specific category, if any
    pub fn leaf_category(&self) -> Option<&str> {
        self.category.last().map(String::as_str)
    }
}
