//! Financial data API port
//!
//! Defines the upstream operations the aggregator consumes (Plaid, or a
//! test double) and the wire models they exchange.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::Location;

/// Country code used for institution lookups
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// `/accounts/get` response; only the item metadata is consumed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsGetResponse {
    pub item: Item,
}

/// The bank connection behind an access token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Absent for manually-linked items
    #[serde(default)]
    pub institution_id: Option<String>,
}

/// `/institutions/get_by_id` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionsGetByIdResponse {
    pub institution: Institution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub institution_id: String,
    pub name: String,
}

/// Parameters for one `/transactions/get` page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsGetRequest {
    pub access_token: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Page size; upstream default applies when `None`
    pub count: Option<u32>,
    /// Index of the first transaction to return; `None` on the first page
    pub offset: Option<u32>,
}

/// One page of `/transactions/get`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionsGetResponse {
    pub transactions: Vec<RawTransaction>,
    /// Size of the full result set for the query, independent of page size
    pub total_transactions: u32,
}

/// Transaction as the upstream service represents it (consumed fields only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    pub name: String,
}

/// Deserialize amount that can be number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) => s
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

/// Upstream financial-data aggregation service
///
/// Implementations own authentication and transport. Every error is
/// returned to the caller untouched; retry policy belongs to whoever calls
/// the aggregator.
pub trait FinancialDataApi: Send + Sync {
    /// Provider name (e.g., "plaid")
    fn name(&self) -> &str;

    /// Look up the item (and its institution) behind an access token
    fn accounts_get(&self, access_token: &str) -> Result<AccountsGetResponse>;

    /// Resolve an institution ID to its display metadata
    fn institutions_get_by_id(
        &self,
        institution_id: &str,
        country_code: &str,
    ) -> Result<InstitutionsGetByIdResponse>;

    /// Fetch one page of transactions
    fn transactions_get(&self, request: &TransactionsGetRequest) -> Result<TransactionsGetResponse>;
}

impl<T: FinancialDataApi + ?Sized> FinancialDataApi for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accounts_get(&self, access_token: &str) -> Result<AccountsGetResponse> {
        (**self).accounts_get(access_token)
    }

    fn institutions_get_by_id(
        &self,
        institution_id: &str,
        country_code: &str,
    ) -> Result<InstitutionsGetByIdResponse> {
        (**self).institutions_get_by_id(institution_id, country_code)
    }

    fn transactions_get(
        &self,
        request: &TransactionsGetRequest,
    ) -> Result<TransactionsGetResponse> {
        (**self).transactions_get(request)
    }
}
