//! Transaction aggregator - resolve access tokens to institutions and merge
//! their transactions into one date-sorted list

use std::thread;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::adapters::plaid::PlaidClient;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{CredentialMap, Transaction};
use crate::ports::{
    FinancialDataApi, RawTransaction, TransactionsGetRequest, DEFAULT_COUNTRY_CODE,
};

/// Date format accepted at the API boundary
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upstream default page size for `/transactions/get`
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page the upstream service will return
pub const MAX_PAGE_SIZE: u32 = 500;

/// How institutions are fetched during retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// One institution after another, one request at a time
    #[default]
    Sequential,
    /// One thread per institution; pages within an institution stay sequential
    Concurrent,
}

/// Retrieval tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Sent as the upstream `count` option; `None` leaves it to the upstream default
    pub page_size: Option<u32>,
    pub strategy: FetchStrategy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            strategy: FetchStrategy::Sequential,
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        Error::parse(format!("'{}' is not a valid YYYY-MM-DD date: {}", value, e))
    })
}

/// End of the retrieval window: one calendar day past `today`
///
/// Pads against timezone truncation so the current day is never cut off.
pub fn end_date_for(today: NaiveDate) -> Result<NaiveDate> {
    today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::parse(format!("no calendar day after {}", today)))
}

/// Aggregates transactions from every linked institution
///
/// Owns the credential map it resolves at construction; the map is never
/// mutated afterwards.
pub struct TransactionAggregator<A: FinancialDataApi> {
    api: A,
    credentials: CredentialMap,
    options: FetchOptions,
}

impl TransactionAggregator<PlaidClient> {
    /// Build a Plaid client from configuration and resolve its access tokens
    pub fn connect(config: &Config) -> Result<Self> {
        let options = config.fetch_options()?;
        let tokens = config.access_tokens()?;
        let client = config.plaid_client()?;
        Ok(Self::initialize(client, tokens)?.with_options(options))
    }
}

impl<A: FinancialDataApi> TransactionAggregator<A> {
    /// Resolve a space-separated token list into institution names
    ///
    /// Issues two upstream requests per token. The list is split on single
    /// spaces with no trimming, so stray whitespace produces an empty token
    /// that the upstream service rejects. Any failure aborts the whole
    /// resolution.
    pub fn initialize(api: A, token_list: &str) -> Result<Self> {
        let mut credentials = CredentialMap::new();

        for token in token_list.split(' ') {
            let accounts = api.accounts_get(token)?;
            let institution_id = accounts.item.institution_id.ok_or_else(|| {
                Error::data_shape("accounts/get response has no item.institution_id")
            })?;

            let institution = api
                .institutions_get_by_id(&institution_id, DEFAULT_COUNTRY_CODE)?
                .institution;

            tracing::debug!(
                institution = %institution.name,
                institution_id = %institution_id,
                "resolved access token"
            );

            if credentials.insert(institution.name.clone(), token).is_some() {
                tracing::warn!(
                    institution = %institution.name,
                    "two access tokens resolve to the same institution; keeping the later one"
                );
            }
        }

        tracing::info!(
            provider = api.name(),
            institutions = credentials.len(),
            "credential map ready"
        );

        Ok(Self {
            api,
            credentials,
            options: FetchOptions::default(),
        })
    }

    /// Replace the retrieval options
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn credentials(&self) -> &CredentialMap {
        &self.credentials
    }

    /// Institution names in retrieval order
    pub fn institutions(&self) -> Vec<&str> {
        self.credentials.institutions()
    }

    /// Fetch every transaction from `start_date` (`YYYY-MM-DD`) through tomorrow
    ///
    /// The date is validated before any request is issued.
    pub fn get_transactions(&self, start_date: &str) -> Result<Vec<Transaction>> {
        let start = parse_date(start_date)?;
        self.get_transactions_since(start)
    }

    /// Fetch every transaction from `start` through tomorrow, sorted by date
    ///
    /// Ties keep merge order: institutions in credential-map order, then
    /// upstream order within an institution.
    pub fn get_transactions_since(&self, start: NaiveDate) -> Result<Vec<Transaction>> {
        let end = end_date_for(Local::now().date_naive())?;
        self.get_transactions_between(start, end)
    }

    fn get_transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        tracing::debug!(%start, %end, strategy = ?self.options.strategy, "fetching transactions");

        let per_institution = match self.options.strategy {
            FetchStrategy::Sequential => self
                .credentials
                .iter()
                .map(|c| self.fetch_institution(&c.institution, &c.access_token, start, end))
                .collect::<Result<Vec<_>>>()?,
            FetchStrategy::Concurrent => thread::scope(|scope| {
                let handles: Vec<_> = self
                    .credentials
                    .iter()
                    .map(|c| {
                        scope.spawn(move || {
                            self.fetch_institution(&c.institution, &c.access_token, start, end)
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                    .collect::<Result<Vec<_>>>()
            })?,
        };

        let mut transactions: Vec<Transaction> = per_institution.into_iter().flatten().collect();
        transactions.sort_by_key(|t| t.date);

        tracing::info!(count = transactions.len(), "merged transactions");
        Ok(transactions)
    }

    /// Page through one institution's transactions
    ///
    /// The offset is this institution's own running count, so institutions
    /// can be fetched in any order or in parallel.
    fn fetch_institution(
        &self,
        institution: &str,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut request = TransactionsGetRequest {
            access_token: access_token.to_string(),
            start_date: start,
            end_date: end,
            count: self.options.page_size,
            offset: None,
        };

        let first = self.api.transactions_get(&request)?;
        let mut total = first.total_transactions as usize;
        let mut collected = project_all(first.transactions, institution);

        while collected.len() < total {
            let offset = u32::try_from(collected.len())
                .map_err(|_| Error::data_shape("transaction offset exceeds u32"))?;
            request.offset = Some(offset);

            tracing::debug!(institution, offset, total, "fetching next page");

            let page = self.api.transactions_get(&request)?;
            total = page.total_transactions as usize;

            if page.transactions.is_empty() && collected.len() < total {
                return Err(Error::data_shape(format!(
                    "{} reported {} transactions but returned an empty page at offset {}",
                    institution, total, offset
                )));
            }

            collected.extend(project_all(page.transactions, institution));
        }

        tracing::info!(institution, count = collected.len(), "fetched institution");
        Ok(collected)
    }
}

fn project_all(raw: Vec<RawTransaction>, institution: &str) -> Vec<Transaction> {
    raw.into_iter().map(|r| project(r, institution)).collect()
}

/// Project an upstream transaction into the normalized shape
fn project(raw: RawTransaction, institution: &str) -> Transaction {
    Transaction {
        amount: raw.amount,
        category: raw.category.unwrap_or_default(),
        date: raw.date,
        institution: institution.to_string(),
        location: raw.location.unwrap_or_default(),
        merchant_name: raw.merchant_name,
        name: raw.name,
    }
}
