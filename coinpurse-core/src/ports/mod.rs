//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The aggregator
//! depends only on these traits, not on concrete implementations.

mod financial_data;

pub use financial_data::{
    AccountsGetResponse, FinancialDataApi, Institution, InstitutionsGetByIdResponse, Item,
    RawTransaction, TransactionsGetRequest, TransactionsGetResponse, DEFAULT_COUNTRY_CODE,
};
