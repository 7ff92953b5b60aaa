//! Coinpurse Core - every linked bank account in one transaction list
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Core entities (Transaction, CredentialMap) and the error taxonomy
//! - **ports**: Trait definition for the upstream financial-data service
//! - **services**: Token resolution, paginated retrieval and summaries
//! - **adapters**: Concrete implementations (Plaid HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use adapters::plaid::{PlaidClient, PlaidCredentials, PlaidEnvironment};
pub use config::Config;
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{CredentialMap, InstitutionCredential, Location, Transaction};
pub use ports::FinancialDataApi;
pub use services::{
    summarize, FetchOptions, FetchStrategy, InstitutionSummary, TransactionAggregator,
};
