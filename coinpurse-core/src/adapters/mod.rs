//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Plaid HTTP client for FinancialDataApi
//! - Mock Plaid server for testing

pub mod plaid;

#[cfg(test)]
pub mod plaid_mock;
