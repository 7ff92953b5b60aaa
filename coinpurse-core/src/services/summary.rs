//! Per-institution summaries of a retrieved transaction list

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Transaction;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionSummary {
    pub institution: String,
    pub transaction_count: usize,
    /// Sum of upstream amounts (positive = outflow)
    pub total_amount: Decimal,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Group transactions by institution, in first-seen order
pub fn summarize(transactions: &[Transaction]) -> Vec<InstitutionSummary> {
    let mut summaries: Vec<InstitutionSummary> = Vec::new();

    for tx in transactions {
        match summaries.iter_mut().find(|s| s.institution == tx.institution) {
            Some(summary) => {
                summary.transaction_count += 1;
                summary.total_amount += tx.amount;
                summary.first_date = summary.first_date.min(tx.date);
                summary.last_date = summary.last_date.max(tx.date);
            }
            None => summaries.push(InstitutionSummary {
                institution: tx.institution.clone(),
                transaction_count: 1,
                total_amount: tx.amount,
                first_date: tx.date,
                last_date: tx.date,
            }),
        }
    }

    summaries
}
