//! Service layer - business logic orchestration

mod aggregator;
mod summary;

pub use aggregator::{
    end_date_for, parse_date, FetchOptions, FetchStrategy, TransactionAggregator, DATE_FORMAT,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use summary::{summarize, InstitutionSummary};
