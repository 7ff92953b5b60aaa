//! Core domain entities
//!
//! Pure data structures - no I/O or external dependencies.

mod credentials;
mod transaction;
pub mod result;

pub use credentials::{CredentialMap, InstitutionCredential};
pub use transaction::{Location, Transaction};
