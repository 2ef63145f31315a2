//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, which is also where tests plug in their doubles.

pub mod ledger;
mod token_issuer;

pub use ledger::{endpoints, LedgerApi};
pub use token_issuer::TokenIssuer;
