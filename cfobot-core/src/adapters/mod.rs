//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Zoho Accounts OAuth client for TokenIssuer
//! - Zoho Books HTTP client for LedgerApi

pub mod zoho_auth;
pub mod zoho_books;

#[cfg(test)]
pub mod mock_server;
