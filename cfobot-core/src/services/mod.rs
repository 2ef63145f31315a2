//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod aggregate;
pub mod aging;
mod credential_cache;
pub mod extract;
mod finance;

pub use aggregate::{EntityResult, NOT_AVAILABLE};
pub use aging::AgingReport;
pub use credential_cache::{CredentialCache, DEFAULT_SKEW, MAX_TOKEN_LIFETIME};
pub use extract::TotalReport;
pub use finance::{unavailable_reply, FinanceService, INVOICE_PAGE_SIZE, MAX_INVOICE_PAGES};
