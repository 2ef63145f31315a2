//! Core domain entities
//!
//! Pure data structures with their validation and formatting logic - no I/O
//! or external dependencies.

mod credential;
pub mod dates;
mod entity;
mod intent;
mod invoice;
mod money;
pub mod result;

pub use credential::{Credential, IssuedToken};
pub use entity::{Entity, EntityCode, EntityScope};
pub use intent::{Intent, Query};
pub use invoice::{AgingBucket, InvoiceStatus, LineItem};
pub use money::{sum_amounts, CurrencyFormat, MonetaryTotal};
