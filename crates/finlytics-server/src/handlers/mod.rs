//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod auth;
pub mod balances;
pub mod categories;
pub mod chat;
pub mod dashboard;
pub mod transactions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use auth::*;
pub use balances::*;
pub use categories::*;
pub use chat::*;
pub use dashboard::*;
pub use transactions::*;
