//! Health-plan catalog
//!
//! Provides the client-side core of the plan catalog:
//! - Operator and plan records in the backend's wire shape
//! - Discount pricing and quote card rendering
//! - Age-band quoting
//! - Read-patch-write editing of plan sub-lists
//! - Backend seam with an in-memory implementation
//! - Admin session with cached listings and outcome banner

pub mod admin;
pub mod backend;
pub mod card;
pub mod models;
pub mod payload;
pub mod pricing;
pub mod quote;
pub mod sync;

pub use admin::*;
pub use backend::*;
pub use card::*;
pub use models::*;
pub use payload::*;
pub use pricing::*;
pub use quote::*;
pub use sync::*;
