//! REST client for the plan catalog backend
//!
//! [`HttpCatalog`] implements [`plan_catalog::CatalogBackend`] over the
//! `/operadoras/`, `/planos/` and `/cotacao/` endpoints. Non-2xx answers are
//! turned into [`error_common::CatalogError`] carrying the backend's `detail`.

pub mod config;
pub mod http;

pub use config::*;
pub use http::*;
