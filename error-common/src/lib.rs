//! Common error handling for the plan catalog crates
//!
//! Every failure of a catalog operation ends up as a [`CatalogError`]. The
//! backend reports failures as JSON bodies with a `detail` field; that text is
//! what the operator sees, so it is preserved verbatim whenever it is a plain
//! string.
//!
//! # Error Categories
//!
//! - **Server**: non-2xx answer from the backend
//! - **Network**: the request never got an answer
//! - **NotFound**: the resource vanished between list and fetch
//! - **Validation**: input rejected locally
//! - **Config / Io / Serialization**: local failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{CatalogError, log_error};
//!
//! let body = r#"{"detail":"Operadora já existe"}"#.as_bytes();
//! let err = CatalogError::from_response(409, body, "Erro ao criar operadora");
//! log_error("create_operator", &err);
//! assert_eq!(err.user_message("Erro ao criar operadora"), "Operadora já existe");
//! ```

pub mod codes;
pub mod detail;
pub mod reporting;
pub mod types;

pub use detail::*;
pub use reporting::*;
pub use types::*;
