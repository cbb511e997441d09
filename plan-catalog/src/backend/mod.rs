//! Catalog backend seam
//!
//! The admin session and the sync protocol only talk to [`CatalogBackend`];
//! the REST client and [`InMemoryCatalog`] are interchangeable behind it.

mod memory;

pub use memory::InMemoryCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use error_common::Result;

use crate::models::{Operator, OperatorInput, Plan};
use crate::payload::PlanPayload;
use crate::quote::{QuoteRequest, QuoteResult};

/// Query of `GET /operadoras/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorFilter {
    /// Case-insensitive substring of the operator name
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Query of `GET /planos/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFilter {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "operadora_id", skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<i64>,
}

impl OperatorFilter {
    pub fn matches(&self, operator: &Operator) -> bool {
        contains_ignore_case(&operator.name, self.name.as_deref())
    }
}

impl PlanFilter {
    pub fn matches(&self, plan: &Plan) -> bool {
        let operator_ok = self.operator_id.is_none() || plan.operator_id == self.operator_id;
        operator_ok && contains_ignore_case(&plan.name, self.name.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => true,
    }
}

/// Operations offered by the plan catalog backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_operators(&self, filter: &OperatorFilter) -> Result<Vec<Operator>>;

    async fn get_operator(&self, id: i64) -> Result<Operator>;

    /// Names are unique, compared case-insensitively
    async fn create_operator(&self, input: &OperatorInput) -> Result<Operator>;

    async fn update_operator(&self, id: i64, input: &OperatorInput) -> Result<Operator>;

    async fn delete_operator(&self, id: i64) -> Result<()>;

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<Plan>>;

    async fn get_plan(&self, id: i64) -> Result<Plan>;

    async fn create_plan(&self, payload: &PlanPayload) -> Result<Plan>;

    /// Whole-document replace of a plan and all of its sub-lists
    async fn update_plan(&self, id: i64, payload: &PlanPayload) -> Result<Plan>;

    async fn delete_plan(&self, id: i64) -> Result<()>;

    /// The only per-item endpoint the backend offers
    async fn delete_co_payment(&self, plan_id: i64, co_payment_id: i64) -> Result<()>;

    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<QuoteResult>>;

    /// Rendered PDF of a quote
    async fn quote_pdf(&self, request: &QuoteRequest) -> Result<Vec<u8>>;
}
