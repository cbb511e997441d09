use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use error_common::{CatalogError, Result};
use plan_catalog::{
    CatalogBackend, Operator, OperatorFilter, OperatorInput, Plan, PlanFilter, PlanPayload,
    QuoteRequest, QuoteResult,
};

use crate::config::ClientConfig;

/// Catalog backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send the request and return the raw body of a 2xx answer
    async fn execute(&self, request: RequestBuilder, fallback: &str) -> Result<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Catalog backend rejected request");
            return Err(CatalogError::from_response(status.as_u16(), &body, fallback));
        }
        Ok(body.to_vec())
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let body = self.execute(request, fallback).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CatalogBackend for HttpCatalog {
    #[instrument(skip(self))]
    async fn list_operators(&self, filter: &OperatorFilter) -> Result<Vec<Operator>> {
        let request = self.client.get(self.url("operadoras/")).query(filter);
        self.fetch_json(request, "Erro ao carregar operadoras").await
    }

    async fn get_operator(&self, id: i64) -> Result<Operator> {
        let request = self.client.get(self.url(&format!("operadoras/{id}")));
        self.fetch_json(request, "Erro ao carregar operadora").await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_operator(&self, input: &OperatorInput) -> Result<Operator> {
        let request = self.client.post(self.url("operadoras/")).json(input);
        self.fetch_json(request, "Erro ao criar operadora").await
    }

    #[instrument(skip(self, input))]
    async fn update_operator(&self, id: i64, input: &OperatorInput) -> Result<Operator> {
        let request = self.client.put(self.url(&format!("operadoras/{id}"))).json(input);
        self.fetch_json(request, "Erro ao atualizar operadora").await
    }

    #[instrument(skip(self))]
    async fn delete_operator(&self, id: i64) -> Result<()> {
        let request = self.client.delete(self.url(&format!("operadoras/{id}")));
        self.execute(request, "Erro ao deletar operadora").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let request = self.client.get(self.url("planos/")).query(filter);
        self.fetch_json(request, "Erro ao carregar planos").await
    }

    async fn get_plan(&self, id: i64) -> Result<Plan> {
        let request = self.client.get(self.url(&format!("planos/{id}")));
        self.fetch_json(request, "Erro ao carregar plano").await
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    async fn create_plan(&self, payload: &PlanPayload) -> Result<Plan> {
        let request = self.client.post(self.url("planos/")).json(payload);
        self.fetch_json(request, "Erro ao salvar plano").await
    }

    #[instrument(skip(self, payload))]
    async fn update_plan(&self, id: i64, payload: &PlanPayload) -> Result<Plan> {
        let request = self.client.put(self.url(&format!("planos/{id}"))).json(payload);
        self.fetch_json(request, "Erro ao salvar plano").await
    }

    #[instrument(skip(self))]
    async fn delete_plan(&self, id: i64) -> Result<()> {
        let request = self.client.delete(self.url(&format!("planos/{id}")));
        self.execute(request, "Erro ao deletar plano").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_co_payment(&self, plan_id: i64, co_payment_id: i64) -> Result<()> {
        let path = format!("planos/{plan_id}/coparticipacoes/{co_payment_id}");
        let request = self.client.delete(self.url(&path));
        self.execute(request, "Erro ao deletar coparticipação").await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(ages = request.ages.len()))]
    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<QuoteResult>> {
        let http = self.client.post(self.url("cotacao/")).json(request);
        self.fetch_json(http, "Erro ao calcular cotação").await
    }

    #[instrument(skip(self, request), fields(plan_id = ?request.plan_id))]
    async fn quote_pdf(&self, request: &QuoteRequest) -> Result<Vec<u8>> {
        let http = self.client.post(self.url("cotacao/pdf")).json(request);
        self.execute(http, "Erro ao gerar PDF").await
    }
}
