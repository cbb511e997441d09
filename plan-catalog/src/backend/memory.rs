use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use error_common::{CatalogError, Result};

use super::{CatalogBackend, OperatorFilter, PlanFilter};
use crate::models::{
    CoPayment, Hospital, Municipality, Operator, OperatorInput, Plan, WaitingPeriod,
};
use crate::payload::{CoPaymentEntry, PlanPayload};
use crate::quote::{quote_catalog, QuoteRequest, QuoteResult};

const OPERATOR_NOT_FOUND: &str = "Operadora não encontrada";
const PLAN_NOT_FOUND: &str = "Plano não encontrado";

#[derive(Debug, Default)]
struct State {
    operators: BTreeMap<i64, Operator>,
    plans: BTreeMap<i64, Plan>,
    next_id: i64,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        let name = name.to_lowercase();
        self.operators
            .values()
            .any(|operator| Some(operator.id) != except && operator.name.to_lowercase() == name)
    }

    fn plan_mut(&mut self, id: i64) -> Result<&mut Plan> {
        self.plans.get_mut(&id).ok_or_else(|| CatalogError::not_found(PLAN_NOT_FOUND))
    }

    fn new_co_payment(&mut self, entry: &CoPaymentEntry) -> CoPayment {
        CoPayment {
            id: Some(self.allocate_id()),
            name: entry.name.clone(),
            plan_type: entry.plan_type.clone(),
            image_url: entry.image_url.clone(),
            service_type: entry.service_type.clone(),
            percentage: entry.percentage,
            min_value: entry.min_value,
            max_value: entry.max_value,
        }
    }

    /// Replace the id-less child lists with freshly numbered rows
    fn write_children(&mut self, plan_id: i64, payload: &PlanPayload) -> Result<()> {
        let hospitals: Vec<Hospital> = payload
            .hospitals
            .iter()
            .map(|entry| Hospital {
                id: Some(self.allocate_id()),
                name: entry.name.clone(),
                address: Some(entry.address.clone()).filter(|address| !address.is_empty()),
            })
            .collect();
        let waiting_periods: Vec<WaitingPeriod> = payload
            .waiting_periods
            .iter()
            .map(|entry| WaitingPeriod {
                id: Some(self.allocate_id()),
                description: entry.description.clone(),
                days: entry.days,
            })
            .collect();
        let municipalities: Vec<Municipality> = payload
            .municipalities
            .iter()
            .map(|entry| Municipality {
                id: Some(self.allocate_id()),
                name: entry.name.clone(),
            })
            .collect();

        let plan = self.plan_mut(plan_id)?;
        plan.price_bands.clone_from(&payload.price_bands);
        plan.hospitals = hospitals;
        plan.waiting_periods = waiting_periods;
        plan.municipalities = municipalities;
        Ok(())
    }

    /// Co-payments are reconciled by id instead of recreated.
    ///
    /// Stored rows whose id is not in the payload are removed, matching rows
    /// are updated in place (plan type and image are kept), id-less entries
    /// are created. Ids that match no stored row are ignored.
    fn reconcile_co_payments(&mut self, plan_id: i64, entries: &[CoPaymentEntry]) -> Result<()> {
        let created: Vec<CoPayment> = entries
            .iter()
            .filter(|entry| entry.id.is_none())
            .map(|entry| self.new_co_payment(entry))
            .collect();

        let plan = self.plan_mut(plan_id)?;
        plan.co_payments.retain(|stored| {
            entries
                .iter()
                .any(|entry| entry.id.is_some() && entry.id == stored.id)
        });

        for stored in &mut plan.co_payments {
            if let Some(entry) = entries.iter().find(|entry| entry.id == stored.id) {
                stored.name.clone_from(&entry.name);
                stored.service_type.clone_from(&entry.service_type);
                stored.percentage = entry.percentage;
                stored.min_value = entry.min_value;
                stored.max_value = entry.max_value;
            }
        }
        plan.co_payments.extend(created);
        Ok(())
    }
}

/// Catalog held in process memory.
///
/// Reproduces the REST backend's observable behaviour, including its error
/// details, so admin flows can be exercised without a server.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with `operators` and `plans`; ids are kept as given
    pub fn with_records(operators: Vec<Operator>, plans: Vec<Plan>) -> Self {
        let mut state = State::default();
        let max_child_id = plans
            .iter()
            .flat_map(|plan| {
                let hospitals = plan.hospitals.iter().filter_map(|h| h.id);
                let periods = plan.waiting_periods.iter().filter_map(|w| w.id);
                let co_payments = plan.co_payments.iter().filter_map(|c| c.id);
                let municipalities = plan.municipalities.iter().filter_map(|m| m.id);
                hospitals.chain(periods).chain(co_payments).chain(municipalities)
            })
            .max()
            .unwrap_or(0);

        state.next_id = operators
            .iter()
            .map(|operator| operator.id)
            .chain(plans.iter().map(|plan| plan.id))
            .fold(max_child_id, i64::max);
        state.operators = operators.into_iter().map(|operator| (operator.id, operator)).collect();
        state.plans = plans.into_iter().map(|plan| (plan.id, plan)).collect();

        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl CatalogBackend for InMemoryCatalog {
    async fn list_operators(&self, filter: &OperatorFilter) -> Result<Vec<Operator>> {
        let state = self.state.read();
        Ok(state
            .operators
            .values()
            .filter(|operator| filter.matches(operator))
            .cloned()
            .collect())
    }

    async fn get_operator(&self, id: i64) -> Result<Operator> {
        self.state
            .read()
            .operators
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(OPERATOR_NOT_FOUND))
    }

    async fn create_operator(&self, input: &OperatorInput) -> Result<Operator> {
        let mut state = self.state.write();
        if state.name_taken(&input.name, None) {
            return Err(CatalogError::Server {
                status: 409,
                message: "Operadora já existe".to_string(),
            });
        }

        let operator = Operator {
            id: state.allocate_id(),
            name: input.name.clone(),
            accredited_network_url: input.accredited_network_url.clone(),
        };
        state.operators.insert(operator.id, operator.clone());
        debug!(operator_id = operator.id, "Operator created");
        Ok(operator)
    }

    async fn update_operator(&self, id: i64, input: &OperatorInput) -> Result<Operator> {
        let mut state = self.state.write();
        let current_name = state
            .operators
            .get(&id)
            .map(|operator| operator.name.clone())
            .ok_or_else(|| CatalogError::not_found(OPERATOR_NOT_FOUND))?;

        if current_name != input.name && state.name_taken(&input.name, Some(id)) {
            return Err(CatalogError::Server {
                status: 409,
                message: "Operadora com esse nome já existe".to_string(),
            });
        }

        let operator = state
            .operators
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found(OPERATOR_NOT_FOUND))?;
        operator.name.clone_from(&input.name);
        operator.accredited_network_url.clone_from(&input.accredited_network_url);
        Ok(operator.clone())
    }

    async fn delete_operator(&self, id: i64) -> Result<()> {
        let mut state = self.state.write();
        if state.operators.remove(&id).is_none() {
            return Err(CatalogError::not_found(OPERATOR_NOT_FOUND));
        }
        // plans outlive their operator and lose the reference
        for plan in state.plans.values_mut() {
            if plan.operator_id == Some(id) {
                plan.operator_id = None;
            }
        }
        Ok(())
    }

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let state = self.state.read();
        Ok(state.plans.values().filter(|plan| filter.matches(plan)).cloned().collect())
    }

    async fn get_plan(&self, id: i64) -> Result<Plan> {
        self.state
            .read()
            .plans
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(PLAN_NOT_FOUND))
    }

    async fn create_plan(&self, payload: &PlanPayload) -> Result<Plan> {
        let mut state = self.state.write();
        let operator_known = payload
            .operator_id
            .is_some_and(|id| state.operators.contains_key(&id));
        if !operator_known {
            return Err(CatalogError::not_found(OPERATOR_NOT_FOUND));
        }

        let id = state.allocate_id();
        state.plans.insert(
            id,
            Plan {
                id,
                name: payload.name.clone(),
                operator_id: payload.operator_id,
                contract_type: payload.contract_type,
                accommodation: payload.accommodation,
                coverage_scope: payload.coverage_scope,
                has_co_payment: payload.has_co_payment,
                has_eligibility_check: Some(payload.has_eligibility_check),
                co_payment_image_url: Some(payload.co_payment_image_url.clone()),
                price_bands: Vec::new(),
                hospitals: Vec::new(),
                waiting_periods: Vec::new(),
                co_payments: Vec::new(),
                municipalities: Vec::new(),
            },
        );
        state.write_children(id, payload)?;

        let co_payments: Vec<CoPayment> = payload
            .co_payments
            .iter()
            .map(|entry| state.new_co_payment(entry))
            .collect();
        let plan = state.plan_mut(id)?;
        plan.co_payments = co_payments;
        Ok(plan.clone())
    }

    async fn update_plan(&self, id: i64, payload: &PlanPayload) -> Result<Plan> {
        let mut state = self.state.write();
        let plan = state.plan_mut(id)?;
        // the operator of an existing plan is not changed by updates
        plan.name.clone_from(&payload.name);
        plan.contract_type = payload.contract_type;
        plan.accommodation = payload.accommodation;
        plan.coverage_scope = payload.coverage_scope;
        plan.has_co_payment = payload.has_co_payment;
        plan.has_eligibility_check = Some(payload.has_eligibility_check);
        plan.co_payment_image_url = Some(payload.co_payment_image_url.clone());

        state.write_children(id, payload)?;
        state.reconcile_co_payments(id, &payload.co_payments)?;
        debug!(plan_id = id, "Plan replaced");
        Ok(state.plan_mut(id)?.clone())
    }

    async fn delete_plan(&self, id: i64) -> Result<()> {
        self.state
            .write()
            .plans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found(PLAN_NOT_FOUND))
    }

    async fn delete_co_payment(&self, plan_id: i64, co_payment_id: i64) -> Result<()> {
        let mut state = self.state.write();
        let plan = state
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| CatalogError::not_found("Coparticipação não encontrada"))?;

        let before = plan.co_payments.len();
        plan.co_payments.retain(|co_payment| co_payment.id != Some(co_payment_id));
        if plan.co_payments.len() == before {
            return Err(CatalogError::not_found("Coparticipação não encontrada"));
        }
        Ok(())
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<QuoteResult>> {
        let state = self.state.read();
        let plans: Vec<Plan> = state.plans.values().cloned().collect();
        let operators: Vec<Operator> = state.operators.values().cloned().collect();
        quote_catalog(&plans, &operators, request)
    }

    async fn quote_pdf(&self, _request: &QuoteRequest) -> Result<Vec<u8>> {
        Err(CatalogError::Unsupported(
            "PDF generation requires the catalog server".to_string(),
        ))
    }
}
