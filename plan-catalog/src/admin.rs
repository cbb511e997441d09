//! Administrative session over a catalog backend
//!
//! Holds the cached operator and plan lists plus the transient banner shown
//! after every action. Each mutation clears the banner, runs against the
//! backend, then either reports success and refetches the affected list or
//! reports the failure and leaves the caches untouched.

use tracing::{info, warn};

use error_common::{log_error, CatalogError, Result};

use crate::backend::{CatalogBackend, OperatorFilter, PlanFilter};
use crate::models::{CoPayment, Operator, OperatorInput, Plan, WaitingPeriod};
use crate::payload::{PlanPayload, WaitingPeriodEntry};
use crate::quote::{QuoteRequest, QuoteResult};
use crate::sync::{apply_sub_list_edit, EditAction, ListEdit, SubList, SubListEdit};

/// Outcome message of the last action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Warning(String),
    Error(String),
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Banner::Success(message) | Banner::Warning(message) | Banner::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Banner::Error(_))
    }
}

/// Result of a sub-list edit request
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The plan was written back; carries the backend's view of it
    Applied(Plan),
    /// The plan is not in the cached plan list, nothing was sent
    PlanNotCached,
}

/// Success message and failure fallback of a sub-list edit
fn edit_messages(edit: &SubListEdit) -> (&'static str, &'static str) {
    match (edit.kind(), edit.action()) {
        (SubList::WaitingPeriods, EditAction::Add) => {
            ("Carência adicionada com sucesso!", "Erro ao adicionar carência")
        }
        (SubList::WaitingPeriods, EditAction::Update) => {
            ("Carência atualizada com sucesso!", "Erro ao atualizar carência")
        }
        (SubList::WaitingPeriods, EditAction::Delete) => {
            ("Carência removida com sucesso!", "Erro ao deletar carência")
        }
        (SubList::CoPayments, EditAction::Add) => {
            ("Coparticipação adicionada com sucesso!", "Erro ao adicionar coparticipação")
        }
        (SubList::CoPayments, EditAction::Update) => {
            ("Coparticipação atualizada com sucesso!", "Erro ao atualizar coparticipação")
        }
        (SubList::CoPayments, EditAction::Delete) => {
            ("Coparticipação removida com sucesso!", "Erro ao deletar coparticipação")
        }
        (SubList::Hospitals, EditAction::Add) => {
            ("Hospital adicionado com sucesso!", "Erro ao adicionar hospital")
        }
        (SubList::Hospitals, EditAction::Update) => {
            ("Hospital atualizado com sucesso!", "Erro ao atualizar hospital")
        }
        (SubList::Hospitals, EditAction::Delete) => {
            ("Hospital removido com sucesso!", "Erro ao deletar hospital")
        }
        (SubList::Municipalities, EditAction::Add) => {
            ("Município adicionado com sucesso!", "Erro ao adicionar município")
        }
        (SubList::Municipalities, EditAction::Update) => {
            ("Município atualizado com sucesso!", "Erro ao atualizar município")
        }
        (SubList::Municipalities, EditAction::Delete) => {
            ("Município removido com sucesso!", "Erro ao deletar município")
        }
        (SubList::PriceBands, EditAction::Add) => {
            ("Faixa de preço adicionada com sucesso!", "Erro ao adicionar faixa de preço")
        }
        (SubList::PriceBands, EditAction::Update) => {
            ("Faixa de preço atualizada com sucesso!", "Erro ao atualizar faixa de preço")
        }
        (SubList::PriceBands, EditAction::Delete) => {
            ("Faixa de preço removida com sucesso!", "Erro ao deletar faixa de preço")
        }
    }
}

/// Admin state for one operator working against one backend
pub struct AdminSession<B> {
    backend: B,
    operators: Vec<Operator>,
    plans: Vec<Plan>,
    selected_plan: Option<i64>,
    waiting_periods: Vec<WaitingPeriod>,
    co_payments: Vec<CoPayment>,
    banner: Option<Banner>,
}

impl<B: CatalogBackend> AdminSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            operators: Vec::new(),
            plans: Vec::new(),
            selected_plan: None,
            waiting_periods: Vec::new(),
            co_payments: Vec::new(),
            banner: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Plan whose sub-lists were last loaded
    pub fn selected_plan(&self) -> Option<i64> {
        self.selected_plan
    }

    pub fn waiting_periods(&self) -> &[WaitingPeriod] {
        &self.waiting_periods
    }

    pub fn co_payments(&self) -> &[CoPayment] {
        &self.co_payments
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    /// Record the outcome of an action in the banner
    fn settle<T>(
        &mut self,
        context: &str,
        result: Result<T>,
        success: Option<&str>,
        fallback: &str,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                if let Some(message) = success {
                    info!(context, "{message}");
                    self.banner = Some(Banner::Success(message.to_string()));
                }
                Ok(value)
            }
            Err(err) => {
                log_error(context, &err);
                self.banner = Some(Banner::Error(err.user_message(fallback)));
                Err(err)
            }
        }
    }

    fn load_failed(&mut self, context: &str, what: &str, err: &CatalogError) {
        log_error(context, err);
        let fallback = format!("Erro ao carregar {what}");
        let message = err.user_message(&fallback);
        self.banner = Some(Banner::Error(format!("{fallback}: {message}")));
    }

    pub async fn refresh_operators(&mut self) -> Result<&[Operator]> {
        match self.backend.list_operators(&OperatorFilter::default()).await {
            Ok(operators) => {
                self.operators = operators;
                Ok(&self.operators)
            }
            Err(err) => {
                self.load_failed("refresh_operators", "operadoras", &err);
                Err(err)
            }
        }
    }

    pub async fn refresh_plans(&mut self, filter: &PlanFilter) -> Result<&[Plan]> {
        match self.backend.list_plans(filter).await {
            Ok(plans) => {
                self.plans = plans;
                Ok(&self.plans)
            }
            Err(err) => {
                self.load_failed("refresh_plans", "planos", &err);
                Err(err)
            }
        }
    }

    /// Refetch after a successful mutation; a failure is logged and the
    /// success banner is kept
    async fn refetch_operators(&mut self) {
        match self.backend.list_operators(&OperatorFilter::default()).await {
            Ok(operators) => self.operators = operators,
            Err(err) => log_error("refetch_operators", &err),
        }
    }

    async fn refetch_plans(&mut self) {
        match self.backend.list_plans(&PlanFilter::default()).await {
            Ok(plans) => self.plans = plans,
            Err(err) => log_error("refetch_plans", &err),
        }
    }

    pub async fn create_operator(&mut self, input: &OperatorInput) -> Result<Operator> {
        self.banner = None;
        let result = self.backend.create_operator(input).await;
        let operator = self.settle(
            "create_operator",
            result,
            Some("Operadora criada com sucesso!"),
            "Erro ao criar operadora",
        )?;
        self.refetch_operators().await;
        Ok(operator)
    }

    pub async fn update_operator(&mut self, id: i64, input: &OperatorInput) -> Result<Operator> {
        self.banner = None;
        let result = self.backend.update_operator(id, input).await;
        let operator = self.settle(
            "update_operator",
            result,
            Some("Operadora atualizada com sucesso!"),
            "Erro ao atualizar operadora",
        )?;
        self.refetch_operators().await;
        Ok(operator)
    }

    pub async fn delete_operator(&mut self, id: i64) -> Result<()> {
        self.banner = None;
        let result = self.backend.delete_operator(id).await;
        self.settle(
            "delete_operator",
            result,
            Some("Operadora removida com sucesso!"),
            "Erro ao deletar operadora",
        )?;
        self.refetch_operators().await;
        self.refetch_plans().await;
        Ok(())
    }

    /// Create (`id == None`) or fully replace a plan entered by the operator
    pub async fn save_plan(&mut self, id: Option<i64>, payload: &PlanPayload) -> Result<Plan> {
        self.banner = None;
        if let Err(err) = payload.validate() {
            return self.settle("save_plan", Err(err), None, "Erro ao salvar plano");
        }

        let (result, success) = match id {
            Some(id) => (self.backend.update_plan(id, payload).await, "Plano atualizado!"),
            None => (self.backend.create_plan(payload).await, "Plano criado!"),
        };
        let plan = self.settle("save_plan", result, Some(success), "Erro ao salvar plano")?;
        self.refetch_plans().await;
        Ok(plan)
    }

    pub async fn delete_plan(&mut self, id: i64) -> Result<()> {
        self.banner = None;
        let result = self.backend.delete_plan(id).await;
        self.settle(
            "delete_plan",
            result,
            Some("Plano removido com sucesso!"),
            "Erro ao deletar plano",
        )?;
        if self.selected_plan == Some(id) {
            self.selected_plan = None;
            self.waiting_periods.clear();
            self.co_payments.clear();
        }
        self.refetch_plans().await;
        Ok(())
    }

    /// Fetch one plan and expose its waiting periods and co-payments
    pub async fn load_sub_lists(&mut self, plan_id: i64) -> Result<Plan> {
        match self.backend.get_plan(plan_id).await {
            Ok(plan) => {
                self.select(&plan);
                Ok(plan)
            }
            Err(err) => {
                self.load_failed("load_sub_lists", "plano", &err);
                Err(err)
            }
        }
    }

    fn select(&mut self, plan: &Plan) {
        self.selected_plan = Some(plan.id);
        self.waiting_periods.clone_from(&plan.waiting_periods);
        self.co_payments.clone_from(&plan.co_payments);
        if let Some(cached) = self.plans.iter_mut().find(|cached| cached.id == plan.id) {
            cached.clone_from(plan);
        }
    }

    /// Edit one sub-list of a cached plan through a whole-plan write.
    ///
    /// Plans missing from the cached list are not edited: the outcome is
    /// [`EditOutcome::PlanNotCached`] and a warning banner asks for a refresh.
    pub async fn edit_sub_list(
        &mut self,
        plan_id: i64,
        edit: SubListEdit,
    ) -> Result<EditOutcome> {
        self.banner = None;
        if !self.plans.iter().any(|plan| plan.id == plan_id) {
            warn!(
                plan_id,
                sub_list = edit.kind().label(),
                "Plan not in cached list, edit not sent"
            );
            self.banner = Some(Banner::Warning(format!(
                "Plano {plan_id} não está na lista carregada; \
                 atualize a lista de planos e tente novamente"
            )));
            return Ok(EditOutcome::PlanNotCached);
        }

        let (success, fallback) = edit_messages(&edit);
        let result = apply_sub_list_edit(&self.backend, plan_id, edit).await;
        let plan = self.settle("edit_sub_list", result, Some(success), fallback)?;

        match self.backend.get_plan(plan_id).await {
            Ok(fresh) => self.select(&fresh),
            Err(err) => log_error("refetch_plan", &err),
        }
        Ok(EditOutcome::Applied(plan))
    }

    /// Remove a co-payment through its own endpoint instead of a plan write
    pub async fn remove_co_payment_direct(
        &mut self,
        plan_id: i64,
        co_payment_id: i64,
    ) -> Result<()> {
        self.banner = None;
        let result = self.backend.delete_co_payment(plan_id, co_payment_id).await;
        self.settle(
            "remove_co_payment_direct",
            result,
            Some("Coparticipação removida com sucesso!"),
            "Erro ao deletar coparticipação",
        )?;
        match self.backend.get_plan(plan_id).await {
            Ok(fresh) => self.select(&fresh),
            Err(err) => log_error("refetch_plan", &err),
        }
        Ok(())
    }

    pub async fn add_waiting_period(
        &mut self,
        plan_id: i64,
        description: &str,
        days: u32,
    ) -> Result<EditOutcome> {
        let entry = WaitingPeriodEntry {
            description: description.to_string(),
            days,
        };
        self.edit_sub_list(plan_id, SubListEdit::WaitingPeriods(ListEdit::Add(entry)))
            .await
    }

    pub async fn quote(&mut self, request: &QuoteRequest) -> Result<Vec<QuoteResult>> {
        self.banner = None;
        let result = self.backend.quote(request).await;
        self.settle("quote", result, None, "Erro ao calcular cotação")
    }

    pub async fn quote_pdf(&mut self, request: &QuoteRequest) -> Result<Vec<u8>> {
        self.banner = None;
        let result = self.backend.quote_pdf(request).await;
        self.settle("quote_pdf", result, None, "Erro ao gerar PDF")
    }
}
