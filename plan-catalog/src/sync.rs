//! Read-patch-write protocol for the sub-lists embedded in a plan
//!
//! The backend has no per-item endpoints for waiting periods, hospitals,
//! municipalities or price bands, so every edit fetches the whole plan,
//! splices one list and writes the whole plan back with a single PUT.

use tracing::{debug, instrument};

use error_common::{CatalogError, Result};

use crate::backend::CatalogBackend;
use crate::models::{CoPayment, Hospital, Municipality, Plan, PriceBand, WaitingPeriod};
use crate::payload::{
    CoPaymentEntry, HospitalEntry, MunicipalityEntry, PlanPayload, WaitingPeriodEntry,
};

/// Element of a plan sub-list as it travels in the write payload
pub trait EmbeddedEntry: Sized {
    /// Element as stored on the read side
    type Record;
    /// Identity used to find the element to update or delete
    type Key: PartialEq;

    fn key_of(record: &Self::Record) -> Option<Self::Key>;

    fn from_record(record: &Self::Record) -> Self;

    /// Entry written in place of `record`
    fn updated(_record: &Self::Record, replacement: Self) -> Self {
        replacement
    }

    /// Entry appended to the list
    fn into_new(self) -> Self {
        self
    }
}

impl EmbeddedEntry for WaitingPeriodEntry {
    type Record = WaitingPeriod;
    type Key = i64;

    fn key_of(record: &WaitingPeriod) -> Option<i64> {
        record.id
    }

    fn from_record(record: &WaitingPeriod) -> Self {
        Self::from(record)
    }
}

impl EmbeddedEntry for HospitalEntry {
    type Record = Hospital;
    type Key = i64;

    fn key_of(record: &Hospital) -> Option<i64> {
        record.id
    }

    fn from_record(record: &Hospital) -> Self {
        Self::from(record)
    }
}

impl EmbeddedEntry for MunicipalityEntry {
    type Record = Municipality;
    type Key = i64;

    fn key_of(record: &Municipality) -> Option<i64> {
        record.id
    }

    fn from_record(record: &Municipality) -> Self {
        Self::from(record)
    }
}

/// Price bands have no id; the age range label is the key
impl EmbeddedEntry for PriceBand {
    type Record = PriceBand;
    type Key = String;

    fn key_of(record: &PriceBand) -> Option<String> {
        Some(record.age_range.clone())
    }

    fn from_record(record: &PriceBand) -> Self {
        record.clone()
    }
}

impl EmbeddedEntry for CoPaymentEntry {
    type Record = CoPayment;
    type Key = i64;

    fn key_of(record: &CoPayment) -> Option<i64> {
        record.id
    }

    fn from_record(record: &CoPayment) -> Self {
        Self::from(record)
    }

    /// The backend updates co-payments in place by id; the denormalised
    /// plan type and image come from the stored row
    fn updated(record: &CoPayment, replacement: Self) -> Self {
        Self {
            id: record.id,
            plan_type: record.plan_type.clone(),
            image_url: record.image_url.clone(),
            ..replacement
        }
    }

    fn into_new(self) -> Self {
        Self { id: None, ..self }
    }
}

/// One edit against a keyed list
#[derive(Debug, Clone, PartialEq)]
pub enum ListEdit<K, T> {
    Add(T),
    Update { key: K, entry: T },
    Delete { key: K },
}

/// Sub-list kinds that can be edited on a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubList {
    WaitingPeriods,
    CoPayments,
    Hospitals,
    Municipalities,
    PriceBands,
}

impl SubList {
    pub fn label(self) -> &'static str {
        match self {
            SubList::WaitingPeriods => "carências",
            SubList::CoPayments => "coparticipações",
            SubList::Hospitals => "hospitais",
            SubList::Municipalities => "municípios",
            SubList::PriceBands => "faixas de preço",
        }
    }
}

/// Edit of exactly one sub-list of a plan
#[derive(Debug, Clone, PartialEq)]
pub enum SubListEdit {
    WaitingPeriods(ListEdit<i64, WaitingPeriodEntry>),
    CoPayments(ListEdit<i64, CoPaymentEntry>),
    Hospitals(ListEdit<i64, HospitalEntry>),
    Municipalities(ListEdit<i64, MunicipalityEntry>),
    PriceBands(ListEdit<String, PriceBand>),
}

impl SubListEdit {
    pub fn kind(&self) -> SubList {
        match self {
            SubListEdit::WaitingPeriods(_) => SubList::WaitingPeriods,
            SubListEdit::CoPayments(_) => SubList::CoPayments,
            SubListEdit::Hospitals(_) => SubList::Hospitals,
            SubListEdit::Municipalities(_) => SubList::Municipalities,
            SubListEdit::PriceBands(_) => SubList::PriceBands,
        }
    }

    pub fn action(&self) -> EditAction {
        match self {
            SubListEdit::WaitingPeriods(edit) => edit.action(),
            SubListEdit::CoPayments(edit) => edit.action(),
            SubListEdit::Hospitals(edit) => edit.action(),
            SubListEdit::Municipalities(edit) => edit.action(),
            SubListEdit::PriceBands(edit) => edit.action(),
        }
    }
}

/// What a [`ListEdit`] does, without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Add,
    Update,
    Delete,
}

impl EditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EditAction::Add => "add",
            EditAction::Update => "update",
            EditAction::Delete => "delete",
        }
    }
}

impl<K, T> ListEdit<K, T> {
    pub fn action(&self) -> EditAction {
        match self {
            ListEdit::Add(_) => EditAction::Add,
            ListEdit::Update { .. } => EditAction::Update,
            ListEdit::Delete { .. } => EditAction::Delete,
        }
    }
}

/// Rebuild the list from the stored records with `edit` applied.
///
/// Order is preserved; an update or delete whose key matches nothing leaves
/// the list unchanged.
pub fn splice<E: EmbeddedEntry>(records: &[E::Record], edit: ListEdit<E::Key, E>) -> Vec<E> {
    match edit {
        ListEdit::Add(entry) => records
            .iter()
            .map(E::from_record)
            .chain(std::iter::once(entry.into_new()))
            .collect(),
        ListEdit::Update { key, entry } => {
            let mut replacement = Some(entry);
            records
                .iter()
                .map(|record| {
                    if E::key_of(record).as_ref() == Some(&key) {
                        if let Some(entry) = replacement.take() {
                            return E::updated(record, entry);
                        }
                    }
                    E::from_record(record)
                })
                .collect()
        }
        ListEdit::Delete { key } => records
            .iter()
            .filter(|record| E::key_of(record).as_ref() != Some(&key))
            .map(E::from_record)
            .collect(),
    }
}

/// Full write payload of `plan` with one sub-list edited.
///
/// Only the edited list is checked: a price-band edit may not leave the plan
/// without bands. Everything else is written back as the backend returned it.
pub fn rebuild_with_edit(plan: &Plan, edit: SubListEdit) -> Result<PlanPayload> {
    let mut payload = PlanPayload::from_record(plan);
    match edit {
        SubListEdit::WaitingPeriods(edit) => {
            payload.waiting_periods = splice(&plan.waiting_periods, edit);
        }
        SubListEdit::CoPayments(edit) => payload.co_payments = splice(&plan.co_payments, edit),
        SubListEdit::Hospitals(edit) => payload.hospitals = splice(&plan.hospitals, edit),
        SubListEdit::Municipalities(edit) => {
            payload.municipalities = splice(&plan.municipalities, edit);
        }
        SubListEdit::PriceBands(edit) => {
            payload.price_bands = splice(&plan.price_bands, edit);
            if payload.price_bands.is_empty() {
                return Err(CatalogError::validation("Informe ao menos uma faixa de preço"));
            }
        }
    }
    Ok(payload)
}

/// Fetch the plan, apply `edit` to one sub-list and write the plan back.
///
/// Returns the backend's view of the updated plan. Nothing is retried and no
/// concurrency check is made: the last whole-plan write wins.
#[instrument(
    skip(backend, edit),
    fields(sub_list = edit.kind().label(), action = edit.action().as_str())
)]
pub async fn apply_sub_list_edit<B>(backend: &B, plan_id: i64, edit: SubListEdit) -> Result<Plan>
where
    B: CatalogBackend + ?Sized,
{
    let plan = backend.get_plan(plan_id).await?;
    let payload = rebuild_with_edit(&plan, edit)?;
    debug!(
        waiting_periods = payload.waiting_periods.len(),
        co_payments = payload.co_payments.len(),
        "Writing plan back"
    );
    backend.update_plan(plan_id, &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockCatalogBackend;
    use crate::models::{Accommodation, ContractType, CoverageScope};
    use rust_decimal_macros::dec;

    fn plan() -> Plan {
        Plan {
            id: 1,
            name: "Smart 200".to_string(),
            operator_id: Some(3),
            contract_type: ContractType::Individual,
            accommodation: Accommodation::Ward,
            coverage_scope: CoverageScope::Local,
            has_co_payment: true,
            has_eligibility_check: Some(true),
            co_payment_image_url: Some("https://img/tabela.png".to_string()),
            price_bands: vec![
                PriceBand {
                    age_range: "00-18".to_string(),
                    value: dec!(120),
                },
                PriceBand {
                    age_range: "19-23".to_string(),
                    value: dec!(150),
                },
            ],
            hospitals: Vec::new(),
            waiting_periods: vec![
                WaitingPeriod {
                    id: Some(5),
                    description: "Urgência".to_string(),
                    days: 1,
                },
                WaitingPeriod {
                    id: Some(7),
                    description: "Parto".to_string(),
                    days: 300,
                },
            ],
            co_payments: vec![CoPayment {
                id: Some(9),
                name: Some("Consulta".to_string()),
                plan_type: Some("PF".to_string()),
                image_url: Some("https://img/c.png".to_string()),
                service_type: Some("Eletiva".to_string()),
                percentage: Some(dec!(30)),
                min_value: None,
                max_value: None,
            }],
            municipalities: Vec::new(),
        }
    }

    #[test]
    fn test_add_appends_without_id() {
        let payload = rebuild_with_edit(
            &plan(),
            SubListEdit::CoPayments(ListEdit::Add(CoPaymentEntry {
                id: Some(99),
                name: Some("Exame".to_string()),
                ..CoPaymentEntry::default()
            })),
        )
        .unwrap();
        assert_eq!(payload.co_payments.len(), 2);
        assert_eq!(payload.co_payments[0].id, Some(9));
        assert_eq!(payload.co_payments[1].id, None);
    }

    #[test]
    fn test_update_keeps_other_entries() {
        let edit = SubListEdit::WaitingPeriods(ListEdit::Update {
            key: 7,
            entry: WaitingPeriodEntry {
                description: "Parto".to_string(),
                days: 180,
            },
        });
        let payload = rebuild_with_edit(&plan(), edit).unwrap();
        assert_eq!(payload.waiting_periods[0].days, 1);
        assert_eq!(payload.waiting_periods[1].days, 180);
        assert_eq!(payload.price_bands.len(), 2);
    }

    #[test]
    fn test_co_payment_update_preserves_identity() {
        let edit = SubListEdit::CoPayments(ListEdit::Update {
            key: 9,
            entry: CoPaymentEntry {
                name: Some("Consulta eletiva".to_string()),
                percentage: Some(dec!(40)),
                ..CoPaymentEntry::default()
            },
        });
        let payload = rebuild_with_edit(&plan(), edit).unwrap();
        let entry = &payload.co_payments[0];
        assert_eq!(entry.id, Some(9));
        assert_eq!(entry.plan_type.as_deref(), Some("PF"));
        assert_eq!(entry.image_url.as_deref(), Some("https://img/c.png"));
        assert_eq!(entry.percentage, Some(dec!(40)));
        assert_eq!(entry.service_type, None);
    }

    #[test]
    fn test_delete_unknown_key_is_noop() {
        let original = PlanPayload::from_record(&plan());
        let edit = SubListEdit::WaitingPeriods(ListEdit::Delete { key: 404 });
        let payload = rebuild_with_edit(&plan(), edit).unwrap();
        assert_eq!(payload, original);
    }

    #[test]
    fn test_price_band_keyed_by_label() {
        let edit = SubListEdit::PriceBands(ListEdit::Update {
            key: "19-23".to_string(),
            entry: PriceBand {
                age_range: "19-23".to_string(),
                value: dec!(155.5),
            },
        });
        let payload = rebuild_with_edit(&plan(), edit).unwrap();
        assert_eq!(payload.price_bands[1].value, dec!(155.5));

        let payload = rebuild_with_edit(
            &plan(),
            SubListEdit::PriceBands(ListEdit::Delete {
                key: "00-18".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(payload.price_bands.len(), 1);
    }

    #[test]
    fn test_last_price_band_cannot_be_deleted() {
        let mut single = plan();
        single.price_bands = vec![PriceBand {
            age_range: "00-+".to_string(),
            value: dec!(300),
        }];

        let err = rebuild_with_edit(
            &single,
            SubListEdit::PriceBands(ListEdit::Delete {
                key: "00-+".to_string(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(err.user_message("ignored"), "Informe ao menos uma faixa de preço");

        // other lists may still be emptied
        let edit = SubListEdit::CoPayments(ListEdit::Delete { key: 9 });
        assert!(rebuild_with_edit(&plan(), edit).unwrap().co_payments.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_edit_is_not_written() {
        let mut backend = MockCatalogBackend::new();
        backend.expect_get_plan().times(1).returning(|_| {
            let mut single = plan();
            single.price_bands.truncate(1);
            Ok(single)
        });
        backend.expect_update_plan().never();

        let edit = SubListEdit::PriceBands(ListEdit::Delete {
            key: "00-18".to_string(),
        });
        let err = apply_sub_list_edit(&backend, 1, edit).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_edit_labels() {
        let edit = SubListEdit::Hospitals(ListEdit::Delete { key: 1 });
        assert_eq!(edit.kind().label(), "hospitais");
        assert_eq!(edit.action(), EditAction::Delete);
    }
}
