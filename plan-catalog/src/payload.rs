use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use error_common::{CatalogError, Result};

use crate::models::{
    Accommodation, CoPayment, ContractType, CoverageScope, Hospital, Municipality, Plan, PriceBand,
    WaitingPeriod,
};

/// Plan create/update body (write shape).
///
/// Differs from [`Plan`]: price bands travel as `faixas_preco`, waiting periods
/// lose their ids, and nullable scalars are sent as concrete values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPayload {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "operadora_id")]
    pub operator_id: Option<i64>,
    #[serde(rename = "tipo_contratacao")]
    pub contract_type: ContractType,
    #[serde(rename = "acomodacao")]
    pub accommodation: Accommodation,
    #[serde(rename = "abrangencia")]
    pub coverage_scope: CoverageScope,
    #[serde(rename = "coparticipacao")]
    pub has_co_payment: bool,
    #[serde(rename = "elegibilidade", default)]
    pub has_eligibility_check: bool,
    #[serde(rename = "imagem_coparticipacao_url", default)]
    pub co_payment_image_url: String,
    #[serde(rename = "faixas_preco", default)]
    pub price_bands: Vec<PriceBand>,
    #[serde(rename = "hospitais", default)]
    pub hospitals: Vec<HospitalEntry>,
    #[serde(rename = "carencias", default)]
    pub waiting_periods: Vec<WaitingPeriodEntry>,
    #[serde(rename = "coparticipacoes", default)]
    pub co_payments: Vec<CoPaymentEntry>,
    #[serde(rename = "municipios", default)]
    pub municipalities: Vec<MunicipalityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalEntry {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "endereco", default)]
    pub address: String,
}

/// Waiting period as written back; the backend never receives its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingPeriodEntry {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "dias")]
    pub days: u32,
}

/// Co-payment as written back.
///
/// The id is what lets the backend update a row in place instead of
/// recreating it; a missing id means "create".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoPaymentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "tipo_plano", default)]
    pub plan_type: Option<String>,
    #[serde(rename = "imagem_url", default)]
    pub image_url: Option<String>,
    #[serde(rename = "tipo_servico", default)]
    pub service_type: Option<String>,
    #[serde(rename = "percentual", default)]
    pub percentage: Option<Decimal>,
    #[serde(rename = "valor_minimo", default)]
    pub min_value: Option<Decimal>,
    #[serde(rename = "valor_maximo", default)]
    pub max_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityEntry {
    #[serde(rename = "nome")]
    pub name: String,
}

impl From<&Hospital> for HospitalEntry {
    fn from(hospital: &Hospital) -> Self {
        Self {
            name: hospital.name.clone(),
            address: hospital.address.clone().unwrap_or_default(),
        }
    }
}

impl From<&WaitingPeriod> for WaitingPeriodEntry {
    fn from(period: &WaitingPeriod) -> Self {
        Self {
            description: period.description.clone(),
            days: period.days,
        }
    }
}

impl From<&CoPayment> for CoPaymentEntry {
    fn from(co_payment: &CoPayment) -> Self {
        Self {
            id: co_payment.id,
            name: co_payment.name.clone(),
            plan_type: co_payment.plan_type.clone(),
            image_url: co_payment.image_url.clone(),
            service_type: co_payment.service_type.clone(),
            percentage: co_payment.percentage,
            min_value: co_payment.min_value,
            max_value: co_payment.max_value,
        }
    }
}

impl From<&Municipality> for MunicipalityEntry {
    fn from(municipality: &Municipality) -> Self {
        Self {
            name: municipality.name.clone(),
        }
    }
}

impl PlanPayload {
    /// Rebuild the write shape of a plan, field by field.
    pub fn from_record(plan: &Plan) -> Self {
        Self {
            name: plan.name.clone(),
            operator_id: plan.operator_id,
            contract_type: plan.contract_type,
            accommodation: plan.accommodation,
            coverage_scope: plan.coverage_scope,
            has_co_payment: plan.has_co_payment,
            has_eligibility_check: plan.has_eligibility_check.unwrap_or(false),
            co_payment_image_url: plan.co_payment_image_url.clone().unwrap_or_default(),
            price_bands: plan
                .price_bands
                .iter()
                .map(|band| PriceBand {
                    age_range: band.age_range.clone(),
                    value: band.value,
                })
                .collect(),
            hospitals: plan.hospitals.iter().map(HospitalEntry::from).collect(),
            waiting_periods: plan.waiting_periods.iter().map(WaitingPeriodEntry::from).collect(),
            co_payments: plan.co_payments.iter().map(CoPaymentEntry::from).collect(),
            municipalities: plan.municipalities.iter().map(MunicipalityEntry::from).collect(),
        }
    }

    /// Checks applied to plans entered by an operator before create/update.
    ///
    /// Sub-list edits skip this: they must round-trip whatever the backend
    /// already stores.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::validation("Nome do plano é obrigatório"));
        }
        if self.operator_id.is_none() {
            return Err(CatalogError::validation("Operadora é obrigatória"));
        }
        if self.price_bands.is_empty() {
            return Err(CatalogError::validation("Informe ao menos uma faixa de preço"));
        }
        if let Some(band) = self.price_bands.iter().find(|band| band.value.is_sign_negative()) {
            return Err(CatalogError::validation(format!(
                "Valor negativo na faixa {}",
                band.age_range
            )));
        }

        for co_payment in &self.co_payments {
            let amounts = [co_payment.percentage, co_payment.min_value, co_payment.max_value];
            if amounts.iter().flatten().any(Decimal::is_sign_negative) {
                return Err(CatalogError::validation(format!(
                    "Valores negativos na coparticipação {}",
                    co_payment.name.as_deref().unwrap_or("sem nome")
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stored_plan() -> Plan {
        Plan {
            id: 10,
            name: "Master PJ".to_string(),
            operator_id: Some(1),
            contract_type: ContractType::Corporate,
            accommodation: Accommodation::PrivateRoom,
            coverage_scope: CoverageScope::National,
            has_co_payment: true,
            has_eligibility_check: None,
            co_payment_image_url: None,
            price_bands: vec![PriceBand {
                age_range: "00-18".to_string(),
                value: dec!(150),
            }],
            hospitals: vec![Hospital {
                id: Some(1),
                name: "Hospital Central".to_string(),
                address: None,
            }],
            waiting_periods: vec![WaitingPeriod {
                id: Some(2),
                description: "Parto".to_string(),
                days: 300,
            }],
            co_payments: vec![CoPayment {
                id: Some(3),
                name: Some("Consulta".to_string()),
                plan_type: Some("PJ".to_string()),
                image_url: Some("https://img/copart.png".to_string()),
                service_type: Some("Consulta".to_string()),
                percentage: Some(dec!(30)),
                min_value: None,
                max_value: Some(dec!(80)),
            }],
            municipalities: vec![Municipality {
                id: Some(4),
                name: "Olinda".to_string(),
            }],
        }
    }

    #[test]
    fn test_from_record_write_shape() {
        let payload = PlanPayload::from_record(&stored_plan());
        let body = serde_json::to_value(&payload).unwrap();

        assert_eq!(body["elegibilidade"], false);
        assert_eq!(body["imagem_coparticipacao_url"], "");
        assert_eq!(body["faixas_preco"][0]["faixa_etaria"], "00-18");
        assert_eq!(
            body["hospitais"][0],
            serde_json::json!({"nome": "Hospital Central", "endereco": ""})
        );
        assert_eq!(body["carencias"][0], serde_json::json!({"descricao": "Parto", "dias": 300}));
        assert_eq!(body["coparticipacoes"][0]["id"], 3);
        assert_eq!(body["coparticipacoes"][0]["tipo_plano"], "PJ");
        assert!(body["coparticipacoes"][0]["valor_minimo"].is_null());
        assert_eq!(body["municipios"][0], serde_json::json!({"nome": "Olinda"}));
        assert!(body.get("faixas").is_none());
    }

    #[test]
    fn test_new_co_payment_omits_id() {
        let entry = CoPaymentEntry {
            name: Some("Exame".to_string()),
            ..CoPaymentEntry::default()
        };
        let body = serde_json::to_value(&entry).unwrap();
        assert!(body.get("id").is_none());
        assert!(body["percentual"].is_null());
    }

    #[test]
    fn test_validate() {
        let mut payload = PlanPayload::from_record(&stored_plan());
        assert!(payload.validate().is_ok());

        payload.price_bands.clear();
        assert!(matches!(payload.validate(), Err(CatalogError::Validation(_))));

        let mut payload = PlanPayload::from_record(&stored_plan());
        payload.co_payments[0].min_value = Some(dec!(-1));
        assert!(payload.validate().is_err());
    }
}
