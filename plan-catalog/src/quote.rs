//! Age-band quoting
//!
//! A quote prices every beneficiary age against the plan's price bands and
//! keeps only plans that cover all of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use error_common::{CatalogError, Result};

use crate::models::{CoPayment, Hospital, Municipality, Operator, Plan, WaitingPeriod};
use crate::pricing::deserialize_lenient;

/// Upper bound used for open-ended bands such as `"59-+"`
pub const OPEN_ENDED_MAX_AGE: u32 = 999;

/// Body of `POST /cotacao/` and `POST /cotacao/pdf`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    #[serde(rename = "idades")]
    pub ages: Vec<u32>,
    #[serde(rename = "operadora_id", default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<i64>,
    /// Case-insensitive prefix of the contract type label
    #[serde(rename = "tipo_contratacao", default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(rename = "acomodacao", default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,
    #[serde(rename = "abrangencia", default, skip_serializing_if = "Option::is_none")]
    pub coverage_scope: Option<String>,
    #[serde(rename = "elegibilidade", default, skip_serializing_if = "Option::is_none")]
    pub has_eligibility_check: Option<bool>,
    #[serde(rename = "coparticipacao", default, skip_serializing_if = "Option::is_none")]
    pub has_co_payment: Option<bool>,
    /// Only honoured by the PDF endpoint
    #[serde(rename = "plano_id", default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i64>,
    #[serde(rename = "desconto_percentual", default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
}

impl QuoteRequest {
    pub fn for_ages(ages: Vec<u32>) -> Self {
        Self {
            ages,
            ..Self::default()
        }
    }

    /// Whether `plan` passes every filter set on the request
    pub fn matches(&self, plan: &Plan) -> bool {
        if self.operator_id.is_some() && plan.operator_id != self.operator_id {
            return false;
        }
        if !prefix_matches(self.contract_type.as_deref(), plan.contract_type.as_str())
            || !prefix_matches(self.accommodation.as_deref(), plan.accommodation.as_str())
            || !prefix_matches(self.coverage_scope.as_deref(), plan.coverage_scope.as_str())
        {
            return false;
        }
        if let Some(wanted) = self.has_eligibility_check {
            if plan.has_eligibility_check != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = self.has_co_payment {
            if plan.has_co_payment != wanted {
                return false;
            }
        }
        true
    }
}

/// Empty filters match everything
fn prefix_matches(filter: Option<&str>, label: &str) -> bool {
    match filter {
        Some(prefix) if !prefix.is_empty() => {
            label.to_lowercase().starts_with(&prefix.to_lowercase())
        }
        _ => true,
    }
}

/// Priced beneficiary line of a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    #[serde(rename = "idade")]
    pub age: u32,
    #[serde(rename = "faixa_etaria_usada", default)]
    pub age_range_used: String,
    #[serde(rename = "valor", default, deserialize_with = "deserialize_lenient")]
    pub value: Decimal,
}

/// One priced plan returned by the quote endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    #[serde(rename = "plano_id", default)]
    pub plan_id: Option<i64>,
    #[serde(rename = "operadora", default)]
    pub operator: String,
    #[serde(rename = "plano", default)]
    pub plan: String,
    #[serde(rename = "preco_total", default, deserialize_with = "deserialize_lenient")]
    pub total_price: Decimal,
    #[serde(rename = "beneficiarios", default)]
    pub beneficiaries: Vec<Beneficiary>,
    #[serde(rename = "imagem_coparticipacao_url", default)]
    pub co_payment_image_url: Option<String>,
    #[serde(rename = "hospitais", default)]
    pub hospitals: Vec<Hospital>,
    #[serde(rename = "carencias", default)]
    pub waiting_periods: Vec<WaitingPeriod>,
    #[serde(rename = "coparticipacoes", default)]
    pub co_payments: Vec<CoPayment>,
    #[serde(rename = "municipios", default)]
    pub municipalities: Vec<Municipality>,
    #[serde(rename = "rede_credenciada_url", default)]
    pub accredited_network_url: Option<String>,
}

/// Inclusive age interval parsed from a band label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub min: u32,
    pub max: u32,
}

impl AgeBand {
    /// Parse `"00-18"`, `"59-+"` or `"59+"`; whitespace is ignored.
    ///
    /// Returns `None` for anything else, so malformed labels never match.
    pub fn parse(label: &str) -> Option<Self> {
        let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();

        let (min, max) = match compact.split_once('-') {
            Some(parts) => parts,
            None => (compact.strip_suffix('+')?, "+"),
        };
        if max.contains('-') {
            return None;
        }

        let min = min.parse().ok()?;
        let max = if max.contains('+') {
            OPEN_ENDED_MAX_AGE
        } else {
            max.parse().ok()?
        };
        Some(Self { min, max })
    }

    pub fn contains(&self, age: u32) -> bool {
        self.min <= age && age <= self.max
    }
}

/// Price one plan for the given ages.
///
/// The first band containing an age wins; `None` when any age is uncovered.
pub fn quote_plan(plan: &Plan, operator: Option<&Operator>, ages: &[u32]) -> Option<QuoteResult> {
    let mut total = Decimal::ZERO;
    let mut beneficiaries = Vec::with_capacity(ages.len());

    for &age in ages {
        let band = plan
            .price_bands
            .iter()
            .find(|band| AgeBand::parse(&band.age_range).is_some_and(|range| range.contains(age)))?;

        total = total.saturating_add(band.value);
        beneficiaries.push(Beneficiary {
            age,
            age_range_used: band.age_range.clone(),
            value: band.value,
        });
    }

    Some(QuoteResult {
        plan_id: Some(plan.id),
        operator: operator.map_or_else(|| "N/A".to_string(), |op| op.name.clone()),
        plan: plan.name.clone(),
        total_price: total.round_dp(2),
        beneficiaries,
        co_payment_image_url: plan.co_payment_image_url.clone(),
        hospitals: plan.hospitals.clone(),
        waiting_periods: plan.waiting_periods.clone(),
        co_payments: plan.co_payments.clone(),
        municipalities: plan.municipalities.clone(),
        accredited_network_url: operator.and_then(|op| op.accredited_network_url.clone()),
    })
}

/// Quote every plan of a catalog that passes the request filters
pub fn quote_catalog(
    plans: &[Plan],
    operators: &[Operator],
    request: &QuoteRequest,
) -> Result<Vec<QuoteResult>> {
    if request.ages.is_empty() {
        return Err(CatalogError::validation("Lista de idades vazia"));
    }

    let results = plans
        .iter()
        .filter(|plan| request.matches(plan))
        .filter_map(|plan| {
            let operator = plan
                .operator_id
                .and_then(|id| operators.iter().find(|operator| operator.id == id));
            quote_plan(plan, operator, &request.ages)
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Accommodation, ContractType, CoverageScope, PriceBand};
    use rust_decimal_macros::dec;

    fn band(label: &str, value: Decimal) -> PriceBand {
        PriceBand {
            age_range: label.to_string(),
            value,
        }
    }

    fn plan(id: i64, operator_id: Option<i64>, bands: Vec<PriceBand>) -> Plan {
        Plan {
            id,
            name: format!("Plano {id}"),
            operator_id,
            contract_type: ContractType::Corporate,
            accommodation: Accommodation::Ward,
            coverage_scope: CoverageScope::Regional,
            has_co_payment: false,
            has_eligibility_check: None,
            co_payment_image_url: None,
            price_bands: bands,
            hospitals: Vec::new(),
            waiting_periods: Vec::new(),
            co_payments: Vec::new(),
            municipalities: Vec::new(),
        }
    }

    #[test]
    fn test_age_band_parse() {
        assert_eq!(AgeBand::parse("00-18"), Some(AgeBand { min: 0, max: 18 }));
        assert_eq!(AgeBand::parse(" 19 - 23 "), Some(AgeBand { min: 19, max: 23 }));
        assert_eq!(AgeBand::parse("59-+"), Some(AgeBand { min: 59, max: OPEN_ENDED_MAX_AGE }));
        assert_eq!(AgeBand::parse("59+"), Some(AgeBand { min: 59, max: OPEN_ENDED_MAX_AGE }));
        assert_eq!(AgeBand::parse("abc"), None);
        assert_eq!(AgeBand::parse("10-20-30"), None);
        assert_eq!(AgeBand::parse(""), None);
    }

    #[test]
    fn test_first_matching_band_wins() {
        let plan = plan(1, None, vec![band("00-30", dec!(100)), band("18-40", dec!(200))]);
        let quote = quote_plan(&plan, None, &[20]).unwrap();
        assert_eq!(quote.total_price, dec!(100));
        assert_eq!(quote.beneficiaries[0].age_range_used, "00-30");
        assert_eq!(quote.operator, "N/A");
    }

    #[test]
    fn test_uncovered_age_excludes_plan() {
        let plan = plan(1, None, vec![band("00-18", dec!(100))]);
        assert!(quote_plan(&plan, None, &[10, 45]).is_none());
    }

    #[test]
    fn test_quote_catalog_filters() {
        let operators = vec![Operator {
            id: 1,
            name: "Unimed".to_string(),
            accredited_network_url: Some("https://rede.unimed".to_string()),
        }];
        let mut with_co_payment = plan(2, Some(1), vec![band("00-+", dec!(99.999))]);
        with_co_payment.has_co_payment = true;
        let plans = vec![plan(1, Some(1), vec![band("00-+", dec!(50))]), with_co_payment];

        let mut request = QuoteRequest::for_ages(vec![30]);
        request.contract_type = Some("pj".to_string());
        request.has_co_payment = Some(true);

        let results = quote_catalog(&plans, &operators, &request).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].plan_id, Some(2));
        assert_eq!(results[0].operator, "Unimed");
        assert_eq!(results[0].total_price, dec!(100.00));
        assert_eq!(results[0].accredited_network_url.as_deref(), Some("https://rede.unimed"));

        request.accommodation = Some("Apart".to_string());
        assert!(quote_catalog(&plans, &operators, &request).unwrap().is_empty());
    }

    #[test]
    fn test_eligibility_filter_excludes_unset() {
        let plans = vec![plan(1, None, vec![band("00-+", dec!(10))])];
        let mut request = QuoteRequest::for_ages(vec![1]);
        request.has_eligibility_check = Some(false);
        assert!(quote_catalog(&plans, &[], &request).unwrap().is_empty());
    }

    #[test]
    fn test_empty_ages_rejected() {
        let err = quote_catalog(&[], &[], &QuoteRequest::default()).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Lista de idades vazia");
    }

    #[test]
    fn test_request_omits_unset_filters() {
        let body = serde_json::to_value(QuoteRequest::for_ages(vec![30, 5])).unwrap();
        assert_eq!(body, serde_json::json!({"idades": [30, 5]}));
    }
}
