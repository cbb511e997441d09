use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Health-insurance operator ("operadora")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// Link to the operator's accredited network listing
    #[serde(rename = "rede_credenciada_url", default)]
    pub accredited_network_url: Option<String>,
}

/// Body of operator create/update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "rede_credenciada_url", default)]
    pub accredited_network_url: Option<String>,
}

impl From<&Operator> for OperatorInput {
    fn from(operator: &Operator) -> Self {
        Self {
            name: operator.name.clone(),
            accredited_network_url: operator.accredited_network_url.clone(),
        }
    }
}

/// Plan as returned by the backend (read shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "operadora_id", default)]
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
    pub has_eligibility_check: Option<bool>,
    #[serde(rename = "imagem_coparticipacao_url", default)]
    pub co_payment_image_url: Option<String>,
    /// Read responses call the price bands `faixas`
    #[serde(rename = "faixas", default)]
    pub price_bands: Vec<PriceBand>,
    #[serde(rename = "hospitais", default)]
    pub hospitals: Vec<Hospital>,
    #[serde(rename = "carencias", default)]
    pub waiting_periods: Vec<WaitingPeriod>,
    #[serde(rename = "coparticipacoes", default)]
    pub co_payments: Vec<CoPayment>,
    #[serde(rename = "municipios", default)]
    pub municipalities: Vec<Municipality>,
}

/// Price tier keyed by an age range label such as `"00-18"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    #[serde(rename = "faixa_etaria")]
    pub age_range: String,
    #[serde(rename = "valor")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "endereco", default)]
    pub address: Option<String>,
}

/// Waiting period ("carência")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingPeriod {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "dias")]
    pub days: u32,
}

/// Co-payment rule ("coparticipação")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoPayment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    /// Denormalised contract type label (PF, PJ, Adesão)
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
pub struct Municipality {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
}

/// Contract type ("tipo de contratação")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "PF")]
    Individual,
    #[serde(rename = "PJ")]
    Corporate,
    #[serde(rename = "Adesão")]
    Affiliation,
}

/// Accommodation ("acomodação")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accommodation {
    #[serde(rename = "Enfermaria")]
    Ward,
    #[serde(rename = "Apartamento")]
    PrivateRoom,
    #[serde(rename = "Semi-privativo")]
    SemiPrivate,
}

/// Geographic coverage ("abrangência")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageScope {
    #[serde(rename = "Nacional")]
    National,
    #[serde(rename = "Regional")]
    Regional,
    #[serde(rename = "Local")]
    Local,
}

impl ContractType {
    /// Wire label
    pub fn as_str(self) -> &'static str {
        match self {
            ContractType::Individual => "PF",
            ContractType::Corporate => "PJ",
            ContractType::Affiliation => "Adesão",
        }
    }
}

impl Accommodation {
    pub fn as_str(self) -> &'static str {
        match self {
            Accommodation::Ward => "Enfermaria",
            Accommodation::PrivateRoom => "Apartamento",
            Accommodation::SemiPrivate => "Semi-privativo",
        }
    }
}

impl CoverageScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverageScope::National => "Nacional",
            CoverageScope::Regional => "Regional",
            CoverageScope::Local => "Local",
        }
    }
}

/// Lower-cased label with Portuguese accents folded, for lenient matching
fn fold(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace('ã', "a")
        .replace('á', "a")
        .replace('í', "i")
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "pf" | "individual" => Ok(ContractType::Individual),
            "pj" | "corporate" => Ok(ContractType::Corporate),
            "adesao" | "affiliation" => Ok(ContractType::Affiliation),
            _ => Err(format!("unknown contract type: {s} (expected PF, PJ or Adesão)")),
        }
    }
}

impl FromStr for Accommodation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "enfermaria" | "ward" => Ok(Accommodation::Ward),
            "apartamento" | "private-room" => Ok(Accommodation::PrivateRoom),
            "semi-privativo" | "semi-private" => Ok(Accommodation::SemiPrivate),
            _ => Err(format!(
                "unknown accommodation: {s} (expected Enfermaria, Apartamento or Semi-privativo)"
            )),
        }
    }
}

impl FromStr for CoverageScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "nacional" | "national" => Ok(CoverageScope::National),
            "regional" => Ok(CoverageScope::Regional),
            "local" => Ok(CoverageScope::Local),
            _ => Err(format!("unknown coverage scope: {s} (expected Nacional, Regional or Local)")),
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Accommodation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CoverageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
