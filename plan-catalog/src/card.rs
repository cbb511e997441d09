//! Text rendering of a quote result
//!
//! Mirrors the product's result card: header with operator and total, and an
//! expandable body with the per-beneficiary breakdown and plan details.

use std::fmt;

use rust_decimal::Decimal;

use crate::models::CoPayment;
use crate::pricing::{
    compute_discounted_value, compute_total, format_amount, format_dot, DiscountSettings,
};
use crate::quote::{QuoteRequest, QuoteResult};

/// Display state of one quote card; the discount is per card
#[derive(Debug, Clone)]
pub struct QuoteCard<'a> {
    pub quote: &'a QuoteResult,
    pub discount: DiscountSettings,
    pub expanded: bool,
}

impl<'a> QuoteCard<'a> {
    pub fn new(quote: &'a QuoteResult) -> Self {
        Self {
            quote,
            discount: DiscountSettings::default(),
            expanded: false,
        }
    }

    #[must_use]
    pub fn with_discount(mut self, discount: DiscountSettings) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Total after the per-beneficiary discount
    pub fn discounted_total(&self) -> Decimal {
        compute_total(self.quote, self.discount)
    }

    /// Request for the PDF of this card's plan, carrying the active discount
    pub fn pdf_request(&self, base: &QuoteRequest) -> QuoteRequest {
        QuoteRequest {
            plan_id: self.quote.plan_id.or(base.plan_id),
            discount_percent: Some(self.discount.effective_percent()),
            ..base.clone()
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    fn write_header(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "[{}]", self.quote.operator)?;
        writeln!(out, "{}", self.quote.plan)?;
        writeln!(out, "Plano de Saúde")?;
        writeln!(out, "Valor total: R$ {} por mês", format_amount(self.quote.total_price))?;
        if let Some(url) = &self.quote.accredited_network_url {
            writeln!(out, "Rede credenciada: {url}")?;
        }
        Ok(())
    }

    fn write_details(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let discount = self.discount;
        let mark = if discount.enabled { "x" } else { " " };
        writeln!(out)?;
        writeln!(
            out,
            "[{mark}] Aplicar desconto por porcentagem: {}% por vida",
            discount.percent.normalize()
        )?;

        let quote = self.quote;
        if !quote.beneficiaries.is_empty() {
            writeln!(out)?;
            writeln!(out, "{} Beneficiário(s)", quote.beneficiaries.len())?;
            for beneficiary in &quote.beneficiaries {
                if discount.is_active() {
                    let discounted = compute_discounted_value(
                        beneficiary.value,
                        discount.enabled,
                        discount.percent,
                    );
                    writeln!(
                        out,
                        "  {} anos: R$ {} -> R$ {}",
                        beneficiary.age,
                        format_amount(beneficiary.value),
                        format_amount(discounted)
                    )?;
                } else {
                    writeln!(
                        out,
                        "  {} anos: R$ {}",
                        beneficiary.age,
                        format_amount(beneficiary.value)
                    )?;
                }
            }
        }

        if !quote.hospitals.is_empty() {
            writeln!(out)?;
            writeln!(out, "Hospitais")?;
            for hospital in &quote.hospitals {
                match hospital.address.as_deref().filter(|address| !address.is_empty()) {
                    Some(address) => writeln!(out, "  - {} ({address})", hospital.name)?,
                    None => writeln!(out, "  - {}", hospital.name)?,
                }
            }
        }

        if !quote.waiting_periods.is_empty() {
            writeln!(out)?;
            writeln!(out, "Carências")?;
            for period in &quote.waiting_periods {
                writeln!(out, "  - {} dias: {}", period.days, period.description)?;
            }
        }

        if !quote.co_payments.is_empty() {
            writeln!(out)?;
            writeln!(out, "Coparticipações")?;
            for co_payment in &quote.co_payments {
                writeln!(out, "  - {}", co_payment_line(co_payment))?;
            }
        }

        if !quote.municipalities.is_empty() {
            let names: Vec<&str> = quote.municipalities.iter().map(|m| m.name.as_str()).collect();
            writeln!(out)?;
            writeln!(out, "Municípios")?;
            writeln!(out, "  {}", names.join(", "))?;
        }

        writeln!(out)?;
        writeln!(out, "Total com desconto: R$ {}", format_amount(self.discounted_total()))
    }
}

impl fmt::Display for QuoteCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        if self.expanded {
            self.write_details(f)?;
        }
        Ok(())
    }
}

/// Zero or missing amounts are left out, as in the product card
pub fn co_payment_line(co_payment: &CoPayment) -> String {
    let present = |value: Option<Decimal>| value.filter(|v| !v.is_zero());

    let mut parts = vec![co_payment.name.clone().unwrap_or_default()];
    if let Some(percentage) = present(co_payment.percentage) {
        parts.push(format!("{}%", percentage.normalize()));
    }
    if let Some(service) = co_payment.service_type.as_deref().filter(|s| !s.is_empty()) {
        parts.push(service.to_string());
    }
    if let Some(min) = present(co_payment.min_value) {
        parts.push(format!("Mín: R$ {}", format_dot(min)));
    }
    if let Some(max) = present(co_payment.max_value) {
        parts.push(format!("Máx: R$ {}", format_dot(max)));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hospital, Municipality, WaitingPeriod};
    use crate::quote::Beneficiary;
    use rust_decimal_macros::dec;

    fn sample_quote() -> QuoteResult {
        QuoteResult {
            plan_id: Some(4),
            operator: "Hapvida".to_string(),
            plan: "Nosso Plano".to_string(),
            total_price: dec!(300),
            beneficiaries: vec![
                Beneficiary {
                    age: 30,
                    age_range_used: "29-33".to_string(),
                    value: dec!(100),
                },
                Beneficiary {
                    age: 60,
                    age_range_used: "59-+".to_string(),
                    value: dec!(200),
                },
            ],
            hospitals: vec![Hospital {
                id: Some(1),
                name: "Hospital Português".to_string(),
                address: Some("Av. Portugal, 163".to_string()),
            }],
            waiting_periods: vec![WaitingPeriod {
                id: Some(1),
                description: "Parto".to_string(),
                days: 300,
            }],
            co_payments: vec![CoPayment {
                id: Some(1),
                name: Some("Consulta".to_string()),
                plan_type: None,
                image_url: None,
                service_type: Some("Eletiva".to_string()),
                percentage: Some(dec!(30)),
                min_value: Some(dec!(50)),
                max_value: None,
            }],
            municipalities: vec![
                Municipality {
                    id: Some(1),
                    name: "Recife".to_string(),
                },
                Municipality {
                    id: Some(2),
                    name: "Olinda".to_string(),
                },
            ],
            ..QuoteResult::default()
        }
    }

    #[test]
    fn test_collapsed_card_shows_header_only() {
        let quote = sample_quote();
        let text = QuoteCard::new(&quote).render();
        assert!(text.contains("[Hapvida]"));
        assert!(text.contains("Valor total: R$ 300,00 por mês"));
        assert!(!text.contains("Total com desconto"));
    }

    #[test]
    fn test_expanded_card_with_discount() {
        let quote = sample_quote();
        let text = QuoteCard::new(&quote)
            .with_discount(DiscountSettings::new(true, dec!(10)))
            .expanded(true)
            .render();

        assert!(text.contains("[x] Aplicar desconto por porcentagem: 10% por vida"));
        assert!(text.contains("2 Beneficiário(s)"));
        assert!(text.contains("30 anos: R$ 100,00 -> R$ 90,00"));
        assert!(text.contains("Hospital Português (Av. Portugal, 163)"));
        assert!(text.contains("300 dias: Parto"));
        assert!(text.contains("Consulta | 30% | Eletiva | Mín: R$ 50.00"));
        assert!(text.contains("Recife, Olinda"));
        assert!(text.contains("Total com desconto: R$ 270,00"));
        // the header total stays undiscounted
        assert!(text.contains("Valor total: R$ 300,00"));
    }

    #[test]
    fn test_out_of_range_discount_renders_zero_total() {
        let quote = sample_quote();
        let card = QuoteCard::new(&quote)
            .with_discount(DiscountSettings::from_input(true, "1e26"))
            .expanded(true);

        let text = card.render();
        assert!(text.contains("30 anos: R$ 100,00 -> R$ 0,00"));
        assert!(text.contains("Total com desconto: R$ 0,00"));
        assert_eq!(text, card.to_string());
    }

    #[test]
    fn test_pdf_request_carries_discount() {
        let quote = sample_quote();
        let base = QuoteRequest::for_ages(vec![30, 60]);

        let card = QuoteCard::new(&quote).with_discount(DiscountSettings::new(false, dec!(15)));
        let request = card.pdf_request(&base);
        assert_eq!(request.plan_id, Some(4));
        assert_eq!(request.discount_percent, Some(Decimal::ZERO));

        let card = card.with_discount(DiscountSettings::new(true, dec!(15)));
        assert_eq!(card.pdf_request(&base).discount_percent, Some(dec!(15)));
    }
}
