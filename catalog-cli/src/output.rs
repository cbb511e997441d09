//! Terminal rendering of catalog records and banners

use std::io::{self, Write};

use colored::Colorize;

use plan_catalog::{
    co_payment_line, format_amount, Banner, CoPayment, Operator, Plan, WaitingPeriod,
};

pub fn write_banner(out: &mut impl Write, banner: &Banner) -> io::Result<()> {
    match banner {
        Banner::Success(message) => writeln!(out, "{}", message.green()),
        Banner::Warning(message) => writeln!(out, "{}", message.yellow()),
        Banner::Error(message) => writeln!(out, "{}", message.red().bold()),
    }
}

pub fn write_operators(out: &mut impl Write, operators: &[Operator]) -> io::Result<()> {
    if operators.is_empty() {
        return writeln!(out, "Nenhuma operadora cadastrada");
    }
    for operator in operators {
        match operator.accredited_network_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                writeln!(out, "{:>4}  {}  {}", operator.id, operator.name.bold(), url.dimmed())?;
            }
            None => writeln!(out, "{:>4}  {}", operator.id, operator.name.bold())?,
        }
    }
    Ok(())
}

fn operator_name(operators: &[Operator], id: Option<i64>) -> &str {
    id.and_then(|id| operators.iter().find(|operator| operator.id == id))
        .map_or("N/A", |operator| operator.name.as_str())
}

/// One line per plan
pub fn write_plans(out: &mut impl Write, plans: &[Plan], operators: &[Operator]) -> io::Result<()> {
    if plans.is_empty() {
        return writeln!(out, "Nenhum plano encontrado");
    }
    for plan in plans {
        writeln!(
            out,
            "{:>4}  {}  [{}]  {} / {} / {}{}",
            plan.id,
            plan.name.bold(),
            operator_name(operators, plan.operator_id),
            plan.contract_type,
            plan.accommodation,
            plan.coverage_scope,
            if plan.has_co_payment { " / coparticipação" } else { "" },
        )?;
    }
    Ok(())
}

/// Every field and sub-list of one plan
pub fn write_plan_details(
    out: &mut impl Write,
    plan: &Plan,
    operators: &[Operator],
) -> io::Result<()> {
    writeln!(out, "{} (#{})", plan.name.bold(), plan.id)?;
    writeln!(out, "Operadora: {}", operator_name(operators, plan.operator_id))?;
    writeln!(out, "Contratação: {}", plan.contract_type)?;
    writeln!(out, "Acomodação: {}", plan.accommodation)?;
    writeln!(out, "Abrangência: {}", plan.coverage_scope)?;
    writeln!(out, "Coparticipação: {}", yes_no(plan.has_co_payment))?;
    writeln!(out, "Elegibilidade: {}", yes_no(plan.has_eligibility_check.unwrap_or(false)))?;

    writeln!(out)?;
    writeln!(out, "Faixas de preço")?;
    for band in &plan.price_bands {
        writeln!(out, "  {:<8} R$ {}", band.age_range, format_amount(band.value))?;
    }

    if !plan.hospitals.is_empty() {
        writeln!(out)?;
        writeln!(out, "Hospitais")?;
        for hospital in &plan.hospitals {
            let id = hospital.id.map(|id| id.to_string()).unwrap_or_default();
            match hospital.address.as_deref().filter(|address| !address.is_empty()) {
                Some(address) => writeln!(out, "  {id:>4}  {} ({address})", hospital.name)?,
                None => writeln!(out, "  {id:>4}  {}", hospital.name)?,
            }
        }
    }

    writeln!(out)?;
    write_waiting_periods(out, &plan.waiting_periods)?;
    writeln!(out)?;
    write_co_payments(out, &plan.co_payments)?;

    if !plan.municipalities.is_empty() {
        writeln!(out)?;
        writeln!(out, "Municípios")?;
        for municipality in &plan.municipalities {
            let id = municipality.id.map(|id| id.to_string()).unwrap_or_default();
            writeln!(out, "  {id:>4}  {}", municipality.name)?;
        }
    }
    Ok(())
}

pub fn write_waiting_periods(out: &mut impl Write, periods: &[WaitingPeriod]) -> io::Result<()> {
    writeln!(out, "Carências")?;
    if periods.is_empty() {
        return writeln!(out, "  (nenhuma)");
    }
    for period in periods {
        let id = period.id.map(|id| id.to_string()).unwrap_or_default();
        writeln!(out, "  {id:>4}  {} dias: {}", period.days, period.description)?;
    }
    Ok(())
}

pub fn write_co_payments(out: &mut impl Write, co_payments: &[CoPayment]) -> io::Result<()> {
    writeln!(out, "Coparticipações")?;
    if co_payments.is_empty() {
        return writeln!(out, "  (nenhuma)");
    }
    for co_payment in co_payments {
        let id = co_payment.id.map(|id| id.to_string()).unwrap_or_default();
        writeln!(out, "  {id:>4}  {}", co_payment_line(co_payment))?;
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Sim"
    } else {
        "Não"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_catalog::{Accommodation, ContractType, CoverageScope, PriceBand};
    use rust_decimal_macros::dec;

    fn render(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn plan() -> Plan {
        Plan {
            id: 5,
            name: "Smart 200".to_string(),
            operator_id: Some(9),
            contract_type: ContractType::Individual,
            accommodation: Accommodation::Ward,
            coverage_scope: CoverageScope::Local,
            has_co_payment: true,
            has_eligibility_check: None,
            co_payment_image_url: None,
            price_bands: vec![PriceBand {
                age_range: "00-18".to_string(),
                value: dec!(99.9),
            }],
            hospitals: Vec::new(),
            waiting_periods: vec![WaitingPeriod {
                id: Some(1),
                description: "Consultas".to_string(),
                days: 30,
            }],
            co_payments: Vec::new(),
            municipalities: Vec::new(),
        }
    }

    #[test]
    fn test_plan_line_without_operator() {
        let text = render(|out| write_plans(out, &[plan()], &[]));
        assert_eq!(text, "   5  Smart 200  [N/A]  PF / Enfermaria / Local / coparticipação\n");
    }

    #[test]
    fn test_plan_details() {
        let operators = [Operator {
            id: 9,
            name: "SulAmérica".to_string(),
            accredited_network_url: None,
        }];
        let text = render(|out| write_plan_details(out, &plan(), &operators));

        assert!(text.contains("Operadora: SulAmérica"));
        assert!(text.contains("  00-18    R$ 99,90"));
        assert!(text.contains("     1  30 dias: Consultas"));
        assert!(text.contains("Coparticipações\n  (nenhuma)"));
        assert!(text.contains("Elegibilidade: Não"));
    }

    #[test]
    fn test_banner() {
        let text = render(|out| write_banner(out, &Banner::Warning("Atenção".to_string())));
        assert_eq!(text, "Atenção\n");
    }
}
