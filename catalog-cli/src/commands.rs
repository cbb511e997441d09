//! Command dispatch
//!
//! Every command runs through an [`AdminSession`], so the outcome banner and
//! the refetch rules are the same as in the interactive product. Success
//! banners are printed; error and warning banners become the command error.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local};
use tracing::{debug, info};

use plan_catalog::{
    AdminSession, Banner, CatalogBackend, CoPaymentEntry, DiscountSettings, HospitalEntry,
    ListEdit, MunicipalityEntry, OperatorFilter, OperatorInput, PlanFilter, PlanPayload,
    PriceBand, QuoteCard, QuoteRequest, SubListEdit, WaitingPeriodEntry,
};

use crate::cli::{
    CoPaymentCommand, CoPaymentFields, Command, HospitalCommand, MunicipalityCommand,
    OperatorCommand, PlanCommand, PriceBandCommand, QuoteArgs, WaitingPeriodCommand,
};
use crate::output;

/// Print the session banner for a finished action and turn failures into
/// the command error
fn finish<B: CatalogBackend, T>(
    session: &AdminSession<B>,
    out: &mut impl Write,
    result: error_common::Result<T>,
) -> anyhow::Result<T> {
    let value = result.map_err(|err| match session.banner() {
        Some(banner) => anyhow!("{}", banner.message()),
        None => anyhow::Error::new(err),
    })?;
    match session.banner() {
        Some(Banner::Warning(message)) => bail!("{message}"),
        Some(banner) => output::write_banner(out, banner)?,
        None => {}
    }
    Ok(value)
}

pub async fn execute<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    session.clear_banner();
    match command {
        Command::Operators(command) => operators(session, command, out).await,
        Command::Plans(command) => plans(session, command, out).await,
        Command::WaitingPeriods(command) => waiting_periods(session, command, out).await,
        Command::CoPayments(command) => co_payments(session, command, out).await,
        Command::Hospitals(command) => hospitals(session, command, out).await,
        Command::Municipalities(command) => municipalities(session, command, out).await,
        Command::PriceBands(command) => price_bands(session, command, out).await,
        Command::Quote(args) => quote(session, &args, out).await,
    }
}

async fn operators<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: OperatorCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        OperatorCommand::List { name } => {
            let result = session.refresh_operators().await.map(|_| ());
            finish(session, out, result)?;
            let filter = OperatorFilter { name };
            let matching: Vec<_> = session
                .operators()
                .iter()
                .filter(|operator| filter.matches(operator))
                .cloned()
                .collect();
            output::write_operators(out, &matching)?;
        }
        OperatorCommand::Create { name, network_url } => {
            let input = OperatorInput {
                name,
                accredited_network_url: network_url,
            };
            let result = session.create_operator(&input).await;
            let operator = finish(session, out, result)?;
            writeln!(out, "Operadora #{}", operator.id)?;
        }
        OperatorCommand::Update { id, name, network_url } => {
            let input = OperatorInput {
                name,
                accredited_network_url: network_url,
            };
            let result = session.update_operator(id, &input).await;
            finish(session, out, result)?;
        }
        OperatorCommand::Delete { id } => {
            let result = session.delete_operator(id).await;
            finish(session, out, result)?;
        }
    }
    Ok(())
}

/// Operator names are decoration for plan listings; a failed load leaves
/// them as "N/A" instead of failing the command
async fn load_operator_names<B: CatalogBackend>(session: &mut AdminSession<B>) {
    if session.refresh_operators().await.is_err() {
        session.clear_banner();
    }
}

async fn plans<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: PlanCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        PlanCommand::List { name, operator } => {
            load_operator_names(session).await;
            let filter = PlanFilter {
                name,
                operator_id: operator,
            };
            let result = session.refresh_plans(&filter).await.map(|_| ());
            finish(session, out, result)?;
            output::write_plans(out, session.plans(), session.operators())?;
        }
        PlanCommand::Show { id } => {
            load_operator_names(session).await;
            let result = session.load_sub_lists(id).await;
            let plan = finish(session, out, result)?;
            output::write_plan_details(out, &plan, session.operators())?;
        }
        PlanCommand::Create { file } => {
            let payload = read_plan_file(&file)?;
            let result = session.save_plan(None, &payload).await;
            let plan = finish(session, out, result)?;
            writeln!(out, "Plano #{}", plan.id)?;
        }
        PlanCommand::Update { id, file } => {
            let payload = read_plan_file(&file)?;
            let result = session.save_plan(Some(id), &payload).await;
            finish(session, out, result)?;
        }
        PlanCommand::Delete { id } => {
            let result = session.delete_plan(id).await;
            finish(session, out, result)?;
        }
    }
    Ok(())
}

/// Plan write body from a `.json`, `.yaml` or `.yml` file
pub fn read_plan_file(path: &Path) -> anyhow::Result<PlanPayload> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    let payload = match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("YAML inválido em {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("JSON inválido em {}", path.display()))?,
    };
    Ok(payload)
}

/// Refresh the plan cache, then run one sub-list edit
async fn edit<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    out: &mut impl Write,
    plan_id: i64,
    sub_list_edit: SubListEdit,
) -> anyhow::Result<()> {
    let refreshed = session.refresh_plans(&PlanFilter::default()).await.map(|_| ());
    finish(session, out, refreshed)?;

    debug!(
        plan_id,
        sub_list = sub_list_edit.kind().label(),
        action = sub_list_edit.action().as_str(),
        "Editing plan"
    );
    let result = session.edit_sub_list(plan_id, sub_list_edit).await;
    finish(session, out, result)?;
    Ok(())
}

async fn waiting_periods<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: WaitingPeriodCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        WaitingPeriodCommand::List { plan } => {
            let result = session.load_sub_lists(plan).await.map(|_| ());
            finish(session, out, result)?;
            output::write_waiting_periods(out, session.waiting_periods())?;
            Ok(())
        }
        WaitingPeriodCommand::Add {
            plan,
            description,
            days,
        } => {
            let entry = WaitingPeriodEntry { description, days };
            edit(session, out, plan, SubListEdit::WaitingPeriods(ListEdit::Add(entry))).await
        }
        WaitingPeriodCommand::Update {
            plan,
            id,
            description,
            days,
        } => {
            let entry = WaitingPeriodEntry { description, days };
            let sub_list_edit = SubListEdit::WaitingPeriods(ListEdit::Update { key: id, entry });
            edit(session, out, plan, sub_list_edit).await
        }
        WaitingPeriodCommand::Delete { plan, id } => {
            let sub_list_edit = SubListEdit::WaitingPeriods(ListEdit::Delete { key: id });
            edit(session, out, plan, sub_list_edit).await
        }
    }
}

fn co_payment_entry(fields: CoPaymentFields) -> CoPaymentEntry {
    CoPaymentEntry {
        name: fields.name,
        service_type: fields.service_type,
        percentage: fields.percentage,
        min_value: fields.min,
        max_value: fields.max,
        ..CoPaymentEntry::default()
    }
}

async fn co_payments<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: CoPaymentCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        CoPaymentCommand::List { plan } => {
            let result = session.load_sub_lists(plan).await.map(|_| ());
            finish(session, out, result)?;
            output::write_co_payments(out, session.co_payments())?;
            Ok(())
        }
        CoPaymentCommand::Add {
            plan,
            fields,
            plan_type,
            image_url,
        } => {
            let entry = CoPaymentEntry {
                plan_type,
                image_url,
                ..co_payment_entry(fields)
            };
            edit(session, out, plan, SubListEdit::CoPayments(ListEdit::Add(entry))).await
        }
        CoPaymentCommand::Update { plan, id, fields } => {
            let entry = co_payment_entry(fields);
            let sub_list_edit = SubListEdit::CoPayments(ListEdit::Update { key: id, entry });
            edit(session, out, plan, sub_list_edit).await
        }
        CoPaymentCommand::Delete { plan, id, direct: true } => {
            let result = session.remove_co_payment_direct(plan, id).await;
            finish(session, out, result)
        }
        CoPaymentCommand::Delete { plan, id, direct: false } => {
            edit(session, out, plan, SubListEdit::CoPayments(ListEdit::Delete { key: id })).await
        }
    }
}

async fn hospitals<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: HospitalCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (plan, sub_list_edit) = match command {
        HospitalCommand::Add { plan, name, address } => {
            let entry = HospitalEntry {
                name,
                address: address.unwrap_or_default(),
            };
            (plan, ListEdit::Add(entry))
        }
        HospitalCommand::Update {
            plan,
            id,
            name,
            address,
        } => {
            let entry = HospitalEntry {
                name,
                address: address.unwrap_or_default(),
            };
            (plan, ListEdit::Update { key: id, entry })
        }
        HospitalCommand::Delete { plan, id } => (plan, ListEdit::Delete { key: id }),
    };
    edit(session, out, plan, SubListEdit::Hospitals(sub_list_edit)).await
}

async fn municipalities<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: MunicipalityCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (plan, sub_list_edit) = match command {
        MunicipalityCommand::Add { plan, name } => {
            (plan, ListEdit::Add(MunicipalityEntry { name }))
        }
        MunicipalityCommand::Update { plan, id, name } => (
            plan,
            ListEdit::Update {
                key: id,
                entry: MunicipalityEntry { name },
            },
        ),
        MunicipalityCommand::Delete { plan, id } => (plan, ListEdit::Delete { key: id }),
    };
    edit(session, out, plan, SubListEdit::Municipalities(sub_list_edit)).await
}

async fn price_bands<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    command: PriceBandCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        PriceBandCommand::Set { plan, range, value } => {
            let result = session.load_sub_lists(plan).await;
            let stored = finish(session, out, result)?;

            let band = PriceBand {
                age_range: range.clone(),
                value,
            };
            let sub_list_edit = if stored.price_bands.iter().any(|band| band.age_range == range) {
                ListEdit::Update { key: range, entry: band }
            } else {
                ListEdit::Add(band)
            };
            edit(session, out, plan, SubListEdit::PriceBands(sub_list_edit)).await
        }
        PriceBandCommand::Delete { plan, range } => {
            edit(session, out, plan, SubListEdit::PriceBands(ListEdit::Delete { key: range })).await
        }
    }
}

pub fn quote_request(args: &QuoteArgs) -> QuoteRequest {
    QuoteRequest {
        ages: args.ages.clone(),
        operator_id: args.operator,
        contract_type: args.contract_type.clone(),
        accommodation: args.accommodation.clone(),
        coverage_scope: args.coverage.clone(),
        has_eligibility_check: args.eligibility,
        has_co_payment: args.co_payment,
        plan_id: None,
        discount_percent: None,
    }
}

/// File the PDF is written to; a directory gets a timestamped file name
pub fn pdf_target(path: &Path, now: DateTime<Local>) -> PathBuf {
    if path.is_dir() {
        path.join(now.format("cotacao_%Y%m%d_%H%M%S.pdf").to_string())
    } else {
        path.to_path_buf()
    }
}

async fn quote<B: CatalogBackend>(
    session: &mut AdminSession<B>,
    args: &QuoteArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let request = quote_request(args);
    let result = session.quote(&request).await;
    let mut quotes = finish(session, out, result)?;
    if let Some(plan_id) = args.plan {
        quotes.retain(|quote| quote.plan_id == Some(plan_id));
    }

    if quotes.is_empty() {
        writeln!(out, "Nenhum plano encontrado para os filtros informados")?;
        return Ok(());
    }

    let discount = args
        .discount
        .as_deref()
        .map_or_else(DiscountSettings::default, |raw| DiscountSettings::from_input(true, raw));

    for (index, quote) in quotes.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        let card = QuoteCard::new(quote).with_discount(discount).expanded(args.expand);
        write!(out, "{}", card.render())?;
    }

    let Some(path) = &args.pdf else {
        return Ok(());
    };
    let [quote] = quotes.as_slice() else {
        bail!("{} planos encontrados; informe --plan para gerar o PDF", quotes.len());
    };

    let card = QuoteCard::new(quote).with_discount(discount);
    let pdf_request = card.pdf_request(&request);
    let result = session.quote_pdf(&pdf_request).await;
    let bytes = finish(session, out, result)?;

    let target = pdf_target(path, Local::now());
    std::fs::write(&target, bytes)
        .with_context(|| format!("Falha ao gravar {}", target.display()))?;
    info!(path = %target.display(), plan_id = ?pdf_request.plan_id, "Quote PDF saved");
    writeln!(out)?;
    writeln!(out, "PDF salvo em {}", target.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quote_request_from_args() {
        let args = QuoteArgs {
            ages: vec![25, 61],
            operator: Some(2),
            coverage: Some("Nac".to_string()),
            co_payment: Some(false),
            ..QuoteArgs::default()
        };
        let request = quote_request(&args);

        assert_eq!(request.ages, vec![25, 61]);
        assert_eq!(request.operator_id, Some(2));
        assert_eq!(request.coverage_scope.as_deref(), Some("Nac"));
        assert_eq!(request.has_co_payment, Some(false));
        assert_eq!(request.plan_id, None);
    }

    #[test]
    fn test_pdf_target_in_directory() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let dir = std::env::temp_dir();

        assert_eq!(pdf_target(&dir, now), dir.join("cotacao_20240309_140507.pdf"));
        let file = dir.join("minha-cotacao.pdf");
        assert_eq!(pdf_target(&file, now), file);
    }

    #[test]
    fn test_read_yaml_plan_file() {
        let path = std::env::temp_dir().join(format!("plano-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "nome: Essencial\noperadora_id: 1\ntipo_contratacao: PF\nacomodacao: Enfermaria\n\
             abrangencia: Regional\ncoparticipacao: false\n\
             faixas_preco:\n  - faixa_etaria: 00-+\n    valor: 250.5\n",
        )
        .unwrap();

        let payload = read_plan_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(payload.name, "Essencial");
        assert_eq!(payload.price_bands.len(), 1);
        assert!(payload.waiting_periods.is_empty());
        assert!(payload.validate().is_ok());
    }
}
