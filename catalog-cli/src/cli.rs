//! Command-line surface of `planos-admin`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// Health-plan catalog administration
#[derive(Parser, Debug)]
#[command(name = "planos-admin")]
#[command(about = "Manage operators, plans and quotes of the health-plan catalog")]
#[command(version)]
pub struct Cli {
    /// Catalog API base URL (overrides the configuration file)
    #[arg(long, env = "PLANOS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Health-insurance operators
    #[command(subcommand)]
    Operators(OperatorCommand),

    /// Plans, written as whole records
    #[command(subcommand)]
    Plans(PlanCommand),

    /// Waiting periods of a plan
    #[command(subcommand)]
    WaitingPeriods(WaitingPeriodCommand),

    /// Co-payment rules of a plan
    #[command(subcommand)]
    CoPayments(CoPaymentCommand),

    /// Hospitals of a plan
    #[command(subcommand)]
    Hospitals(HospitalCommand),

    /// Municipalities covered by a plan
    #[command(subcommand)]
    Municipalities(MunicipalityCommand),

    /// Age-range price bands of a plan
    #[command(subcommand)]
    PriceBands(PriceBandCommand),

    /// Quote the catalog for a list of ages
    Quote(QuoteArgs),
}

#[derive(Subcommand, Debug)]
pub enum OperatorCommand {
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        name: Option<String>,
    },
    Create {
        name: String,
        /// Accredited network listing URL
        #[arg(long)]
        network_url: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        network_url: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    List {
        #[arg(long)]
        name: Option<String>,
        /// Only plans of this operator
        #[arg(long)]
        operator: Option<i64>,
    },
    Show {
        id: i64,
    },
    /// Create a plan from a JSON or YAML file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a plan with the contents of a JSON or YAML file
    Update {
        id: i64,
        #[arg(short, long)]
        file: PathBuf,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum WaitingPeriodCommand {
    List {
        plan: i64,
    },
    Add {
        plan: i64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        days: u32,
    },
    Update {
        plan: i64,
        id: i64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        days: u32,
    },
    Delete {
        plan: i64,
        id: i64,
    },
}

/// Fields of a co-payment rule
#[derive(Args, Debug, Clone, Default)]
pub struct CoPaymentFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub service_type: Option<String>,
    #[arg(long)]
    pub percentage: Option<Decimal>,
    #[arg(long)]
    pub min: Option<Decimal>,
    #[arg(long)]
    pub max: Option<Decimal>,
}

#[derive(Subcommand, Debug)]
pub enum CoPaymentCommand {
    List {
        plan: i64,
    },
    Add {
        plan: i64,
        #[command(flatten)]
        fields: CoPaymentFields,
        /// Contract type label (PF, PJ, Adesão)
        #[arg(long)]
        plan_type: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    Update {
        plan: i64,
        id: i64,
        #[command(flatten)]
        fields: CoPaymentFields,
    },
    Delete {
        plan: i64,
        id: i64,
        /// Use the co-payment endpoint instead of a whole-plan write
        #[arg(long)]
        direct: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum HospitalCommand {
    Add {
        plan: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    Update {
        plan: i64,
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        plan: i64,
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum MunicipalityCommand {
    Add {
        plan: i64,
        #[arg(long)]
        name: String,
    },
    Update {
        plan: i64,
        id: i64,
        #[arg(long)]
        name: String,
    },
    Delete {
        plan: i64,
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PriceBandCommand {
    /// Set the value of an age range, adding the band when missing
    Set {
        plan: i64,
        /// Age range label, e.g. `00-18` or `59-+`
        #[arg(long)]
        range: String,
        #[arg(long)]
        value: Decimal,
    },
    Delete {
        plan: i64,
        #[arg(long)]
        range: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QuoteArgs {
    /// Beneficiary ages, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub ages: Vec<u32>,

    #[arg(long)]
    pub operator: Option<i64>,

    /// Contract type prefix (PF, PJ, Adesão)
    #[arg(long)]
    pub contract_type: Option<String>,

    /// Accommodation prefix (Enfermaria, Apartamento, Semi-privativo)
    #[arg(long)]
    pub accommodation: Option<String>,

    /// Coverage prefix (Nacional, Regional, Local)
    #[arg(long)]
    pub coverage: Option<String>,

    #[arg(long)]
    pub eligibility: Option<bool>,

    #[arg(long)]
    pub co_payment: Option<bool>,

    /// Discount percentage applied per beneficiary, e.g. `10` or `7,5`
    #[arg(long)]
    pub discount: Option<String>,

    /// Show the full breakdown of every card
    #[arg(long)]
    pub expand: bool,

    /// Restrict the output (and the PDF) to one plan
    #[arg(long)]
    pub plan: Option<i64>,

    /// Write the quote PDF to this file or directory
    #[arg(long)]
    pub pdf: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quote() {
        let cli = Cli::parse_from([
            "planos-admin",
            "quote",
            "--ages",
            "30,62",
            "--discount",
            "7,5",
            "--plan",
            "12",
            "--expand",
        ]);
        let args = match cli.command {
            Command::Quote(args) => Some(args),
            _ => None,
        }
        .expect("quote command");
        assert_eq!(args.ages, vec![30, 62]);
        assert_eq!(args.discount.as_deref(), Some("7,5"));
        assert_eq!(args.plan, Some(12));
        assert!(args.expand);
    }

    #[test]
    fn test_parse_co_payment_add() {
        let cli = Cli::parse_from([
            "planos-admin",
            "co-payments",
            "add",
            "3",
            "--name",
            "Consulta",
            "--percentage",
            "30",
            "--max",
            "90.5",
        ]);
        let (plan, fields) = match cli.command {
            Command::CoPayments(CoPaymentCommand::Add { plan, fields, .. }) => Some((plan, fields)),
            _ => None,
        }
        .expect("co-payments add command");
        assert_eq!(plan, 3);
        assert_eq!(fields.percentage, Some(dec!(30)));
        assert_eq!(fields.max, Some(dec!(90.5)));
        assert_eq!(fields.min, None);
    }
}
