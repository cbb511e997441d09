//! `planos-admin`: operator CLI for the health-plan catalog
//!
//! ```bash
//! planos-admin operators create "Amil" --network-url https://rede.amil.com.br
//! planos-admin plans create --file plano.yaml
//! planos-admin waiting-periods add 12 --description Parto --days 300
//! planos-admin price-bands set 12 --range 59-+ --value 980
//! planos-admin quote --ages 30,62 --discount 10 --expand
//! planos-admin quote --ages 30,62 --plan 12 --discount 10 --pdf ./cotacoes
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;

pub use cli::Cli;
pub use commands::execute;
pub use crate::config::AdminConfig;
