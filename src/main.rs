use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use cbam_engine::config::AppConfig;
use cbam_engine::error::AppError;
use cbam_engine::submission::service::BenchmarkQuery;
use cbam_engine::{
    telemetry, validate_for_submission, CalculationError, ComplianceService, EntryImporter,
    ProjectionRequest, SubmissionReport,
};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cbam",
    about = "Calculate and validate EU CBAM declarations from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess a quarterly batch of entries for submission readiness
    Validate(ValidateArgs),
    /// Check each entry of a file against the field-level rules
    Lint(LintArgs),
    /// Resolve the default benchmark of a CN code
    Benchmark(BenchmarkArgs),
    /// Forecast certificates across the free-allocation phase-out
    Project(ProjectArgs),
    /// Validate one or more EORI numbers
    Eori(EoriArgs),
    /// Flag entries that deviate from their CN code peers
    Materiality(MaterialityArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// CSV or JSON file of entries
    #[arg(long)]
    entries: PathBuf,
    #[arg(long)]
    year: i32,
    /// Reporting quarter (1-4)
    #[arg(long)]
    quarter: u8,
    #[arg(long)]
    member_state: Option<String>,
    /// Declarant EORI number
    #[arg(long)]
    declarant: Option<String>,
    /// Certificates already surrendered for the period
    #[arg(long, default_value_t = 0)]
    surrendered: u64,
    /// Assessment date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct LintArgs {
    /// CSV or JSON file of entries
    #[arg(long)]
    entries: PathBuf,
    /// Also compute certificates for entries that pass validation
    #[arg(long)]
    certificates: bool,
}

#[derive(Args, Debug)]
struct BenchmarkArgs {
    cn_code: String,
    #[arg(long)]
    route: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    /// Country of origin, used for the default-value markup and route hint
    #[arg(long)]
    country: Option<String>,
    /// Product description, used for the route hint
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Benchmark intensity in tCO2e per unit
    #[arg(long)]
    benchmark_value: f64,
    #[arg(long)]
    quantity: f64,
    /// Embedded emissions of the import profile in tCO2e
    #[arg(long)]
    total_emissions: f64,
    #[arg(long, default_value_t = 0.0)]
    carbon_price_deduction: f64,
    #[arg(long, default_value_t = 2026)]
    start_year: i32,
    #[arg(long, default_value_t = 2034)]
    end_year: i32,
    /// Certificate price in EUR. Defaults to the configured price.
    #[arg(long)]
    price: Option<f64>,
}

#[derive(Args, Debug)]
struct EoriArgs {
    #[arg(required = true)]
    identifiers: Vec<String>,
    /// Member state the declarant must be registered in
    #[arg(long)]
    member_state: Option<String>,
    /// Treat a failed national checksum as invalid
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct MaterialityArgs {
    /// CSV or JSON file of entries
    #[arg(long)]
    entries: PathBuf,
}

#[derive(Debug, Serialize)]
struct LintedEntry {
    reference: String,
    validation: cbam_engine::ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificates: Option<cbam_engine::EntryCertificates>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let tables = Arc::new(config.engine.reference_tables()?);
    let service = ComplianceService::new(Arc::clone(&tables), config.engine.certificate_price_eur);

    match cli.command {
        Command::Validate(args) => {
            let entries = EntryImporter::from_path(&args.entries)?;
            let report = SubmissionReport {
                reporting_year: args.year,
                reporting_quarter: args.quarter,
                declarant_eori: args.declarant,
                member_state: args.member_state,
                certificates_surrendered: args.surrendered,
            };
            let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
            let readiness = validate_for_submission(&tables, &report, &entries, as_of);
            info!(
                entries = readiness.entry_count,
                readiness_score = readiness.readiness_score,
                "assessed batch"
            );
            print_json(&readiness)
        }
        Command::Lint(args) => {
            let entries = EntryImporter::from_path(&args.entries)?;
            let linted: Vec<LintedEntry> = entries
                .iter()
                .enumerate()
                .map(|(position, entry)| {
                    let validation = service.validate_entry(entry);
                    let certificates = if args.certificates && validation.valid {
                        service.entry_certificates(entry).ok().map(|view| view.certificates)
                    } else {
                        None
                    };
                    LintedEntry {
                        reference: entry.reference(position),
                        validation,
                        certificates,
                    }
                })
                .collect();
            print_json(&linted)
        }
        Command::Benchmark(args) => {
            let query = BenchmarkQuery {
                cn_code: args.cn_code,
                route: args.route,
                year: args.year,
                country_of_origin: args.country,
                product_description: args.description,
            };
            let view = service.resolve(&query).map_err(CalculationError::from)?;
            print_json(&view)
        }
        Command::Project(args) => {
            let request = ProjectionRequest {
                benchmark_value: args.benchmark_value,
                quantity: args.quantity,
                total_embedded_emissions: args.total_emissions,
                foreign_carbon_price_deduction: args.carbon_price_deduction,
                start_year: args.start_year,
                end_year: args.end_year,
                certificate_price_eur: args.price,
            };
            print_json(&service.project(&request)?)
        }
        Command::Eori(args) => {
            if let [identifier] = args.identifiers.as_slice() {
                let result = service.eori(identifier, args.member_state.as_deref(), args.strict);
                print_json(&result)
            } else {
                print_json(&service.eori_batch(
                    &args.identifiers,
                    args.member_state.as_deref(),
                    args.strict,
                ))
            }
        }
        Command::Materiality(args) => {
            let entries = EntryImporter::from_path(&args.entries)?;
            print_json(&service.materiality(&entries))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(io::Error::from)?;
    writeln!(handle)?;
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
