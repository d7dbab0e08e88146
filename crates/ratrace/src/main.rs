use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ratrace::commands::{self, TaxRequest};
use ratrace::{ScenarioStore, init_logging};
use ratrace_core::taxes::IncomeSources;

#[derive(Parser, Debug)]
#[command(name = "ratrace")]
#[command(about = "A period-based financial ledger simulator")]
struct Args {
    /// Path to the data directory (default: ~/.ratrace/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a demo scenario to the data directory
    Init {
        #[arg(default_value = "demo")]
        name: String,
        /// Store as JSON instead of YAML
        #[arg(long)]
        json: bool,
        /// Overwrite an existing scenario
        #[arg(long)]
        force: bool,
    },
    /// Run a scenario and print its summary
    Run {
        /// Stored scenario name or path to a scenario file
        scenario: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a scenario and show one entity's state in a period
    Query {
        scenario: String,
        entity: String,
        /// Period index (default: last period)
        #[arg(short, long)]
        period: Option<usize>,
    },
    /// Compute UK tax for one person
    Tax {
        #[arg(long, default_value_t = 0.0)]
        salary: f64,
        #[arg(long, default_value_t = 0.0)]
        pension: f64,
        #[arg(long, default_value_t = 0.0)]
        dividends: f64,
        #[arg(long, default_value_t = 0.0)]
        capital_gains: f64,
        /// Use Scottish income tax bands
        #[arg(long)]
        scottish: bool,
        #[arg(long)]
        personal_allowance: Option<f64>,
    },
    /// List stored scenarios
    List,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(ScenarioStore::default_path);

    init_logging(&data_dir, &args.log_level)?;
    let store = ScenarioStore::new(data_dir);

    let output = match args.command {
        Command::Init { name, json, force } => {
            let path = commands::init(&store, &name, json, force)?;
            format!("Created {}\n", path.display())
        }
        Command::Run { scenario, json } => commands::run(&store, &scenario, json)?,
        Command::Query {
            scenario,
            entity,
            period,
        } => commands::query(&store, &scenario, &entity, period)?,
        Command::Tax {
            salary,
            pension,
            dividends,
            capital_gains,
            scottish,
            personal_allowance,
        } => commands::tax(&TaxRequest {
            income: IncomeSources {
                salary,
                pension,
                dividends,
                capital_gains,
            },
            scottish,
            personal_allowance,
        })?,
        Command::List => commands::list(&store)?,
    };
    print!("{output}");

    tracing::info!("ratrace shutting down");
    Ok(())
}
