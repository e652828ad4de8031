// contactcheck - Loqate email/phone validation accuracy harness
//
// Generates labelled test inputs, sends them through the validation API and
// scores the verdicts against what is known about each input.

mod dataset;
mod exit_codes;
mod export;
mod fetch;
mod generate;
mod logging;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use contactcheck_config::{ConfigError, Settings};

use exit_codes::{
    EXIT_CONFIG_ENV, EXIT_CONFIG_INVALID, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "contactcheck")]
#[command(about = "Score Loqate email/phone validation against known-real and known-fake inputs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Settings file (default: ./contactcheck.toml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Args, Debug, Clone, Copy)]
struct GenerateArgs {
    /// Standard (made-up) fake emails
    #[arg(long, default_value_t = 2)]
    standard: usize,

    /// Pro fake emails (live disposable mailboxes)
    #[arg(long, default_value_t = 2)]
    pro: usize,

    /// Phone numbers per country
    #[arg(long, alias = "phones_per_country", default_value_t = 2)]
    phones_per_country: usize,
}

impl From<GenerateArgs> for generate::GenerateCounts {
    fn from(args: GenerateArgs) -> Self {
        Self {
            standard: args.standard,
            pro: args.pro,
            phones_per_country: args.phones_per_country,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the dataset against Loqate and print accuracy metrics
    #[command(after_help = "\
Examples:
  contactcheck run
  contactcheck run --generate-new-data --standard 10 --pro 5 --phones-per-country 3
  contactcheck run --metrics-json data/metrics.json
  LOQATE_API_KEY=AA11-BB22-CC33-DD44 REAL_EMAILS=me@company.com contactcheck run")]
    Run {
        #[command(flatten)]
        counts: GenerateArgs,

        /// Regenerate the dataset instead of loading the saved one
        #[arg(long, alias = "generate_new_data")]
        generate_new_data: bool,

        /// Loqate API key (default: LOQATE_API_KEY env)
        #[arg(long)]
        api_key: Option<String>,

        /// Also write the metric reports as JSON
        #[arg(long)]
        metrics_json: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate and save a new dataset without verifying it
    #[command(after_help = "\
Examples:
  contactcheck generate
  contactcheck generate --standard 20 --pro 0 --phones-per-country 0")]
    Generate {
        #[command(flatten)]
        counts: GenerateArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Recompute metrics from saved results without calling Loqate
    #[command(after_help = "\
Examples:
  contactcheck evaluate
  contactcheck evaluate data/verification_results.json --json")]
    Evaluate {
        /// Results file (default: <data_dir>/verification_results.json)
        results: Option<PathBuf>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the configured country prefixes in reporting order
    Countries {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("CONTACTCHECK_GIT_HASH"),
        ")",
        "\neval:    contactcheck-eval ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            counts,
            generate_new_data,
            api_key,
            metrics_json,
            common,
        } => run::cmd_run(run::RunOptions {
            counts: counts.into(),
            generate_new_data,
            api_key,
            metrics_json,
            config: common.config,
            verbose: common.verbose,
        }),
        Commands::Generate { counts, common } => {
            run::cmd_generate(counts.into(), common.config, common.verbose)
        }
        Commands::Evaluate { results, json, common } => {
            run::cmd_evaluate(results, json, common.config, common.verbose)
        }
        Commands::Countries { common } => cmd_countries(common.config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Map a settings or `.env` failure to its exit code.
    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound(_) => Some("omit --config to use built-in defaults".to_string()),
            ConfigError::DuplicateCountry(_) => {
                Some("each [[countries]] code may appear once".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_CONFIG_INVALID, message: err.to_string(), hint }
    }

    pub fn env(err: ConfigError) -> Self {
        Self { code: EXIT_CONFIG_ENV, message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// countries
// ============================================================================

fn cmd_countries(config: Option<PathBuf>) -> Result<(), CliError> {
    let settings = Settings::load(config.as_deref()).map_err(CliError::config)?;
    let table = settings.prefix_table();

    for entry in table.entries() {
        println!("{:<4} {}", entry.code, entry.prefix);
    }
    Ok(())
}
