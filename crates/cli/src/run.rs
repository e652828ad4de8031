//! `run`, `generate` and `evaluate` commands.

use std::path::{Path, PathBuf};

use contactcheck_config::{load_dotenv, real_inputs_from_env, Settings};
use contactcheck_eval::{
    build_scopes, evaluate_scopes, tag_ground_truth, Evaluation, ScopeInputs, Section,
    VerificationRecord,
};

use crate::dataset::Dataset;
use crate::export;
use crate::fetch::{resolve_api_key, LoqateClient};
use crate::generate::{generate_dataset, GenerateCounts};
use crate::logging::{self, emit_report};
use crate::CliError;

pub struct RunOptions {
    pub counts: GenerateCounts,
    pub generate_new_data: bool,
    pub api_key: Option<String>,
    pub metrics_json: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

// ============================================================================
// Shared setup
// ============================================================================

/// Settings, then `.env` next to them. Nothing is logged yet at this point.
fn load_environment(config: Option<&Path>) -> Result<Settings, CliError> {
    let settings = Settings::load(config).map_err(CliError::config)?;
    load_dotenv(&settings.dotenv_path()).map_err(CliError::env)?;
    Ok(settings)
}

fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Start a logged run: console plus a timestamped file under the logs dir.
fn start_logged_run(settings: &Settings, verbose: bool) -> Result<(), CliError> {
    let timestamp = run_timestamp();
    let log_path = settings.log_path(&timestamp);
    logging::init(verbose, Some(&log_path))?;
    tracing::info!("--- Starting Verification Run: {} ---", timestamp);
    tracing::info!("--- Logs will be saved to: {} ---", log_path.display());
    Ok(())
}

fn generate_and_save(settings: &Settings, counts: GenerateCounts) -> Result<Dataset, CliError> {
    if counts.standard == 0 && counts.pro == 0 && counts.phones_per_country == 0 {
        return Err(CliError::args("nothing to generate: all counts are zero")
            .with_hint("set at least one of --standard, --pro, --phones-per-country"));
    }
    let mut rng = rand::thread_rng();
    let dataset = generate_dataset(settings, counts, &mut rng)?;
    dataset.save(settings)?;
    Ok(dataset)
}

// ============================================================================
// Reporting
// ============================================================================

/// Print every report, each section preceded by its banner.
pub fn print_evaluation(evaluation: &Evaluation) {
    for section in [Section::Overall, Section::Email, Section::Phone, Section::Country] {
        if let Some(heading) = section.heading() {
            emit_report(&format!("\n{heading}"));
        }
        for scope in evaluation.reports.iter().filter(|r| r.section == section) {
            emit_report(&format!("\n{}", scope.report));
        }
    }

    if !evaluation.skipped_scopes.is_empty() {
        tracing::debug!(
            "scopes without matching results: {}",
            evaluation.skipped_scopes.join(", ")
        );
    }
}

fn evaluate(settings: &Settings, inputs: &ScopeInputs, results: &[VerificationRecord]) -> Evaluation {
    let scopes = build_scopes(&settings.prefix_table(), inputs);
    evaluate_scopes(results, &scopes)
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let settings = load_environment(opts.config.as_deref())?;
    start_logged_run(&settings, opts.verbose)?;

    let api_key = resolve_api_key(opts.api_key.as_deref(), &settings.dotenv_path())?;

    let dataset = if opts.generate_new_data {
        tracing::info!("[Info] Generating new data as per --generate-new-data flag.");
        generate_and_save(&settings, opts.counts)?
    } else {
        tracing::info!("[Info] Loading existing generated data from disk.");
        Dataset::load(&settings)?
    };

    let inputs = dataset.into_scope_inputs(real_inputs_from_env());
    let emails = inputs.all_emails();
    let phones = inputs.all_phones();
    if emails.is_empty() && phones.is_empty() {
        return Err(CliError::args("no inputs to verify")
            .with_hint("generate a dataset with --generate-new-data or set REAL_EMAILS / REAL_PHONES"));
    }

    let loqate = LoqateClient::new(api_key, &settings)?;
    let mut results = loqate.verify_emails(&emails)?;
    results.extend(loqate.verify_phones(&phones)?);
    tracing::info!("{} returned {} results", loqate.source_name(), results.len());

    let tagged = tag_ground_truth(&results, &inputs.all_real(), &inputs.all_fake());
    let evaluation = evaluate(&settings, &inputs, &tagged);
    print_evaluation(&evaluation);

    if let Some(files) = export::write_results(&settings.results_stem(), &tagged)? {
        tracing::info!(
            "[Done] Results saved to {} and {}",
            files.json.display(),
            files.csv.display(),
        );
    }
    if let Some(path) = opts.metrics_json {
        export::write_metrics_json(&path, &evaluation)?;
    }

    Ok(())
}

// ============================================================================
// generate
// ============================================================================

pub fn cmd_generate(counts: GenerateCounts, config: Option<PathBuf>, verbose: bool) -> Result<(), CliError> {
    let settings = load_environment(config.as_deref())?;
    start_logged_run(&settings, verbose)?;

    let dataset = generate_and_save(&settings, counts)?;
    tracing::info!(
        "generated {} emails and {} phones into {}",
        dataset.email_count(),
        dataset.phone_count(),
        settings.data_dir().display(),
    );
    Ok(())
}

// ============================================================================
// evaluate
// ============================================================================

pub fn cmd_evaluate(
    results_path: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), CliError> {
    let settings = load_environment(config.as_deref())?;
    logging::init(verbose, None)?;

    let results_path = results_path.unwrap_or_else(|| settings.results_stem().with_extension("json"));
    let results = export::load_results(&results_path)?;
    let dataset = Dataset::load(&settings)?;
    let inputs = dataset.into_scope_inputs(real_inputs_from_env());

    let evaluation = evaluate(&settings, &inputs, &results);

    if json {
        let out = serde_json::to_string_pretty(&evaluation)
            .map_err(|e| CliError::io(format!("JSON error: {e}")))?;
        println!("{out}");
    } else {
        print_evaluation(&evaluation);
    }
    Ok(())
}
