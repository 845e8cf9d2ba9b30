//! `stockbal run` / `stockbal validate`: config-driven period balancing.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use stockbal_recon::{ReconError, ReconResult, StockConfig};

use crate::exit_codes::{
    recon_exit_code, EXIT_INVALID_CONFIG, EXIT_MISSING_INPUT, EXIT_RUNTIME, EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum Commands {
    /// Balance the four ledgers named in a TOML config file
    #[command(after_help = "\
Examples:
  stockbal run close.stock.toml
  stockbal run close.stock.toml --output balanced.xlsx
  stockbal run close.stock.toml --sales-target 800000 --tax-target 65000 --json")]
    Run {
        /// Path to the .stock.toml config file
        config: PathBuf,

        /// Target sales amount (overrides [targets].sales_amount)
        #[arg(long, value_name = "AMOUNT")]
        sales_target: Option<f64>,

        /// Target tax amount (overrides [targets].tax_amount)
        #[arg(long, value_name = "AMOUNT")]
        tax_target: Option<f64>,

        /// Report file, .xlsx or .csv (overrides [output].file)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a config without reading any ledger
    #[command(after_help = "\
Examples:
  stockbal validate close.stock.toml")]
    Validate {
        /// Path to the .stock.toml config file
        config: PathBuf,
    },
}

pub fn cmd_stock(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Run {
            config,
            sales_target,
            tax_target,
            output,
            json,
        } => cmd_run(config, sales_target, tax_target, output, json),
        Commands::Validate { config } => cmd_validate(config),
    }
}

fn stock_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("sales column names are set in [columns.sales]".to_string())
            }
            ReconError::TooFewColumns { .. } => {
                Some("inventory ledgers need a code column and a quantity column".to_string())
            }
            ReconError::MissingLedger(kind) => Some(format!("add a [ledgers.{kind}] table")),
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

fn load_config(config_path: &Path) -> Result<StockConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        stock_err(
            EXIT_INVALID_CONFIG,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    Ok(StockConfig::from_toml(&config_str)?)
}

/// Directory that relative ledger and output paths are resolved against.
fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn cmd_run(
    config_path: PathBuf,
    sales_target: Option<f64>,
    tax_target: Option<f64>,
    output: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let mut config = load_config(&config_path)?;
    let base_dir = config_dir(&config_path);
    log::debug!("ledger and output paths relative to {}", base_dir.display());

    // Command-line targets win; re-validate so they get the same checks
    if let Some(target) = sales_target {
        log::info!(
            "sales target {target} from --sales-target (config: {:?})",
            config.targets.sales_amount
        );
        config.targets.sales_amount = Some(target);
    }
    if let Some(target) = tax_target {
        log::info!(
            "tax target {target} from --tax-target (config: {:?})",
            config.targets.tax_amount
        );
        config.targets.tax_amount = Some(target);
    }
    config.validate()?;
    config.targets.resolve().map_err(|e| {
        CliError::from(e)
            .with_hint("set [targets] in the config or pass --sales-target/--tax-target")
    })?;

    let report_path = output.or_else(|| config.output.file.as_ref().map(|f| base_dir.join(f)));
    let json_path = config.output.json.as_ref().map(|f| base_dir.join(f));
    if report_path.is_none() && json_path.is_none() && !json_output {
        return Err(stock_err(EXIT_USAGE, "nothing to write")
            .with_hint("pass --output or --json, or set [output].file in the config"));
    }

    // Absent files are missing input, not a read failure
    for (kind, source) in &config.ledgers {
        let path = base_dir.join(&source.file);
        if !path.exists() {
            return Err(stock_err(
                EXIT_MISSING_INPUT,
                format!("{kind} ledger not found: {}", path.display()),
            ));
        }
    }

    let input = stockbal_io::load_ledgers(&config, base_dir)?;
    let result = stockbal_recon::run(&config, &input)?;

    if let Some(ref path) = report_path {
        let format = stockbal_io::output_format(path, config.output.format);
        stockbal_io::export_report(&result.rows, &config.report, path, format)
            .map_err(|e| stock_err(EXIT_RUNTIME, format!("cannot write report: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_path.is_some() || json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| stock_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = json_path {
            std::fs::write(path, &json_str)
                .map_err(|e| stock_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    print_summary(&result);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "'{}': {} products, {} negative before, {} after",
        result.meta.config_name, s.products, s.negative_before, s.negative_after,
    );
    eprintln!(
        "redistributed in {} of {} tax bracket(s)",
        s.brackets_redistributed(),
        s.brackets.len(),
    );
    eprintln!(
        "sales {} -> {} (ratio {:.6})",
        s.sales_total_before, s.sales_total_after, s.sales_scale.ratio,
    );
    eprintln!(
        "tax   {} -> {} (ratio {:.6})",
        s.tax_total_before, s.tax_total_after, s.tax_scale.ratio,
    );
    if s.negative_after > 0 {
        eprintln!(
            "warning: {} product(s) still below zero after redistribution",
            s.negative_after
        );
    }
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let targets = match (config.targets.sales_amount, config.targets.tax_amount) {
        (Some(_), Some(_)) => "targets set",
        _ => "targets must be passed at run time",
    };
    eprintln!(
        "valid: '{}' with {} ledger(s), {}",
        config.name,
        config.ledgers.len(),
        targets,
    );
    Ok(())
}
