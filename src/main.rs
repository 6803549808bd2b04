use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evc_quote::catalog::{resolve_catalog, Catalog};
use evc_quote::compare::{compare_options, CompareAxis, Comparison};
use evc_quote::config::{Config, ConfigOverrides};
use evc_quote::engine::{compute_quote, Quote};
use evc_quote::output::csv::{comparison_to_csv, quote_to_csv};
use evc_quote::output::json::{render_json, render_quote_json};
use evc_quote::output::table::{
    render_catalog_table, render_comparison_table, render_report, render_summary_table,
};
use evc_quote::output::ReportMeta;
use evc_quote::selection::{load_selection, ModuleSpec, Selection};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "evc-quote",
    about = "Price Elastic Value Credit engagements and estimate delivery time"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,
    #[arg(long = "base-price")]
    base_price: Option<Decimal>,
    #[arg(long)]
    currency: Option<String>,
    /// Print the defaults applied for missing or unknown choices.
    #[arg(long)]
    notes: bool,
    #[command(flatten)]
    selection: SelectionArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct SelectionArgs {
    /// Selection snapshot (JSON or TOML); flags below override it.
    #[arg(long = "selection")]
    file: Option<PathBuf>,
    /// NAME[=VARIANT[@EVCS_PER_WEEK]], repeatable.
    #[arg(short = 'm', long = "module")]
    modules: Vec<ModuleSpec>,
    #[arg(short, long)]
    tier: Option<String>,
    #[arg(short, long)]
    allocation: Option<String>,
    #[arg(short, long)]
    payment: Option<String>,
    /// Enable a custom parameter, repeatable.
    #[arg(long = "param")]
    params: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Quote,
    Report {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Compare {
        #[arg(long, default_value = "tier")]
        by: CompareAxis,
    },
    Catalog,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        base_price_per_evc: cli.base_price,
        currency: cli.currency.clone(),
        catalog_path: cli.catalog.clone(),
        show_notes: cli.notes.then_some(true),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }

    let format = resolve_format(cli.output, &config);
    let catalog = resolve_catalog(config.catalog_path().as_deref())?;
    let meta = ReportMeta::new(catalog.digest(), config.pricing.currency.clone())
        .with_notes(config.features.show_notes);
    debug!("catalog digest {}", meta.catalog_digest);

    match &cli.command {
        Commands::Quote => {
            let selection = build_selection(&cli.selection)?;
            let quote = compute_quote(&catalog, &selection, &config.settings());
            print_summary(&quote, &meta, format)?;
        }
        Commands::Report { out } => {
            let selection = build_selection(&cli.selection)?;
            let quote = compute_quote(&catalog, &selection, &config.settings());
            let rendered = render_quote(&quote, &meta, format)?;
            match out {
                Some(path) => {
                    write_output(path, &rendered)?;
                    info!("wrote report to {}", path.display());
                    println!("Wrote report to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Compare { by } => {
            let selection = build_selection(&cli.selection)?;
            let comparison = compare_options(&catalog, &selection, &config.settings(), *by);
            print_comparison(&comparison, &meta, format)?;
        }
        Commands::Catalog => print_catalog(&catalog, format)?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn resolve_format(cli_format: Option<OutputFormat>, config: &Config) -> OutputFormat {
    if let Some(format) = cli_format {
        return format;
    }
    match OutputFormat::from_str(&config.output.format, true) {
        Ok(format) => format,
        Err(_) => {
            warn!(
                "unknown output format in config: {}, using table",
                config.output.format
            );
            OutputFormat::Table
        }
    }
}

fn build_selection(args: &SelectionArgs) -> Result<Selection> {
    let mut selection = match &args.file {
        Some(path) => load_selection(path)?,
        None => Selection::new(),
    };
    for spec in &args.modules {
        selection.apply_module_spec(spec.clone());
    }
    if let Some(tier) = &args.tier {
        selection.tier = Some(tier.clone());
    }
    if let Some(allocation) = &args.allocation {
        selection.allocation = Some(allocation.clone());
    }
    if let Some(payment) = &args.payment {
        selection.payment = Some(payment.clone());
    }
    for param in &args.params {
        selection.custom_parameters.insert(param.clone(), true);
    }
    Ok(selection)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating output directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed writing {}", path.display()))
}

fn render_quote(quote: &Quote, meta: &ReportMeta, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_report(quote, meta)),
        OutputFormat::Json => render_quote_json(quote, meta),
        OutputFormat::Csv => quote_to_csv(quote),
    }
}

fn print_summary(quote: &Quote, meta: &ReportMeta, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_summary_table(quote, meta)),
        OutputFormat::Json => println!("{}", render_quote_json(quote, meta)?),
        OutputFormat::Csv => println!("{}", quote_to_csv(quote)?),
    }
    Ok(())
}

fn print_comparison(
    comparison: &Comparison,
    meta: &ReportMeta,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_comparison_table(comparison, meta)),
        OutputFormat::Json => println!("{}", render_json(comparison)?),
        OutputFormat::Csv => println!("{}", comparison_to_csv(comparison)?),
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_catalog_table(catalog)),
        OutputFormat::Json => println!("{}", render_json(catalog)?),
        OutputFormat::Csv => {
            warn!("CSV output for catalog not implemented, using JSON");
            println!("{}", render_json(catalog)?);
        }
    }
    Ok(())
}
