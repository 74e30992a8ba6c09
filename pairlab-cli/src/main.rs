//! PairLab CLI — run reports and inspect positions files.
//!
//! Commands:
//! - `run` — build the full report set from a TOML config or a positions CSV
//! - `inspect` — summarize a positions file without running the pipeline

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pairlab_runner::{
    load_positions, run_report_from_store, write_reports, ReportConfig, ReportSet,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "pairlab",
    about = "PairLab CLI — pair ranking and combination reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report set and write the CSV artifacts.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Positions CSV file (alternative to --config, defaults apply).
        #[arg(long)]
        positions: Option<PathBuf>,

        /// Output directory for the report artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Filter positions by the Type column (e.g. long, short).
        #[arg(long)]
        position_type: Option<String>,

        /// Pair to exclude from combinations (repeatable).
        #[arg(long = "exclude")]
        excluded_pairs: Vec<String>,

        /// Cap on combination rows.
        #[arg(long)]
        max_rows: Option<usize>,

        /// Target capital per trade for the rescale.
        #[arg(long)]
        capital_per_trade: Option<f64>,
    },
    /// Summarize a positions file: pairs, counts, time span.
    Inspect {
        /// Positions CSV file.
        positions: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            positions,
            output_dir,
            position_type,
            excluded_pairs,
            max_rows,
            capital_per_trade,
        } => run_cmd(
            config,
            positions,
            output_dir,
            position_type,
            excluded_pairs,
            max_rows,
            capital_per_trade,
        ),
        Commands::Inspect { positions } => inspect_cmd(&positions),
    }
}

fn run_cmd(
    config_path: Option<PathBuf>,
    positions: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    position_type: Option<String>,
    excluded_pairs: Vec<String>,
    max_rows: Option<usize>,
    capital_per_trade: Option<f64>,
) -> Result<()> {
    let mut config = match (config_path, positions) {
        (Some(path), _) => ReportConfig::from_file(&path)?,
        (None, Some(positions)) => ReportConfig::new(positions),
        (None, None) => bail!("one of --config or --positions is required"),
    };

    // Flags override the config file.
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if position_type.is_some() {
        config.position_type = position_type;
    }
    if !excluded_pairs.is_empty() {
        config.excluded_pairs = excluded_pairs;
    }
    if let Some(rows) = max_rows {
        config.max_combination_rows = rows;
    }
    if let Some(capital) = capital_per_trade {
        config.capital_per_trade = capital;
    }
    config.validate()?;

    let store = load_positions(&config.positions_file, config.position_type.as_deref())?;
    let report = run_report_from_store(&store, &config)?;

    print_summary(&report, &config);

    let paths = write_reports(&config.output_dir, &report, &config)?;
    println!("Artifacts saved to: {}", config.output_dir.display());
    println!("  {}", paths.base.display());
    println!("  {}", paths.final_report.display());
    println!("  {}", paths.monthly.display());
    println!("  {}", paths.combined.display());
    println!("  {}", paths.manifest.display());

    Ok(())
}

fn inspect_cmd(positions: &Path) -> Result<()> {
    let store = load_positions(positions, None)?;

    if store.is_empty() {
        println!("Positions file is empty: {}", positions.display());
        return Ok(());
    }

    println!("Positions: {}", positions.display());
    println!("Rows:      {}", store.len());
    println!("Closed:    {}", store.closed_count());
    println!("Open:      {}", store.open_count());
    if let Some((start, end)) = store.time_range() {
        println!("Span:      {start} to {end} ({} months)", store.month_span().len());
    }
    println!();

    let pairs = store.pair_names();
    println!("{:<14} {:>8} {:>12}", "Pair", "Closed", "Net Profit");
    println!("{}", "-".repeat(36));
    for pair in &pairs {
        let subset = store.closed_for_pair(pair);
        let net: f64 = subset.iter().map(|p| p.net_profit).sum();
        println!("{:<14} {:>8} {:>12.2}", pair, subset.len(), net);
    }

    Ok(())
}

fn print_summary(report: &ReportSet, config: &ReportConfig) {
    println!();
    println!("=== Report Summary ===");
    println!("Run id:        {}", config.run_id());
    println!("Pairs ranked:  {}", report.base.len());
    println!("Combinations:  {}", report.combinations.len());
    println!("Months:        {}", report.monthly.months.len());
    println!();
    println!("--- Top Pairs ---");
    for (i, row) in report.base.iter().take(10).enumerate() {
        println!(
            "{:>3}. {:<14} score {:>8.4}  net {:>10.2}  winrate {:>5.1}%",
            i + 1,
            row.pair,
            row.score,
            row.bundle.net_profit,
            row.bundle.winrate
        );
    }
    if let Some(best) = report.combinations.last() {
        println!();
        println!("--- Full Combination ---");
        println!("Pairs:          {}", best.pair_count);
        println!("Positions:      {}", best.bundle.position_count);
        println!("Net Profit:     {:.2}", best.bundle.net_profit);
        println!("Max Drawdown:   {:.2}", best.bundle.max_drawdown);
        println!("Winrate:        {:.1}%", best.bundle.winrate);
        println!("Performance:    {:.1}%", best.bundle.performance);
    }
    println!();
}
