//! Report export — the four CSV artifacts plus a JSON run manifest.
//!
//! Four CSVs per run:
//! - `base_report.csv` — per-pair metrics ranked by score
//! - `final_report.csv` — cumulative top-k combinations, capital-normalized
//! - `monthly_report.csv` — month × combination profit matrix
//! - `combined_report.csv` — final report columns joined with the monthly
//!   columns, one row per combination
//!
//! `manifest.json` records the run id, timestamp, and the full config so a
//! report directory is self-describing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pairlab_core::MetricBundle;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::monthly::MonthlyReport;
use crate::ranking::CombinationRow;
use crate::runner::ReportSet;
use crate::scoring::RankedTable;

/// Where each artifact of a run landed.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub base: PathBuf,
    pub final_report: PathBuf,
    pub monthly: PathBuf,
    pub combined: PathBuf,
    pub manifest: PathBuf,
}

/// Run provenance, persisted next to the CSVs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ReportConfig,
}

fn bundle_header() -> [&'static str; 16] {
    [
        "position_count",
        "performance",
        "winrate",
        "net_profit",
        "gross_profit",
        "gross_loss",
        "largest_profit",
        "average_profit",
        "average_loss",
        "max_drawdown",
        "missing_months",
        "average_concurrent",
        "average_win_streak",
        "max_win_streak",
        "average_loss_streak",
        "max_loss_streak",
    ]
}

fn bundle_fields(bundle: &MetricBundle) -> [String; 16] {
    [
        bundle.position_count.to_string(),
        format!("{:.4}", bundle.performance),
        format!("{:.4}", bundle.winrate),
        format!("{:.4}", bundle.net_profit),
        format!("{:.4}", bundle.gross_profit),
        format!("{:.4}", bundle.gross_loss),
        format!("{:.4}", bundle.largest_profit),
        format!("{:.4}", bundle.average_profit),
        format!("{:.4}", bundle.average_loss),
        format!("{:.4}", bundle.max_drawdown),
        bundle.missing_months.to_string(),
        format!("{:.4}", bundle.average_concurrent),
        format!("{:.4}", bundle.average_win_streak),
        bundle.max_win_streak.to_string(),
        format!("{:.4}", bundle.average_loss_streak),
        bundle.max_loss_streak.to_string(),
    ]
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Serialize the ranked per-pair table as CSV.
pub fn export_base_csv(base: &RankedTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["pair", "score"];
    header.extend(bundle_header());
    wtr.write_record(&header)?;

    for row in base {
        let mut record = vec![row.pair.clone(), format!("{:.6}", row.score)];
        record.extend(bundle_fields(&row.bundle));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

fn combination_header() -> Vec<&'static str> {
    let mut header = vec!["pair_count", "capital_per_trade", "scaling_factor"];
    header.extend(bundle_header());
    header
}

fn combination_fields(row: &CombinationRow) -> Vec<String> {
    let mut record = vec![
        row.pair_count.to_string(),
        format!("{:.4}", row.capital_per_trade),
        format!("{:.6}", row.scaling_factor),
    ];
    record.extend(bundle_fields(&row.bundle));
    record
}

/// Serialize the capital-normalized combination rows as CSV.
pub fn export_final_csv(combinations: &[CombinationRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&combination_header())?;
    for row in combinations {
        wtr.write_record(&combination_fields(row))?;
    }
    finish(wtr)
}

/// Serialize the month × combination matrix as CSV, months as `YYYY-MM`.
pub fn export_monthly_csv(monthly: &MonthlyReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["pair_count".to_string()];
    header.extend(monthly.months.iter().map(|m| m.format("%Y-%m").to_string()));
    wtr.write_record(&header)?;

    for row in &monthly.rows {
        let mut record = vec![row.pair_count.to_string()];
        record.extend(row.profits.iter().map(|p| format!("{:.4}", p)));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

/// Serialize the combined view: final report columns joined with the
/// monthly profit columns, matched by row order.
pub fn export_combined_csv(
    combinations: &[CombinationRow],
    monthly: &MonthlyReport,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = combination_header()
        .into_iter()
        .map(str::to_string)
        .collect();
    header.extend(monthly.months.iter().map(|m| m.format("%Y-%m").to_string()));
    wtr.write_record(&header)?;

    for (row, monthly_row) in combinations.iter().zip(&monthly.rows) {
        let mut record = combination_fields(row);
        record.extend(monthly_row.profits.iter().map(|p| format!("{:.4}", p)));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

/// Write the full artifact set for a run into `output_dir` (created if
/// absent). Returns where each file landed.
pub fn write_reports(
    output_dir: &Path,
    report: &ReportSet,
    config: &ReportConfig,
) -> Result<ReportPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create report dir: {}", output_dir.display()))?;

    let paths = ReportPaths {
        base: output_dir.join("base_report.csv"),
        final_report: output_dir.join("final_report.csv"),
        monthly: output_dir.join("monthly_report.csv"),
        combined: output_dir.join("combined_report.csv"),
        manifest: output_dir.join("manifest.json"),
    };

    std::fs::write(&paths.base, export_base_csv(&report.base)?)?;
    std::fs::write(&paths.final_report, export_final_csv(&report.combinations)?)?;
    std::fs::write(&paths.monthly, export_monthly_csv(&report.monthly)?)?;
    std::fs::write(
        &paths.combined,
        export_combined_csv(&report.combinations, &report.monthly)?,
    )?;

    let manifest = RunManifest {
        run_id: config.run_id(),
        generated_at: Utc::now(),
        config: config.clone(),
    };
    let json = serde_json::to_string_pretty(&manifest)
        .context("failed to serialize run manifest to JSON")?;
    std::fs::write(&paths.manifest, json)?;

    Ok(paths)
}
