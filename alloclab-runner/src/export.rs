//! Export: JSON manifest, decision CSV, and a short text report.
//!
//! Persisted manifests carry a `schema_version`; newer versions are
//! rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::replay::Decision;
use crate::runner::{ReplayResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ReplayResult` to pretty JSON.
pub fn export_json(result: &ReplayResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize ReplayResult to JSON")
}

/// Deserialize a `ReplayResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ReplayResult> {
    let result: ReplayResult =
        serde_json::from_str(json).context("failed to deserialize ReplayResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export decisions in long form: one row per (date, ticker).
///
/// Columns: date, ticker, weight. A cash decision is a single row with an
/// empty ticker and weight.
pub fn export_decisions_csv(decisions: &[Decision]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "ticker", "weight"])?;

    for d in decisions {
        let date = d.date.to_string();
        if d.allocation.is_empty() {
            wtr.write_record([date.as_str(), "", ""])?;
            continue;
        }
        for (ticker, weight) in d.allocation.iter() {
            let weight = format!("{weight:.4}");
            wtr.write_record([date.as_str(), ticker, weight.as_str()])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a replay.
///
/// Creates `{strategy}_{timestamp}/` under `output_dir` containing
/// `manifest.json` (the full result) and `decisions.csv`.
pub fn save_artifacts(result: &ReplayResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("decisions.csv"),
        export_decisions_csv(&result.decisions)?,
    )?;

    Ok(run_dir)
}

/// Load a `ReplayResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<ReplayResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Text report ────────────────────────────────────────────────────

/// Plain-text summary for terminal output.
pub fn generate_report(result: &ReplayResult) -> String {
    let mut out = String::with_capacity(512);
    let s = &result.summary;
    let _ = writeln!(
        out,
        "{} [{}] {} .. {}",
        result.strategy, result.interval, result.start_date, result.end_date
    );
    if result.has_synthetic {
        let _ = writeln!(out, "  data: SYNTHETIC");
    }
    if result.warmup_bars > 0 {
        let _ = writeln!(out, "  warm-up:    {} bars", result.warmup_bars);
    }
    let _ = writeln!(out, "  run id:     {}", &result.run_id[..16.min(result.run_id.len())]);
    let _ = writeln!(out, "  decisions:  {}", s.decisions);
    let _ = writeln!(out, "  cash days:  {}", s.cash_days);
    let _ = writeln!(out, "  changes:    {}", s.changes);
    for (ticker, days) in &s.days_held {
        let _ = writeln!(out, "  held {ticker:<6} {days} days");
    }
    if !result.skipped.is_empty() {
        let _ = writeln!(out, "  skipped:    {}", result.skipped.len());
    }
    if let Some(last) = result.decisions.last() {
        let _ = writeln!(
            out,
            "  latest ({}): {}",
            last.date,
            serde_json::to_string(&last.allocation).unwrap_or_default()
        );
    }
    out
}
