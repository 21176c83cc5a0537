// 📊 Batch Report - detection rate, per-printer counts, unmatched groups, CSV

use crate::rules::{preprocess_filename, ClassificationResult, ClassificationStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

// ============================================================================
// BATCH SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub pending: usize,

    /// printer → brand → number of profiles
    pub by_printer: BTreeMap<String, BTreeMap<String, usize>>,

    /// Leading token → unmatched filenames, for writing new rules
    pub unmatched_groups: BTreeMap<String, Vec<String>>,

    /// Combo key → number of profiles still waiting for a decision
    pub pending_combos: BTreeMap<String, usize>,

    pub generated_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            matched: 0,
            unmatched: 0,
            pending: 0,
            by_printer: BTreeMap::new(),
            unmatched_groups: BTreeMap::new(),
            pending_combos: BTreeMap::new(),
            generated_at: Utc::now(),
        };

        for result in results {
            match result.status {
                ClassificationStatus::Matched => {
                    summary.matched += 1;
                    *summary
                        .by_printer
                        .entry(result.printer.clone())
                        .or_default()
                        .entry(result.brand.clone())
                        .or_default() += 1;
                }
                ClassificationStatus::Unmatched => {
                    summary.unmatched += 1;
                    summary
                        .unmatched_groups
                        .entry(leading_token(&result.filename))
                        .or_default()
                        .push(result.filename.clone());
                }
                ClassificationStatus::PendingDisambiguation => {
                    summary.pending += 1;
                    if let Some(key) = &result.combo_key {
                        *summary.pending_combos.entry(key.to_string()).or_default() += 1;
                    }
                }
            }
        }

        summary
    }

    /// Matched share of all files, in percent (0 for an empty batch).
    pub fn detection_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total as f64 * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} profiles: {:.1}% detected | {} matched, {} unmatched, {} pending disambiguation",
            self.total,
            self.detection_rate(),
            self.matched,
            self.unmatched,
            self.pending
        )
    }
}

/// Text before the first space, '_' or '-' of the extension-less name.
pub fn leading_token(filename: &str) -> String {
    let name = preprocess_filename(filename);
    name.split([' ', '_', '-'])
        .find(|t| !t.is_empty())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// CSV EXPORT
// ============================================================================

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    filename: &'a str,
    status: &'static str,
    printer: &'a str,
    brand: &'a str,
    paper_type: &'a str,
    code: &'a str,
    matched_rule: &'a str,
    combo_key: &'a str,
    candidates: String,
    display_name: String,
}

/// Write one CSV row per result, with a header.
pub fn write_csv<W: Write>(writer: W, results: &[ClassificationResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for result in results {
        wtr.serialize(CsvRow {
            filename: &result.filename,
            status: result.status.as_str(),
            printer: &result.printer,
            brand: &result.brand,
            paper_type: &result.paper_type,
            code: &result.code,
            matched_rule: result.matched_rule.as_deref().unwrap_or_default(),
            combo_key: result.combo_key.as_ref().map(|k| k.as_str()).unwrap_or_default(),
            candidates: result.candidates.join("|"),
            display_name: result.display_name(),
        })
        .with_context(|| format!("Failed to write CSV row for {}", result.filename))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
